//! Debug command parsing

use crate::hex::parse_number;

/// Width of a target address
const ADDRESS_BITS: u32 = 24;

/// A numeric argument, kept verbatim when it does not parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Number {
    /// A value that fits the argument's width
    Valid(u32),
    /// The token as typed
    Invalid(String),
}

impl Number {
    fn parse(token: &str, bits: u32) -> Self {
        match parse_number(token, bits) {
            Some(value) => Number::Valid(value),
            None => Number::Invalid(token.to_string()),
        }
    }
}

/// Arguments of a `write` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteArgs {
    /// Start address
    pub address: Number,
    /// Bytes to write, up to the first bad token
    pub data: Vec<u8>,
    /// The first data token that is not a byte, if any
    pub rejected: Option<String>,
}

/// One debug monitor command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Halt the target
    Stop,
    /// Resume the target
    Go,
    /// Reset the target
    Reset,
    /// Execute one instruction
    Step,
    /// Stop, reset and resume
    Run,
    /// Dump 64 bytes at each address
    Read(Vec<Number>),
    /// Write bytes starting at an address; `None` without arguments
    Write(Option<WriteArgs>),
    /// Write an Intel HEX file to RAM
    Program(Option<String>),
    /// Compare RAM with an Intel HEX file
    Verify(Option<String>),
    /// Erase the flash and program an Intel HEX file into it
    Flash(Option<String>),
    /// Compare the flash with an Intel HEX file
    VerifyRom(Option<String>),
    /// Load the identity RAM mapping
    MapRam,
    /// Erase the whole flash chip
    Erase,
    /// Erase the flash sector holding an address
    EraseSector(Option<Number>),
    /// Identify the flash chip
    ChipId,
    /// Drain stale bytes from the link
    Resync,
    /// Anything else, with the name as typed
    Unknown(String),
}

impl Command {
    /// Parse a tokenized command line
    ///
    /// The command name is case-insensitive; empty argument tokens are
    /// ignored. Returns `None` for an empty token list.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Option<Self> {
        let (name, rest) = tokens.split_first()?;
        let name = name.as_ref();
        let mut args = rest.iter().map(AsRef::as_ref).filter(|a| !a.is_empty());

        let command = match name.to_ascii_lowercase().as_str() {
            "stop" => Command::Stop,
            "cont" | "go" => Command::Go,
            "reset" => Command::Reset,
            "step" => Command::Step,
            "run" => Command::Run,
            "read" => Command::Read(args.map(|a| Number::parse(a, ADDRESS_BITS)).collect()),
            "write" => Command::Write(args.next().map(|first| {
                let address = Number::parse(first, ADDRESS_BITS);
                let mut data = Vec::new();
                let mut rejected = None;
                if let Number::Valid(_) = address {
                    for token in args {
                        match parse_number(token, 8) {
                            Some(byte) => data.push(byte as u8),
                            None => {
                                rejected = Some(token.to_string());
                                break;
                            }
                        }
                    }
                }
                WriteArgs {
                    address,
                    data,
                    rejected,
                }
            })),
            "program" => Command::Program(args.next().map(str::to_string)),
            "verify" => Command::Verify(args.next().map(str::to_string)),
            "flash" => Command::Flash(args.next().map(str::to_string)),
            "verify-rom" => Command::VerifyRom(args.next().map(str::to_string)),
            "mapram" => Command::MapRam,
            "erase" => Command::Erase,
            "erase-sector" => {
                Command::EraseSector(args.next().map(|a| Number::parse(a, ADDRESS_BITS)))
            }
            "chipid" => Command::ChipId,
            "resync" => Command::Resync,
            _ => Command::Unknown(name.to_string()),
        };
        Some(command)
    }
}

//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Console device name that selects the built-in test mode
pub const TEST_DEVICE: &str = "test";

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser, Debug)]
#[command(name = "nico")]
#[command(author, version, about = "Neon816 integrated console", long_about = None)]
pub struct Cli {
    /// Console device: serial port, Unix socket, or "test"
    pub console: String,

    /// Debug monitor device: serial port or Unix socket
    pub debug: Option<String>,

    /// Console serial speed (hex or decimal)
    #[arg(long, default_value = "9600", value_parser = parse_hex_u32)]
    pub console_speed: u32,

    /// Debug serial speed (hex or decimal)
    #[arg(long, default_value = "57600", value_parser = parse_hex_u32)]
    pub debug_speed: u32,

    /// Disable the debug interface; debug commands are discarded
    #[arg(long)]
    pub no_debug: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log file (the terminal belongs to the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Whether the console runs in test mode
    pub fn test_mode(&self) -> bool {
        self.console == TEST_DEVICE
    }

    /// Where log output goes
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("nico.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("9600"), Ok(9600));
        assert_eq!(parse_hex_u32("0xE100"), Ok(57600));
        assert!(parse_hex_u32("fast").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["nico", "/dev/ttyUSB0"]).unwrap();
        assert_eq!(cli.console, "/dev/ttyUSB0");
        assert_eq!(cli.debug, None);
        assert_eq!(cli.console_speed, 9600);
        assert_eq!(cli.debug_speed, 57600);
        assert!(!cli.no_debug);
        assert!(!cli.test_mode());
    }

    #[test]
    fn test_full_command_line() {
        let cli = Cli::try_parse_from([
            "nico",
            "test",
            "/tmp/neon-debug",
            "--console-speed",
            "115200",
            "--no-debug",
            "-vv",
        ])
        .unwrap();
        assert!(cli.test_mode());
        assert_eq!(cli.debug.as_deref(), Some("/tmp/neon-debug"));
        assert_eq!(cli.console_speed, 115200);
        assert!(cli.no_debug);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_console_is_required() {
        assert!(Cli::try_parse_from(["nico"]).is_err());
    }
}

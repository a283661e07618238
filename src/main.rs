//! nico - Neon816 integrated console
//!
//! One terminal window shows both sides of a Neon816 board:
//! - the **console** pane, an ANSI terminal on the target's serial console
//!   that can also push files with ASCII, XMODEM or YMODEM
//! - the **debug** pane, a transcript of commands sent to the board's
//!   debug monitor (memory access, flash programming, run control)
//!
//! Each link is serviced on its own thread; everything reaches the screen
//! through a single event channel owned by the UI thread.

mod cli;
mod console;
mod debug;
mod ui;

use std::fs::File;
use std::sync::mpsc;

use clap::Parser;
use cli::Cli;
use nico_link::open_link;
use ui::{App, Screen, UiEvent};

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    // The terminal belongs to the UI, so logs go to a file
    let path = cli.log_path();
    match File::create(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", path.display(), e);
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();

    match cli.verbose {
        0 => {}
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli);
    log::info!("nico v{} starting", env!("CARGO_PKG_VERSION"));

    let (events, inbox) = mpsc::channel();

    let console_tx = if cli.test_mode() {
        console::spawn_test(events.clone())?
    } else {
        let opened = match open_link(&cli.console, cli.console_speed) {
            Ok(opened) => opened,
            Err(e) => {
                log::error!("console device {}: {}", cli.console, e);
                return Err(format!("Failed to open console device {}: {}", cli.console, e).into());
            }
        };
        log::info!(
            "console link {} open ({:?}, speed {})",
            cli.console,
            opened.kind,
            opened.speed
        );
        console::spawn(
            opened.transport,
            &cli.console,
            opened.kind,
            opened.speed,
            events.clone(),
        )?
    };
    let debug_tx = debug::spawn(cli.debug.as_deref(), cli.debug_speed, cli.no_debug, events.clone())?;

    let mut screen = Screen::enter()?;
    let (cols, rows) = Screen::size()?;
    let mut app = App::new(cols, rows, console_tx, debug_tx);

    app.handle(UiEvent::Console(
        format!("nico v{}\r\n", env!("CARGO_PKG_VERSION")).into_bytes(),
    ));
    if cli.test_mode() {
        let layout = app.layout();
        let banner = format!(
            "*** Test Mode ***\r\n[console {}x{}]\r\n[debug {}x{}]\r\n",
            layout.cols, layout.console_rows, layout.cols, layout.debug_rows
        );
        app.handle(UiEvent::Console(banner.into_bytes()));
    }

    ui::spawn_input(events)?;
    let reason = ui::run(&mut app, &mut screen, &inbox);
    // Restore the terminal before reporting anything
    drop(screen);

    let reason = reason?;
    if !reason.is_empty() {
        log::error!("{}", reason);
        eprintln!("{}", reason);
        std::process::exit(1);
    }
    log::info!("nico exiting");
    Ok(())
}

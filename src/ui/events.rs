//! Messages funnelled into the UI thread
//!
//! The console servicer, the debug servicer and the keyboard reader each
//! run on their own thread and only ever talk to the screen by sending a
//! [`UiEvent`] down one channel.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// How often the keyboard thread checks whether the UI is gone
const POLL_RATE: Duration = Duration::from_millis(50);

/// Something the UI thread has to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Bytes the target wrote to its console
    Console(Vec<u8>),
    /// A complete line for the debug pane
    DebugLine(String),
    /// A progress report that the next debug output overwrites
    DebugProgress(String),
    /// A key was pressed
    Key(KeyEvent),
    /// The terminal changed size (columns, rows)
    Resize(u16, u16),
    /// Shut down, with a reason for the user (empty for a normal exit)
    Quit(String),
}

/// Forward keyboard and resize events until the UI stops listening
pub fn spawn_input(events: Sender<UiEvent>) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("nico-input".to_owned())
        .spawn(move || loop {
            let event = match event::poll(POLL_RATE) {
                Ok(false) => continue,
                Ok(true) => event::read(),
                Err(e) => Err(e),
            };
            let message = match event {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => UiEvent::Key(key),
                Ok(Event::Resize(cols, rows)) => UiEvent::Resize(cols, rows),
                Ok(_) => continue,
                Err(e) => {
                    log::error!("keyboard input failed: {}", e);
                    UiEvent::Quit(format!("Error reading keyboard: {}", e))
                }
            };
            let fatal = matches!(message, UiEvent::Quit(_));
            if events.send(message).is_err() || fatal {
                return;
            }
        })
}

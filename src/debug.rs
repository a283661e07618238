//! Debug interface servicer
//!
//! Debug commands are executed strictly one after another on a dedicated
//! thread. Depending on how the program was started, commands go to the
//! monitor on a real debug link, are bounced with an error, or are dropped.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::{debug, info, warn};
use nico_core::debug::{Debugger, Transcript};
use nico_core::link::Link;
use nico_link::{open_link, Transport};

use crate::ui::UiEvent;

/// Sends command output to the debug pane
#[derive(Clone)]
pub struct UiTranscript {
    events: Sender<UiEvent>,
}

impl UiTranscript {
    pub fn new(events: Sender<UiEvent>) -> Self {
        Self { events }
    }
}

impl Transcript for UiTranscript {
    fn line(&mut self, text: &str) {
        let _ = self.events.send(UiEvent::DebugLine(text.to_string()));
    }

    fn progress(&mut self, text: &str) {
        let _ = self.events.send(UiEvent::DebugProgress(text.to_string()));
    }
}

/// What debug commands are executed by
pub enum Backend<L> {
    /// The monitor on an open debug link
    Monitor(Debugger<L, UiTranscript>),
    /// No usable debug link: every command is rejected
    Null,
    /// Debug interface switched off: commands vanish
    Disabled,
}

/// Open the debug link at `device`, or fall back to the null interface
pub fn connect(device: &str, speed: u32, events: &Sender<UiEvent>) -> Backend<Box<dyn Transport>> {
    match open_link(device, speed) {
        Ok(opened) => {
            info!(
                "debug link {} open ({:?}, speed {})",
                device, opened.kind, opened.speed
            );
            let mut transcript = UiTranscript::new(events.clone());
            transcript.line(&format!("Connected to debugger at {}", device));
            Backend::Monitor(Debugger::open(opened.transport, opened.speed, transcript))
        }
        Err(e) => {
            warn!("debug device {} is not usable: {}", device, e);
            let _ = events.send(UiEvent::DebugLine(format!(
                "Failed to connect to {}: {}",
                device, e
            )));
            let _ = events.send(UiEvent::DebugLine(format!(
                "Debug device {} is not usable!",
                device
            )));
            Backend::Null
        }
    }
}

/// Execute commands in order until the command channel closes
pub fn serve<L: Link>(mut backend: Backend<L>, commands: Receiver<Vec<String>>, events: &Sender<UiEvent>) {
    while let Ok(words) = commands.recv() {
        let Some(name) = words.first() else {
            continue;
        };
        match &mut backend {
            Backend::Monitor(debugger) => debugger.dispatch(&words),
            Backend::Null => {
                let _ = events.send(UiEvent::DebugLine(format!("Bad command: {}", name)));
            }
            Backend::Disabled => debug!("debug interface disabled, dropping {:?}", words),
        }
    }
    debug!("debug servicer stopped");
}

/// Start the debug servicer thread
///
/// With `disabled` set commands are discarded; without a device they are
/// rejected.
pub fn spawn(
    device: Option<&str>,
    speed: u32,
    disabled: bool,
    events: Sender<UiEvent>,
) -> io::Result<Sender<Vec<String>>> {
    let backend = match device {
        _ if disabled => Backend::Disabled,
        Some(device) => connect(device, speed, &events),
        None => Backend::Null,
    };
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("nico-debug".to_owned())
        .spawn(move || serve(backend, rx, &events))?;
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nico_dummy::DummyMonitor;
    use std::sync::mpsc::channel;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn run<L: Link>(backend: Backend<L>, commands: &[&str], events: &Sender<UiEvent>) {
        let (tx, rx) = channel();
        for command in commands {
            tx.send(words(command)).unwrap();
        }
        drop(tx);
        serve(backend, rx, events);
    }

    #[test]
    fn test_null_interface_rejects() {
        let (events, screen) = channel();
        run(Backend::<DummyMonitor>::Null, &["chipid", "read 1000"], &events);
        let lines: Vec<_> = screen.try_iter().collect();
        assert_eq!(
            lines,
            [
                UiEvent::DebugLine("Bad command: chipid".into()),
                UiEvent::DebugLine("Bad command: read".into()),
            ]
        );
    }

    #[test]
    fn test_disabled_interface_is_silent() {
        let (events, screen) = channel();
        run(Backend::<DummyMonitor>::Disabled, &["chipid"], &events);
        assert!(screen.try_recv().is_err());
    }

    #[test]
    fn test_monitor_commands_in_order() {
        let (events, screen) = channel();
        let transcript = UiTranscript::new(events.clone());
        let debugger = Debugger::new(DummyMonitor::new(), 0, transcript);
        run(
            Backend::Monitor(debugger),
            &["write 0x1000 0x41", "chipid", "bogus"],
            &events,
        );
        let lines: Vec<_> = screen.try_iter().collect();
        assert_eq!(
            lines,
            [
                UiEvent::DebugLine("Wrote 1 byte!".into()),
                UiEvent::DebugLine("Manufacturer: SST, device: 39xF040 (512K)".into()),
                UiEvent::DebugLine("Unknown command: 'bogus'".into()),
            ]
        );
    }

    #[test]
    fn test_flash_progress_is_transient() {
        let (events, screen) = channel();
        let mut transcript = UiTranscript::new(events);
        transcript.progress("50%");
        transcript.line("Segment complete!");
        let lines: Vec<_> = screen.try_iter().collect();
        assert_eq!(
            lines,
            [
                UiEvent::DebugProgress("50%".into()),
                UiEvent::DebugLine("Segment complete!".into()),
            ]
        );
    }

    #[test]
    fn test_unusable_device_falls_back() {
        let (events, screen) = channel();
        let backend = connect("/nonexistent/ttyNEON", 57600, &events);
        assert!(matches!(backend, Backend::Null));
        let lines: Vec<_> = screen.try_iter().collect();
        assert_eq!(
            lines.last(),
            Some(&UiEvent::DebugLine(
                "Debug device /nonexistent/ttyNEON is not usable!".into()
            ))
        );
    }
}

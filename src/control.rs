use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Keys the monitor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    TogglePause,
    /// Ctrl+C typed while the terminal is in raw mode.
    Interrupt,
}

/// Non-blocking source of control key presses.
pub trait KeyListener {
    /// Report at most one buffered key press, never waiting for one.
    fn poll(&mut self) -> Option<ControlKey>;
}

impl<K: KeyListener + ?Sized> KeyListener for Box<K> {
    fn poll(&mut self) -> Option<ControlKey> {
        (**self).poll()
    }
}

/// Used when stdin is not an interactive terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTerminal;

impl KeyListener for NoTerminal {
    fn poll(&mut self) -> Option<ControlKey> {
        None
    }
}

/// Reads single key presses from a raw-mode terminal. Raw mode is left on drop.
pub struct TerminalKeys {
    _private: (),
}

impl TerminalKeys {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

impl KeyListener for TerminalKeys {
    fn poll(&mut self) -> Option<ControlKey> {
        match event::poll(Duration::ZERO) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                log::debug!("Key poll failed: {e}");
                return None;
            }
        }

        let key = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
            Ok(_) => return None,
            Err(e) => {
                log::debug!("Key read failed: {e}");
                return None;
            }
        };

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(ControlKey::Interrupt)
            }
            KeyCode::Char('p') | KeyCode::Char('P') => Some(ControlKey::TogglePause),
            _ => None,
        }
    }
}

/// Pick the terminal listener when stdin is interactive, the no-op otherwise.
pub fn key_listener() -> Box<dyn KeyListener> {
    if !io::stdin().is_terminal() {
        return Box::new(NoTerminal);
    }

    match TerminalKeys::new() {
        Ok(keys) => Box::new(keys),
        Err(e) => {
            log::warn!("Pause key unavailable, could not enable raw mode: {e}");
            Box::new(NoTerminal)
        }
    }
}

/// Set once from any thread to ask the monitor loop to stop.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pause and liveness state shared by the loop, the key listener and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub paused: bool,
    pub running: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            paused: false,
            running: true,
        }
    }
}

impl ControlState {
    /// Flip pause and return the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Mark the session finished. Returns false if it already was.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_terminal_never_reports_a_key() {
        let mut keys = NoTerminal;
        for _ in 0..10 {
            assert_eq!(keys.poll(), None);
        }
    }

    #[test]
    fn stop_flag_is_shared_between_clones() {
        let flag = StopFlag::new();
        let handler_copy = flag.clone();
        assert!(!flag.is_requested());
        handler_copy.request_stop();
        assert!(flag.is_requested());
    }

    #[test]
    fn running_goes_false_exactly_once() {
        let mut state = ControlState::default();
        assert!(state.running);
        assert!(state.stop());
        assert!(!state.stop());
        assert!(!state.running);
    }

    #[test]
    fn pause_toggles() {
        let mut state = ControlState::default();
        assert!(state.toggle_pause());
        assert!(!state.toggle_pause());
    }
}

//! Keystroke input handling using crossterm
//!
//! Features:
//! - Non-blocking keystroke capture bounded by the next timer deadline
//! - Key to raw selection mapping per trial
//! - Ctrl+C graceful exit, Esc to abandon a trial

use crate::registry::TrialId;
use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::Result as IoResult;
use std::time::Duration;

/// Menu entries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuChoice {
    Trial(TrialId),
    Diagnosis,
    Quit,
}

/// Handles user input from terminal
pub struct InputHandler {
    /// Upper bound for a single poll (milliseconds)
    poll_timeout: Duration,
}

impl InputHandler {
    /// Create new input handler with default timeout (50ms for responsive input)
    pub fn new() -> Self {
        InputHandler {
            poll_timeout: Duration::from_millis(50),
        }
    }

    /// Enable raw mode for terminal input
    pub fn enable_raw_mode() -> IoResult<()> {
        crossterm::terminal::enable_raw_mode()
    }

    /// Disable raw mode and restore terminal
    pub fn disable_raw_mode() -> IoResult<()> {
        crossterm::terminal::disable_raw_mode()
    }

    /// Poll for a key press, waiting at most until `deadline` (if sooner
    /// than the default poll timeout). Returns None on timeout.
    pub fn read_key(&self, deadline: Option<Duration>) -> IoResult<Option<KeyEvent>> {
        let wait = deadline.map_or(self.poll_timeout, |d| d.min(self.poll_timeout));
        if event::poll(wait)? {
            match event::read()? {
                event::Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
                    Ok(Some(key_event))
                }
                _ => Ok(None),
            }
        } else {
            Ok(None)
        }
    }

    /// Check if key event is an exit signal (Ctrl+C)
    pub fn is_exit(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL))
    }

    /// Esc leaves the current trial or screen
    pub fn is_escape(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Esc)
    }

    pub fn menu_choice(key: &KeyEvent) -> Option<MenuChoice> {
        match key.code {
            KeyCode::Char('1') => Some(MenuChoice::Trial(TrialId::Telekinesis)),
            KeyCode::Char('2') => Some(MenuChoice::Trial(TrialId::Clairvoyance)),
            KeyCode::Char('3') => Some(MenuChoice::Trial(TrialId::Precognition)),
            KeyCode::Char('4') => Some(MenuChoice::Diagnosis),
            KeyCode::Char('q') | KeyCode::Esc => Some(MenuChoice::Quit),
            _ => None,
        }
    }

    /// Raw selection for a trial. Range checks happen in the session layer,
    /// so card `4` is forwarded as 3 and rejected there.
    pub fn selection(trial: TrialId, key: &KeyEvent) -> Option<i64> {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match (trial, key.code) {
            (TrialId::Telekinesis, KeyCode::Char(' ') | KeyCode::Enter) => Some(0),
            (TrialId::Clairvoyance, KeyCode::Char(c)) => {
                c.to_digit(10).filter(|&d| d > 0).map(|d| d as i64 - 1)
            }
            (TrialId::Precognition, KeyCode::Char(c)) => c.to_digit(10).map(|d| d as i64),
            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

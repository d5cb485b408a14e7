//! Keyboard input: single key presses read from the terminal in raw mode and
//! mapped to control actions, polled once per tick by the replay loop.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use gridline_replay::ControlAction;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Map a single typed character to an action.
pub fn action_for_char(c: char) -> Option<ControlAction> {
    match c.to_ascii_lowercase() {
        'p' | ' ' => Some(ControlAction::TogglePause),
        'f' => Some(ControlAction::SpeedUp),
        'r' => Some(ControlAction::SpeedDown),
        '1' => Some(ControlAction::SpeedReset),
        'l' => Some(ControlAction::SkipForward),
        'h' => Some(ControlAction::SkipBackward),
        'n' => Some(ControlAction::NextLap),
        'q' => Some(ControlAction::Quit),
        _ => None,
    }
}

/// Map a terminal key event to an action. Only presses count.
pub fn action_for_key(key: &KeyEvent) -> Option<ControlAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        // Raw mode swallows SIGINT.
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ControlAction::Quit)
        }
        KeyCode::Char(c) => action_for_char(c),
        KeyCode::Up => Some(ControlAction::SpeedUp),
        KeyCode::Down => Some(ControlAction::SpeedDown),
        KeyCode::Right => Some(ControlAction::SkipForward),
        KeyCode::Left => Some(ControlAction::SkipBackward),
        _ => None,
    }
}

/// Anything the replay loop can poll for control actions.
pub trait ControlSource {
    /// Every action available now, without blocking.
    fn poll(&mut self) -> Result<Vec<ControlAction>>;
}

/// Keeps the terminal in raw mode for as long as it lives.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to put the terminal in raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::warn!(%err, "failed to restore terminal mode");
        }
    }
}

/// Key presses from the controlling terminal.
///
/// The terminal is restored when this is dropped, including on an early
/// return or a panic unwinding through the caller.
pub struct TerminalInput {
    _raw: RawModeGuard,
}

impl TerminalInput {
    pub fn new() -> Result<Self> {
        let raw = RawModeGuard::enable()?;
        tracing::debug!("terminal in raw mode");
        Ok(Self { _raw: raw })
    }
}

impl ControlSource for TerminalInput {
    fn poll(&mut self) -> Result<Vec<ControlAction>> {
        let mut actions = Vec::new();
        while event::poll(Duration::ZERO).context("Failed to poll the terminal")? {
            if let Event::Key(key) = event::read().context("Failed to read a terminal event")? {
                actions.extend(action_for_key(&key));
            }
        }
        Ok(actions)
    }
}

/// Scripted actions, as sent by tests or another thread.
impl ControlSource for Receiver<ControlAction> {
    fn poll(&mut self) -> Result<Vec<ControlAction>> {
        Ok(self.try_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use std::sync::mpsc;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_single_keys() {
        let actions: Vec<ControlAction> = "p 1nqQ".chars().filter_map(action_for_char).collect();
        assert_eq!(
            actions,
            vec![
                ControlAction::TogglePause,
                ControlAction::TogglePause,
                ControlAction::SpeedReset,
                ControlAction::NextLap,
                ControlAction::Quit,
                ControlAction::Quit,
            ]
        );
        assert_eq!(action_for_char('x'), None);
    }

    #[test]
    fn test_arrow_keys() {
        let actions: Vec<ControlAction> = [KeyCode::Up, KeyCode::Down, KeyCode::Right, KeyCode::Left]
            .into_iter()
            .filter_map(|code| action_for_key(&press(code)))
            .collect();
        assert_eq!(
            actions,
            vec![
                ControlAction::SpeedUp,
                ControlAction::SpeedDown,
                ControlAction::SkipForward,
                ControlAction::SkipBackward,
            ]
        );
    }

    #[test]
    fn test_key_presses_only() {
        assert_eq!(
            action_for_key(&press(KeyCode::Char('l'))),
            Some(ControlAction::SkipForward)
        );
        let release = KeyEvent {
            code: KeyCode::Char('l'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(action_for_key(&release), None);
        assert_eq!(action_for_key(&press(KeyCode::Enter)), None);
        assert_eq!(action_for_key(&press(KeyCode::Char('é'))), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for_key(&ctrl_c), Some(ControlAction::Quit));
        assert_eq!(action_for_key(&press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_channel_poll_drains_without_blocking() {
        let (tx, mut rx) = mpsc::channel();
        assert!(rx.poll().unwrap().is_empty());

        tx.send(ControlAction::SpeedUp).unwrap();
        tx.send(ControlAction::Quit).unwrap();
        assert_eq!(
            rx.poll().unwrap(),
            vec![ControlAction::SpeedUp, ControlAction::Quit]
        );
        assert!(rx.poll().unwrap().is_empty());
    }
}

use crate::config::DURATION_PRESETS;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Document-level shortcuts, valid wherever a test is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Alt+1..Alt+4
    Duration(u32),
    /// Ctrl+R (Shift optional), Super/Meta accepted in place of Ctrl
    Reset,
    CycleLanguage,
    CycleDuration,
    ShowHistory,
    ClearSavedData,
}

impl Shortcut {
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        let m = key.modifiers;
        let alt_only = m.contains(KeyModifiers::ALT)
            && !m.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER | KeyModifiers::META);
        let ctrl_or_meta = m.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER | KeyModifiers::META);

        match key.code {
            KeyCode::Char(c @ '1'..='4') if alt_only => {
                let idx = c as usize - '1' as usize;
                Some(Shortcut::Duration(DURATION_PRESETS[idx]))
            }
            KeyCode::Char('r') | KeyCode::Char('R') if ctrl_or_meta => Some(Shortcut::Reset),
            KeyCode::Char('g') | KeyCode::Char('G') if m.contains(KeyModifiers::CONTROL) => {
                Some(Shortcut::ShowHistory)
            }
            KeyCode::Char('k') | KeyCode::Char('K') if m.contains(KeyModifiers::CONTROL) => {
                Some(Shortcut::ClearSavedData)
            }
            KeyCode::Tab => Some(Shortcut::CycleLanguage),
            KeyCode::BackTab => Some(Shortcut::CycleDuration),
            _ => None,
        }
    }
}

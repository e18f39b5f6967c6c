use ratatui::Frame;

use crate::app::{App, AppState};
use crate::ui;

/// A UI Screen boundary: responsible for rendering one application state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Passage, live readouts and controls
pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        ui::render_typing(app, area, f.buffer_mut());
    }
}

/// The ended test with the results overlay and any confetti on top
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        ui::render_typing(app, area, f.buffer_mut());
        ui::render_results_overlay(app, area, f.buffer_mut());
        ui::render_confetti(&app.confetti, area, f.buffer_mut());
    }
}

pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        ui::render_history(app, area, f.buffer_mut());
    }
}

/// Clear-data confirmation drawn over whatever screen asked for it
pub struct ConfirmClearScreen;

impl Screen for ConfirmClearScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        if app.return_state != AppState::ConfirmClear {
            current_screen(&app.return_state).render(app, f);
        }
        let area = f.area();
        ui::render_confirm_clear(area, f.buffer_mut());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Typing => Box::new(TypingScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::History => Box::new(HistoryScreen),
        AppState::ConfirmClear => Box::new(ConfirmClearScreen),
    }
}

use crate::celebration::Confetti;
use crate::config::{Settings, SettingsStore};
use crate::history_chart::ProgressSeries;
use crate::language::{Language, PassagePool};
use crate::results::{self, PersonalBest, ResultRecord};
use crate::session::{Session, SessionSummary};
use crate::shortcuts::Shortcut;
use crate::storage::{self, KeyValueStore};
use crate::TICK_RATE_MS;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Overlay keys are ignored this long after a test ends, so keystrokes
/// still in flight when the timer expires cannot dismiss the results.
pub const OVERLAY_GRACE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    /// Results overlay on top of the ended test
    Results,
    History,
    ConfirmClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Data behind the results overlay
#[derive(Debug, Clone)]
pub struct ResultsOverlay {
    pub summary: SessionSummary,
    pub record: ResultRecord,
    /// `None` when the stored best could not be read
    pub personal_best: Option<PersonalBest>,
    pub top_runs: Vec<String>,
}

impl ResultsOverlay {
    pub fn is_new_best(&self) -> bool {
        self.personal_best.is_some_and(|pb| pb.is_new())
    }
}

pub struct App {
    store: Box<dyn KeyValueStore>,
    custom_prompt: Option<String>,
    pub settings: Settings,
    pub session: Session,
    pub state: AppState,
    /// Screen to return to when leaving History or ConfirmClear
    pub return_state: AppState,
    pub overlay: Option<ResultsOverlay>,
    /// When the current overlay was raised
    finished_at: Option<Instant>,
    pub progress: Option<ProgressSeries>,
    pub confetti: Confetti,
    pub status: Option<String>,
    pub viewport: (u16, u16),
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn new(store: Box<dyn KeyValueStore>, custom_prompt: Option<String>) -> Self {
        let settings = store.load_settings();
        let session = Session::new(settings.language, settings.duration_secs, String::new());

        let mut app = Self {
            store,
            custom_prompt,
            settings,
            session,
            state: AppState::Typing,
            return_state: AppState::Typing,
            overlay: None,
            finished_at: None,
            progress: None,
            confetti: Confetti::new(),
            status: None,
            viewport: (80, 24),
        };
        app.reset();
        app
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Fresh session for the current settings. Persists the settings and
    /// picks a new passage.
    pub fn reset(&mut self) {
        self.store.save_settings(&self.settings);

        let passage = match &self.custom_prompt {
            Some(prompt) if !prompt.is_empty() => prompt.clone(),
            _ => PassagePool::for_language(self.settings.language).pick(),
        };

        self.session = Session::new(self.settings.language, self.settings.duration_secs, passage);
        self.state = AppState::Typing;
        self.return_state = AppState::Typing;
        self.overlay = None;
        self.finished_at = None;
        self.confetti.stop();

        tracing::debug!(
            language = %self.settings.language,
            duration = self.settings.duration_secs,
            "session reset"
        );
    }

    /// Re-read settings from storage and start over, as on a fresh launch.
    /// Fields the store cannot read keep their current value.
    pub fn reload(&mut self) {
        self.settings = self.store.load_settings_or(self.settings);
        self.status = None;
        self.reset();
    }

    /// Language control changed: persist, then reload
    pub fn select_language(&mut self, language: Language) {
        self.store.save_language(language);
        self.settings.language = language;
        self.reload();
    }

    /// Duration control changed: persist, then reload
    pub fn select_duration(&mut self, duration_secs: u32) {
        self.store.save_duration(duration_secs);
        self.settings.duration_secs = duration_secs;
        self.reload();
    }

    /// Alt+digit presets: switch duration and reset
    pub fn apply_duration_preset(&mut self, duration_secs: u32) {
        self.settings.duration_secs = duration_secs;
        self.reset();
    }

    pub fn on_tick(&mut self, now: Instant) {
        if let Some(summary) = self.session.tick(now) {
            self.finish(summary, now);
        }
        self.confetti.update(TICK_RATE_MS as f64 / 1000.0);
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match self.state {
            AppState::Typing | AppState::Results => {
                if let Some(shortcut) = Shortcut::from_key(&key) {
                    self.apply_shortcut(shortcut);
                    return Control::Continue;
                }

                if self.state == AppState::Typing {
                    return self.on_typing_key(key, now);
                }
                self.on_results_key(key, now);
            }
            AppState::History => match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') | KeyCode::Backspace => {
                    self.state = self.return_state;
                }
                _ => {}
            },
            AppState::ConfirmClear => {
                let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
                self.confirm_clear(confirmed);
            }
        }

        Control::Continue
    }

    fn on_typing_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        let summary = match key.code {
            KeyCode::Esc => return Control::Quit,
            KeyCode::Backspace => self.session.backspace(now),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                self.session.push_char(c, now)
            }
            _ => None,
        };

        if let Some(summary) = summary {
            self.finish(summary, now);
        }
        Control::Continue
    }

    fn on_results_key(&mut self, key: KeyEvent, now: Instant) {
        let shown_for = self
            .finished_at
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(OVERLAY_GRACE);
        if shown_for < OVERLAY_GRACE {
            tracing::debug!(code = ?key.code, "ignoring key while results settle");
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('c') => self.close_overlay(),
            KeyCode::Enter | KeyCode::Char('n') => self.reset(),
            KeyCode::Char('g') => self.open_history(),
            _ => {}
        }
    }

    pub fn apply_shortcut(&mut self, shortcut: Shortcut) {
        match shortcut {
            Shortcut::Duration(secs) => self.apply_duration_preset(secs),
            Shortcut::Reset => self.reset(),
            Shortcut::CycleLanguage => self.select_language(self.settings.language.next()),
            Shortcut::CycleDuration => self.select_duration(self.settings.next_duration()),
            Shortcut::ShowHistory => self.open_history(),
            Shortcut::ClearSavedData => self.request_clear(),
        }
    }

    /// Persist the run, check the personal best and raise the overlay.
    /// Called once per session: the session only hands out one summary.
    fn finish(&mut self, summary: SessionSummary, now: Instant) {
        let record = summary.to_record(Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

        if let Err(err) = results::append_history(self.store(), &record) {
            tracing::warn!(error = %err, "could not save result");
        }

        let personal_best = match results::update_personal_best(self.store(), &record) {
            Ok(pb) => Some(pb),
            Err(err) => {
                tracing::warn!(error = %err, "could not check personal best");
                None
            }
        };

        let top_runs = results::top_run_lines(self.store(), &record.language, record.duration);

        tracing::info!(
            language = %record.language,
            duration = record.duration,
            wpm = record.wpm,
            accuracy = record.accuracy,
            errors = record.errors,
            "test finished"
        );

        let overlay = ResultsOverlay {
            summary,
            record,
            personal_best,
            top_runs,
        };

        if overlay.is_new_best() {
            self.confetti.start(self.viewport.0, self.viewport.1);
        }

        self.overlay = Some(overlay);
        self.finished_at = Some(now);
        self.state = AppState::Results;
    }

    /// Hide the overlay; the ended test stays on screen with input disabled
    pub fn close_overlay(&mut self) {
        self.confetti.stop();
        self.state = AppState::Typing;
    }

    pub fn open_history(&mut self) {
        self.progress = match results::load_history(self.store()) {
            Ok(history) => ProgressSeries::from_history(&history),
            Err(err) => {
                tracing::warn!(error = %err, "could not read history");
                self.status = Some("Error reading history".to_string());
                None
            }
        };
        self.return_state = self.state;
        self.state = AppState::History;
    }

    pub fn request_clear(&mut self) {
        self.return_state = self.state;
        self.state = AppState::ConfirmClear;
    }

    pub fn confirm_clear(&mut self, confirmed: bool) {
        self.state = self.return_state;
        if !confirmed {
            return;
        }

        self.status = Some(match storage::clear_saved_data(self.store()) {
            Ok(_) => "Cleared saved data.".to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "could not clear saved data");
                "Unable to clear storage (storage unavailable).".to_string()
            }
        });
    }
}

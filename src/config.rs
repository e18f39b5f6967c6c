use crate::language::Language;
use crate::storage::{KeyValueStore, LAST_DURATION_KEY, LAST_LANGUAGE_KEY};

/// Durations reachable from the duration control and the Alt+digit shortcuts
pub const DURATION_PRESETS: [u32; 4] = [15, 30, 60, 120];
pub const DEFAULT_DURATION_SECS: u32 = 60;

/// Last used test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub language: Language,
    pub duration_secs: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

impl Settings {
    /// Next preset after the current duration, wrapping around
    pub fn next_duration(&self) -> u32 {
        let idx = DURATION_PRESETS
            .iter()
            .position(|&d| d == self.duration_secs)
            .map(|i| (i + 1) % DURATION_PRESETS.len())
            .unwrap_or(0);
        DURATION_PRESETS[idx]
    }
}

/// Settings persisted in the key/value store next to results
pub trait SettingsStore {
    /// Saved settings. A field whose read fails keeps its value from
    /// `fallback`; a missing or invalid value means the default.
    fn load_settings_or(&self, fallback: Settings) -> Settings;
    fn save_language(&self, language: Language);
    fn save_duration(&self, duration_secs: u32);

    fn load_settings(&self) -> Settings {
        self.load_settings_or(Settings::default())
    }

    fn save_settings(&self, settings: &Settings) {
        self.save_language(settings.language);
        self.save_duration(settings.duration_secs);
    }
}

impl<S: KeyValueStore + ?Sized> SettingsStore for S {
    fn load_settings_or(&self, fallback: Settings) -> Settings {
        let defaults = Settings::default();

        let language = match self.get(LAST_LANGUAGE_KEY) {
            Ok(Some(tag)) => Language::from_tag(&tag).unwrap_or_else(|| {
                tracing::debug!(%tag, "ignoring unknown saved language");
                defaults.language
            }),
            Ok(None) => defaults.language,
            Err(err) => {
                tracing::warn!(error = %err, "could not load saved language");
                fallback.language
            }
        };

        // only the presets are selectable; anything else reads as unset
        let duration_secs = match self.get(LAST_DURATION_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<u32>() {
                Ok(secs) if DURATION_PRESETS.contains(&secs) => secs,
                _ => {
                    tracing::debug!(%raw, "ignoring invalid saved duration");
                    defaults.duration_secs
                }
            },
            Ok(None) => defaults.duration_secs,
            Err(err) => {
                tracing::warn!(error = %err, "could not load saved duration");
                fallback.duration_secs
            }
        };

        Settings {
            language,
            duration_secs,
        }
    }

    fn save_language(&self, language: Language) {
        if let Err(err) = self.set(LAST_LANGUAGE_KEY, &language.tag()) {
            tracing::warn!(error = %err, "could not persist language");
        }
    }

    fn save_duration(&self, duration_secs: u32) {
        if let Err(err) = self.set(LAST_DURATION_KEY, &duration_secs.to_string()) {
            tracing::warn!(error = %err, "could not persist duration");
        }
    }
}

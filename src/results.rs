use crate::storage::{personal_best_key, KeyValueStore, Result, HISTORY_KEY};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Snapshot written once a test ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub date: String,
    pub language: String,
    pub duration: u32,
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
}

/// Outcome of comparing a finished run against the stored personal best
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalBest {
    /// Strictly better than the previous best, which has been replaced
    New { previous: u32 },
    /// Tie or regression; the stored best is unchanged
    Unchanged { best: u32 },
}

impl PersonalBest {
    pub fn is_new(&self) -> bool {
        matches!(self, PersonalBest::New { .. })
    }
}

/// Full history in storage order; a missing entry is an empty history
pub fn load_history(store: &dyn KeyValueStore) -> Result<Vec<ResultRecord>> {
    match store.get(HISTORY_KEY)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

pub fn append_history(store: &dyn KeyValueStore, record: &ResultRecord) -> Result<()> {
    let mut history = load_history(store)?;
    history.push(record.clone());
    store.set(HISTORY_KEY, &serde_json::to_string(&history)?)
}

/// Stored best for the pair; absent or unparsable values count as zero
pub fn personal_best(store: &dyn KeyValueStore, language: &str, duration_secs: u32) -> Result<u32> {
    let stored = store.get(&personal_best_key(language, duration_secs))?;
    Ok(stored
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0))
}

/// Replace the stored best only on strict improvement
pub fn update_personal_best(store: &dyn KeyValueStore, record: &ResultRecord) -> Result<PersonalBest> {
    let previous = personal_best(store, &record.language, record.duration)?;

    if record.wpm > previous {
        store.set(
            &personal_best_key(&record.language, record.duration),
            &record.wpm.to_string(),
        )?;
        tracing::info!(
            language = %record.language,
            duration = record.duration,
            wpm = record.wpm,
            previous,
            "new personal best"
        );
        Ok(PersonalBest::New { previous })
    } else {
        Ok(PersonalBest::Unchanged { best: previous })
    }
}

/// Best three runs for a configuration, highest wpm first.
/// Ties keep their storage order.
pub fn top_runs(history: &[ResultRecord], language: &str, duration_secs: u32) -> Vec<ResultRecord> {
    history
        .iter()
        .filter(|r| r.language == language && r.duration == duration_secs)
        .sorted_by(|a, b| b.wpm.cmp(&a.wpm))
        .take(3)
        .cloned()
        .collect()
}

/// Lines shown in the overlay's best-runs list
pub fn top_run_lines(store: &dyn KeyValueStore, language: &str, duration_secs: u32) -> Vec<String> {
    match load_history(store) {
        Ok(history) => {
            let runs = top_runs(&history, language, duration_secs);
            if runs.is_empty() {
                vec!["No previous runs".to_string()]
            } else {
                runs.iter()
                    .map(|r| format!("{} WPM — {}", r.wpm, r.date))
                    .collect()
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "could not read history");
            vec!["Error reading history".to_string()]
        }
    }
}

/// Write the history as CSV with a header row
pub fn export_csv<W: Write>(history: &[ResultRecord], writer: W) -> std::result::Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in history {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError, UnavailableStore};
    use assert_matches::assert_matches;

    fn record(language: &str, duration: u32, wpm: u32, date: &str) -> ResultRecord {
        ResultRecord {
            date: date.to_string(),
            language: language.to_string(),
            duration,
            wpm,
            accuracy: 97,
            errors: 2,
        }
    }

    #[test]
    fn test_history_round_trips_through_store() {
        let store = MemoryStore::new();
        assert!(load_history(&store).unwrap().is_empty());

        append_history(&store, &record("english", 60, 40, "d1")).unwrap();
        append_history(&store, &record("hindi", 30, 20, "d2")).unwrap();

        let history = load_history(&store).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "d1");
        assert_eq!(history[1].language, "hindi");
    }

    #[test]
    fn test_history_json_field_names() {
        let json = serde_json::to_string(&record("english", 60, 40, "d1")).unwrap();
        assert_eq!(
            json,
            r#"{"date":"d1","language":"english","duration":60,"wpm":40,"accuracy":97,"errors":2}"#
        );
    }

    #[test]
    fn test_corrupt_history_is_an_error() {
        let store = MemoryStore::new();
        store.set(HISTORY_KEY, "not json").unwrap();
        assert_matches!(load_history(&store), Err(StorageError::Serialization(_)));
    }

    #[test]
    fn test_personal_best_strict_improvement_only() {
        let store = MemoryStore::new();

        let first = update_personal_best(&store, &record("english", 60, 50, "d1")).unwrap();
        assert_eq!(first, PersonalBest::New { previous: 0 });

        let tie = update_personal_best(&store, &record("english", 60, 50, "d2")).unwrap();
        assert_eq!(tie, PersonalBest::Unchanged { best: 50 });

        let worse = update_personal_best(&store, &record("english", 60, 30, "d3")).unwrap();
        assert!(!worse.is_new());
        assert_eq!(personal_best(&store, "english", 60).unwrap(), 50);

        let better = update_personal_best(&store, &record("english", 60, 51, "d4")).unwrap();
        assert_eq!(better, PersonalBest::New { previous: 50 });
        assert_eq!(store.get("pb_english_60").unwrap().as_deref(), Some("51"));
    }

    #[test]
    fn test_personal_best_is_keyed_per_configuration() {
        let store = MemoryStore::new();
        update_personal_best(&store, &record("english", 60, 50, "d1")).unwrap();

        let other = update_personal_best(&store, &record("english", 30, 10, "d2")).unwrap();
        assert!(other.is_new());
        assert_eq!(personal_best(&store, "hindi", 60).unwrap(), 0);
    }

    #[test]
    fn test_unparsable_personal_best_counts_as_zero() {
        let store = MemoryStore::new();
        store.set("pb_english_60", "abc").unwrap();
        assert_eq!(personal_best(&store, "english", 60).unwrap(), 0);
    }

    #[test]
    fn test_zero_wpm_never_sets_a_best() {
        let store = MemoryStore::new();
        let pb = update_personal_best(&store, &record("english", 60, 0, "d1")).unwrap();
        assert_eq!(pb, PersonalBest::Unchanged { best: 0 });
        assert_eq!(store.get("pb_english_60").unwrap(), None);
    }

    #[test]
    fn test_top_runs_filters_sorts_and_caps() {
        let history = vec![
            record("english", 60, 30, "a"),
            record("english", 60, 55, "b"),
            record("hindi", 60, 90, "c"),
            record("english", 30, 99, "d"),
            record("english", 60, 55, "e"),
            record("english", 60, 41, "f"),
        ];

        let top = top_runs(&history, "english", 60);
        let dates: Vec<&str> = top.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["b", "e", "f"]);
    }

    #[test]
    fn test_top_run_lines() {
        let store = MemoryStore::new();
        assert_eq!(top_run_lines(&store, "english", 60), vec!["No previous runs"]);

        append_history(&store, &record("english", 60, 42, "yesterday")).unwrap();
        assert_eq!(
            top_run_lines(&store, "english", 60),
            vec!["42 WPM — yesterday"]
        );
        assert_eq!(top_run_lines(&store, "english", 15), vec!["No previous runs"]);
    }

    #[test]
    fn test_top_run_lines_on_unavailable_storage() {
        assert_eq!(
            top_run_lines(&UnavailableStore, "english", 60),
            vec!["Error reading history"]
        );
    }

    #[test]
    fn test_export_csv() {
        let history = vec![record("english", 60, 42, "d1"), record("hindi", 15, 12, "d2")];
        let mut out = Vec::new();
        export_csv(&history, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,language,duration,wpm,accuracy,errors");
        assert_eq!(lines[1], "d1,english,60,42,97,2");
        assert_eq!(lines[2], "d2,hindi,15,12,97,2");
    }
}

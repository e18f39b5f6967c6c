use crate::results::ResultRecord;

pub const CHART_TITLE: &str = "Typing Progress Over Time";

/// Plot-ready view of the history: one point per run, storage order
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSeries {
    pub title: &'static str,
    pub labels: Vec<String>,
    pub wpm: Vec<u32>,
}

impl ProgressSeries {
    /// `None` when there is nothing to plot
    pub fn from_history(history: &[ResultRecord]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }

        Some(Self {
            title: CHART_TITLE,
            labels: history.iter().map(|r| r.date.clone()).collect(),
            wpm: history.iter().map(|r| r.wpm).collect(),
        })
    }

    /// (run index, wpm) pairs for a line dataset, x starting at 1
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.wpm
            .iter()
            .enumerate()
            .map(|(i, &w)| ((i + 1) as f64, w as f64))
            .collect()
    }

    pub fn max_wpm(&self) -> u32 {
        self.wpm.iter().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.wpm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wpm.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, wpm: u32) -> ResultRecord {
        ResultRecord {
            date: date.to_string(),
            language: "english".to_string(),
            duration: 60,
            wpm,
            accuracy: 100,
            errors: 0,
        }
    }

    #[test]
    fn test_empty_history_has_no_series() {
        assert_eq!(ProgressSeries::from_history(&[]), None);
    }

    #[test]
    fn test_series_keeps_storage_order() {
        let history = vec![record("mon", 40), record("tue", 35), record("wed", 52)];
        let series = ProgressSeries::from_history(&history).unwrap();

        assert_eq!(series.title, "Typing Progress Over Time");
        assert_eq!(series.labels, vec!["mon", "tue", "wed"]);
        assert_eq!(series.wpm, vec![40, 35, 52]);
        assert_eq!(series.points(), vec![(1.0, 40.0), (2.0, 35.0), (3.0, 52.0)]);
        assert_eq!(series.max_wpm(), 52);
        assert_eq!(series.len(), 3);
    }
}

//! Reading-rate summaries and pace suggestions derived from the session log.

use crate::session::ReadingSession;
use serde::Serialize;

/// Render seconds as `"42 sec"` or `"3 min 5 sec"`.
pub fn format_reading_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let remaining = (seconds % 60.0).floor() as u64;

    if minutes == 0 {
        format!("{remaining} sec")
    } else {
        format!("{minutes} min {remaining} sec")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum ReadingPace {
    Developing,
    Steady,
    Fluent,
}

impl ReadingPace {
    pub fn from_wpm(words_per_minute: f64) -> Self {
        if words_per_minute < 100.0 {
            ReadingPace::Developing
        } else if words_per_minute < 200.0 {
            ReadingPace::Steady
        } else {
            ReadingPace::Fluent
        }
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            ReadingPace::Developing => &[
                "Try using a larger font size",
                "Consider wider text spacing",
                "Enable word-by-word highlighting",
            ],
            ReadingPace::Steady => &[
                "Your reading speed is good",
                "Experiment with different fonts to see what works best",
                "Try text-to-speech for longer passages",
            ],
            ReadingPace::Fluent => &[
                "You're reading at an excellent pace",
                "Try challenging yourself with more complex texts",
                "Consider disabling highlighting if not needed",
            ],
        }
    }
}

/// Aggregate over ended sessions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub sessions: usize,
    pub total_words: usize,
    pub total_time: f64,
    pub mean_wpm: Option<f64>,
    pub wpm_std_dev: Option<f64>,
    pub best_wpm: Option<f64>,
}

impl SessionSummary {
    /// Sessions without a computed rate are counted but left out of the
    /// rate statistics.
    pub fn from_sessions(sessions: &[ReadingSession]) -> Self {
        let rates: Vec<f64> = sessions.iter().filter_map(|s| s.words_per_minute).collect();

        Self {
            sessions: sessions.len(),
            total_words: sessions.iter().map(|s| s.total_words).sum(),
            total_time: sessions.iter().filter_map(|s| s.total_time).sum(),
            mean_wpm: mean(&rates),
            wpm_std_dev: std_dev(&rates),
            best_wpm: rates.iter().copied().reduce(f64::max),
        }
    }

    pub fn pace(&self) -> Option<ReadingPace> {
        self.mean_wpm.map(ReadingPace::from_wpm)
    }
}

fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation.
fn std_dev(data: &[f64]) -> Option<f64> {
    let avg = mean(data)?;
    let variance = data.iter().map(|v| (avg - v).powi(2)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}

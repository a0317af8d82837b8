use crate::alignment::{Tally, WordComparison, WordStatus};
use chrono::{DateTime, Duration, Utc};

/// How long a feedback message stays up unless superseded.
pub const DEFAULT_CLEAR_AFTER_SECS: i64 = 5;

/// Judgment shown to the reader after a transcript update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
    AllCorrect,
    Misread { word: String },
    Retry,
    Skipped,
}

impl Feedback {
    /// Derive feedback from a classification. An empty classification has
    /// nothing misread or skipped, so it is judged all correct.
    pub fn judge(comparisons: &[WordComparison]) -> Self {
        let tally = Tally::of(comparisons);
        if tally.incorrect == 0 && tally.skipped == 0 {
            Feedback::AllCorrect
        } else if tally.incorrect > 0 {
            comparisons
                .iter()
                .find(|c| c.status == WordStatus::Incorrect)
                .map_or(Feedback::Retry, |c| Feedback::Misread {
                    word: c.word.clone(),
                })
        } else {
            Feedback::Skipped
        }
    }

    pub fn message(&self) -> String {
        match self {
            Feedback::AllCorrect => "Excellent reading! You read all words correctly.".to_string(),
            Feedback::Misread { word } => {
                format!("Try that again? The word \"{word}\" was a bit tricky.")
            }
            Feedback::Retry => "Try that again? There were some misread words.".to_string(),
            Feedback::Skipped => "You skipped some words. Try reading the passage again.".to_string(),
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Feedback::AllCorrect)
    }
}

/// Single-slot feedback holder with a cancel-and-replace auto-clear deadline.
#[derive(Clone, Debug)]
pub struct FeedbackSlot {
    clear_after: Duration,
    /// Feedback and its clear deadline; `None` deadline never expires.
    live: Option<(Feedback, Option<DateTime<Utc>>)>,
}

impl Default for FeedbackSlot {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_CLEAR_AFTER_SECS))
    }
}

impl FeedbackSlot {
    pub fn new(clear_after: Duration) -> Self {
        Self {
            clear_after,
            live: None,
        }
    }

    /// Replace whatever is showing and restart the clear deadline.
    pub fn publish(&mut self, feedback: Feedback, now: DateTime<Utc>) {
        if let Some((previous, _)) = &self.live {
            tracing::trace!(?previous, "superseding pending feedback");
        }
        let deadline = now.checked_add_signed(self.clear_after);
        if deadline.is_none() {
            tracing::debug!(
                clear_after = ?self.clear_after,
                "feedback deadline out of range, never clearing"
            );
        }
        self.live = Some((feedback, deadline));
    }

    /// Feedback still live at `now`.
    pub fn current(&self, now: DateTime<Utc>) -> Option<&Feedback> {
        match &self.live {
            Some((feedback, deadline)) if deadline.map_or(true, |d| now < d) => Some(feedback),
            _ => None,
        }
    }

    /// Drop expired feedback. Returns true if something was cleared.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self
            .live
            .as_ref()
            .is_some_and(|(_, deadline)| deadline.is_some_and(|d| now >= d));
        if expired {
            self.live = None;
        }
        expired
    }

    pub fn clear(&mut self) {
        self.live = None;
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.live.as_ref().and_then(|(_, deadline)| *deadline)
    }
}

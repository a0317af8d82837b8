use crate::similarity::similarity;
use crate::tokenizer::{split_spoken, tokenize};
use serde::{Deserialize, Serialize};

/// Spoken words scoring strictly above this count as a correct reading.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WordStatus {
    Correct,
    Incorrect,
    Skipped,
}

/// One reference word and how it was read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordComparison {
    pub word: String,
    pub status: WordStatus,
}

/// Classify every reference word against the spoken word at the same index.
///
/// The alignment is positional: a dropped or inserted spoken word shifts every
/// later comparison. Reference words are lower-cased; spoken words are expected
/// to be normalized already (see [`split_spoken`]).
pub fn classify<R, S>(reference: &[R], spoken: &[S]) -> Vec<WordComparison>
where
    R: AsRef<str>,
    S: AsRef<str>,
{
    reference
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let word = word.as_ref().to_lowercase();
            let status = match spoken.get(i) {
                None => WordStatus::Skipped,
                Some(said) => {
                    let said = said.as_ref();
                    if word == said || similarity(&word, said) > SIMILARITY_THRESHOLD {
                        WordStatus::Correct
                    } else {
                        WordStatus::Incorrect
                    }
                }
            };
            WordComparison { word, status }
        })
        .collect()
}

/// Tokenize the reference text and a raw transcript, then classify.
pub fn compare_texts(reference_text: &str, transcript: &str) -> Vec<WordComparison> {
    let tokens = tokenize(reference_text);
    classify(&tokens.words(), &split_spoken(transcript))
}

/// Per-status counts for one classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn of(comparisons: &[WordComparison]) -> Self {
        comparisons
            .iter()
            .fold(Tally::default(), |mut tally, c| {
                match c.status {
                    WordStatus::Correct => tally.correct += 1,
                    WordStatus::Incorrect => tally.incorrect += 1,
                    WordStatus::Skipped => tally.skipped += 1,
                }
                tally
            })
    }

    pub fn total(&self) -> usize {
        self.correct + self.incorrect + self.skipped
    }

    /// Percentage of words read correctly, rounded to a whole number.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => ((self.correct as f64 / total as f64) * 100.0).round(),
        }
    }
}

// Library surface shared by the CLI and integration tests.
// Core scoring and sync logic lives here; the binary only wires I/O.
pub mod alignment;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod feedback;
pub mod playback;
pub mod reader;
pub mod runtime;
pub mod session;
pub mod similarity;
pub mod stats;
pub mod storage;
pub mod tokenizer;

pub use alignment::{classify, compare_texts, Tally, WordComparison, WordStatus};
pub use feedback::{Feedback, FeedbackSlot};
pub use playback::{BoundaryEvent, BoundaryKind, PlaybackTracker, SpeechSynthesizer, Voice};
pub use reader::GuidedReader;
pub use session::{ReadingSession, SessionLog, SessionTimer};
pub use tokenizer::{tokenize, Token, Tokens};

use crate::clock::Clock;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key holding the JSON array of finished sessions.
pub const SESSION_LOG_KEY: &str = "readingSessions";

/// One timed interval of reading. Times are epoch milliseconds, `total_time`
/// is in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSession {
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    pub total_words: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words_per_minute: Option<f64>,
}

impl ReadingSession {
    pub fn new(started_at: DateTime<Utc>, total_words: usize) -> Self {
        Self {
            start_time: started_at.timestamp_millis(),
            end_time: None,
            total_words,
            total_time: None,
            words_per_minute: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_time)
    }

    /// Stamp the end time and derive total time and reading rate.
    fn finish(&mut self, ended_at: DateTime<Utc>) {
        let end_time = ended_at.timestamp_millis();
        let total_time = (end_time - self.start_time) as f64 / 1000.0;
        let words_per_minute = if total_time > 0.0 {
            self.total_words as f64 / total_time * 60.0
        } else {
            0.0
        };

        self.end_time = Some(end_time);
        self.total_time = Some(total_time);
        self.words_per_minute = Some(words_per_minute);
    }
}

/// Result of a best-effort log write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { total: usize },
    Failed(String),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Append-only log of ended sessions on top of a key-value store. Failures are
/// logged and reported, never propagated.
#[derive(Debug)]
pub struct SessionLog<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SessionLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All saved sessions; empty when the log is missing or unreadable.
    pub fn load(&self) -> Vec<ReadingSession> {
        match self.try_load() {
            Ok(sessions) => sessions,
            Err(reason) => {
                tracing::error!(%reason, "failed to retrieve reading sessions");
                Vec::new()
            }
        }
    }

    pub fn append(&self, session: &ReadingSession) -> SaveOutcome {
        let result = self.try_load().and_then(|mut sessions| {
            sessions.push(session.clone());
            let data = serde_json::to_string(&sessions).map_err(|e| e.to_string())?;
            self.store
                .set(SESSION_LOG_KEY, &data)
                .map_err(|e| e.to_string())?;
            Ok(sessions.len())
        });

        match result {
            Ok(total) => {
                tracing::debug!(total, "reading session saved");
                SaveOutcome::Saved { total }
            }
            Err(reason) => {
                tracing::error!(%reason, "failed to save reading session");
                SaveOutcome::Failed(reason)
            }
        }
    }

    fn try_load(&self) -> Result<Vec<ReadingSession>, String> {
        match self.store.get(SESSION_LOG_KEY).map_err(|e| e.to_string())? {
            Some(data) => serde_json::from_str(&data).map_err(|e| e.to_string()),
            None => Ok(Vec::new()),
        }
    }
}

/// Owns the single live reading session and its lifecycle.
#[derive(Debug)]
pub struct SessionTimer<C: Clock, S: KeyValueStore> {
    clock: C,
    log: SessionLog<S>,
    session: Option<ReadingSession>,
    last_save: Option<SaveOutcome>,
}

impl<C: Clock, S: KeyValueStore> SessionTimer<C, S> {
    pub fn new(clock: C, log: SessionLog<S>) -> Self {
        Self {
            clock,
            log,
            session: None,
            last_save: None,
        }
    }

    /// Begin a session, discarding any session still in progress.
    pub fn start(&mut self, total_words: usize) -> &ReadingSession {
        if let Some(previous) = &self.session {
            tracing::warn!(
                start_time = previous.start_time,
                total_words = previous.total_words,
                "discarding unfinished reading session"
            );
        }
        let session = ReadingSession::new(self.clock.now(), total_words);
        tracing::info!(total_words, "reading session started");
        self.session.insert(session)
    }

    /// End the live session. `None` means there was nothing to end.
    pub fn end(&mut self) -> Option<ReadingSession> {
        let Some(mut session) = self.session.take() else {
            tracing::warn!("no active reading session to end");
            return None;
        };

        session.finish(self.clock.now());
        tracing::info!(
            total_time = ?session.total_time,
            words_per_minute = ?session.words_per_minute,
            "reading session ended"
        );
        self.last_save = Some(self.log.append(&session));
        Some(session)
    }

    pub fn current(&self) -> Option<&ReadingSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Outcome of the most recent log write, if any.
    pub fn last_save(&self) -> Option<&SaveOutcome> {
        self.last_save.as_ref()
    }

    pub fn log(&self) -> &SessionLog<S> {
        &self.log
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

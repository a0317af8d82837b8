use crate::tokenizer::{Token, Tokens};

/// Boundary granularity reported by a speech synthesiser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryKind {
    Word,
    Sentence,
    Other(String),
}

impl From<&str> for BoundaryKind {
    fn from(name: &str) -> Self {
        match name {
            "word" => BoundaryKind::Word,
            "sentence" => BoundaryKind::Sentence,
            other => BoundaryKind::Other(other.to_string()),
        }
    }
}

/// Progress notification: `char_index` is relative to the text of the
/// utterance currently being spoken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryEvent {
    pub char_index: usize,
    pub kind: BoundaryKind,
}

impl BoundaryEvent {
    pub fn word(char_index: usize) -> Self {
        Self {
            char_index,
            kind: BoundaryKind::Word,
        }
    }
}

/// Utterance settings passed to the synthesiser with each `speak`.
#[derive(Clone, Debug, PartialEq)]
pub struct Voice {
    /// Rate multiplier, 1.0 is the engine's normal speed.
    pub rate: f32,
    /// BCP 47 language tag, e.g. `en-US`.
    pub language: String,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            rate: 1.0,
            language: "en-US".to_string(),
        }
    }
}

/// Control surface of an external text-to-speech engine. Boundary and end
/// notifications arrive separately as [`crate::runtime::ReaderEvent`]s.
pub trait SpeechSynthesizer {
    /// Cancel anything in flight and start speaking `text`.
    fn speak(&mut self, text: &str, voice: &Voice);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn is_speaking(&self) -> bool;
    fn is_paused(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum_macros::Display)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Resolve a char offset to the index of the word token whose span contains
/// it. Offsets inside whitespace land on the following word, or the preceding
/// one for trailing whitespace. Returns `None` past the end of the text.
pub fn locate(tokens: &Tokens, offset: usize) -> Option<usize> {
    let mut start = 0;
    let mut landed = None;
    for (i, token) in tokens.iter().enumerate() {
        let end = start + token.char_len();
        if offset < end {
            landed = Some(i);
            break;
        }
        start = end;
    }

    let index = landed?;
    if tokens.get(index).is_some_and(Token::is_word) {
        return Some(index);
    }
    let next = (index + 1..tokens.len()).find(|&i| tokens.get(i).is_some_and(Token::is_word));
    next.or_else(|| (0..index).rev().find(|&i| tokens.get(i).is_some_and(Token::is_word)))
}

/// Tracks which token is being spoken so the host can highlight it and
/// resume from it.
#[derive(Debug, Clone, Default)]
pub struct PlaybackTracker {
    tokens: Tokens,
    cursor: usize,
    /// Token index the current utterance started from.
    base_index: usize,
    /// Char offset of `base_index` within the full text.
    base_offset: usize,
    state: PlaybackState,
}

impl PlaybackTracker {
    pub fn new(tokens: Tokens) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn tokens(&self) -> &Tokens {
        &self.tokens
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Map a boundary event to a token index. Non-word boundaries, events
    /// received while idle and offsets past the text are ignored.
    pub fn on_boundary(&mut self, event: &BoundaryEvent) -> Option<usize> {
        if self.state == PlaybackState::Idle {
            tracing::trace!(char_index = event.char_index, "boundary while idle ignored");
            return None;
        }
        if event.kind != BoundaryKind::Word {
            return None;
        }

        let index = locate(&self.tokens, self.base_offset + event.char_index)?;
        self.cursor = index;
        Some(index)
    }

    /// Play/pause toggle. Starts a new utterance from the cursor when nothing
    /// is being spoken.
    pub fn play<S: SpeechSynthesizer + ?Sized>(&mut self, synth: &mut S, voice: &Voice) -> PlaybackState {
        if synth.is_speaking() {
            if synth.is_paused() {
                synth.resume();
                self.state = PlaybackState::Speaking;
            } else {
                synth.pause();
                self.state = PlaybackState::Paused;
            }
            return self.state;
        }

        let remaining = self.tokens.text_from(self.cursor);
        if remaining.is_empty() {
            tracing::debug!(cursor = self.cursor, "nothing left to speak");
            self.state = PlaybackState::Idle;
            return self.state;
        }

        self.base_index = self.cursor;
        self.base_offset = self
            .tokens
            .char_spans()
            .get(self.cursor)
            .map_or(0, |span| span.start);
        tracing::debug!(
            from_token = self.base_index,
            from_char = self.base_offset,
            rate = voice.rate,
            language = %voice.language,
            "starting utterance"
        );
        synth.speak(&remaining, voice);
        self.state = PlaybackState::Speaking;
        self.state
    }

    /// Stop speech and rewind to the first token.
    pub fn restart<S: SpeechSynthesizer + ?Sized>(&mut self, synth: &mut S) {
        synth.stop();
        self.cursor = 0;
        self.base_index = 0;
        self.base_offset = 0;
        self.state = PlaybackState::Idle;
    }

    /// Stop speech, keeping the cursor for a later resume.
    pub fn stop<S: SpeechSynthesizer + ?Sized>(&mut self, synth: &mut S) {
        synth.stop();
        self.state = PlaybackState::Idle;
    }

    /// Move the cursor to a stored position, snapping to a word token.
    pub fn seek(&mut self, index: usize) {
        let spans = self.tokens.char_spans();
        self.cursor = match spans.get(index) {
            Some(span) => locate(&self.tokens, span.start).unwrap_or(0),
            None => self.tokens.last_word_index().unwrap_or(0),
        };
    }

    /// Utterance finished. Returns true when the last word was reached.
    pub fn on_end(&mut self) -> bool {
        let was_active = self.state != PlaybackState::Idle;
        self.state = PlaybackState::Idle;
        was_active
            && self
                .tokens
                .last_word_index()
                .is_some_and(|last| self.cursor >= last)
    }
}

/// Recorded call on a [`RecordingSynthesizer`].
#[derive(Clone, Debug, PartialEq)]
pub enum SynthCall {
    Speak {
        text: String,
        rate: f32,
        language: String,
    },
    Pause,
    Resume,
    Stop,
}

/// In-process synthesiser that records calls and mimics speaking/paused state.
#[derive(Debug, Default)]
pub struct RecordingSynthesizer {
    pub calls: Vec<SynthCall>,
    speaking: bool,
    paused: bool,
}

impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the engine reaching the end of the utterance.
    pub fn finish(&mut self) {
        self.speaking = false;
        self.paused = false;
    }

    pub fn spoken_texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SynthCall::Speak { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn speak(&mut self, text: &str, voice: &Voice) {
        self.calls.push(SynthCall::Speak {
            text: text.to_string(),
            rate: voice.rate,
            language: voice.language.clone(),
        });
        self.speaking = true;
        self.paused = false;
    }

    fn pause(&mut self) {
        self.calls.push(SynthCall::Pause);
        if self.speaking {
            self.paused = true;
        }
    }

    fn resume(&mut self) {
        self.calls.push(SynthCall::Resume);
        self.paused = false;
    }

    fn stop(&mut self) {
        self.calls.push(SynthCall::Stop);
        self.finish();
    }

    fn is_speaking(&self) -> bool {
        self.speaking
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

use crate::alignment::{classify, Tally, WordComparison};
use crate::clock::Clock;
use crate::config::Config;
use crate::feedback::{Feedback, FeedbackSlot};
use crate::playback::{BoundaryEvent, PlaybackState, PlaybackTracker, SpeechSynthesizer, Voice};
use crate::runtime::ReaderEvent;
use crate::session::{ReadingSession, SessionTimer};
use crate::storage::KeyValueStore;
use crate::tokenizer::{split_spoken, tokenize, Tokens};

/// What a handled event changed, for the host to decide what to redraw.
#[derive(Clone, Debug, PartialEq)]
pub enum ReaderUpdate {
    Classified(Tally),
    Highlight(usize),
    SessionEnded(ReadingSession),
    FeedbackCleared,
    Nothing,
}

/// Host-owned context tying the guided reading components together for one
/// text: speech-output highlighting, read-aloud scoring and session timing.
#[derive(Debug)]
pub struct GuidedReader<C: Clock, S: KeyValueStore, Y: SpeechSynthesizer> {
    synth: Y,
    tracker: PlaybackTracker,
    timer: SessionTimer<C, S>,
    feedback: FeedbackSlot,
    comparison: Vec<WordComparison>,
    transcript: String,
    listening: bool,
    voice: Voice,
}

impl<C: Clock, S: KeyValueStore, Y: SpeechSynthesizer> GuidedReader<C, S, Y> {
    pub fn new(synth: Y, timer: SessionTimer<C, S>, config: &Config) -> Self {
        Self {
            synth,
            tracker: PlaybackTracker::default(),
            timer,
            feedback: FeedbackSlot::new(config.feedback_clear_after()),
            comparison: Vec::new(),
            transcript: String::new(),
            listening: false,
            voice: config.voice(),
        }
    }

    /// Replace the text being read and start a new session. Returns the word count.
    pub fn load_text(&mut self, text: &str) -> usize {
        self.tracker.stop(&mut self.synth);
        let tokens = tokenize(text);
        let word_count = tokens.word_count();
        self.tracker = PlaybackTracker::new(tokens);
        self.reset_listening();
        self.timer.start(word_count);
        word_count
    }

    pub fn start_listening(&mut self) {
        self.clear_reading_results();
        self.listening = true;
    }

    pub fn stop_listening(&mut self) {
        self.listening = false;
    }

    pub fn reset_listening(&mut self) {
        self.clear_reading_results();
        self.listening = false;
    }

    fn clear_reading_results(&mut self) {
        self.transcript.clear();
        self.comparison.clear();
        self.feedback.clear();
    }

    /// Re-score the whole text against the latest transcript. Transcripts that
    /// arrive after listening stopped are dropped.
    pub fn on_transcript(&mut self, transcript: &str) -> Option<Tally> {
        if !self.listening {
            tracing::debug!("transcript after stop ignored");
            return None;
        }

        self.transcript = transcript.to_string();
        self.comparison = classify(&self.tracker.tokens().words(), &split_spoken(transcript));
        let tally = Tally::of(&self.comparison);
        tracing::debug!(?tally, "transcript classified");

        let now = self.timer.clock().now();
        self.feedback.publish(Feedback::judge(&self.comparison), now);
        Some(tally)
    }

    pub fn on_boundary(&mut self, event: &BoundaryEvent) -> Option<usize> {
        self.tracker.on_boundary(event)
    }

    /// End of an utterance; closes the session once the last word was spoken.
    pub fn on_speech_end(&mut self) -> Option<ReadingSession> {
        if self.tracker.on_end() {
            self.timer.end()
        } else {
            None
        }
    }

    /// Clear feedback whose display time has run out.
    pub fn on_tick(&mut self) -> bool {
        let now = self.timer.clock().now();
        self.feedback.on_tick(now)
    }

    pub fn play_pause(&mut self) -> PlaybackState {
        self.tracker.play(&mut self.synth, &self.voice)
    }

    pub fn restart(&mut self) {
        self.tracker.restart(&mut self.synth);
    }

    /// Stop speech and close the session.
    pub fn stop(&mut self) -> Option<ReadingSession> {
        self.tracker.stop(&mut self.synth);
        self.timer.end()
    }

    pub fn handle(&mut self, event: ReaderEvent) -> ReaderUpdate {
        match event {
            ReaderEvent::Transcript(text) => self
                .on_transcript(&text)
                .map_or(ReaderUpdate::Nothing, ReaderUpdate::Classified),
            ReaderEvent::Boundary(boundary) => self
                .on_boundary(&boundary)
                .map_or(ReaderUpdate::Nothing, ReaderUpdate::Highlight),
            ReaderEvent::SpeechEnded => self
                .on_speech_end()
                .map_or(ReaderUpdate::Nothing, ReaderUpdate::SessionEnded),
            ReaderEvent::Tick => {
                if self.on_tick() {
                    ReaderUpdate::FeedbackCleared
                } else {
                    ReaderUpdate::Nothing
                }
            }
        }
    }

    /// Applies from the next utterance; a paused one keeps its rate.
    pub fn set_speech_rate(&mut self, rate: f32) {
        self.voice.rate = rate;
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn seek(&mut self, index: usize) {
        self.tracker.seek(index);
    }

    pub fn tokens(&self) -> &Tokens {
        self.tracker.tokens()
    }

    pub fn cursor(&self) -> usize {
        self.tracker.cursor()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.tracker.state()
    }

    pub fn comparison(&self) -> &[WordComparison] {
        &self.comparison
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.current(self.timer.clock().now())
    }

    pub fn timer(&self) -> &SessionTimer<C, S> {
        &self.timer
    }

    pub fn synth(&self) -> &Y {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut Y {
        &mut self.synth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::WordStatus;
    use crate::clock::ManualClock;
    use crate::playback::{RecordingSynthesizer, SynthCall};
    use crate::session::SessionLog;
    use crate::storage::MemoryStore;
    use assert_matches::assert_matches;
    use chrono::Duration;

    type TestReader<'a> = GuidedReader<&'a ManualClock, MemoryStore, RecordingSynthesizer>;

    fn reader(clock: &ManualClock) -> TestReader<'_> {
        let timer = SessionTimer::new(clock, SessionLog::new(MemoryStore::new()));
        GuidedReader::new(RecordingSynthesizer::new(), timer, &Config::default())
    }

    #[test]
    fn load_text_starts_session_with_word_count() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        assert_eq!(reader.load_text("The cat  sat"), 3);
        assert_eq!(reader.timer().current().map(|s| s.total_words), Some(3));
        assert_eq!(reader.cursor(), 0);
    }

    #[test]
    fn transcript_updates_replace_classification() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        reader.load_text("The cat sat");
        reader.start_listening();

        reader.on_transcript("the");
        assert_eq!(reader.comparison()[2].status, WordStatus::Skipped);
        assert_eq!(reader.feedback(), Some(&Feedback::Skipped));

        let tally = reader.on_transcript("the cat sat").unwrap();
        assert_eq!(tally.correct, 3);
        assert_eq!(reader.feedback(), Some(&Feedback::AllCorrect));
        assert_eq!(reader.transcript(), "the cat sat");
    }

    #[test]
    fn transcripts_after_stop_are_ignored() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        reader.load_text("The cat sat");
        reader.start_listening();
        reader.on_transcript("the cat");
        reader.stop_listening();

        assert_eq!(reader.on_transcript("the dog sat"), None);
        assert_eq!(reader.comparison()[1].status, WordStatus::Correct);
    }

    #[test]
    fn feedback_expires_on_tick() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        reader.load_text("one two");
        reader.start_listening();
        reader.on_transcript("one too");
        assert_matches!(reader.feedback(), Some(Feedback::Misread { word }) if word == "two");

        clock.advance(Duration::seconds(5));
        assert_eq!(reader.handle(ReaderEvent::Tick), ReaderUpdate::FeedbackCleared);
        assert_eq!(reader.feedback(), None);
    }

    #[test]
    fn playback_to_end_closes_session() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        reader.load_text("Hello world");
        reader.play_pause();

        assert_eq!(
            reader.handle(ReaderEvent::Boundary(BoundaryEvent::word(6))),
            ReaderUpdate::Highlight(2)
        );
        clock.advance(Duration::seconds(6));
        reader.synth_mut().finish();

        let update = reader.handle(ReaderEvent::SpeechEnded);
        assert_matches!(update, ReaderUpdate::SessionEnded(session) if session.words_per_minute == Some(20.0));
        assert_eq!(reader.timer().log().load().len(), 1);
    }

    #[test]
    fn early_speech_end_keeps_session_open() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        reader.load_text("Hello big world");
        reader.play_pause();
        reader.on_boundary(&BoundaryEvent::word(6));
        assert_eq!(reader.handle(ReaderEvent::SpeechEnded), ReaderUpdate::Nothing);
        assert!(reader.timer().is_active());
    }

    #[test]
    fn stop_ends_session_and_speech() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        reader.load_text("a b c d");
        reader.play_pause();
        clock.advance(Duration::seconds(2));

        let session = reader.stop().unwrap();
        assert_eq!(session.words_per_minute, Some(120.0));
        assert_eq!(reader.synth().calls.last(), Some(&SynthCall::Stop));
        assert_eq!(reader.stop(), None);
    }

    #[test]
    fn utterances_use_configured_voice_and_rate_changes() {
        let clock = ManualClock::at_epoch();
        let timer = SessionTimer::new(&clock, SessionLog::new(MemoryStore::new()));
        let config = Config {
            speech_rate: 0.9,
            language: "en-GB".into(),
            ..Config::default()
        };
        let mut reader = GuidedReader::new(RecordingSynthesizer::new(), timer, &config);
        reader.load_text("one two");
        reader.play_pause();
        assert_matches!(
            reader.synth().calls.last(),
            Some(SynthCall::Speak { rate, language, .. }) if *rate == 0.9 && language == "en-GB"
        );

        reader.set_speech_rate(1.25);
        reader.restart();
        reader.play_pause();
        assert_matches!(
            reader.synth().calls.last(),
            Some(SynthCall::Speak { rate, .. }) if *rate == 1.25
        );
        assert_eq!(reader.voice().language, "en-GB");
    }

    #[test]
    fn empty_text_transcript_is_praised() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        reader.load_text("   ");
        reader.start_listening();
        reader.on_transcript("hello");
        assert_eq!(reader.feedback(), Some(&Feedback::AllCorrect));
    }

    #[test]
    fn huge_feedback_delay_does_not_panic() {
        let clock = ManualClock::at_epoch();
        let timer = SessionTimer::new(&clock, SessionLog::new(MemoryStore::new()));
        let config = Config {
            feedback_clear_secs: 9_000_000_000_000,
            ..Config::default()
        };
        let mut reader = GuidedReader::new(RecordingSynthesizer::new(), timer, &config);
        reader.load_text("a");
        reader.start_listening();
        reader.on_transcript("a");
        assert_eq!(reader.handle(ReaderEvent::Tick), ReaderUpdate::Nothing);
        assert_eq!(reader.feedback(), Some(&Feedback::AllCorrect));
    }

    #[test]
    fn restart_rewinds_playback() {
        let clock = ManualClock::at_epoch();
        let mut reader = reader(&clock);
        reader.load_text("Hello world foo");
        reader.play_pause();
        reader.on_boundary(&BoundaryEvent::word(12));
        assert_eq!(reader.cursor(), 4);

        reader.restart();
        assert_eq!(reader.cursor(), 0);
        assert_eq!(reader.playback_state(), PlaybackState::Idle);
        assert!(reader.timer().is_active());
    }
}

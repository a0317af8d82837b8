use clap::{Parser, Subcommand};
use itertools::Itertools;
use readalong::{
    alignment::{compare_texts, Tally},
    clock::ManualClock,
    config::{Config, ConfigStore, FileConfigStore},
    feedback::Feedback,
    playback::{locate, BoundaryEvent, RecordingSynthesizer},
    reader::{GuidedReader, ReaderUpdate},
    runtime::{ChannelEventSource, FixedTicker, ReaderEvent, Runner},
    session::{ReadingSession, SessionLog, SessionTimer},
    stats::{format_reading_time, SessionSummary},
    storage::{SqliteStore, StoreError},
    tokenizer::{tokenize, Token},
};
use std::{
    error::Error,
    io,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 50;
const MAX_IDLE_TICKS: u32 = 40;
const MAX_WORD_DELAY_DAYS: i64 = 1;

/// guided reading engine: score read-aloud transcripts, sync speech highlights, track reading rate
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Cli {
    /// config file to use instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// session log database
    #[clap(long, global = true)]
    store: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// score a spoken transcript against the reference text
    Compare {
        #[clap(short, long)]
        text: String,
        #[clap(short, long)]
        spoken: String,
        /// print the classification as JSON
        #[clap(long)]
        json: bool,
    },
    /// map a speech boundary offset to the highlighted word
    Locate {
        #[clap(short, long)]
        text: String,
        #[clap(short, long)]
        offset: usize,
    },
    /// summarize the saved reading sessions
    Sessions {
        #[clap(long)]
        json: bool,
    },
    /// export the session log as CSV
    Export {
        /// write to a file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// read a text aloud with a simulated synthesiser and log the session
    Simulate {
        #[clap(short, long)]
        text: String,
        /// simulated speaking rate
        #[clap(long, default_value_t = 150.0)]
        wpm: f64,
        /// transcript to score while listening
        #[clap(short, long)]
        spoken: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("words per minute must be positive and at least one word a day, got {0}")]
    InvalidRate(f64),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FileConfigStore::with_path(path).load(),
        None => FileConfigStore::new().load(),
    };
    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| config.resolved_store_path());

    match cli.command {
        Command::Compare { text, spoken, json } => compare(&text, &spoken, json)?,
        Command::Locate { text, offset } => locate_word(&text, offset),
        Command::Sessions { json } => sessions(&store_path, json)?,
        Command::Export { output } => export(&store_path, output)?,
        Command::Simulate { text, wpm, spoken } => {
            simulate(&config, &store_path, &text, wpm, spoken.as_deref())?
        }
    }

    Ok(())
}

fn compare(text: &str, spoken: &str, json: bool) -> Result<(), CliError> {
    let comparison = compare_texts(text, spoken);

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    for item in &comparison {
        println!("{:<10} {}", item.status.to_string(), item.word);
    }
    let tally = Tally::of(&comparison);
    println!(
        "correct {} / incorrect {} / skipped {} ({}% accuracy)",
        tally.correct,
        tally.incorrect,
        tally.skipped,
        tally.accuracy()
    );
    println!("{}", Feedback::judge(&comparison).message());
    Ok(())
}

fn locate_word(text: &str, offset: usize) {
    let tokens = tokenize(text);
    match locate(&tokens, offset).and_then(|i| tokens.get(i).map(|t| (i, t))) {
        Some((index, Token::Word(word))) => println!("{index}\t{word}"),
        _ => println!("offset {offset} is outside the text"),
    }
}

fn open_log(path: &Path) -> Result<SessionLog<SqliteStore>, CliError> {
    Ok(SessionLog::new(SqliteStore::open(path)?))
}

fn sessions(store_path: &Path, json: bool) -> Result<(), CliError> {
    let log = open_log(store_path)?;
    let sessions = log.load();
    let summary = SessionSummary::from_sessions(&sessions);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("sessions:     {}", summary.sessions);
    println!("total words:  {}", summary.total_words);
    println!("reading time: {}", format_reading_time(summary.total_time));
    match (summary.mean_wpm, summary.pace()) {
        (Some(wpm), Some(pace)) => {
            println!(
                "mean wpm:     {:.0} (sd {:.1})",
                wpm,
                summary.wpm_std_dev.unwrap_or(0.0)
            );
            println!("pace:         {pace}");
            println!("{}", pace.suggestions().iter().map(|s| format!("  - {s}")).join("\n"));
        }
        _ => println!("no completed sessions yet"),
    }
    Ok(())
}

fn export(store_path: &Path, output: Option<PathBuf>) -> Result<(), CliError> {
    let log = open_log(store_path)?;
    let writer: Box<dyn io::Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["start", "end", "total_words", "total_secs", "wpm"])?;
    for session in log.load() {
        csv.write_record(session_record(&session))?;
    }
    csv.flush()?;
    Ok(())
}

fn session_record(session: &ReadingSession) -> [String; 5] {
    let stamp = |ms: i64| {
        chrono::DateTime::from_timestamp_millis(ms)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default()
    };
    [
        stamp(session.start_time),
        session.end_time.map(stamp).unwrap_or_default(),
        session.total_words.to_string(),
        session
            .total_time
            .map_or(String::new(), |t| format!("{t:.2}")),
        session
            .words_per_minute
            .map_or(String::new(), |w| format!("{w:.2}")),
    ]
}

fn simulate(
    config: &Config,
    store_path: &Path,
    text: &str,
    wpm: f64,
    spoken: Option<&str>,
) -> Result<(), CliError> {
    let per_word = word_delay(wpm).ok_or(CliError::InvalidRate(wpm))?;

    // Simulated time so the logged rate reflects `wpm`, not wall time.
    let clock = ManualClock::new(chrono::Utc::now());
    let timer = SessionTimer::new(&clock, open_log(store_path)?);
    let mut reader = GuidedReader::new(RecordingSynthesizer::new(), timer, config);

    let word_count = reader.load_text(text);
    println!("{word_count} words loaded");

    if let Some(transcript) = spoken {
        reader.start_listening();
        reader.on_transcript(transcript);
        for item in reader.comparison() {
            println!("{:<10} {}", item.status.to_string(), item.word);
        }
        if let Some(feedback) = reader.feedback() {
            println!("{}", feedback.message());
        }
        reader.stop_listening();
    }

    reader.play_pause();

    // Feed boundary events the way a synthesiser callback would.
    let word_starts: Vec<usize> = reader
        .tokens()
        .iter()
        .zip(reader.tokens().char_spans())
        .filter(|(token, _)| token.is_word())
        .map(|(_, span)| span.start)
        .collect();
    let (tx, source) = ChannelEventSource::channel();
    let producer = thread::spawn(move || {
        for start in word_starts {
            if tx.send(ReaderEvent::Boundary(BoundaryEvent::word(start))).is_err() {
                return;
            }
        }
        let _ = tx.send(ReaderEvent::SpeechEnded);
    });

    let runner = Runner::new(source, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));
    let mut idle_ticks = 0;
    loop {
        let event = runner.step();
        match &event {
            ReaderEvent::Boundary(_) => clock.advance(per_word),
            ReaderEvent::SpeechEnded => reader.synth_mut().finish(),
            ReaderEvent::Tick => idle_ticks += 1,
            ReaderEvent::Transcript(_) => {}
        }

        match reader.handle(event) {
            ReaderUpdate::Highlight(index) => {
                if let Some(token) = reader.tokens().get(index) {
                    println!("> {}", token.as_str());
                }
            }
            ReaderUpdate::SessionEnded(session) => {
                println!(
                    "read {} words in {} ({:.0} wpm)",
                    session.total_words,
                    format_reading_time(session.total_time.unwrap_or(0.0)),
                    session.words_per_minute.unwrap_or(0.0)
                );
                break;
            }
            _ => {}
        }

        if idle_ticks >= MAX_IDLE_TICKS {
            tracing::warn!("no speech end received, stopping");
            reader.stop();
            break;
        }
    }

    if producer.join().is_err() {
        tracing::warn!("boundary producer thread panicked");
    }
    Ok(())
}

/// Simulated time between words, or `None` when `wpm` is not positive or
/// spaces words further apart than `MAX_WORD_DELAY_DAYS`.
fn word_delay(wpm: f64) -> Option<chrono::TimeDelta> {
    if wpm.is_nan() || wpm <= 0.0 {
        return None;
    }
    let max = chrono::TimeDelta::try_days(MAX_WORD_DELAY_DAYS)?;
    let millis = (60_000.0 / wpm).round();
    if !millis.is_finite() || millis > max.num_milliseconds() as f64 {
        return None;
    }
    chrono::TimeDelta::try_milliseconds(millis as i64)
}

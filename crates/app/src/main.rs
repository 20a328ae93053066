use std::fmt;
use std::io::{self, BufRead, Write};

use quiz_core::model::{QuestionId, QuestionRecord};
use quiz_core::stats::{correct_answer_distribution, find_duplicate_questions};
use services::{
    AppServices, BrowseFilter, Clock, LoadedBank, QuizSession, QuizSessionService,
    SessionOptions, browse, browse_counts,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_SOURCE: &str = "data/quiz_data.csv";
const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_NAMESPACE: &str = "quiz";
const MEMORY_DB_URL: &str = "sqlite::memory:";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidFilter { raw: String },
    InvalidStart { raw: String },
    InvalidQuestionId { raw: String },
    MissingQuestionId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidFilter { raw } => write!(f, "invalid --filter value: {raw}"),
            ArgsError::InvalidStart { raw } => write!(f, "invalid --start value: {raw}"),
            ArgsError::InvalidQuestionId { raw } => write!(f, "invalid question id: {raw}"),
            ArgsError::MissingQuestionId => write!(f, "mark requires a question id"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz load    [common]");
    eprintln!("  quiz browse  [common] [--search <text>] [--filter all|known|unknown]");
    eprintln!("  quiz mark    [common] <question-id>");
    eprintln!("  quiz refresh [common]");
    eprintln!("  quiz play    [common] [--shuffle] [--start <n>] [--restart]");
    eprintln!("  quiz stats   [common]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --source <path|url>   default {DEFAULT_SOURCE}");
    eprintln!("  --db <sqlite_url>     default {DEFAULT_DB_URL}");
    eprintln!("  --namespace <name>    default {DEFAULT_NAMESPACE}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_SOURCE, QUIZ_DB_URL, QUIZ_NAMESPACE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Load,
    Browse,
    Mark,
    Refresh,
    Play,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "load" => Some(Self::Load),
            "browse" => Some(Self::Browse),
            "mark" => Some(Self::Mark),
            "refresh" => Some(Self::Refresh),
            "play" | "quiz" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    source: String,
    namespace: String,
    search: String,
    filter: BrowseFilter,
    shuffle: bool,
    start: usize,
    restart: bool,
    question_id: Option<QuestionId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>, cmd: Command) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url),
            source: std::env::var("QUIZ_SOURCE").unwrap_or_else(|_| DEFAULT_SOURCE.into()),
            namespace: std::env::var("QUIZ_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.into()),
            search: String::new(),
            filter: BrowseFilter::All,
            shuffle: false,
            start: 0,
            restart: false,
            question_id: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--source" => parsed.source = require_value(args, "--source")?,
                "--namespace" => parsed.namespace = require_value(args, "--namespace")?,
                "--search" => parsed.search = require_value(args, "--search")?,
                "--filter" => {
                    let value = require_value(args, "--filter")?;
                    parsed.filter = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidFilter { raw: value.clone() })?;
                }
                "--start" => {
                    let value = require_value(args, "--start")?;
                    parsed.start = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidStart { raw: value.clone() })?;
                }
                "--shuffle" => parsed.shuffle = true,
                "--restart" => parsed.restart = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                raw if cmd == Command::Mark
                    && !raw.starts_with('-')
                    && parsed.question_id.is_none() =>
                {
                    let id = raw
                        .parse::<QuestionId>()
                        .map_err(|_| ArgsError::InvalidQuestionId { raw: arg.clone() })?;
                    parsed.question_id = Some(id);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == MEMORY_DB_URL || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == MEMORY_DB_URL {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: load and summarize when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Load,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Load,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter(), cmd).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        &parsed.source,
        &parsed.namespace,
        Clock::default(),
    )
    .await?;
    debug!(source = %services.source(), db = %parsed.db_url, ?cmd, "services ready");

    let bank_svc = services.question_bank();
    match cmd {
        Command::Load => {
            let bank = bank_svc.try_load().await?;
            print_summary(&bank);
            let known = bank_svc.known_count(&bank.questions).await;
            println!("known: {known}/{}", bank.questions.len());
        }
        Command::Refresh => {
            let bank = bank_svc.refresh().await?;
            print_summary(&bank);
        }
        Command::Browse => {
            let bank = bank_svc.try_load().await?;
            let known = bank_svc.known_ids(&bank.questions).await;
            for entry in browse(&bank.questions, &known, &parsed.search, parsed.filter) {
                let mark = if entry.known { 'x' } else { ' ' };
                println!(
                    "[{mark}] #{:<5} {:>4}  {}",
                    entry.question.id(),
                    entry.position,
                    entry.question.text()
                );
            }
            let counts = browse_counts(&bank.questions, &known, &parsed.search);
            println!(
                "all: {}  known: {}  unknown: {}  (filter: {})",
                counts.all, counts.known, counts.unknown, parsed.filter
            );
        }
        Command::Mark => {
            let id = parsed.question_id.ok_or(ArgsError::MissingQuestionId)?;
            let known = bank_svc.toggle_known(id).await;
            println!(
                "question {id} marked {}",
                if known { "known" } else { "unknown" }
            );
        }
        Command::Play => {
            let quiz = services.quiz();
            let resumed = if parsed.restart {
                None
            } else {
                quiz.resume().await
            };
            let session = match resumed {
                Some(session) => {
                    println!("Resuming saved quiz.");
                    session
                }
                None => {
                    let bank = bank_svc.try_load().await?;
                    let options = SessionOptions {
                        shuffle: parsed.shuffle,
                        start_index: parsed.start,
                    };
                    quiz.start(bank.questions, options).await?
                }
            };
            play(&quiz, session).await?;
        }
        Command::Stats => match services.quiz().last_stats().await {
            Some(stats) => println!(
                "last quiz: {}/{} correct ({}%)",
                stats.correct_answers, stats.total_questions, stats.percentage
            ),
            None => println!("no finished quiz yet"),
        },
    }

    Ok(())
}

fn print_summary(bank: &LoadedBank) {
    let stats = &bank.stats;
    println!("{} questions loaded ({:?})", stats.total_questions, bank.origin);
    println!("  average options:   {:.2}", stats.average_options_count);
    println!("  with category:     {}", stats.questions_with_categories);
    println!("  with explanation:  {}", stats.questions_with_explanations);
    if !bank.validation.errors.is_empty() {
        println!("  rejected by validation: {}", bank.validation.errors.len());
    }

    let distribution = correct_answer_distribution(&bank.questions);
    let spread: Vec<String> = distribution
        .iter()
        .map(|(index, count)| format!("{}:{count}", index + 1))
        .collect();
    println!("  correct answer slots: {}", spread.join(" "));

    let duplicates = find_duplicate_questions(&bank.questions);
    if !duplicates.is_empty() {
        println!("  duplicate questions: {}", duplicates.len());
    }
}

fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_question(session: &QuizSession, question: &QuestionRecord) {
    let progress = session.progress();
    println!();
    println!("Question {}/{}: {}", progress.position, progress.total, question.text());
    if let Some(category) = question.category() {
        println!("  ({category})");
    }
    for (index, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", index + 1);
    }
}

async fn play(
    quiz: &QuizSessionService,
    mut session: QuizSession,
) -> Result<(), Box<dyn std::error::Error>> {
    while let Some(question) = session.current().cloned() {
        print_question(&session, &question);

        if session.current_answer().is_none() {
            let count = question.options().len();
            let Some(input) = prompt(&format!("answer 1-{count} (q to quit): "))? else {
                return Ok(());
            };
            if input.eq_ignore_ascii_case("q") {
                println!("Progress saved.");
                return Ok(());
            }
            let Some(choice) = input.parse::<usize>().ok().filter(|n| (1..=count).contains(n))
            else {
                println!("pick a number between 1 and {count}");
                continue;
            };

            let outcome = quiz.answer(&mut session, choice - 1).await?;
            if outcome.correct {
                println!("Correct!");
            } else {
                let answer = outcome
                    .correct_index
                    .and_then(|index| question.options().get(index))
                    .map_or(question.correct_answer(), String::as_str);
                println!("Wrong. The answer is {answer}.");
            }
            if let Some(explanation) = question.explanation() {
                println!("  {explanation}");
            }

            if !outcome.correct {
                let Some(input) = prompt("r to retry, enter to continue: ")? else {
                    return Ok(());
                };
                if input.eq_ignore_ascii_case("r") {
                    quiz.retry(&mut session).await?;
                    continue;
                }
            }
        }

        let step = quiz.advance(&mut session).await?;
        if let Some(stats) = step.stats {
            println!();
            println!(
                "Finished: {}/{} correct ({}%)",
                stats.correct_answers, stats.total_questions, stats.percentage
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

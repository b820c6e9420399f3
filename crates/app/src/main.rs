use std::fmt;
use std::sync::Arc;

use ktet_core::model::UserId;
use services::{AppServices, Clock, Identity, QuizSettings, SeededShuffle, StaticIdentity};

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidUser { raw: String },
    InvalidDbUrl { raw: String },
    SignInRequired { command: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::SignInRequired { command } => {
                write!(f, "{command} needs a signed-in user (--user or KTET_USER)")
            }
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

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  ktet quiz --category <name>   practice one category");
    eprintln!("  ktet exam                     timed full exam");
    eprintln!("  ktet categories               list categories in the question bank");
    eprintln!("  ktet stats                    dashboard and recent history");
    eprintln!("  ktet reset --category <name>  forget seen questions for a category");
    eprintln!("  ktet generate --topic <topic> [--count <n>] [--subject <name>]");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --bank <path|url>   question bank (default data/questions.json)");
    eprintln!("  --db <sqlite_url>   history database (default sqlite://ktet.sqlite3)");
    eprintln!("  --user <id>         signed-in user; omit to practice anonymously");
    eprintln!("  --seed <n>          reproducible question order");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  KTET_BANK, KTET_DB_URL, KTET_USER, KTET_STANDARD_SIZE,");
    eprintln!("  KTET_EXAM_DURATION_SECS, KTET_QUESTION_SECS,");
    eprintln!("  KTET_AI_API_KEY, KTET_AI_BASE_URL, KTET_AI_MODEL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Exam,
    Categories,
    Stats,
    Reset,
    Generate,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "exam" => Some(Self::Exam),
            "categories" => Some(Self::Categories),
            "stats" => Some(Self::Stats),
            "reset" => Some(Self::Reset),
            "generate" => Some(Self::Generate),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Exam => "exam",
            Self::Categories => "categories",
            Self::Stats => "stats",
            Self::Reset => "reset",
            Self::Generate => "generate",
        }
    }
}

struct Args {
    db_url: String,
    bank: String,
    user: Option<UserId>,
    seed: Option<u64>,
    category: Option<String>,
    topic: Option<String>,
    count: usize,
    subject: String,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("KTET_DB_URL")
                .ok()
                .map_or_else(|| normalize_sqlite_url("ktet.sqlite3".into()), normalize_sqlite_url),
            bank: std::env::var("KTET_BANK").unwrap_or_else(|_| "data/questions.json".into()),
            user: std::env::var("KTET_USER").ok().map(parse_user).transpose()?,
            seed: None,
            category: None,
            topic: None,
            count: 10,
            subject: "KTET Exam".into(),
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
                "--bank" => parsed.bank = require_value(args, "--bank")?,
                "--user" => parsed.user = Some(parse_user(require_value(args, "--user")?)?),
                "--seed" => {
                    parsed.seed = Some(parse_number(require_value(args, "--seed")?, "--seed")?);
                }
                "--category" => parsed.category = Some(require_value(args, "--category")?),
                "--topic" => parsed.topic = Some(require_value(args, "--topic")?),
                "--count" => {
                    parsed.count = parse_number(require_value(args, "--count")?, "--count")?;
                }
                "--subject" => parsed.subject = require_value(args, "--subject")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn require_category(&self, command: Command) -> Result<&str, ArgsError> {
        self.category.as_deref().ok_or(ArgsError::MissingFlag {
            command: command.name(),
            flag: "--category",
        })
    }

    fn require_user(&self, command: Command) -> Result<&UserId, ArgsError> {
        self.user.as_ref().ok_or(ArgsError::SignInRequired {
            command: command.name(),
        })
    }
}

fn parse_user(raw: String) -> Result<UserId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidUser { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
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

fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "warn,ktet=info,services=info,storage=warn".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let identity: Arc<dyn Identity> = Arc::new(match parsed.user.clone() {
        Some(user) => StaticIdentity::signed_in(user),
        None => StaticIdentity::anonymous(),
    });

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let mut app = AppServices::new_sqlite(
        &parsed.db_url,
        &parsed.bank,
        Clock::default(),
        QuizSettings::from_env(),
        identity,
    )
    .await?;
    if let Some(seed) = parsed.seed {
        app = app.with_shuffle(Arc::new(SeededShuffle::new(seed)));
    }

    match cmd {
        Command::Quiz => {
            let category = parsed.require_category(cmd)?;
            let quiz = app.quiz();
            let session = quiz.start_standard(category).await?;
            terminal::run_session(&quiz, &app.explanations(), session).await
        }
        Command::Exam => {
            let quiz = app.quiz();
            let session = quiz.start_exam().await?;
            terminal::run_session(&quiz, &app.explanations(), session).await
        }
        Command::Categories => {
            let bank = app.quiz().load_bank().await?;
            for category in bank.categories() {
                println!("{:<40} {:>4} questions", category.name(), category.len());
            }
            Ok(())
        }
        Command::Stats => {
            let user = parsed.require_user(cmd)?;
            print_stats(&app, user).await
        }
        Command::Reset => {
            let user = parsed.require_user(cmd)?;
            let category = parsed.require_category(cmd)?;
            let removed = app.progress().reset_category(user, category).await?;
            println!("Cleared {removed} seen questions in {category}.");
            Ok(())
        }
        Command::Generate => {
            let topic = parsed.topic.as_deref().ok_or(ArgsError::MissingFlag {
                command: cmd.name(),
                flag: "--topic",
            })?;
            let questions = app
                .generator()
                .generate(topic, parsed.count, &parsed.subject)
                .await?;
            for (n, question) in questions.iter().enumerate() {
                println!("{}. {}", n + 1, question.prompt());
                for (i, option) in question.options().iter().enumerate() {
                    let marker = if question.is_correct(i) { '*' } else { ' ' };
                    println!("  {marker} {}) {option}", i + 1);
                }
                if !question.explanation().is_empty() {
                    println!("  {}", question.explanation());
                }
            }
            Ok(())
        }
    }
}

async fn print_stats(app: &AppServices, user: &UserId) -> Result<(), Box<dyn std::error::Error>> {
    let progress = app.progress();
    let stats = progress.dashboard(user).await?;

    println!("Quizzes taken:  {}", stats.total_quizzes);
    println!("Average score:  {}%", stats.average_score);
    println!("Topics covered: {}", stats.topics_covered);
    println!("Study time:     {}", stats.study_time());

    if !stats.by_category.is_empty() {
        println!("\nBy category:");
        for (category, perf) in &stats.by_category {
            println!(
                "  {category:<36} {:>3}%  ({} attempts)",
                perf.percentage(),
                perf.attempts
            );
        }
    }

    let recent = progress.history(user, 5).await?;
    if !recent.is_empty() {
        println!("\nRecent:");
        for row in recent {
            let result = row.result;
            println!(
                "  {}  {:<36} {}/{} ({}%) {}",
                result.completed_at().format("%Y-%m-%d %H:%M"),
                result.category(),
                result.score(),
                result.total(),
                result.percentage(),
                if result.passed() { "passed" } else { "failed" }
            );
        }
    }

    let seen = progress.resettable_categories(user).await?;
    if !seen.is_empty() {
        println!("\nSeen questions (reset with `ktet reset --category <name>`):");
        for entry in seen {
            println!("  {:<36} {}", entry.category, entry.seen_count);
        }
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
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

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

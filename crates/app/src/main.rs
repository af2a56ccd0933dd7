mod render;

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{LessonId, QuizSettings, QuizSettingsError, UserId};
use services::{
    Clock, LessonLoad, LessonService, Notice, Notifier, ProfileSession, ProfileStore,
    QuizEngine, QuizService, QuizView,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLessonId { raw: String },
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidRevealDelay { raw: String },
    Settings(QuizSettingsError),
    MissingFile,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid --lesson-id value: {raw}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidRevealDelay { raw } => {
                write!(f, "invalid --reveal-delay-ms value: {raw}")
            }
            ArgsError::Settings(err) => write!(f, "{err}"),
            ArgsError::MissingFile => write!(f, "import requires --file <path>"),
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
    eprintln!("  cargo run -p app -- play    [--db <sqlite_url>] [--lesson-id <id>] [--user-id <id> | --guest]");
    eprintln!("                              [--reveal-delay-ms <ms>]");
    eprintln!("  cargo run -p app -- lessons [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- import  [--db <sqlite_url>] --file <lesson.json>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!("  --lesson-id 1");
    eprintln!("  --user-id 1");
    eprintln!("  --reveal-delay-ms {}", QuizSettings::DEFAULT_REVEAL_DELAY_MS);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_LESSON_ID, LEARN_USER_ID, LEARN_REVEAL_DELAY_MS");
    eprintln!("  LEARN_LOG (tracing filter, default \"warn\")");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Lessons,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "lessons" => Some(Self::Lessons),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    lesson_id: LessonId,
    user_id: Option<UserId>,
    settings: QuizSettings,
    file: Option<PathBuf>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LEARN_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url);
        let mut lesson_id = std::env::var("LEARN_LESSON_ID")
            .ok()
            .and_then(|value| value.parse::<LessonId>().ok())
            .unwrap_or_else(|| LessonId::new(1));
        let mut user_id = Some(
            std::env::var("LEARN_USER_ID")
                .ok()
                .and_then(|value| value.parse::<UserId>().ok())
                .unwrap_or_else(|| UserId::new(1)),
        );
        let mut reveal_delay_ms = std::env::var("LEARN_REVEAL_DELAY_MS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(QuizSettings::DEFAULT_REVEAL_DELAY_MS);
        let mut file = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--lesson-id" => {
                    let value = require_value(args, "--lesson-id")?;
                    lesson_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLessonId { raw: value.clone() })?;
                }
                "--user-id" => {
                    let value = require_value(args, "--user-id")?;
                    user_id = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?,
                    );
                }
                "--guest" => user_id = None,
                "--reveal-delay-ms" => {
                    let value = require_value(args, "--reveal-delay-ms")?;
                    reveal_delay_ms = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidRevealDelay { raw: value.clone() })?;
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(args, "--file")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let settings = QuizSettings::new(reveal_delay_ms).map_err(ArgsError::Settings)?;
        Ok(Self {
            db_url,
            lesson_id,
            user_id,
            settings,
            file,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path = std::path::Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEARN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints notices inline with the quiz screens.
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, notice: Notice) {
        println!("{}", render::notice(&notice));
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if cmd == Command::Import && parsed.file.is_none() {
        print_usage();
        return Err(ArgsError::MissingFile.into());
    }

    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    match cmd {
        Command::Play => play(&storage, &parsed).await,
        Command::Lessons => {
            let lessons = LessonService::new(Arc::clone(&storage.lessons))
                .list_lessons(256)
                .await?;
            if lessons.is_empty() {
                println!("No lessons yet. Import one with `import --file <lesson.json>`.");
            }
            for lesson in &lessons {
                println!("{}", render::lesson_line(lesson));
            }
            Ok(())
        }
        Command::Import => {
            let path = parsed.file.as_ref().ok_or(ArgsError::MissingFile)?;
            let json = std::fs::read_to_string(path)?;
            let id = LessonService::new(Arc::clone(&storage.lessons))
                .import_json(&json)
                .await?;
            println!("Imported lesson {id} from {}.", path.display());
            Ok(())
        }
    }
}

async fn play(storage: &Storage, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::default_clock();
    let profiles = Arc::new(match args.user_id {
        Some(user) => ProfileSession::signed_in(clock, user, Arc::clone(&storage.profiles)),
        None => ProfileSession::signed_out(clock, Arc::clone(&storage.profiles)),
    });
    if args.user_id.is_some() {
        match profiles.refresh().await {
            Ok(Some(profile)) => println!(
                "Signed in as {} ({} points).",
                profile.display_name(),
                profile.points()
            ),
            Ok(None) => println!("No profile found; points cannot be saved."),
            Err(err) => tracing::warn!(error = %err, "profile lookup failed"),
        }
    }

    let service = QuizService::new(
        args.settings,
        Arc::clone(&storage.lessons),
        profiles,
        Arc::new(StdoutNotifier),
    );
    let engine = match service.load(args.lesson_id).await? {
        LessonLoad::Ready(engine) => engine,
        LessonLoad::NotFound => {
            println!("Lesson {} was not found.", args.lesson_id);
            return Ok(());
        }
    };

    drive(
        &engine,
        BufReader::new(tokio::io::stdin()),
        &mut std::io::stdout(),
    )
    .await?;

    engine.exit();
    if let Some(status) = engine.settle().await {
        tracing::debug!(?status, "reward settled");
    }
    Ok(())
}

/// Render screens to `out` and feed lines from `input` into the engine until the user
/// quits or input ends.
async fn drive<R, W>(engine: &QuizEngine, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        let view = engine.view();
        writeln!(out)?;
        write!(out, "{}", render::screen(&view))?;
        let Some(prompt) = render::prompt(&view) else {
            out.flush()?;
            sit_out_reveal(engine, &mut lines).await?;
            continue;
        };
        write!(out, "{prompt}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") {
            return Ok(());
        }

        let result = match &view {
            QuizView::Intro { .. } if input.is_empty() || input.eq_ignore_ascii_case("s") => {
                engine.begin()
            }
            QuizView::Question { .. } => match input.parse::<usize>() {
                Ok(number) if number >= 1 => engine.answer(number - 1).map(|_| ()),
                _ => {
                    writeln!(out, "Enter the number of your choice.")?;
                    continue;
                }
            },
            view if view.offers_retry() && input.eq_ignore_ascii_case("r") => engine.reset(),
            _ => continue,
        };
        if let Err(rejection) = result {
            writeln!(out, "({rejection})")?;
        }
    }
}

/// Wait for the reveal to end. Choices are disabled meanwhile, so lines typed
/// during the pause are read and dropped.
async fn sit_out_reveal<R>(engine: &QuizEngine, lines: &mut Lines<R>) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        tokio::select! {
            biased;
            () = engine.wait_reveal() => return Ok(()),
            line = lines.next_line() => match line? {
                Some(dropped) => {
                    tracing::debug!(input = %dropped.trim(), "input ignored during reveal");
                }
                None => {
                    engine.wait_reveal().await;
                    return Ok(());
                }
            },
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Lesson, Question};
    use services::LogNotifier;
    use storage::repository::{InMemoryRepository, LessonRepository};

    async fn budgeting_engine() -> QuizEngine {
        let questions = ["Which is a need?", "Which is fixed?", "Which is savings?"]
            .iter()
            .map(|statement| {
                Question::new(
                    *statement,
                    vec!["Rent".to_string(), "Concert tickets".to_string()],
                    0,
                )
                .unwrap()
            })
            .collect();
        let lesson = Lesson::new(LessonId::new(1), "Budgeting", "", 20, questions).unwrap();
        let repo = InMemoryRepository::new();
        repo.upsert_lesson(&lesson).await.unwrap();

        let service = QuizService::new(
            QuizSettings::default(),
            Arc::new(repo.clone()),
            Arc::new(ProfileSession::signed_out(Clock::default_clock(), Arc::new(repo))),
            Arc::new(LogNotifier),
        );
        match service.load(LessonId::new(1)).await.unwrap() {
            LessonLoad::Ready(engine) => engine,
            LessonLoad::NotFound => panic!("lesson was just stored"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn lines_typed_during_reveal_are_dropped() {
        let engine = budgeting_engine().await;
        let mut out = Vec::new();

        drive(&engine, &b"s\n1\n2\n"[..], &mut out).await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.question_index, 1);
        assert_eq!(snapshot.correct_count, 1);
        assert!(!snapshot.revealing);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Question 2/3\n"));
        assert_eq!(text.matches("your answer").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_at_intro_leaves_quiz_unstarted() {
        let engine = budgeting_engine().await;
        let mut out = Vec::new();

        drive(&engine, &b"q\n1\n"[..], &mut out).await.unwrap();

        assert_eq!(engine.snapshot().phase, quiz_core::QuizPhase::Start);
        assert!(String::from_utf8(out).unwrap().contains("== Budgeting =="));
    }

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--db",
            "sqlite::memory:",
            "--lesson-id",
            "7",
            "--guest",
            "--reveal-delay-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.lesson_id, LessonId::new(7));
        assert_eq!(args.user_id, None);
        assert_eq!(
            args.settings.reveal_delay(),
            std::time::Duration::from_millis(250)
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(&["--lesson-id", "abc"]),
            Err(ArgsError::InvalidLessonId { .. })
        ));
        assert!(matches!(
            parse(&["--reveal-delay-ms", "600000"]),
            Err(ArgsError::Settings(_))
        ));
        assert!(matches!(
            parse(&["--file"]),
            Err(ArgsError::MissingValue { flag: "--file" })
        ));
        assert!(matches!(parse(&["--bogus"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/learn.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/learn.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}

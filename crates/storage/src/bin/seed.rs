use std::fmt;

use chrono::{DateTime, Utc};
use quiz_core::model::{Lesson, LessonId, Profile, Question, UserId};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    display_name: String,
    points: u64,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidPoints { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user-id value: {raw}"),
            ArgsError::InvalidPoints { raw } => write!(f, "invalid --points value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LEARN_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user_id = std::env::var("LEARN_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or_else(|| UserId::new(1));
        let mut display_name = "Learner".to_string();
        let mut points = 0_u64;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user-id" => {
                    let value = require_value(&mut args, "--user-id")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--name" => {
                    display_name = require_value(&mut args, "--name")?;
                }
                "--points" => {
                    let value = require_value(&mut args, "--points")?;
                    points = value
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidPoints { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            display_name,
            points,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --user-id <id>            Profile to create or overwrite (default: 1)");
    eprintln!("  --name <display_name>     Profile display name (default: Learner)");
    eprintln!("  --points <n>              Starting point balance (default: 0)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LEARN_DB_URL, LEARN_USER_ID");
}

fn sample_lessons() -> Result<Vec<Lesson>, Box<dyn std::error::Error>> {
    let q = |statement: &str, choices: &[&str], answer: usize| {
        Question::new(
            statement,
            choices.iter().map(|c| (*c).to_string()).collect(),
            answer,
        )
    };

    let budgeting = Lesson::new(
        LessonId::new(1),
        "Budgeting Basics",
        "Learn how to plan where your money goes.",
        50,
        vec![
            q(
                "What is a budget?",
                &["A plan for spending and saving", "A type of loan", "A bank fee"],
                0,
            )?,
            q(
                "Which of these is a fixed expense?",
                &["Groceries", "Rent", "Concert tickets"],
                1,
            )?,
            q(
                "The 50/30/20 rule puts 20% toward...",
                &["Wants", "Needs", "Savings and debt repayment"],
                2,
            )?,
        ],
    )?;

    let saving = Lesson::new(
        LessonId::new(2),
        "Emergency Funds",
        "Why a safety net matters.",
        30,
        vec![
            q(
                "An emergency fund should usually cover...",
                &["One week of expenses", "Three to six months of expenses"],
                1,
            )?,
            q(
                "Where should an emergency fund be kept?",
                &["An accessible savings account", "Volatile stocks"],
                0,
            )?,
        ],
    )?;

    Ok(vec![budgeting, saving])
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let lessons = sample_lessons()?;
    for lesson in &lessons {
        storage.lessons.upsert_lesson(lesson).await?;
    }

    let profile = Profile::new(args.user_id, args.display_name.clone(), args.points, now)?;
    storage.profiles.upsert_profile(&profile).await?;

    println!(
        "Seeded {} lessons and profile {} ({} points) into {}",
        lessons.len(),
        args.user_id,
        args.points,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

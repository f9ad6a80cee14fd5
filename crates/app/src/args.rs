use std::fmt;

use chrono::NaiveDate;
use storage::config::{ConfigError, DatabaseUrl};
use tracker_core::{DateParseError, parse_date};

pub const DEFAULT_DB_URL: &str = "sqlite:exercise_tracker.sqlite3";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { what: &'static str, raw: String },
    InvalidDate(DateParseError),
    InvalidDbUrl(ConfigError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidNumber { what, raw } => write!(f, "invalid {what}: {raw}"),
            ArgsError::InvalidDate(err) => write!(f, "{err}"),
            ArgsError::InvalidDbUrl(err) => write!(f, "invalid --db value: {err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Goal {
        exercise: String,
        target: i64,
        days: i64,
        start: Option<NaiveDate>,
    },
    Log {
        exercise: String,
        quantity: u32,
        date: Option<NaiveDate>,
    },
    Complete {
        exercise: String,
    },
    Status {
        json: bool,
    },
    Chart {
        exercise: String,
    },
    Help,
}

#[derive(Debug)]
pub struct Args {
    pub db_url: DatabaseUrl,
    pub verbose: bool,
    pub command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_arg(
    args: &mut impl Iterator<Item = String>,
    what: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingArgument { what })
}

fn parse_number<T: std::str::FromStr>(what: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ArgsError::InvalidNumber { what, raw })
}

fn parse_day(raw: &str) -> Result<NaiveDate, ArgsError> {
    parse_date(raw).map_err(ArgsError::InvalidDate)
}

impl Args {
    /// Parse `argv` (without the program name). `env_db_url` is the value of
    /// `DATABASE_URL`, if set; `--db` wins over it.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env_db_url: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let mut db_raw = env_db_url.unwrap_or_else(|| DEFAULT_DB_URL.to_string());
        let mut verbose = false;

        let command_name = loop {
            let Some(arg) = args.next() else {
                break None;
            };
            match arg.as_str() {
                "--db" => db_raw = require_value(&mut args, "--db")?,
                "-v" | "--verbose" => verbose = true,
                "-h" | "--help" => break Some("help".to_string()),
                flag if flag.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ => break Some(arg),
            }
        };

        let command = match command_name.as_deref() {
            None | Some("status") => Self::parse_status(&mut args)?,
            Some("help") => Command::Help,
            Some("goal") => Self::parse_goal(&mut args)?,
            Some("log") => Self::parse_log(&mut args)?,
            Some("complete") => Command::Complete {
                exercise: require_arg(&mut args, "exercise name")?,
            },
            Some("chart") => Command::Chart {
                exercise: require_arg(&mut args, "exercise name")?,
            },
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_string())),
        };
        if let Some(extra) = args.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        let db_url =
            DatabaseUrl::parse(&normalize_sqlite_url(&db_raw)).map_err(ArgsError::InvalidDbUrl)?;

        Ok(Self {
            db_url,
            verbose,
            command,
        })
    }

    fn parse_status(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
        match args.next() {
            None => Ok(Command::Status { json: false }),
            Some(flag) if flag == "--json" => Ok(Command::Status { json: true }),
            Some(other) => Err(ArgsError::UnknownArg(other)),
        }
    }

    fn parse_goal(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
        let exercise = require_arg(args, "exercise name")?;
        let mut target = None;
        let mut days = None;
        let mut start = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--target" => {
                    target = Some(parse_number("--target", require_value(args, "--target")?)?);
                }
                "--days" => {
                    days = Some(parse_number("--days", require_value(args, "--days")?)?);
                }
                "--start" => start = Some(parse_day(&require_value(args, "--start")?)?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Command::Goal {
            exercise,
            target: target.ok_or(ArgsError::MissingArgument { what: "--target" })?,
            days: days.ok_or(ArgsError::MissingArgument { what: "--days" })?,
            start,
        })
    }

    fn parse_log(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
        let exercise = require_arg(args, "exercise name")?;
        let quantity = parse_number("quantity", require_arg(args, "quantity")?)?;
        let mut date = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--date" => date = Some(parse_day(&require_value(args, "--date")?)?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Command::Log {
            exercise,
            quantity,
            date,
        })
    }
}

/// Turn relative `sqlite:` paths into absolute `sqlite://` urls.
///
/// Non-SQLite urls and in-memory SQLite urls pass through unchanged.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("sqlite:")
        || trimmed == "sqlite::memory:"
        || trimmed.starts_with("sqlite://")
        || trimmed.starts_with("sqlite:file:")
    {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(ToString::to_string), None)
    }

    #[test]
    fn defaults_to_status_on_sqlite_file() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.command, Command::Status { json: false });
        assert!(matches!(args.db_url, DatabaseUrl::Sqlite { .. }));
        assert!(!args.verbose);
    }

    #[test]
    fn parses_goal_command() {
        let args = parse(&[
            "-v", "goal", "Push-ups", "--target", "100", "--days", "30", "--start", "2024-01-01",
        ])
        .unwrap();
        assert!(args.verbose);
        assert_eq!(
            args.command,
            Command::Goal {
                exercise: "Push-ups".into(),
                target: 100,
                days: 30,
                start: NaiveDate::from_ymd_opt(2024, 1, 1),
            }
        );
    }

    #[test]
    fn zero_target_reaches_validation() {
        let args = parse(&["goal", "Push-ups", "--target", "0", "--days", "30"]).unwrap();
        assert!(matches!(args.command, Command::Goal { target: 0, .. }));
    }

    #[test]
    fn goal_requires_target_and_days() {
        let err = parse(&["goal", "Push-ups", "--days", "30"]).unwrap_err();
        assert_eq!(err.to_string(), "missing --target");
    }

    #[test]
    fn parses_log_with_date() {
        let args = parse(&["log", "Squats", "25", "--date", "2024-02-03"]).unwrap();
        assert_eq!(
            args.command,
            Command::Log {
                exercise: "Squats".into(),
                quantity: 25,
                date: NaiveDate::from_ymd_opt(2024, 2, 3),
            }
        );
    }

    #[test]
    fn negative_log_quantity_is_rejected() {
        let err = parse(&["log", "Squats", "-4"]).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidNumber { what: "quantity", .. }));
    }

    #[test]
    fn db_flag_overrides_env_and_rewrites_postgres() {
        let args = Args::parse(
            ["--db", "postgres://u@h/db", "status", "--json"].map(String::from),
            Some("memory".into()),
        )
        .unwrap();
        assert_eq!(
            args.db_url,
            DatabaseUrl::Postgres {
                url: "postgresql://u@h/db".into()
            }
        );
        assert_eq!(args.command, Command::Status { json: true });
    }

    #[test]
    fn env_url_is_used_without_flag() {
        let args = Args::parse(["status".to_string()], Some("memory".into())).unwrap();
        assert_eq!(args.db_url, DatabaseUrl::Memory);
    }

    #[test]
    fn rejects_unknown_commands_and_trailing_args() {
        assert!(matches!(
            parse(&["delete", "x"]),
            Err(ArgsError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse(&["complete", "Squats", "now"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn sqlite_urls_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/goals.db");
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/goals.db"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("memory"), "memory");
    }
}

mod args;
mod render;

use std::io::Write;

use args::{Args, ArgsError, Command};
use services::{AppServices, Clock, GoalService};
use storage::config::{DATABASE_URL_ENV, DatabaseUrl};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracker_core::model::GoalDraft;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  exercise-tracker [--db <url>] [-v] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  goal <exercise> --target <n> --days <n> [--start YYYY-MM-DD]");
    eprintln!("  log <exercise> <quantity> [--date YYYY-MM-DD]");
    eprintln!("  complete <exercise>");
    eprintln!("  status [--json]                  # default");
    eprintln!("  chart <exercise>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {}", args::DEFAULT_DB_URL);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DATABASE_URL_ENV}  memory | sqlite:<path> | postgresql://...");
    eprintln!("  RUST_LOG      tracing filter, e.g. `debug` or `storage=trace`");
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug,sqlx=warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(
        std::env::args().skip(1),
        std::env::var(DATABASE_URL_ENV).ok(),
    )
    .map_err(|e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if parsed.command == Command::Help {
        print_usage();
        return Ok(());
    }

    init_logging(parsed.verbose);

    // Create the SQLite file up front. Keep this in the binary glue so core/services stay pure.
    if let DatabaseUrl::Sqlite { url } = &parsed.db_url {
        prepare_sqlite_file(url)?;
    }
    let app = AppServices::connect(&parsed.db_url, Clock::default_clock()).await?;
    debug!(backend = app.backend().describe(), "services ready");
    let goals = app.goal_service();

    dispatch(&goals, parsed.command, &mut std::io::stdout().lock()).await?;

    goals.save().await?;
    Ok(())
}

async fn dispatch(
    goals: &GoalService,
    command: Command,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Goal {
            exercise,
            target,
            days,
            start,
        } => {
            let name = exercise.trim().to_string();
            let start = start.unwrap_or_else(|| goals.today());
            goals
                .set_goal(GoalDraft::new(exercise, target, start, days))
                .await?;
            writeln!(out, "Goal set for {name}!")?;
        }
        Command::Log {
            exercise,
            quantity,
            date,
        } => {
            let date = date.unwrap_or_else(|| goals.today());
            goals.log_progress_on(&exercise, date, quantity).await?;
            writeln!(out, "Logged {quantity} {} on {date}.", exercise.trim())?;

            // The entry is committed; the summary below is best-effort.
            let snapshot = goals.goal_snapshot(&exercise).await;
            write_warnings(out, &snapshot.warnings)?;
            if let Some(view) = snapshot.view {
                writeln!(out, "{}", view.progress_label())?;
                if view.reached && view.goal.is_active() {
                    writeln!(
                        out,
                        "Congratulations! You've reached your {} goal.",
                        view.exercise()
                    )?;
                }
            }
        }
        Command::Complete { exercise } => {
            let name = exercise.trim();
            if goals.mark_complete(name).await? {
                writeln!(out, "Goal for {name} marked as complete.")?;
            } else {
                writeln!(out, "No active goal for {name}.")?;
            }
        }
        Command::Status { json } => {
            let dashboard = goals.dashboard().await;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&dashboard)?)?;
            } else {
                write!(out, "{}", render::render_dashboard(&dashboard))?;
            }
        }
        Command::Chart { exercise } => {
            let snapshot = goals.goal_snapshot(&exercise).await;
            write_warnings(out, &snapshot.warnings)?;
            match snapshot.view {
                Some(view) => write!(out, "{}", render::render_chart(&view))?,
                None if snapshot.warnings.is_empty() => {
                    writeln!(out, "No goal found for {}.", exercise.trim())?;
                }
                None => {}
            }
        }
        Command::Help => print_usage(),
    }
    Ok(())
}

fn write_warnings(out: &mut impl Write, warnings: &[String]) -> std::io::Result<()> {
    for warning in warnings {
        writeln!(out, "warning: {warning}")?;
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url.contains(":memory:") || db_url.contains("mode=memory") {
        return Ok(());
    }
    // `sqlite:file:` urls are handed to SQLite untouched.
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(format!("invalid --db value: {db_url}").into());
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

const ERROR_EXIT_CODE: i32 = 2;

/// Print a failed run once and turn it into the process exit code.
fn finish(result: Result<(), Box<dyn std::error::Error>>, err_out: &mut impl Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            let _ = writeln!(err_out, "{err}");
            ERROR_EXIT_CODE
        }
    }
}

#[tokio::main]
async fn main() {
    let code = finish(run().await, &mut std::io::stderr());
    if code != 0 {
        std::process::exit(code);
    }
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use time::{Date, OffsetDateTime};

use dictation_report::clock::parse_local_day;
use dictation_report::config::{
    default_dashboard_path, default_db_path, expand_home, DEFAULT_TZ_OFFSET_MINUTES,
};
use dictation_report::report::{
    search, stats, DashboardReport, ExportRange, ExportReport, SearchQuery,
    SearchReport, StatsReport,
};
use dictation_report::{Period, ReportConfig, ReportError};

#[derive(Parser, Debug)]
#[command(name = "dictation_report", version, about = "Reports over a local dictation history")]
struct Args {
    /// Dictation history database.
    ///
    /// Defaults to the Wispr Flow store under the home directory.
    #[arg(long, global = true, env = "DICTATION_DB")]
    db: Option<PathBuf>,

    /// Fixed local offset from UTC, in minutes. Clamped to +/-14h.
    #[arg(
        long,
        global = true,
        env = "DICTATION_TZ_OFFSET_MINUTES",
        default_value_t = DEFAULT_TZ_OFFSET_MINUTES,
        allow_negative_numbers = true
    )]
    tz_offset_minutes: i32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Usage summary: totals, top apps, recent days, hourly pattern.
    Stats {
        #[arg(long, value_enum)]
        period: Option<Period>,

        #[arg(long)]
        json: bool,
    },

    /// Case-sensitive substring search over formatted text, newest first.
    Search {
        query: String,

        /// Application filter; matches raw identifiers and display names.
        #[arg(long)]
        app: Option<String>,

        #[arg(long, value_parser = parse_day_arg)]
        from: Option<Date>,

        #[arg(long, value_parser = parse_day_arg)]
        to: Option<Date>,

        /// Maximum results, 1 to 500.
        #[arg(
            short = 'n',
            long,
            default_value_t = search::DEFAULT_LIMIT,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new()
                .range(1..=search::MAX_LIMIT as u64)
        )]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Export dictations as one JSON file or as daily Markdown notes.
    Export {
        /// JSON file, or directory for daily notes.
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        #[arg(long, value_parser = parse_day_arg)]
        from: Option<Date>,

        #[arg(long, value_parser = parse_day_arg)]
        to: Option<Date>,

        #[arg(long)]
        skip_cancelled: bool,
    },

    /// Write a self-contained HTML dashboard.
    Dashboard {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Obsidian,
}

fn parse_day_arg(s: &str) -> Result<Date, String> {
    parse_local_day(s).ok_or_else(|| format!("expected YYYY-MM-DD, got {s:?}"))
}

fn run(args: Args) -> anyhow::Result<()> {
    let db = args.db.unwrap_or_else(default_db_path);
    let config = ReportConfig::new(db, args.tz_offset_minutes);
    tracing::debug!(
        "store {} offset {} minutes",
        config.db_path.display(),
        config.tz_offset_minutes
    );

    match args.command {
        Command::Stats { period, json } => {
            let summary = StatsReport::new(config)
                .collect(period, OffsetDateTime::now_utc())
                .context("collect stats")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", stats::render_text(&summary));
            }
        }
        Command::Search {
            query,
            app,
            from,
            to,
            limit,
            json,
        } => {
            let mut q = SearchQuery::new(query);
            q.app = app;
            q.from = from;
            q.to = to;
            q.limit = limit;
            let results = SearchReport::new(config).run(&q).context("search")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", search::render_text(&results));
            }
        }
        Command::Export {
            output,
            format,
            from,
            to,
            skip_cancelled,
        } => {
            let output = expand_home(output);
            let range = ExportRange {
                from,
                to,
                skip_cancelled,
            };
            let report = ExportReport::new(config);
            match format {
                ExportFormat::Json => {
                    let summary = report.write_json(&range, &output).context("export json")?;
                    println!(
                        "✅ Exported {} dictations to {}",
                        summary.count,
                        summary.path.display()
                    );
                    println!("   Size: {:.1} MB", summary.bytes as f64 / 1e6);
                }
                ExportFormat::Obsidian => {
                    let summary = report
                        .write_notes(&range, &output)
                        .context("export daily notes")?;
                    println!(
                        "✅ Exported {} daily notes to {}",
                        summary.written,
                        summary.dir.display()
                    );
                }
            }
        }
        Command::Dashboard { output } => {
            let output = output.map(expand_home).unwrap_or_else(default_dashboard_path);
            let path = DashboardReport::new(config)
                .write(&output)
                .context("build dashboard")?;
            println!("✅ Dashboard created: {}", path.display());
        }
    }
    Ok(())
}

/// Exit status and the message printed for a failed run.
fn diagnose(err: &anyhow::Error) -> (u8, String) {
    let unavailable = err.chain().find_map(|e| match e.downcast_ref::<ReportError>() {
        Some(ReportError::StoreUnavailable { path, reason }) => Some((path, reason)),
        _ => None,
    });
    let message = match unavailable {
        Some((path, reason)) => format!(
            "Error: Wispr Flow database not found or unreadable ({reason}).\nExpected: {}",
            path.display()
        ),
        None => format!("Error: {err:#}"),
    };
    (1, message)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dictation_report=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (code, message) = diagnose(&err);
            eprintln!("{message}");
            ExitCode::from(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_offset_and_global_db() {
        let args = Args::try_parse_from([
            "dictation_report",
            "stats",
            "--db",
            "/tmp/flow.sqlite",
            "--tz-offset-minutes",
            "-420",
            "--period",
            "week",
        ])
        .unwrap();
        assert_eq!(args.tz_offset_minutes, -420);
        assert_eq!(args.db, Some(PathBuf::from("/tmp/flow.sqlite")));
        assert!(matches!(
            args.command,
            Command::Stats { period: Some(Period::Week), json: false }
        ));
    }

    #[test]
    fn search_defaults_and_day_validation() {
        let args = Args::try_parse_from(["dictation_report", "search", "hello"]).unwrap();
        match args.command {
            Command::Search { limit, from, .. } => {
                assert_eq!(limit, 20);
                assert_eq!(from, None);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(Args::try_parse_from(["dictation_report", "search", "x", "--from", "2024-1-5"]).is_err());
        assert!(Args::try_parse_from(["dictation_report", "search", "x", "--from", "2024-02-30"]).is_err());
    }

    #[test]
    fn export_requires_output() {
        assert!(Args::try_parse_from(["dictation_report", "export"]).is_err());
        let args = Args::try_parse_from(["dictation_report", "export", "-o", "out", "-f", "obsidian"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Export { format: ExportFormat::Obsidian, skip_cancelled: false, .. }
        ));
    }

    #[test]
    fn search_limit_out_of_range_is_rejected() {
        for n in ["0", "501", "1000"] {
            assert!(Args::try_parse_from(["dictation_report", "search", "x", "-n", n]).is_err());
        }
        let args = Args::try_parse_from(["dictation_report", "search", "x", "-n", "500"]).unwrap();
        assert!(matches!(args.command, Command::Search { limit: 500, .. }));
    }

    #[test]
    fn missing_store_exits_one_and_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("absent").join("flow.sqlite");
        let args = Args::try_parse_from([
            "dictation_report",
            "stats",
            "--db",
            db.to_str().unwrap(),
        ])
        .unwrap();

        let err = run(args).unwrap_err();
        let (code, message) = diagnose(&err);
        assert_eq!(code, 1);
        assert!(message.contains("database not found"));
        assert!(message.contains("file does not exist"));
        assert!(message.contains(&format!("Expected: {}", db.display())));
    }

    #[test]
    fn store_without_history_table_reports_reason() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("other.sqlite");
        rusqlite::Connection::open(&db)
            .unwrap()
            .execute_batch("CREATE TABLE Notes (id INTEGER);")
            .unwrap();
        let args = Args::try_parse_from([
            "dictation_report",
            "dashboard",
            "--db",
            db.to_str().unwrap(),
            "-o",
            dir.path().join("dash.html").to_str().unwrap(),
        ])
        .unwrap();

        let (code, message) = diagnose(&run(args).unwrap_err());
        assert_eq!(code, 1);
        assert!(message.contains("no such table"));
        assert!(message.contains(&db.display().to_string()));
        assert!(!dir.path().join("dash.html").exists());
    }

    #[test]
    fn other_failures_keep_their_context() {
        let err = anyhow::Error::new(ReportError::NotesIncomplete {
            written: 2,
            expected: 3,
        })
        .context("export daily notes");
        let (code, message) = diagnose(&err);
        assert_eq!(code, 1);
        assert_eq!(message, "Error: export daily notes: wrote 2 of 3 daily notes");
    }
}

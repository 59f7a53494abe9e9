use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::PathBuf;

use coachload::config::AppConfig;
use coachload::display;
use coachload::error::DataWarning;
use coachload::internal_load::internal_load_series;
use coachload::logging::{init_logging, LogLevel};
use coachload::models::{ExtraSession, Week};
use coachload::store::CsvStore;
use coachload::tables::{SessionFilter, SessionSort, Tables};
use coachload::weekly::WeeklyAggregator;

/// coachload - Training load dashboard
///
/// Weekly load and volume statistics, week-over-week trends and per-zone
/// time for sessions assigned to athletes.
#[derive(Parser)]
#[command(name = "coachload")]
#[command(version)]
#[command(about = "Training load dashboard", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the table CSV files (overrides the config)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weekly load and volume against the previous week
    Week {
        /// Athlete name
        #[arg(short, long)]
        athlete: String,

        /// Week label (YYYY-MM-DD or "Sww - dd/mm"), defaults to the current week
        #[arg(short, long)]
        week: Option<String>,
    },

    /// Minutes per zone over the trailing weeks
    Zones {
        #[arg(short, long)]
        athlete: String,

        /// Last week of the window, defaults to the current week
        #[arg(short, long)]
        week: Option<String>,

        /// Window length in weeks (overrides the config)
        #[arg(short = 'n', long)]
        weeks: Option<u32>,
    },

    /// List and filter sessions
    Sessions {
        /// Substring of the name or a block description
        #[arg(short, long)]
        search: Option<String>,

        /// Restrict to these session names
        #[arg(long = "name")]
        names: Vec<String>,

        #[arg(long)]
        min_volume: Option<Decimal>,

        #[arg(long)]
        max_volume: Option<Decimal>,

        #[arg(long)]
        min_load: Option<Decimal>,

        #[arg(long)]
        max_load: Option<Decimal>,

        #[arg(long, value_enum, default_value = "name")]
        sort: SortKey,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Assignments and feedback referencing deleted sessions
    Orphans,

    /// External and internal load per week from completed feedback
    Internal {
        #[arg(short, long)]
        athlete: String,

        /// First day considered (YYYY-MM-DD), defaults to the recent-feedback window
        #[arg(short, long)]
        since: Option<NaiveDate>,
    },

    /// Recent assignments and feedback
    Recent {
        /// Restrict feedback to one athlete
        #[arg(short, long)]
        athlete: Option<String>,
    },

    /// Report a session done outside the plan
    Extra {
        #[arg(short, long)]
        athlete: String,

        /// Date, content, how it went
        description: String,

        /// Day of the session, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Athlete profiles with BMI and record paces
    Athletes,

    /// Show or initialize the configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortKey {
    Name,
    Volume,
    Load,
}

impl From<SortKey> for SessionSort {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Name => SessionSort::Name,
            SortKey::Volume => SessionSort::Volume,
            SortKey::Load => SessionSort::Load,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.logging.level = LogLevel::from_verbosity(config.logging.level, cli.verbose);
    init_logging(&config.logging)?;

    if let Some(dir) = &cli.data_dir {
        config.settings.data_dir = dir.clone();
    }

    let today = Local::now().date_naive();
    let year = config.settings.effective_year();
    let resolve_week = |label: Option<&str>| -> Result<Week> {
        match label {
            Some(label) => Week::parse(label, year).with_context(|| format!("Invalid week '{}'", label)),
            None => Ok(Week::containing(today)),
        }
    };

    let store = CsvStore::new(&config.settings.data_dir, year).with_weights(config.load.zone_weights);
    let load_tables = || -> Result<Tables> {
        let (tables, warnings) = store
            .load()
            .with_context(|| format!("Failed to load tables from {}", store.data_dir().display()))?;
        print_warnings(&warnings);
        Ok(tables)
    };

    match cli.command {
        Commands::Week { athlete, week } => {
            let tables = load_tables()?;
            note_unknown_athlete(&tables, &athlete);
            let week = resolve_week(week.as_deref())?;
            let aggregator = WeeklyAggregator::with_comparator(&tables, config.load.comparator());
            let comparison = aggregator.compare_with_previous(&athlete, week);

            println!(
                "{} {} ({} sessions)",
                athlete.bold(),
                week.range_label(),
                comparison.current.session_count
            );
            println!("{}", display::weekly_comparison_table(&comparison));
            if comparison.trend.any_notable() {
                println!(
                    "{}",
                    format!(
                        "Change above {}% on at least one metric",
                        config.load.notable_threshold_pct
                    )
                    .red()
                );
            }
            print_warnings(&comparison.warnings);
        }

        Commands::Zones { athlete, week, weeks } => {
            let tables = load_tables()?;
            note_unknown_athlete(&tables, &athlete);
            let week = resolve_week(week.as_deref())?;
            let mut analyzer = config.load.zone_analyzer();
            if let Some(weeks) = weeks {
                analyzer = coachload::zones::ZoneTimeAnalyzer::with_window(weeks);
            }
            let breakdown = analyzer.breakdown(&tables, &athlete, week);

            println!(
                "{} zone time, {} weeks to {}",
                athlete.bold(),
                analyzer.window_weeks(),
                week.label()
            );
            println!("{}", display::zone_breakdown_table(&breakdown));
            print_warnings(&breakdown.warnings);
        }

        Commands::Sessions {
            search,
            names,
            min_volume,
            max_volume,
            min_load,
            max_load,
            sort,
            desc,
        } => {
            let tables = load_tables()?;
            let filter = SessionFilter {
                names: (!names.is_empty()).then(|| names.into_iter().collect::<BTreeSet<_>>()),
                text: search,
                min_volume,
                max_volume,
                min_load,
                max_load,
            };
            let sessions = tables.sessions.search(&filter, sort.into(), !desc);
            if sessions.is_empty() {
                println!("{}", "No session matches".yellow());
            } else {
                println!("{}", display::sessions_table(sessions));
            }
        }

        Commands::Orphans => {
            let tables = load_tables()?;
            let orphans = tables.orphans();
            if orphans.is_empty() {
                println!("{}", "✓ No orphaned references".green());
            } else {
                for line in display::warning_lines(&orphans) {
                    println!("{}", line);
                }
            }
        }

        Commands::Internal { athlete, since } => {
            let tables = load_tables()?;
            note_unknown_athlete(&tables, &athlete);
            let since = since.unwrap_or_else(|| {
                today - chrono::Duration::days(config.load.recent_feedback_days as i64)
            });
            let (series, warnings) = internal_load_series(&tables, &athlete, since);
            if series.is_empty() {
                println!("{}", format!("No completed feedback since {}", since).yellow());
            } else {
                println!("{}", display::internal_load_table(&series));
            }
            print_warnings(&warnings);
        }

        Commands::Recent { athlete } => {
            let tables = load_tables()?;
            println!(
                "{}",
                format!("Assignments, last {} weeks", config.load.recent_assignment_weeks).bold()
            );
            for assignment in tables
                .assignments
                .recent(today, config.load.recent_assignment_weeks)
                .into_iter()
                .filter(|a| athlete.as_deref().map_or(true, |name| a.athlete_id == name))
            {
                let status = if tables.sessions.contains(&assignment.session_name) {
                    String::new()
                } else {
                    " (deleted)".red().to_string()
                };
                println!(
                    "  {} {} {}{}",
                    assignment.week.label(),
                    assignment.athlete_id,
                    assignment.session_name,
                    status
                );
            }

            let extras = tables.extras.recent(athlete.as_deref(), today, config.load.recent_feedback_days);
            if !extras.is_empty() {
                println!(
                    "{}",
                    format!("Extra sessions, last {} days", config.load.recent_feedback_days).bold()
                );
                for extra in extras {
                    println!(
                        "  {} {} {}",
                        extra.date.format("%d/%m"),
                        extra.athlete_id,
                        extra.description
                    );
                }
            }

            if let Some(name) = athlete {
                println!(
                    "{}",
                    format!("Feedback, last {} days", config.load.recent_feedback_days).bold()
                );
                for feedback in tables
                    .feedback
                    .recent(&name, today, config.load.recent_feedback_days)
                {
                    let done = if feedback.completed { "✓".green() } else { "✗".red() };
                    println!(
                        "  {} {} {} RPE {} {}",
                        feedback.logged_at.format("%d/%m"),
                        done,
                        feedback.session_name,
                        feedback.perceived_effort.value(),
                        feedback.comment
                    );
                }
            }
        }

        Commands::Extra {
            athlete,
            description,
            date,
        } => {
            let mut tables = load_tables()?;
            let extra = ExtraSession::new(athlete, date.unwrap_or(today), description.trim());
            tables
                .add_extra(extra)
                .context("Failed to record extra session")?;
            store.save_extras(&tables.extras)?;
            println!("{}", "✓ Extra session recorded, your coach will see it".green());
        }

        Commands::Athletes => {
            let tables = load_tables()?;
            for athlete in tables.athletes.iter() {
                for line in display::athlete_summary(athlete) {
                    println!("{}", line);
                }
                if let Some(age) = athlete.age_on(today) {
                    println!("  Age: {}", age);
                }
            }
        }

        Commands::Config { init, force } => {
            let path = cli.config.unwrap_or_else(AppConfig::default_config_path);
            run_config(&config, path, init, force)?;
        }
    }

    Ok(())
}

fn run_config(config: &AppConfig, path: PathBuf, init: bool, force: bool) -> Result<()> {
    if init {
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        let mut fresh = AppConfig::default();
        fresh.save_to_file(&path)?;
        println!("{}", format!("✓ Configuration written to {}", path.display()).green());
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", format!("# {}", path.display()).dimmed());
    println!("{}", rendered);
    Ok(())
}

fn note_unknown_athlete(tables: &Tables, name: &str) {
    if !tables.athletes.contains(name) {
        tracing::debug!(athlete = name, "Athlete not in table, reporting from assignments only");
        eprintln!("{}", format!("Note: no athlete profile named '{}'", name).yellow());
    }
}

fn print_warnings(warnings: &[DataWarning]) {
    for line in display::warning_lines(warnings) {
        eprintln!("{}", line);
    }
}

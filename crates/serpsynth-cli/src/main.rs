use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serpsynth_core::config::CliOverrides;
use serpsynth_core::errors::{PipelineError, SynthErrorCode};
use serpsynth_core::tracing::init_tracing;
use serpsynth_core::SynthConfig;
use serpsynth_pipeline::{Coordinator, JsonLinesSource, RawLoader};
use serpsynth_storage::queries::runs;
use serpsynth_storage::DatabaseManager;

#[derive(Parser)]
#[command(name = "serpsynth", version, about = "Synthetic impression and click generation")]
struct Cli {
    /// Config file (default: ./serpsynth.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database path, overriding config and SERPSYNTH_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level, overriding config and SERPSYNTH_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the generation pipeline, then the consistency checks.
    Run,
    /// Load missing raw dates from the source export directory.
    Sync,
    /// Run the consistency checks only.
    Check,
    /// Sync, then run.
    All,
    /// Show recent pipeline runs.
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        db_path: cli.db.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = match SynthConfig::load(Path::new("."), Some(&overrides)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.tagged());
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging.effective_level());

    match execute(cli.command.unwrap_or(Command::Run), &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "serpsynth failed");
            eprintln!("{}", e.tagged());
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command, config: &SynthConfig) -> Result<(), PipelineError> {
    let db_path = config.database.effective_path();
    let db = DatabaseManager::open(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    match command {
        Command::Run => run(&db, config)?,
        Command::Sync => sync(&db, config)?,
        Command::Check => check(&db, config)?,
        Command::All => {
            sync(&db, config)?;
            run(&db, config)?;
        }
        Command::History { limit } => history(&db, limit)?,
    }

    db.checkpoint()?;
    Ok(())
}

fn sync(db: &DatabaseManager, config: &SynthConfig) -> Result<(), PipelineError> {
    let source = JsonLinesSource::new(config.source.effective_input_dir());
    let loader = RawLoader::new(
        db,
        &source,
        config.source.effective_device_types(),
        config.pipeline.effective_days_back(),
    );
    let report = loader.sync(chrono::Local::now().date_naive())?;
    for (date, rows) in &report.loaded {
        println!("{date}: {rows} raw rows");
    }
    println!("synced {} raw rows", report.total());
    Ok(())
}

fn run(db: &DatabaseManager, config: &SynthConfig) -> Result<(), PipelineError> {
    let mut coordinator = Coordinator::new(db, &config.pipeline);
    let stats = coordinator.run_full_pipeline()?;
    for (stage, rows) in stats.iter() {
        println!("{stage:<12} {rows}");
    }
    report_consistency(&coordinator)
}

fn check(db: &DatabaseManager, config: &SynthConfig) -> Result<(), PipelineError> {
    report_consistency(&Coordinator::new(db, &config.pipeline))
}

fn report_consistency(coordinator: &Coordinator<'_>) -> Result<(), PipelineError> {
    let report = coordinator.check_data_consistency()?;
    for (check, anomalies) in &report.checks {
        println!("{check:<24} {anomalies}");
    }
    for warning in report.warnings() {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn history(db: &DatabaseManager, limit: usize) -> Result<(), PipelineError> {
    for run in db.with_conn(|conn| runs::query_recent(conn, limit))? {
        let started = chrono::DateTime::from_timestamp(run.started_at, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| run.started_at.to_string());
        let stages = run
            .stages
            .iter()
            .map(|(stage, rows)| format!("{stage}={rows}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "#{} {started} {} {}ms {stages}",
            run.id,
            run.status,
            run.duration_ms.unwrap_or(0)
        );
        if let Some(error) = &run.error {
            println!("    {error}");
        }
    }
    Ok(())
}

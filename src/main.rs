use std::process::ExitCode;

use fanbench::bench::BenchmarkRunner;
use fanbench::cli::Cli;
use fanbench::config::{BenchmarkConfig, ConfigManager};
use fanbench::report::{self, ProgressDisplay};
use fanbench::{error, Result};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::try_parse_loose(std::env::args_os()).unwrap_or_else(|e| e.exit());
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", error::user_friendly_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_config_path(path.clone()),
        None => ConfigManager::new()?,
    };

    if cli.clear_history {
        manager.clear_history()?;
        println!("Run history cleared.");
        return Ok(());
    }

    if let Some(limit) = cli.history {
        let reports = manager.get_recent_reports(limit)?;
        print!("{}", report::render_history(&reports));
        return Ok(());
    }

    if cli.write_config {
        // Writing may create the file, so a missing one starts from defaults
        let base = if manager.config_path().exists() {
            manager.load_config()?
        } else {
            BenchmarkConfig::default()
        };
        manager.save_config(&cli.apply(base))?;
        println!("Configuration written to {}", manager.config_path().display());
        return Ok(());
    }

    let config = cli.apply(manager.load_config()?);
    let save_history = config.save_history;
    let request = cli.request();
    let mut runner = BenchmarkRunner::new(config, request)?;

    let display = cli.progress_display();
    if display != ProgressDisplay::Silent {
        println!("{}", report::render_header(&request));
    }

    let (tx, rx) = mpsc::channel(request.task_count);
    let progress = report::spawn_progress(rx, request.task_count, display);

    runner.start(Some(tx)).await?;

    let cancel = runner.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, cancelling running tasks");
            cancel.cancel_all().await;
        }
    });

    let run_report = runner.wait_for_completion().await?;
    interrupt.abort();
    let _ = progress.await;

    if cli.json {
        println!("{}", report::render_json(&run_report)?);
    } else {
        print!("{}", report::render_text(&run_report));
    }

    if save_history {
        // A history write failure doesn't invalidate the run
        if let Err(e) = manager.save_report(run_report) {
            log::warn!("could not save run history: {}", e);
            eprintln!("{}", error::user_friendly_message(&e));
        }
    }

    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelwerk — data-driven label composer
//
// Entry point. Initialises logging, restores the last used configuration and
// runs one command: batch generation, a single framed preview, or a
// configuration export.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use labelwerk_batch::{BatchEvent, BatchHandle};
use labelwerk_core::error::Result;
use labelwerk_core::human_errors::humanize_error;
use labelwerk_render::output::save_png;

use services::data_dir;
use services::dataset_source::load_dataset;
use services::session::LabelSession;

/// Exit code when a batch finished but some rows could not be written.
const EXIT_ROWS_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "labelwerk",
    version,
    about = "Labelwerk — render one text + QR label per row of a dataset"
)]
struct Cli {
    /// Print batch events as JSON lines on stdout.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Render every row into a new `labels_<timestamp>` directory.
    Generate {
        /// Dataset file (JSON table or list of records).
        #[arg(long)]
        data: PathBuf,
        /// Configuration to apply instead of the last used one.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory the run directory is created in.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render one row, framed as in the preview pane, to a PNG file.
    Preview {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// 1-based row number; out-of-range rows show row 1.
        #[arg(long, default_value_t = 1)]
        row: usize,
        #[arg(long)]
        out: PathBuf,
    },

    /// Write the field configuration for a dataset to a file.
    ExportConfig {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "labelwerk failed");
            eprintln!("{}", humanize_error(&e).status_line());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.cmd {
        Cmd::Generate {
            data,
            config,
            output,
        } => {
            let mut session = open_session(&data, config.as_deref())?;
            if let Some(dir) = output {
                session.set_output_dir(dir);
            }
            let handle = session.start_batch()?;
            follow_batch(handle, cli.json).await
        }

        Cmd::Preview {
            data,
            config,
            row,
            out,
        } => {
            let session = open_session(&data, config.as_deref())?;
            let outcome = session.preview(row);
            match outcome.image {
                Some(image) => {
                    save_png(&image, &out)?;
                    println!("{}", outcome.status);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("{}", outcome.status);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Cmd::ExportConfig { data, config, out } => {
            let session = open_session(&data, config.as_deref())?;
            session.save_config(&out)?;
            println!("configuration written to {}", out.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_session(data: &Path, config: Option<&Path>) -> Result<LabelSession> {
    let mut session = LabelSession::autoload(&data_dir::last_config_path());
    if let Some(path) = config {
        session.import_config(path)?;
    }
    session.load_dataset(load_dataset(data)?);
    Ok(session)
}

/// Print events until the run ends. Ctrl-C asks the run to stop after the
/// current row.
async fn follow_batch(mut handle: BatchHandle, json: bool) -> Result<ExitCode> {
    let mut cancel_sent = false;
    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_event(&event, json)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !cancel_sent => {
                info!(batch_id = %handle.id(), "cancel requested");
                handle.cancel();
                cancel_sent = true;
            }
        }
    }

    let report = handle.wait().await?;
    if report.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_ROWS_FAILED))
    }
}

fn print_event(event: &BatchEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        BatchEvent::Started { total, output_dir, .. } => {
            println!("generating {total} labels in {}", output_dir.display());
        }
        BatchEvent::Progress { row, total, percent } => {
            println!("[{percent:5.1}%] row {row}/{total}");
        }
        BatchEvent::RowFailed { row, message } => {
            eprintln!("row {row} failed: {message}");
        }
        BatchEvent::Completed(report) => println!("{}", report.status_line()),
        BatchEvent::Aborted { message } => eprintln!("aborted: {message}"),
    }
    Ok(())
}

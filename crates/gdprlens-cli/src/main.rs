mod cancel;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gdprlens_ai::config::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use gdprlens_ai::{AnnotatorConfig, CaseAnnotator};
use gdprlens_store::{DEFAULT_MARKER, DEFAULT_REPORT_FILE};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cancel::CancellationToken;
use crate::pipeline::RunOptions;

#[derive(Parser)]
#[command(name = "gdprlens", version, about = "Annotate GDPR case files with a chat-completion model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Annotate every .txt case file under a directory, writing a .json record next to each.
    Annotate {
        /// Directory containing case files (searched recursively).
        dir: PathBuf,
        #[command(flatten)]
        api: ApiArgs,
        /// Maximum annotation requests in flight.
        #[arg(long, default_value_t = 1)]
        concurrency: usize,
        /// Start without the connectivity check.
        #[arg(long)]
        skip_check: bool,
        /// Hide the progress bar.
        #[arg(long)]
        no_progress: bool,
    },
    /// Check that the completion endpoint accepts the configured credentials.
    Check {
        #[command(flatten)]
        api: ApiArgs,
    },
    /// List annotation records that contain an error marker.
    Audit {
        /// Directory containing .json annotation records.
        dir: PathBuf,
        /// Literal text to search for.
        #[arg(long, default_value = DEFAULT_MARKER)]
        marker: String,
        /// Report file receiving one matching file name per line.
        #[arg(short, long, default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct ApiArgs {
    /// API key for the completion endpoint.
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,
    /// Chat-completion endpoint URL.
    #[arg(long, env = "DEEPSEEK_API_URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Model name sent with each request.
    #[arg(long, env = "DEEPSEEK_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
}

impl ApiArgs {
    fn annotator(self) -> anyhow::Result<CaseAnnotator<gdprlens_ai::HttpTransport>> {
        let config = AnnotatorConfig::new(self.api_key)
            .with_endpoint(self.endpoint)
            .with_model(self.model);
        CaseAnnotator::http(config).context("invalid configuration")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gdprlens=info,gdprlens_ai=info,gdprlens_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("gdprlens v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Annotate {
            dir,
            api,
            concurrency,
            skip_check,
            no_progress,
        } => {
            let annotator = api.annotator()?;
            info!(config = ?annotator.config(), "annotator configured");

            if !skip_check && !annotator.connectivity_check().await {
                error!("connectivity check failed; check the API key and network connection");
                return Ok(ExitCode::FAILURE);
            }

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if on_signal.cancel() {
                        warn!("second interrupt received; exiting without waiting");
                        std::process::exit(130);
                    }
                    warn!("interrupt received; finishing in-flight files (press Ctrl-C again to exit now)");
                }
            });

            let options = RunOptions {
                concurrency,
                show_progress: !no_progress,
            };
            info!(dir = %dir.display(), "starting annotation run");
            let summary = pipeline::run(&dir, &annotator, &options, &cancel)
                .await
                .with_context(|| format!("annotating {}", dir.display()))?;

            eprintln!(
                "Annotated {}/{} files ({} error records, {} failed, {} skipped) in {:.1}s",
                summary.written,
                summary.discovered,
                summary.annotation_errors,
                summary.failed,
                summary.cancelled,
                summary.elapsed_secs
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { api } => {
            let annotator = api.annotator()?;
            if annotator.connectivity_check().await {
                eprintln!("API connection OK");
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("API connection failed");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Audit {
            dir,
            marker,
            output,
        } => {
            let report = gdprlens_store::audit(&dir, &marker, &output)
                .with_context(|| format!("auditing {}", dir.display()))?;
            eprintln!(
                "Found {} of {} records containing {:?}; list saved to {}",
                report.matches.len(),
                report.scanned,
                marker,
                report.report_path.display()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

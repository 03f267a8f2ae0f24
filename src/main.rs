use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use clap::{Parser, Subcommand};
use serde::Deserialize;

use faq_generator::{
    app_state::AppState,
    config::Config,
    errors::{AppError, AppResult},
    models::{domain::Variant, dto::request::GenerateFaqRequest},
    services::{BatchItem, ItemStatus},
};

#[derive(Parser, Debug)]
#[command(name = "faq-generator", about = "Generate validated FAQ sections with an LLM", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one FAQ section and print the outcome as JSON
    Generate {
        title: String,
        url: String,
        /// File holding the page text used as source
        source_file: PathBuf,
        #[arg(default_value = "short")]
        variant: Variant,
        #[arg(long)]
        allow_links: bool,
    },
    /// Run every item of a JSON file; Ctrl-C stops before the next item
    Batch { items_file: PathBuf },
}

#[derive(Deserialize)]
struct BatchFileItem {
    id: String,
    #[serde(flatten)]
    request: GenerateFaqRequest,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(AppError::ExhaustedRetries(report)) => {
            log::error!("Generation exhausted its retries");
            match serde_json::to_string_pretty(&report) {
                Ok(json) => eprintln!("{}", json),
                Err(err) => log::error!("Could not serialize diagnostics: {}", err),
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("{} ({})", err, err.error_code());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> AppResult<ExitCode> {
    let state = AppState::new(Config::from_env())?;

    match args.command {
        Command::Generate {
            title,
            url,
            source_file,
            variant,
            allow_links,
        } => {
            let source = read_file(&source_file)?;
            let mut request = GenerateFaqRequest::new(title, url, source).with_variant(variant);
            request.allow_external_links = allow_links;

            let outcome = state.pipeline.generate(request).await?;
            println!("{}", to_json(&outcome)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Batch { items_file } => {
            let items: Vec<BatchFileItem> = serde_json::from_str(&read_file(&items_file)?)
                .map_err(|e| AppError::ValidationError(format!("Invalid batch file: {}", e)))?;
            let items = items
                .into_iter()
                .map(|item| BatchItem::new(item.id, item.request))
                .collect();

            let stop = Arc::new(AtomicBool::new(false));
            let signal_flag = Arc::clone(&stop);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupt received, stopping after the current item");
                    signal_flag.store(true, Ordering::SeqCst);
                }
            });

            let reports = state.batch_runner().run(items, &stop).await;
            println!("{}", to_json(&reports)?);

            let all_completed = reports.iter().all(|r| r.status == ItemStatus::Completed);
            Ok(if all_completed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn read_file(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|e| {
        AppError::ValidationError(format!("Cannot read {}: {}", path.display(), e))
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize output: {}", e)))
}

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use tryon_connector::{
    telemetry, CallerContext, ConnectorConfig, ImagePart, ResultOutcome, TryOnConnector,
    UploadRequest,
};

/// Virtual try-on client
#[derive(Parser)]
#[command(name = "tryon")]
#[command(about = "Submit a virtual try-on request and print the result reference", long_about = None)]
struct Cli {
    /// Bearer token (overrides TRYON_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One request, answered with a result URL or image bytes
    Sync {
        /// Photo of the person
        #[arg(long)]
        person: PathBuf,

        /// Garment image file
        #[arg(long, conflicts_with = "garment_url", required_unless_present = "garment_url")]
        garment: Option<PathBuf>,

        /// Garment image URL, fetched by the service
        #[arg(long)]
        garment_url: Option<String>,

        /// Extra form fields as name=value
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Submit a job and poll until it finishes
    Async {
        /// Photo of the person
        #[arg(long)]
        person: PathBuf,

        /// Garment image file
        #[arg(long)]
        garment: PathBuf,

        /// Extra form fields as name=value
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

async fn read_image(path: &Path) -> Result<ImagePart, Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image.png")
        .to_string();
    Ok(ImagePart::new(file_name, bytes))
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    telemetry::describe_metrics();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "try-on failed to start");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = ConnectorConfig::from_env()?;
    let connector = TryOnConnector::new(config)?;

    let mut context = CallerContext::new();
    let handle = context.handle();
    let result: Arc<Mutex<Option<ResultOutcome>>> = Arc::new(Mutex::new(None));
    let sink = result.clone();
    let callback = move |outcome: ResultOutcome| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(outcome);
        }
    };

    match cli.command {
        Commands::Sync {
            person,
            garment,
            garment_url,
            fields,
        } => {
            let person = read_image(&person).await?;
            let mut request = match (garment, garment_url) {
                (Some(path), _) => UploadRequest::with_outfit_image(person, read_image(&path).await?),
                (None, Some(url)) => UploadRequest::with_outfit_url(person, url),
                (None, None) => return Err("either --garment or --garment-url is required".into()),
            };
            request.extra_fields.extend(fields);
            if let Some(token) = cli.token {
                request = request.auth_token(token);
            }
            connector.submit_sync(&handle, request, callback);
        }
        Commands::Async {
            person,
            garment,
            fields,
        } => {
            let mut request =
                UploadRequest::with_outfit_image(read_image(&person).await?, read_image(&garment).await?);
            request.extra_fields.extend(fields);
            if let Some(token) = cli.token {
                request = request.auth_token(token);
            }
            connector.submit_async(&handle, request, callback);
        }
    }

    let delivered = tokio::select! {
        _ = tokio::signal::ctrl_c() => None,
        delivered = context.dispatch_next() => Some(delivered),
    };

    match delivered {
        None => {
            tracing::info!("Interrupted, tearing down");
            context.teardown();
            return Ok(ExitCode::from(130));
        }
        Some(None) => return Err("request ended without a result".into()),
        Some(Some(request_id)) => tracing::debug!(request_id = %request_id, "Result delivered"),
    }

    let outcome = result
        .lock()
        .map_err(|_| "result slot poisoned")?
        .take()
        .ok_or("no result delivered")?;

    match outcome {
        ResultOutcome::Success(reference) => {
            println!("{}", reference);
            Ok(ExitCode::SUCCESS)
        }
        ResultOutcome::Failure { kind, message } => {
            eprintln!("{}: {}", kind, message);
            Ok(ExitCode::FAILURE)
        }
    }
}

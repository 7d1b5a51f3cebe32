//! Studio front-end for the gateway: submits a design request, then
//! extracts and downloads whatever image references come back.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Parser, Subcommand};
use elegance_studio::logger;
use elegance_studio::presenter::{export_references, extract_image_references, queued_job};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "studio", about = "Elegance Studio design tools", version)]
struct Cli {
    /// Base URL of the gateway.
    #[arg(long, default_value = "http://localhost:8000")]
    gateway_url: String,

    /// Directory the generated designs are saved into.
    #[arg(long, default_value = "designs")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate design variations from a text description.
    Generate {
        #[arg(long)]
        prompt: String,
        /// Number of variations to request.
        #[arg(long, default_value_t = 2)]
        count: u32,
    },
    /// Replace the background of an uploaded product image.
    Background {
        /// Product image to upload.
        #[arg(long)]
        image: PathBuf,
        /// Description of the new background.
        #[arg(long)]
        prompt: String,
    },
    /// Render a model wearing the uploaded jewelry piece.
    Pose {
        /// Jewelry image to upload.
        #[arg(long)]
        image: PathBuf,
        /// Description of the model.
        #[arg(long)]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv::dotenv();
    if logger::init_with_config(logger::LoggerConfig::new().with_prefix("studio")).is_err() {
        eprintln!("Failed to initialize logger");
    }

    let cli = Cli::parse();

    let (route, body) = match &cli.command {
        Command::Generate { prompt, count } => (
            "/generate-image",
            json!({ "prompt": prompt, "number_of_images": count }),
        ),
        Command::Background { image, prompt } => {
            let input_image = match read_image_as_data_uri(image) {
                Ok(uri) => uri,
                Err(e) => {
                    log::error!("Could not read {}: {}", image.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            (
                "/change-background",
                json!({ "prompt": prompt, "input_image": input_image }),
            )
        }
        Command::Pose { image, prompt } => {
            let input_image = match read_image_as_data_uri(image) {
                Ok(uri) => uri,
                Err(e) => {
                    log::error!("Could not read {}: {}", image.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            (
                "/generate-pose",
                json!({ "prompt": prompt, "input_image": input_image }),
            )
        }
    };

    match submit(&cli.gateway_url, route, &body).await {
        Ok(data) => present(data, &cli.out_dir).await,
        Err(e) => {
            log::error!("Error connecting to gateway: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn submit(gateway_url: &str, route: &str, body: &Value) -> Result<Value, String> {
    let url = format!("{}{}", gateway_url.trim_end_matches('/'), route);
    log::info!("Submitting request to {}", url);

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    let text = response.text().await.map_err(|e| e.to_string())?;

    if !status.is_success() {
        // Show the raw error body inline and keep going.
        log::error!("Gateway returned {}:", status);
        println!("{}", pretty(&text));
        return Err(format!("gateway error {}", status));
    }

    serde_json::from_str(&text).map_err(|e| format!("invalid JSON from gateway: {}", e))
}

async fn present(data: Value, out_dir: &Path) -> ExitCode {
    if let Some(job_id) = queued_job(&data) {
        log::info!("Design generation is queued. Job ID: {}", job_id);
        println!("{}", pretty(&data.to_string()));
        return ExitCode::SUCCESS;
    }

    let references = extract_image_references(&data);
    if references.is_empty() {
        log::warn!("Couldn't automatically extract image URLs from the response:");
        println!("{}", pretty(&data.to_string()));
        return ExitCode::SUCCESS;
    }

    log::info!("Extracted {} image reference(s)", references.len());
    match export_references(&references, out_dir).await {
        Ok(outcome) => {
            for path in &outcome.saved {
                println!("Saved {}", path.display());
            }
            for (reference, reason) in &outcome.failed {
                log::error!("Failed to fetch {}: {}", reference, reason);
            }
            if outcome.saved.is_empty() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            log::error!("Export failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn read_image_as_data_uri(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let subtype = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "jpeg",
        _ => "png",
    };
    Ok(format!(
        "data:image/{};base64,{}",
        subtype,
        BASE64.encode(bytes)
    ))
}

fn pretty(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| raw.to_string())
}

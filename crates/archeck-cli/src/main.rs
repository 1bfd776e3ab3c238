use anyhow::Context;
use archeck_core::{Renderer, Response};
use archeck_runtime::{ApiCredential, InvocationConfig};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            save_response,
        } => {
            let config = config.resolve()?;
            let invocation = archeck_runtime::invoke(&config)
                .await
                .context("guarded model call failed")?;

            if let Some(path) = save_response {
                save_document(&path, &invocation.document)?;
            }
            print_report(&invocation.response)?;
        }
        Commands::Render { file } => {
            let response = Response::from_json_file(&file)
                .with_context(|| format!("reading response {}", file.display()))?;
            print_report(&response)?;
        }
        Commands::CheckConfig { config } => {
            let config = config.resolve()?;
            config.validate().context("invalid configuration")?;
            print_config(&config)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print the report, raw dump included, before surfacing any analysis error.
fn print_report(response: &Response) -> anyhow::Result<()> {
    let report = Renderer::new().report(response);
    print!("{}", report.text);
    if let Some(err) = report.error {
        return Err(err).context("trace analysis failed");
    }
    Ok(())
}

fn save_document(path: &Path, document: &serde_json::Value) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(document)?;
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "Saved response document");
    Ok(())
}

fn print_config(config: &InvocationConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    let timeout = config.timeout()?;
    println!("endpoint: {}", config.endpoint_url());
    println!("timeout: {:?}", timeout);
    if ApiCredential::is_available(&config.api_key_env) {
        println!("credential: {} is set", config.api_key_env);
    } else {
        println!("credential: {} is NOT set", config.api_key_env);
    }
    println!("configuration valid");
    Ok(())
}

use std::path::PathBuf;

use anyhow::Context;
use archeck_runtime::InvocationConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "archeck",
    version,
    about = "Invoke a guarded model and report its automated reasoning trace"
)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug)"
    )]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one guarded request and print the verification report
    Run {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long, help = "Write the raw response document to this file")]
        save_response: Option<PathBuf>,
    },
    /// Render a saved response document without calling the service
    Render {
        file: PathBuf,
    },
    /// Validate and print the effective configuration
    CheckConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[arg(long, help = "YAML or JSON config file")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub model_id: Option<String>,
    #[arg(long)]
    pub guardrail_id: Option<String>,
    #[arg(long, help = "DRAFT or a published version number")]
    pub guardrail_version: Option<String>,
    #[arg(long, conflicts_with = "prompt_file")]
    pub prompt: Option<String>,
    #[arg(long, help = "Read the prompt from a file")]
    pub prompt_file: Option<PathBuf>,
    #[arg(long, help = "Runtime endpoint override")]
    pub endpoint: Option<String>,
    #[arg(long, help = "Request timeout, e.g. 30s or 2m")]
    pub timeout: Option<String>,
}

impl ConfigArgs {
    /// Load the config file (if any) and apply flag overrides on top.
    pub fn resolve(self) -> anyhow::Result<InvocationConfig> {
        let mut config = match &self.config {
            Some(path) => InvocationConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => InvocationConfig::default(),
        };

        if let Some(region) = self.region {
            config.region = region;
        }
        if let Some(model_id) = self.model_id {
            config.model_id = model_id;
        }
        if let Some(guardrail_id) = self.guardrail_id {
            config.guardrail_id = guardrail_id;
        }
        if let Some(version) = self.guardrail_version {
            config.guardrail_version = version;
        }
        if let Some(prompt) = self.prompt {
            config.prompt = prompt;
        }
        if let Some(path) = self.prompt_file {
            config.prompt = std::fs::read_to_string(&path)
                .with_context(|| format!("reading prompt {}", path.display()))?;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = Some(endpoint);
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }

        Ok(config)
    }
}

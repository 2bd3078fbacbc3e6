//! maturity-advisor CLI.
//!
//! Usage:
//!   maturity-advisor assess --input assessment.toml [--output report.md] [--json] [--skip-roadmap] [--phases]
//!   maturity-advisor parse reply.txt
//!   maturity-advisor phases roadmap.md
//!   maturity-advisor catalog

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use maturity_advisor::assessment::{AssessmentInput, DEFAULT_CATALOG};
use maturity_advisor::clients::OpenAiClient;
use maturity_advisor::config::{Config, DEFAULT_LOG_FILTER, RuntimeConfig};
use maturity_advisor::session::Advisor;
use maturity_advisor::{card, json_repair, phases, report};

#[derive(Parser)]
#[command(name = "maturity-advisor")]
#[command(about = "Technology maturity assessment advisor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate cards, a consolidated roadmap and a report for an assessment file
    Assess {
        /// Assessment input (TOML)
        #[arg(long, short)]
        input: PathBuf,
        /// Write the report here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Emit the JSON export instead of Markdown
        #[arg(long)]
        json: bool,
        /// Skip the consolidation request
        #[arg(long)]
        skip_roadmap: bool,
        /// Also request the phased roadmap
        #[arg(long)]
        phases: bool,
    },
    /// Repair and normalize a saved model reply into a card
    Parse { file: PathBuf },
    /// Extract phases and success criteria from saved roadmap prose
    Phases { file: PathBuf },
    /// List categories and sub-capabilities
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    maturity_advisor::load_env();
    let runtime = RuntimeConfig::load_from_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&runtime.log_level)
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Assess {
            input,
            output,
            json,
            skip_roadmap,
            phases,
        } => assess(&input, output.as_deref(), json, skip_roadmap, phases).await,
        Commands::Parse { file } => parse_reply(&file),
        Commands::Phases { file } => extract_phases(&file),
        Commands::Catalog => {
            print_catalog();
            Ok(())
        }
    }
}

async fn assess(
    input: &Path,
    output: Option<&Path>,
    json: bool,
    skip_roadmap: bool,
    with_phases: bool,
) -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let assessment = AssessmentInput::from_toml_str(&content)?.resolve()?;

    let api_key = config.runtime.openai_api_key.clone().unwrap_or_default();
    let client = OpenAiClient::new(&config.provider, api_key)?;
    info!(
        "Using model {} at {}",
        client.model(),
        client.endpoint()
    );
    let advisor = Advisor::new(client, config.generation.clone());

    let mut session = advisor.generate_cards(&assessment).await;
    if !skip_roadmap {
        if session.has_fragments() {
            if let Err(e) = advisor.consolidate(&mut session).await {
                tracing::warn!("Roadmap consolidation failed: {}", e);
            }
        } else {
            info!("No roadmap fragments; skipping consolidation");
        }
    }
    if with_phases {
        advisor.phased_roadmap(&assessment, &mut session).await;
    }

    let rendered = if json {
        report::to_json(&assessment, &session)?
    } else {
        report::render_markdown(&assessment, &session)
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn parse_reply(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let (parsed, strategy) = json_repair::parse_with_strategy(&raw)?;
    info!("Parsed with strategy {:?}", strategy);
    let card = card::normalize(Some(&parsed));
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

fn extract_phases(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    for phase in phases::extract(&text) {
        println!("{}", phase.label);
        for criterion in &phase.criteria {
            println!("  - {}", criterion);
        }
    }
    Ok(())
}

fn print_catalog() {
    for category in DEFAULT_CATALOG {
        println!("{}", category.name);
        for sub in category.sub_capabilities {
            println!("  - {}", sub);
        }
    }
}

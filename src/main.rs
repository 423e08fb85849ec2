//! Mailforge - marketing email campaigns from a local LLM workflow.
//!
//! Plans a campaign, researches the selected products, and writes tone-cycled
//! email variants as text and HTML.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde::Deserialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mailforge::campaign::{self, resolve_products, CampaignInput, EventSink, ProgressEvent};
use mailforge::core::Config;

/// Marketing email campaigns from a local LLM workflow
#[derive(Parser)]
#[command(name = "mailforge")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this configuration file instead of the default locations
    #[arg(short, long, global = true, env = "MAILFORGE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a campaign
    Generate(GenerateArgs),

    /// List the products available for campaigns
    Products {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that the generation provider is reachable
    Status,

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Target segment name
    #[arg(short, long)]
    segment: Option<String>,

    /// Campaign type (e.g. Reactivation, Launch)
    #[arg(short = 't', long)]
    campaign_type: Option<String>,

    /// Product as category:name (repeatable)
    #[arg(short, long = "product")]
    products: Vec<String>,

    /// Variants per tone
    #[arg(short = 'n', long)]
    variants: Option<usize>,

    /// Tone label (repeatable, replaces the configured rotation)
    #[arg(long = "tone")]
    tones: Vec<String>,

    /// Read the campaign from a TOML file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Generation provider (ollama, openai)
    #[arg(long)]
    provider: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

/// Campaign description read with `--input`.
#[derive(Debug, Deserialize)]
struct CampaignFile {
    segment_name: String,
    campaign_type: String,
    products: Vec<String>,
    #[serde(default)]
    variants_per_tone: Option<usize>,
    #[serde(default)]
    tones: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    // Missing .env is fine
    let _ = dotenvy::dotenv();

    match cli.command {
        Commands::Generate(args) => cmd_generate(args, cli.config.as_deref())?,
        Commands::Products { format } => cmd_products(&format, cli.config.as_deref())?,
        Commands::Status => cmd_status(cli.config.as_deref())?,
        Commands::Config { path } => cmd_config(path, cli.config.as_deref())?,
        Commands::Completions { shell } => cmd_completions(shell),
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load(),
    }
}

/// Prints one line per committed node.
struct ConsoleProgress {
    step: AtomicUsize,
}

impl EventSink for ConsoleProgress {
    fn emit(&self, event: ProgressEvent) {
        let step = self.step.fetch_add(1, Ordering::Relaxed) + 1;
        let state = &event.snapshot;
        eprintln!(
            "[{:>3}] {:<17} tone: {:<30} variants: {}/{}",
            step,
            event.node.as_str(),
            state.current_tone,
            state.variants.len(),
            state.quota()
        );
    }
}

/// Run the campaign workflow and write the report.
fn cmd_generate(args: GenerateArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;

    let file = match args.input {
        Some(ref path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Some(
                toml::from_str::<CampaignFile>(&content)
                    .with_context(|| format!("Invalid campaign file {}", path.display()))?,
            )
        }
        None => None,
    };

    let (segment, campaign_type, mut product_specs, mut variants, mut tones) = match file {
        Some(file) => (
            file.segment_name,
            file.campaign_type,
            file.products,
            file.variants_per_tone,
            file.tones,
        ),
        None => (String::new(), String::new(), Vec::new(), None, Vec::new()),
    };

    // Flags win over the campaign file
    let segment = args.segment.unwrap_or(segment);
    let campaign_type = args.campaign_type.unwrap_or(campaign_type);
    if !args.products.is_empty() {
        product_specs = args.products;
    }
    if args.variants.is_some() {
        variants = args.variants;
    }
    if !args.tones.is_empty() {
        tones = args.tones;
    }

    if !tones.is_empty() {
        config.campaign.tones = tones;
    }
    if let Some(variants) = variants {
        config.campaign.variants_per_tone = variants;
    }
    if let Some(provider) = args.provider {
        config.ai.provider = provider;
    }
    if let Some(output) = args.output {
        config.campaign.output_dir = output;
    }
    config.validate()?;

    let products = resolve_products(&config, &product_specs)?;
    let input =
        CampaignInput::new(segment, campaign_type, products, config.campaign.variants_per_tone)?;
    let state = campaign::initial_state(&config, input)?;

    run_campaign(&config, state, args.json)
}

#[cfg(feature = "ai")]
fn run_campaign(config: &Config, state: campaign::CampaignState, json: bool) -> Result<()> {
    use mailforge::core::CancelFlag;

    let provider = mailforge::ai::provider_from_config(&config.ai)?;
    let store = mailforge::retrieval::store_from_config(config)?;

    let cancel = CancelFlag::new();
    cancel.install_ctrlc_handler().context("Failed to install Ctrl+C handler")?;

    let engine = campaign::engine_from_config(config, provider, store)
        .with_cancel_flag(cancel)
        .with_event_sink(Arc::new(ConsoleProgress { step: AtomicUsize::new(0) }));

    eprintln!(
        "Generating {} variant(s) for {}...\n",
        state.quota(),
        state.campaign_info.product_names()
    );

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;
    let finished = match rt.block_on(engine.run(state)) {
        Ok(state) => state,
        Err(err) => {
            eprintln!(
                "\nRun stopped at '{}' with {} of {} variant(s) finalized.",
                err.node,
                err.state.variants.len(),
                err.state.quota()
            );
            return Err(err.into());
        }
    };

    let summary = campaign::write_report(&finished, &config.campaign.output_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "\nGenerated {} variant(s) in {}",
            summary.variant_count,
            config.campaign.output_dir.display()
        );
        for variant in &finished.variants {
            println!("  [{}] {}", variant.tone, variant.content.subject_line.as_str());
        }
    }

    Ok(())
}

#[cfg(not(feature = "ai"))]
fn run_campaign(_config: &Config, _state: campaign::CampaignState, _json: bool) -> Result<()> {
    anyhow::bail!("mailforge was built without the `ai` feature; no generation provider available")
}

/// List the product catalog.
fn cmd_products(format: &str, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&config.catalog)?;
            println!("{json}");
        }
        _ => {
            for category in &config.catalog {
                println!("{}:", category.category);
                for option in &category.options {
                    println!("  {}:{}", category.category, option);
                }
            }
        }
    }

    Ok(())
}

/// Check provider reachability.
#[cfg(feature = "ai")]
fn cmd_status(config_path: Option<&Path>) -> Result<()> {
    use mailforge::ai::GenerationProvider;

    let config = load_config(config_path)?;
    let provider = mailforge::ai::provider_from_config(&config.ai)?;

    let rt = tokio::runtime::Runtime::new()?;
    let available = rt.block_on(provider.is_available());

    println!("Provider:  {}", provider.name());
    println!("Retrieval: {}", config.retrieval.backend);
    if config.retrieval.backend.eq_ignore_ascii_case("memory") {
        match config.retrieval.documents_dir {
            Some(ref dir) => println!("Documents: {}", dir.display()),
            None => println!("Documents: none (research runs without context)"),
        }
    }
    if available {
        println!("Status:    available");
        Ok(())
    } else {
        anyhow::bail!(
            "Provider '{}' is not reachable.\n\
             Start Ollama locally or point [ai] at a running endpoint.",
            provider.name()
        )
    }
}

#[cfg(not(feature = "ai"))]
fn cmd_status(_config_path: Option<&Path>) -> Result<()> {
    anyhow::bail!("mailforge was built without the `ai` feature")
}

/// Show configuration.
fn cmd_config(show_path: bool, config_path: Option<&Path>) -> Result<()> {
    if show_path {
        match config_path {
            Some(path) => println!("{}", path.display()),
            None => {
                if let Some(path) = Config::config_dir() {
                    println!("{}", path.join("config.toml").display());
                }
            }
        }
        return Ok(());
    }

    let config = load_config(config_path)?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "mailforge", &mut io::stdout());
}

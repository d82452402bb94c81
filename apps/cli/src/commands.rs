//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use keywordscout_core::pipeline::{
    Collaborators, ProgressSink, ResearchRequest, run_research,
};
use keywordscout_core::OpenRouterChat;
use keywordscout_embeddings::OpenAiEmbeddings;
use keywordscout_metrics::UnconfiguredAdsProvider;
use keywordscout_shared::{
    AppConfig, DomainContext, ProjectProfile, ResearchParams, RunId, expand_tilde, init_config,
    load_config, validate_api_keys,
};
use keywordscout_sources::{DuckDuckGoSerp, GoogleAutocomplete, SitemapCompetitorMiner};
use keywordscout_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// KeywordScout — turn seed phrases into ranked keyword opportunities.
#[derive(Parser)]
#[command(
    name = "keywordscout",
    version,
    about = "Discover, score, and cluster content-worthy keyword opportunities.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Database path override.
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run keyword research for a domain.
    Research {
        /// Target domain (e.g., acme.io).
        domain: String,

        /// Niche description (e.g., "developer productivity tools").
        #[arg(short, long, default_value = "")]
        niche: String,

        /// Seed keyword (repeatable). Omit to generate seeds.
        #[arg(short, long = "seed")]
        seeds: Vec<String>,

        /// Competitor domain to mine (repeatable).
        #[arg(short, long = "competitor")]
        competitors: Vec<String>,

        /// Site title, if known.
        #[arg(long)]
        title: Option<String>,

        /// Site description, if known.
        #[arg(long)]
        description: Option<String>,
    },

    /// List research runs.
    Runs,

    /// Show persisted keywords for a run.
    Keywords {
        /// Run ID.
        #[arg(long)]
        run: String,

        /// Collapse clusters to their representatives.
        #[arg(long)]
        representatives: bool,
    },

    /// Show the progress log for a run.
    Log {
        /// Run ID.
        #[arg(long)]
        run: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "keywordscout=info",
        1 => "keywordscout=debug",
        _ => "keywordscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Research {
            domain,
            niche,
            seeds,
            competitors,
            title,
            description,
        } => {
            cmd_research(
                &domain,
                &niche,
                seeds,
                competitors,
                title,
                description,
                cli.db.as_deref(),
            )
            .await
        }
        Command::Runs => cmd_runs(cli.db.as_deref()).await,
        Command::Keywords { run, representatives } => {
            cmd_keywords(&run, representatives, cli.db.as_deref()).await
        }
        Command::Log { run } => cmd_log(&run, cli.db.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Resolve the database path from a CLI override or the config default.
fn resolve_db_path(config: &AppConfig, db_flag: Option<&str>) -> Result<PathBuf> {
    let raw = db_flag.unwrap_or(&config.defaults.db_path);
    expand_tilde(raw).map_err(|e| eyre!("invalid database path '{raw}': {e}"))
}

// ---------------------------------------------------------------------------
// research
// ---------------------------------------------------------------------------

async fn cmd_research(
    domain: &str,
    niche: &str,
    seeds: Vec<String>,
    competitors: Vec<String>,
    title: Option<String>,
    description: Option<String>,
    db_flag: Option<&str>,
) -> Result<()> {
    // Validate API keys before doing anything
    let config = load_config()?;
    validate_api_keys(&config)?;

    let context = if title.is_some() || description.is_some() || !seeds.is_empty() {
        DomainContext::Known(ProjectProfile {
            domain: domain.to_string(),
            niche: niche.to_string(),
            title,
            description,
            headings: Vec::new(),
            seed_keywords: seeds,
            competitors,
        })
    } else {
        DomainContext::Raw {
            domain: domain.to_string(),
            niche: niche.to_string(),
            competitors,
        }
    };

    let storage = Storage::open(&resolve_db_path(&config, db_flag)?).await?;

    let collab = Collaborators {
        chat: Arc::new(OpenRouterChat::new(&config.openrouter)?),
        embeddings: Arc::new(OpenAiEmbeddings::new(&config.openai)?),
        autocomplete: Arc::new(GoogleAutocomplete::new()?),
        serp: Arc::new(DuckDuckGoSerp::new()?),
        competitors: Arc::new(SitemapCompetitorMiner::new()?),
        ads: Arc::new(UnconfiguredAdsProvider),
    };

    let request = ResearchRequest {
        context,
        params: ResearchParams::from(&config),
    };

    info!(domain, "starting keyword research");

    let reporter = CliProgress::new();
    let outcome = run_research(&request, &collab, &storage, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Research run completed!");
    println!("  Run ID:     {}", outcome.run_id);
    println!("  Found:      {} candidates", outcome.total_found);
    println!("  Persisted:  {} keywords", outcome.persisted);
    println!("  Clusters:   {}", outcome.clusters);
    println!("  Time:       {:.1}s", outcome.elapsed.as_secs_f64());
    println!();
    println!("  View them:  keywordscout keywords --run {}", outcome.run_id);
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressSink for CliProgress {
    fn stage(&self, message: &str, indent: u8) {
        let padding = "  ".repeat(indent as usize);
        self.spinner.set_message(format!("{padding}{message}"));
    }
}

// ---------------------------------------------------------------------------
// runs / keywords / log
// ---------------------------------------------------------------------------

async fn cmd_runs(db_flag: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let storage = Storage::open(&resolve_db_path(&config, db_flag)?).await?;

    let runs = storage.list_runs().await?;
    if runs.is_empty() {
        println!("No research runs yet. Start one with: keywordscout research <domain>");
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {:<10}  {:<24}  found={}  {}",
            run.id,
            run.status.as_str(),
            run.domain,
            run.total_found,
            run.created_at.format("%Y-%m-%d %H:%M"),
        );
        if let Some(error) = &run.error_message {
            println!("    error: {error}");
        }
    }
    Ok(())
}

async fn cmd_keywords(run: &str, representatives: bool, db_flag: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let storage = Storage::open(&resolve_db_path(&config, db_flag)?).await?;

    let run_id: RunId = run.parse().map_err(|e| eyre!("invalid run id '{run}': {e}"))?;
    let keywords = storage.list_keywords(&run_id, representatives).await?;

    if keywords.is_empty() {
        println!("No keywords for run {run}.");
        return Ok(());
    }

    for kw in keywords {
        let cluster = match (kw.cluster_id, kw.is_representative) {
            (Some(id), true) => format!("  [cluster {id}, {} variants]", kw.cluster_size),
            (Some(id), false) => format!("  [cluster {id}]"),
            (None, _) => String::new(),
        };
        println!(
            "{:>3}  {:<40}  vol={:<6}  diff={:<3}  {}{}",
            kw.opportunity.map_or("-".to_string(), |o| o.to_string()),
            kw.text,
            kw.volume.map_or("-".to_string(), |v| v.to_string()),
            kw.difficulty.map_or("-".to_string(), |d| d.to_string()),
            kw.intent.as_str(),
            cluster,
        );
        if representatives && !kw.cluster_siblings.is_empty() {
            println!("     also: {}", kw.cluster_siblings.join(", "));
        }
    }
    Ok(())
}

async fn cmd_log(run: &str, db_flag: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let storage = Storage::open(&resolve_db_path(&config, db_flag)?).await?;

    let run_id: RunId = run.parse().map_err(|e| eyre!("invalid run id '{run}': {e}"))?;
    let entries = storage.list_progress(&run_id).await?;

    if entries.is_empty() {
        println!("No progress log for run {run}.");
        return Ok(());
    }

    for entry in entries {
        let padding = "  ".repeat(entry.indent as usize);
        println!(
            "{}  {padding}{}",
            entry.time.format("%H:%M:%S"),
            entry.message
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

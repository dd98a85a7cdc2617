//! BrandBuddy - operations decision engine in your terminal
//!
//! Pulls pre-aggregated order, inventory, shipment and returns data from an
//! analytics service, asks a language model for insight cards and tracks the
//! resulting workflows locally.
//!
//! Exit codes:
//!   0 - Success (no cards above threshold, or no --fail-on set)
//!   1 - Runtime error (configuration, connection, state file, etc.)
//!   2 - Insight cards found at or above the --fail-on threshold

mod analytics;
mod cli;
mod config;
mod llm;
mod metrics;
mod models;
mod report;
mod views;
mod workflow;

use analytics::{AnalyticsClient, Pipe, PipeFilters};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{
    Args, Command, FailOnLevel, OutputFormat, PreferencesCommand, WorkflowActionArg,
    WorkflowCommand,
};
use config::{Config, CONFIG_FILE};
use llm::{CompletionClient, InsightGenerator};
use models::{InsightCard, Severity};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use views::{PageContext, PageView};
use workflow::{items, InsightSnapshot, WorkflowAction, WorkflowMetrics, WorkflowStore};

/// Acting user recorded in audit trails when `$USER` is unset.
const DEFAULT_USER: &str = "Current User";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Some(Command::InitConfig)) {
        return handle_init_config(&args);
    }

    // Initialize logging
    init_logging(&args);

    info!("BrandBuddy v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default config at --config or .brandbuddy.toml.
fn handle_init_config(args: &Args) -> Result<()> {
    let path = config_path(args);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            path.display()
        );
        std::process::exit(1);
    }

    write_default_config(&path)?;

    println!("✅ Created {} with default settings.", path.display());
    println!("   Add your analytics token and LLM API key, then run `brandbuddy connection`.");
    Ok(())
}

fn config_path(args: &Args) -> PathBuf {
    args.config.clone().unwrap_or_else(|| CONFIG_FILE.into())
}

fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration, merge flags and dispatch. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    match args.command.clone() {
        Some(Command::Workflows { action }) => run_workflows(&args, &config, action),
        Some(Command::Connection) => run_connection(&args, &config).await,
        Some(Command::Preferences { action }) => run_preferences(&args, config, action),
        Some(Command::Query { pipe, limit }) => run_query(&args, &config, &pipe, limit).await,
        command => run_page(&args, &config, command).await,
    }
}

/// Progress lines go to stderr so stdout carries only the report.
fn progress(args: &Args, message: &str) {
    if !args.quiet {
        eprintln!("{}", message);
    }
}

fn actor() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER.to_string())
}

/// Render and emit a page, then apply --fail-on.
async fn run_page(args: &Args, config: &Config, command: Option<Command>) -> Result<i32> {
    let analytics = AnalyticsClient::new(&config.analytics)?;
    let completion = CompletionClient::new(config.llm.clone())?;
    let generator = InsightGenerator::new(completion, !args.quiet);

    if !analytics.is_configured() {
        warn!("Analytics token is not configured; page data will be unavailable");
    }

    progress(args, "📥 Fetching analytics data...");
    let ctx = PageContext::new(&analytics, &generator, args.brand.clone());

    let mut view = match command {
        Some(Command::Dashboard) => ctx.dashboard().await?,
        Some(Command::Orders { channel }) => ctx.orders(channel).await?,
        Some(Command::Inventory { warehouse, sku }) => ctx.inventory(warehouse, sku).await?,
        Some(Command::Inbound { warehouse, status }) => ctx.inbound(warehouse, status).await?,
        Some(Command::Returns { timeframe, status }) => ctx.returns(timeframe, status).await?,
        Some(Command::Replenishment) => ctx.replenishment().await?,
        Some(Command::Sla { timeframe }) => ctx.sla(timeframe).await?,
        _ => {
            info!("No command given, showing {}", config.preferences.default_view);
            ctx.by_name(&config.preferences.default_view).await?
        }
    };

    publish_cards(
        &config.general.state_dir,
        view.page,
        &mut view.insights,
        args.min_severity,
    );

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&view)?,
        OutputFormat::Markdown => {
            report::generate_page_markdown(&view, &config.preferences, generator.model())
        }
    };
    emit(args, &output)?;

    print_page_summary(args, &view);

    Ok(fail_on_exit_code(args.fail_on, view.max_severity()))
}

fn print_page_summary(args: &Args, view: &PageView) {
    let count = |s: Severity| view.insights.iter().filter(|c| c.severity == s).count();
    progress(
        args,
        &format!(
            "\n📊 {}: {} insight cards | 🔴 Critical: {} | 🟠 High: {} | 🟡 Medium: {} | 🟢 Low: {}",
            view.title,
            view.insights.len(),
            count(Severity::Critical),
            count(Severity::High),
            count(Severity::Medium),
            count(Severity::Low)
        ),
    );
}

/// Remember the cards just shown so `workflows from-insight` can find them.
fn save_snapshot(state_dir: &Path, page: &str, cards: &[InsightCard]) {
    let snapshot = InsightSnapshot {
        page: page.to_string(),
        generated_at: Some(Utc::now()),
        cards: cards.to_vec(),
    };
    if let Err(e) = snapshot.save(state_dir) {
        warn!("Could not save insight cards for later workflows: {}", e);
    }
}

/// Drop cards below --min-severity, then snapshot what is left so
/// `workflows from-insight` only sees cards the user was shown.
fn publish_cards(
    state_dir: &Path,
    page: &str,
    cards: &mut Vec<InsightCard>,
    min_severity: Option<FailOnLevel>,
) {
    if let Some(min_level) = min_severity {
        let min = Severity::from(min_level);
        cards.retain(|c| c.severity >= min);
    }
    save_snapshot(state_dir, page, cards);
}

/// 2 when the highest card reaches the --fail-on level, otherwise 0.
fn fail_on_exit_code(fail_on: Option<FailOnLevel>, highest: Option<Severity>) -> i32 {
    match (fail_on, highest) {
        (Some(fail_level), Some(highest)) if highest >= Severity::from(fail_level) => {
            eprintln!(
                "\n⛔ Insight cards found at or above {:?} severity. Failing (exit code 2).",
                fail_level
            );
            2
        }
        _ => 0,
    }
}

/// Write to --output or stdout.
fn emit(args: &Args, output: &str) -> Result<()> {
    report::write_output(output, args.output.as_deref())?;
    if let Some(ref path) = args.output {
        progress(args, &format!("✅ Saved to: {}", path.display()));
    }
    Ok(())
}

fn run_workflows(args: &Args, config: &Config, action: WorkflowCommand) -> Result<i32> {
    let state_dir = &config.general.state_dir;
    let prefs = &config.preferences;
    let now = Utc::now();
    let mut store = WorkflowStore::open(state_dir)?;

    match action {
        WorkflowCommand::List { status, kind, sort } => {
            let metrics = WorkflowMetrics::from_items(store.items(), now);
            let selected = items::list(store.items(), status, kind, sort);
            let output = match args.format {
                OutputFormat::Json => report::generate_json(&json!({
                    "metrics": metrics,
                    "workflows": selected,
                }))?,
                OutputFormat::Markdown => {
                    report::generate_workflows_markdown(&selected, &metrics, &[], prefs)
                }
            };
            emit(args, &output)?;
            Ok(0)
        }
        WorkflowCommand::Create {
            title,
            description,
            impact,
        } => {
            let item = items::create(&title, &description, impact, &actor(), now);
            let id = store.insert(item).id.clone();
            store.save()?;
            info!("Created workflow {}", id);
            progress(args, &format!("✅ Created workflow {}", id));
            emit_workflow(args, &store, &id, prefs)
        }
        WorkflowCommand::FromInsight { id } => {
            let snapshot = InsightSnapshot::load(state_dir)?;
            let card = snapshot.find(&id)?;
            let item = items::from_insight(card, &actor(), now);
            let workflow_id = store.insert(item).id.clone();
            store.save()?;
            info!("Created workflow {} from insight {}", workflow_id, id);
            progress(
                args,
                &format!("✅ Created workflow {} from insight {}", workflow_id, id),
            );
            emit_workflow(args, &store, &workflow_id, prefs)
        }
        WorkflowCommand::Act { id, action, team } => {
            let action = match action {
                WorkflowActionArg::Acknowledge => WorkflowAction::Acknowledge,
                WorkflowActionArg::Resolve => WorkflowAction::Resolve,
                WorkflowActionArg::Reassign => WorkflowAction::Reassign(team.unwrap_or_default()),
            };
            items::apply(store.get_mut(&id)?, &action, &actor(), now)?;
            store.save()?;
            progress(args, &format!("✅ Updated workflow {}", id));
            emit_workflow(args, &store, &id, prefs)
        }
        WorkflowCommand::Followups => {
            let mut cards = workflow::follow_up_cards(store.items(), now);
            publish_cards(state_dir, "workflows", &mut cards, args.min_severity);

            let metrics = WorkflowMetrics::from_items(store.items(), now);
            let overdue: Vec<_> = store
                .items()
                .iter()
                .filter(|w| w.is_overdue(now))
                .collect();
            let output = match args.format {
                OutputFormat::Json => report::generate_json(&cards)?,
                OutputFormat::Markdown => {
                    report::generate_workflows_markdown(&overdue, &metrics, &cards, prefs)
                }
            };
            emit(args, &output)?;
            let highest = cards.iter().map(|c| c.severity).max();
            Ok(fail_on_exit_code(args.fail_on, highest))
        }
    }
}

fn emit_workflow(
    args: &Args,
    store: &WorkflowStore,
    id: &str,
    prefs: &config::Preferences,
) -> Result<i32> {
    let item = store.get(id)?;
    let output = match args.format {
        OutputFormat::Json => report::generate_json(item)?,
        OutputFormat::Markdown => report::generate_workflow_markdown(item, prefs),
    };
    emit(args, &output)?;
    Ok(0)
}

/// Check both services concurrently.
async fn run_connection(args: &Args, config: &Config) -> Result<i32> {
    let analytics = AnalyticsClient::new(&config.analytics)?;
    let completion = CompletionClient::new(config.llm.clone())?;

    progress(args, "🔌 Testing connections...");
    let (analytics_status, llm_status) =
        futures::future::join(analytics.test_connection(), completion.test_connection()).await;

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&json!({
            "analytics": analytics_status,
            "llm": llm_status,
        }))?,
        OutputFormat::Markdown => {
            report::generate_connection_markdown(&analytics_status, &llm_status)
        }
    };
    emit(args, &output)?;

    if analytics_status.success && llm_status.success {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn run_preferences(args: &Args, mut config: Config, action: PreferencesCommand) -> Result<i32> {
    match action {
        PreferencesCommand::Show => {}
        PreferencesCommand::Set { key, value } => {
            config.preferences.set(&key, &value)?;

            // Only the file's own contents are written back, never merged flags.
            let path = config_path(args);
            let mut on_disk = if path.exists() {
                Config::load(&path)?
            } else {
                Config::default()
            };
            on_disk.preferences.set(&key, &value)?;
            on_disk.save(&path)?;
            progress(
                args,
                &format!("✅ Set {} = {} in {}", key, value, path.display()),
            );
        }
    }

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&config.preferences)?,
        OutputFormat::Markdown => report::generate_preferences_markdown(&config.preferences),
    };
    emit(args, &output)?;
    Ok(0)
}

async fn run_query(args: &Args, config: &Config, pipe: &str, limit: u32) -> Result<i32> {
    let pipe = Pipe::from_name(pipe).with_context(|| format!("Unknown pipe: {}", pipe))?;
    let analytics = AnalyticsClient::new(&config.analytics)?;

    let filters = PipeFilters::new().brand(args.brand.clone()).limit(limit);
    let response = analytics
        .fetch_pipe(pipe, &filters)
        .await
        .map_err(|e| anyhow::anyhow!("{} ({})", analytics::describe_failure(&e), e))?;

    let output = match args.format {
        OutputFormat::Json => report::generate_json(&response)?,
        OutputFormat::Markdown => {
            report::generate_rows_markdown(pipe, &response, &config.preferences)
        }
    };
    emit(args, &output)?;
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

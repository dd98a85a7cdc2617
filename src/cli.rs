//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{Severity, WorkflowStatus, WorkflowType};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// BrandBuddy - operations decision engine in your terminal
///
/// Pulls order, inventory, shipment and returns analytics from your
/// analytics pipes and turns them into insight cards with suggested
/// workflow actions.
///
/// Examples:
///   brandbuddy dashboard
///   brandbuddy orders --channel amazon --format json
///   brandbuddy sla --timeframe 30d --fail-on high
///   brandbuddy workflows list --sort urgency
///   brandbuddy connection
///   brandbuddy init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Analytics service bearer token
    #[arg(long, global = true, env = "BRANDBUDDY_ANALYTICS_TOKEN", hide_env_values = true)]
    pub analytics_token: Option<String>,

    /// Analytics service base URL
    #[arg(long, global = true, env = "BRANDBUDDY_ANALYTICS_URL", value_name = "URL")]
    pub analytics_url: Option<String>,

    /// Text-generation API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Text-generation API base URL (OpenAI compatible)
    #[arg(long, global = true, env = "BRANDBUDDY_LLM_URL", value_name = "URL")]
    pub llm_url: Option<String>,

    /// Model used for insight generation
    #[arg(short, long, global = true, env = "BRANDBUDDY_MODEL")]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds for both services
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Restrict every query to one brand
    #[arg(long, global = true, value_name = "BRAND_ID")]
    pub brand: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .brandbuddy.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for local state (workflow store, last insights)
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, global = true, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the rendered view to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Hide raw row tables
    #[arg(long, global = true)]
    pub compact: bool,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Fail if insight cards at or above this severity are produced
    ///
    /// Useful for scheduled checks. Exit code 2 when threshold is exceeded.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Minimum severity of insight cards to show
    #[arg(long, global = true, value_name = "LEVEL")]
    pub min_severity: Option<FailOnLevel>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Decision overview across orders, inventory and inbound shipments
    Dashboard,

    /// Orders by channel
    Orders {
        /// Only this sales channel
        #[arg(long)]
        channel: Option<String>,
    },

    /// Inventory health by SKU
    Inventory {
        #[arg(long)]
        warehouse: Option<String>,
        #[arg(long)]
        sku: Option<String>,
    },

    /// Inbound shipments and receiving workload
    Inbound {
        #[arg(long)]
        warehouse: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },

    /// Return patterns and processing
    Returns {
        #[arg(long, default_value = "30d")]
        timeframe: Timeframe,
        #[arg(long)]
        status: Option<String>,
    },

    /// Replenishment needs from inbound supply versus stock
    Replenishment,

    /// SLA performance across shipping, returns and receiving
    Sla {
        #[arg(long, default_value = "7d")]
        timeframe: Timeframe,
    },

    /// Locally tracked workflows
    Workflows {
        #[command(subcommand)]
        action: WorkflowCommand,
    },

    /// Test both service connections
    Connection,

    /// Show or change display preferences
    Preferences {
        #[command(subcommand)]
        action: PreferencesCommand,
    },

    /// Print raw rows from one pipe
    Query {
        /// Pipe name, e.g. order_details_mv
        pipe: String,
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Generate a default .brandbuddy.toml configuration file
    InitConfig,
}

#[derive(Subcommand, Debug, Clone)]
pub enum WorkflowCommand {
    /// List workflows with metrics
    List {
        #[arg(long)]
        status: Option<WorkflowStatus>,
        #[arg(long)]
        kind: Option<WorkflowType>,
        #[arg(long, default_value = "impact")]
        sort: WorkflowSort,
    },

    /// Create a workflow by hand
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "0")]
        impact: f64,
    },

    /// Create a workflow from an insight card shown by the last page run
    FromInsight {
        /// Insight card id
        id: String,
    },

    /// Acknowledge, resolve or reassign a workflow
    Act {
        /// Workflow id
        id: String,
        action: WorkflowActionArg,
        /// New assignee for `reassign`
        #[arg(long)]
        team: Option<String>,
    },

    /// Follow-up cards for overdue and idle workflows
    Followups,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PreferencesCommand {
    Show,
    Set { key: String, value: String },
}

/// Output format for rendered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Severity level for --fail-on and --min-severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl From<FailOnLevel> for Severity {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Low => Severity::Low,
            FailOnLevel::Medium => Severity::Medium,
            FailOnLevel::High => Severity::High,
            FailOnLevel::Critical => Severity::Critical,
        }
    }
}

/// Look-back window for date-filtered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Timeframe {
    #[value(name = "7d")]
    Week,
    #[value(name = "30d")]
    Month,
    #[value(name = "90d")]
    Quarter,
    #[value(name = "6m")]
    HalfYear,
    #[value(name = "1y")]
    Year,
    #[value(name = "18m")]
    EighteenMonths,
    #[value(name = "2y")]
    TwoYears,
}

impl Timeframe {
    pub fn days(&self) -> i64 {
        match self {
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Quarter => 90,
            Timeframe::HalfYear => 180,
            Timeframe::Year => 365,
            Timeframe::EighteenMonths => 548,
            Timeframe::TwoYears => 730,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Week => "Last 7 Days",
            Timeframe::Month => "Last 30 Days",
            Timeframe::Quarter => "Last 90 Days",
            Timeframe::HalfYear => "Last 6 Months",
            Timeframe::Year => "Last Year",
            Timeframe::EighteenMonths => "Last 18 Months",
            Timeframe::TwoYears => "Last 2 Years",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WorkflowSort {
    /// Largest financial impact first
    Impact,
    /// Highest priority first
    Urgency,
    /// Oldest first
    Age,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WorkflowActionArg {
    Acknowledge,
    Resolve,
    Reassign,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for url in [&self.analytics_url, &self.llm_url].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("URL must start with 'http://' or 'https://': {}", url));
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(Command::Query { ref pipe, limit }) = self.command {
            if crate::analytics::Pipe::from_name(pipe).is_none() {
                return Err(format!(
                    "Unknown pipe '{}'. Expected one of: {}",
                    pipe,
                    crate::analytics::Pipe::ALL
                        .iter()
                        .map(|p| p.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            if limit == 0 {
                return Err("--limit must be at least 1".to_string());
            }
        }

        if let Some(Command::Workflows {
            action: WorkflowCommand::Create { ref title, .. },
        }) = self.command
        {
            if title.trim().is_empty() {
                return Err("Workflow title cannot be empty".to_string());
            }
        }

        if let Some(Command::Workflows {
            action:
                WorkflowCommand::Act {
                    action: WorkflowActionArg::Reassign,
                    ref team,
                    ..
                },
        }) = self.command
        {
            if team.as_deref().map_or(true, |t| t.trim().is_empty()) {
                return Err("reassign requires --team".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["brandbuddy"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_page_with_global_flags() {
        let args = parse(&["orders", "--channel", "shopify", "--format", "json", "--brand", "b1"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.brand.as_deref(), Some("b1"));
        match args.command {
            Some(Command::Orders { channel }) => assert_eq!(channel.as_deref(), Some("shopify")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_timeframe_values() {
        let args = parse(&["sla", "--timeframe", "18m"]);
        match args.command {
            Some(Command::Sla { timeframe }) => {
                assert_eq!(timeframe, Timeframe::EighteenMonths);
                assert_eq!(timeframe.days(), 548);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(Timeframe::Week.days(), 7);
        assert_eq!(Timeframe::TwoYears.label(), "Last 2 Years");
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = parse(&["dashboard"]);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_url() {
        let mut args = parse(&["dashboard"]);
        args.analytics_url = Some("api.tinybird.co".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_reassign_requires_team() {
        let args = parse(&["workflows", "act", "WF-1", "reassign"]);
        assert!(args.validate().is_err());

        let args = parse(&["workflows", "act", "WF-1", "reassign", "--team", "Supply"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_query_rejects_unknown_pipe() {
        let args = parse(&["query", "order_details_mv", "--limit", "5"]);
        assert!(args.validate().is_ok());

        let args = parse(&["query", "users"]);
        assert!(args.validate().unwrap_err().contains("Unknown pipe"));
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["dashboard"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_fail_on_to_severity() {
        assert_eq!(Severity::from(FailOnLevel::High), Severity::High);
        assert_eq!(Severity::from(FailOnLevel::Low), Severity::Low);
    }
}

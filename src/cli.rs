//! Command-line interface argument parsing for sales-dashboard.
//!
//! - `sales-dashboard show` launches the interactive dashboard
//! - `sales-dashboard report --format json` prints one render pass
//!
//! Connection secrets come from flags, the environment or a `.env` file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::data::SnowflakeConfig;
use crate::error::{DashboardError, DashboardResult};

/// A terminal dashboard for enterprise sales analytics.
#[derive(Parser, Debug)]
#[command(name = "sales-dashboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive dashboard
    Show {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Auto-refresh interval in seconds (0 disables auto-refresh)
        #[arg(short, long, default_value = "0")]
        interval: u64,
    },

    /// Run one render pass and print it to stdout
    Report {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Snowflake session API
    Snowflake,
    /// Local SQLite replica of the reporting views
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Warehouse selection and credentials shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Warehouse backend to query
    #[arg(long, value_enum, env = "DASHBOARD_BACKEND")]
    pub backend: Option<Backend>,

    /// Path to the SQLite replica (sqlite backend)
    #[arg(long, env = "DASHBOARD_SQLITE_PATH")]
    pub sqlite_path: Option<PathBuf>,

    #[arg(long, env = "SNOWFLAKE_USER")]
    pub user: Option<String>,

    #[arg(long, env = "SNOWFLAKE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Account identifier, e.g. `xy12345.eu-west-1`
    #[arg(long, env = "SNOWFLAKE_ACCOUNT")]
    pub account: Option<String>,

    #[arg(long, env = "SNOWFLAKE_WAREHOUSE")]
    pub warehouse: Option<String>,

    #[arg(long, env = "SNOWFLAKE_DATABASE")]
    pub database: Option<String>,

    #[arg(long, env = "SNOWFLAKE_SCHEMA")]
    pub schema: Option<String>,

    #[arg(long, env = "SNOWFLAKE_ROLE")]
    pub role: Option<String>,

    /// Override the account URL (proxies, private links)
    #[arg(long, env = "SNOWFLAKE_URL")]
    pub url: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value = "60")]
    pub timeout: u64,

    /// Log file (defaults to the user cache directory)
    #[arg(long, env = "DASHBOARD_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments, after loading `.env` if present
    pub fn parse_args() -> Self {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();
        Cli::parse()
    }
}

/// Which backend to connect to, with its settings
#[derive(Debug, Clone)]
pub enum WarehouseSettings {
    Snowflake(SnowflakeConfig),
    Sqlite(PathBuf),
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub warehouse: WarehouseSettings,
    pub refresh_interval_secs: u64,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Validate connection arguments; any missing secret is a configuration error
    pub fn from_args(args: ConnectionArgs, interval: u64) -> DashboardResult<Self> {
        let log_file = args.log_file.clone().unwrap_or_else(default_log_file);

        let backend = args.backend.unwrap_or(if args.sqlite_path.is_some() {
            Backend::Sqlite
        } else {
            Backend::Snowflake
        });

        let warehouse = match backend {
            Backend::Sqlite => {
                let path = args.sqlite_path.ok_or_else(|| {
                    DashboardError::Configuration(
                        "--sqlite-path is required for the sqlite backend".to_string(),
                    )
                })?;
                WarehouseSettings::Sqlite(path)
            }
            Backend::Snowflake => WarehouseSettings::Snowflake(snowflake_config(args)?),
        };

        Ok(AppConfig {
            warehouse,
            refresh_interval_secs: interval,
            log_file,
        })
    }
}

fn snowflake_config(args: ConnectionArgs) -> DashboardResult<SnowflakeConfig> {
    let fields = [
        ("SNOWFLAKE_USER", &args.user),
        ("SNOWFLAKE_PASSWORD", &args.password),
        ("SNOWFLAKE_ACCOUNT", &args.account),
        ("SNOWFLAKE_WAREHOUSE", &args.warehouse),
        ("SNOWFLAKE_DATABASE", &args.database),
        ("SNOWFLAKE_SCHEMA", &args.schema),
        ("SNOWFLAKE_ROLE", &args.role),
    ];
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.as_deref().map(str::trim).unwrap_or("").is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::Configuration(format!(
            "missing connection settings: {}",
            missing.join(", ")
        )));
    }

    Ok(SnowflakeConfig {
        user: args.user.unwrap_or_default(),
        password: args.password.unwrap_or_default(),
        account: args.account.unwrap_or_default(),
        warehouse: args.warehouse.unwrap_or_default(),
        database: args.database.unwrap_or_default(),
        schema: args.schema.unwrap_or_default(),
        role: args.role.unwrap_or_default(),
        timeout_secs: args.timeout,
        base_url: args.url,
    })
}

/// `<cache dir>/sales-dashboard/sales-dashboard.log`
fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sales-dashboard")
        .join("sales-dashboard.log")
}

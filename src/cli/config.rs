use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bridge::channel::DEFAULT_REPLY_TIMEOUT;
use crate::service::client::DEFAULT_BASE_URL;
use crate::trace::logger::DEFAULT_TRACE_PATH;

pub const DEFAULT_CONFIG_PATH: &str = "form-filler.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-filler",
    version,
    about = "Discover form fields, ask an analysis service for answers, and fill them in"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Analysis service base URL
    #[arg(long, global = true)]
    pub service_url: Option<String>,

    /// Path to config file (default: form-filler.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the field snapshot of a page file as JSON
    Snapshot {
        /// Page file (JSON page model)
        #[arg(long)]
        page: String,
    },

    /// Fill a page file with answers from the analysis service
    Fill {
        /// Page file (JSON page model)
        #[arg(long)]
        page: String,

        /// Operator comment sent along with the snapshot
        #[arg(long, default_value = "")]
        comment: String,

        /// Where to write the filled page (default: print the report only)
        #[arg(short, long)]
        output: Option<String>,

        /// Seconds to wait for the analysis reply
        #[arg(long)]
        reply_timeout_secs: Option<u64>,
    },

    /// Send one chat message to the analysis service
    Chat {
        /// Message text
        #[arg(long)]
        message: String,
    },

    /// Upload documents to the analysis service
    Upload {
        /// File to upload (repeatable)
        #[arg(long = "file", required = true)]
        files: Vec<String>,

        /// Comment sent with the documents
        #[arg(long, default_value = "")]
        comment: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-filler.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout; unset means no client-side timeout.
    pub timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: default_reply_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default = "default_trace_path")]
    pub path: Option<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            path: default_trace_path(),
        }
    }
}

// Serde default helpers
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_reply_timeout() -> u64 { DEFAULT_REPLY_TIMEOUT.as_secs() }
fn default_trace_path() -> Option<String> { Some(DEFAULT_TRACE_PATH.to_string()) }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "malformed config file, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

//! CLI command definitions

use crate::core::Fields;
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

/// Run the pipeline for a form submission
#[derive(Debug, Args, Clone)]
pub struct FormCommand {
    /// Business id
    #[arg(short, long)]
    pub business: String,

    /// Pipeline key (defaults to the business's default form pipeline)
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Form field (key=value, value parsed as JSON when possible)
    #[arg(short, long, value_parser = parse_key_value)]
    pub field: Vec<(String, Value)>,

    /// Request option (key=value)
    #[arg(short, long, value_parser = parse_key_value)]
    pub option: Vec<(String, Value)>,

    /// JSON object file with form fields; --field entries override it
    #[arg(long)]
    pub fields_file: Option<PathBuf>,

    /// Source tag recorded on the run
    #[arg(long)]
    pub source: Option<String>,

    /// Request id (generated when omitted)
    #[arg(long)]
    pub request_id: Option<String>,

    /// Ask actions to avoid real side effects
    #[arg(long)]
    pub dry_run: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the pipeline mapped to a trigger
#[derive(Debug, Args, Clone)]
pub struct TriggerCommand {
    /// Business id
    #[arg(short, long)]
    pub business: String,

    /// Trigger key, looked up in the business's trigger map
    #[arg(short, long)]
    pub trigger: Option<String>,

    /// Explicit pipeline key (takes precedence over --trigger)
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Payload entry (key=value, value parsed as JSON when possible)
    #[arg(long, value_parser = parse_key_value)]
    pub payload: Vec<(String, Value)>,

    /// Type of the resource that fired the trigger
    #[arg(long)]
    pub resource_type: Option<String>,

    /// CRM board id of the resource
    #[arg(long)]
    pub board_id: Option<i64>,

    /// CRM item id of the resource
    #[arg(long)]
    pub item_id: Option<i64>,

    /// Source tag recorded on the run
    #[arg(long)]
    pub source: Option<String>,

    /// Request id (generated when omitted)
    #[arg(long)]
    pub request_id: Option<String>,

    /// Ask actions to avoid real side effects
    #[arg(long)]
    pub dry_run: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Check businesses and pipelines for dangling references
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List configured businesses
#[derive(Debug, Args, Clone)]
pub struct BusinessesCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show stored jobs
#[derive(Debug, Args, Clone)]
pub struct JobsCommand {
    /// Business id to list jobs for
    #[arg(short, long, required_unless_present = "id")]
    pub business: Option<String>,

    /// Show a single job by id
    #[arg(long, conflicts_with = "business")]
    pub id: Option<String>,

    /// Number of recent jobs to show (0 for all)
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs; the value is JSON when it parses, a plain string otherwise
pub fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid key=value pair: {}", s))?;
    if key.is_empty() {
        return Err(format!("Missing key in: {}", s));
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Collect parsed pairs into a field map; later entries win
pub fn to_fields(pairs: &[(String, Value)]) -> Fields {
    pairs.iter().cloned().collect()
}

//! CRUD command implementations

use clap::Args;
use restbridge_core::{QueryOptions, RestError};
use serde_json::{Map, Value};

use super::{print_json, Target};

/// Record selection shared by find, update and destroy
#[derive(Args, Debug, Clone, Default)]
pub struct Selector {
    /// Address a single record by id
    #[arg(long)]
    pub id: Option<String>,

    /// Criteria as a JSON object, e.g. '{"status":"archived"}'
    #[arg(short = 'w', long = "where")]
    pub where_clause: Option<String>,

    /// Records to skip
    #[arg(long)]
    pub skip: Option<u64>,

    /// Maximum number of records
    #[arg(long)]
    pub limit: Option<u64>,
}

impl Selector {
    /// Build query options from the flags
    pub fn to_options(&self) -> Result<QueryOptions, RestError> {
        let mut options = QueryOptions::new();
        if let Some(raw) = &self.where_clause {
            options = options.with_where(parse_object("--where", raw)?);
        }
        if let Some(id) = &self.id {
            options = options.filter("id", parse_id(id));
        }
        if let Some(skip) = self.skip {
            options = options.with_skip(skip);
        }
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        Ok(options)
    }
}

/// Numeric ids stay numbers, anything else is sent as a string
fn parse_id(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Number(_)) => value,
        _ => Value::String(raw.to_string()),
    }
}

fn parse_object(flag: &str, raw: &str) -> Result<Map<String, Value>, RestError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RestError::Validation(format!("{} must be a JSON object", flag))),
        Err(e) => Err(RestError::Validation(format!("{} is not valid JSON: {}", flag, e))),
    }
}

/// Find command arguments
#[derive(Args, Debug)]
pub struct FindCommand {
    /// Collection name
    pub collection: String,

    #[command(flatten)]
    pub selector: Selector,
}

impl FindCommand {
    pub async fn execute(&self, target: &Target) -> Result<(), RestError> {
        let options = self.selector.to_options()?;
        let (config, adapter) = target.open().await?;
        let identity = target.identity_for(&config, &self.collection)?;

        let records = adapter.find(&identity, &self.collection, options).await?;
        print_json(&records)
    }
}

/// Create command arguments
#[derive(Args, Debug)]
pub struct CreateCommand {
    /// Collection name
    pub collection: String,

    /// Record values as a JSON object
    #[arg(short, long)]
    pub data: String,
}

impl CreateCommand {
    pub async fn execute(&self, target: &Target) -> Result<(), RestError> {
        let values = parse_object("--data", &self.data)?;
        let (config, adapter) = target.open().await?;
        let identity = target.identity_for(&config, &self.collection)?;

        let record = adapter
            .create(&identity, &self.collection, Value::Object(values))
            .await?;
        print_json(&record)
    }
}

/// Update command arguments
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Collection name
    pub collection: String,

    #[command(flatten)]
    pub selector: Selector,

    /// New values as a JSON object
    #[arg(short, long)]
    pub data: String,
}

impl UpdateCommand {
    pub async fn execute(&self, target: &Target) -> Result<(), RestError> {
        let options = self.selector.to_options()?;
        let values = parse_object("--data", &self.data)?;
        let (config, adapter) = target.open().await?;
        let identity = target.identity_for(&config, &self.collection)?;

        let record = adapter
            .update(&identity, &self.collection, options, Value::Object(values))
            .await?;
        print_json(&record)
    }
}

/// Destroy command arguments
#[derive(Args, Debug)]
pub struct DestroyCommand {
    /// Collection name
    pub collection: String,

    #[command(flatten)]
    pub selector: Selector,
}

impl DestroyCommand {
    pub async fn execute(&self, target: &Target) -> Result<(), RestError> {
        let options = self.selector.to_options()?;
        let (config, adapter) = target.open().await?;
        let identity = target.identity_for(&config, &self.collection)?;

        adapter.destroy(&identity, &self.collection, options).await?;
        print_json(&serde_json::json!({ "destroyed": true }))
    }
}

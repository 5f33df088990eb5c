//! Attach command - open or create a lake and show its configuration.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;

use lakehold_catalog::BackendMetadataStore;
use lakehold_catalog::bootstrap::{AttachedLake, BootstrapEnv, BootstrapOutcome, open_lake};
use lakehold_catalog::metadata::CatalogKind;
use lakehold_catalog::options::{LakeOptions, ParamValue};
use lakehold_core::LocalFsBackend;

use crate::{Config, OutputFormat};

/// Arguments for the attach command.
#[derive(Debug, Args)]
pub struct AttachArgs {
    /// Path of the lake's metadata database.
    #[arg()]
    pub metadata_path: String,

    /// Name to attach the lake under (defaults to the metadata file stem).
    #[arg(long)]
    pub name: Option<String>,

    /// Root location of the data files.
    #[arg(long)]
    pub data_path: Option<String>,

    /// Access mode: automatic, read_only or read_write.
    #[arg(long)]
    pub access_mode: Option<String>,

    /// Schema inside the metadata database.
    #[arg(long)]
    pub metadata_schema: Option<String>,

    /// Maximum number of rows inlined into the metadata store.
    #[arg(long)]
    pub inline_rows: Option<u64>,

    /// Open a specific snapshot.
    #[arg(long, conflicts_with = "snapshot_time")]
    pub snapshot_version: Option<u64>,

    /// Open the latest snapshot at or before this RFC 3339 timestamp.
    #[arg(long)]
    pub snapshot_time: Option<String>,

    /// Encrypt data files of a new lake.
    #[arg(long)]
    pub encrypted: bool,

    /// Metadata store parameter, forwarded as-is (repeatable).
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
    pub meta: Vec<(String, String)>,

    /// Treat the metadata store as an external (non-native) catalog.
    #[arg(long)]
    pub non_native: bool,
}

impl AttachArgs {
    /// Returns the lake name.
    #[must_use]
    pub fn lake_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            Path::new(&self.metadata_path)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("lake")
                .to_string()
        })
    }

    /// Returns the attach parameters in the order they apply.
    #[must_use]
    pub fn parameters(&self) -> Vec<(String, ParamValue)> {
        let mut params: Vec<(String, ParamValue)> = Vec::new();
        if let Some(mode) = &self.access_mode {
            params.push(("ACCESS_MODE".into(), mode.as_str().into()));
        }
        if let Some(schema) = &self.metadata_schema {
            params.push(("METADATA_SCHEMA".into(), schema.as_str().into()));
        }
        if let Some(path) = &self.data_path {
            params.push(("DATA_PATH".into(), path.as_str().into()));
        }
        if let Some(rows) = self.inline_rows {
            params.push((
                "DATA_INLINING_ROW_LIMIT".into(),
                ParamValue::Text(rows.to_string()),
            ));
        }
        if let Some(version) = self.snapshot_version {
            params.push((
                "SNAPSHOT_VERSION".into(),
                ParamValue::Text(version.to_string()),
            ));
        }
        if let Some(time) = &self.snapshot_time {
            params.push(("SNAPSHOT_TIME".into(), time.as_str().into()));
        }
        if self.encrypted {
            params.push(("ENCRYPTED".into(), true.into()));
        }
        for (key, value) in &self.meta {
            params.push((format!("META_{key}"), meta_value(value)));
        }
        params
    }

    fn catalog_kind(&self) -> CatalogKind {
        if self.non_native {
            CatalogKind::External
        } else {
            CatalogKind::Native
        }
    }
}

fn parse_meta(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn meta_value(raw: &str) -> ParamValue {
    if let Ok(v) = raw.parse::<i64>() {
        return ParamValue::Integer(v);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => ParamValue::Boolean(true),
        "false" => ParamValue::Boolean(false),
        _ => ParamValue::Text(raw.to_string()),
    }
}

/// Resolved configuration of an attached lake.
#[derive(Debug, Clone, Serialize)]
pub struct AttachReport {
    /// Lake name.
    pub lake: String,
    /// `created` or `loaded`.
    pub outcome: &'static str,
    /// Logical name of the metadata database.
    pub metadata_database: String,
    /// Resolved metadata schema.
    pub metadata_schema: String,
    /// Resolved data path.
    pub data_path: String,
    /// Resolved encryption mode.
    pub encryption: String,
    /// Global tags.
    pub tags: BTreeMap<String, String>,
    /// Per-schema tags, keyed by schema id.
    pub schema_settings: BTreeMap<String, BTreeMap<String, String>>,
    /// Per-table tags, keyed by table id.
    pub table_settings: BTreeMap<String, BTreeMap<String, String>>,
}

impl From<&AttachedLake> for AttachReport {
    fn from(lake: &AttachedLake) -> Self {
        let options = &lake.options;
        Self {
            lake: options.lake_name.clone(),
            outcome: lake.outcome.as_str(),
            metadata_database: options.metadata_database.clone(),
            metadata_schema: options.metadata_schema.clone(),
            data_path: options.data_path.clone(),
            encryption: lake.state.encryption().to_string(),
            tags: sorted(&options.config_options),
            schema_settings: options
                .schema_options
                .iter()
                .map(|(id, overlay)| (id.to_string(), sorted(overlay)))
                .collect(),
            table_settings: options
                .table_options
                .iter()
                .map(|(id, overlay)| (id.to_string(), sorted(overlay)))
                .collect(),
        }
    }
}

fn sorted(overlay: &HashMap<String, String>) -> BTreeMap<String, String> {
    overlay
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Attaches the lake described by `args` and returns its report.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the bootstrap fails.
pub async fn attach(args: &AttachArgs) -> Result<AttachReport> {
    let lake_name = args.lake_name();
    let options = LakeOptions::from_parameters(&lake_name, &args.metadata_path, args.parameters())
        .context("invalid attach options")?;

    let root = if Path::new(&args.metadata_path).is_absolute() {
        "/"
    } else {
        "."
    };
    let store = BackendMetadataStore::new(
        Arc::new(LocalFsBackend::new(root)),
        args.catalog_kind(),
    );
    let mut txn = store.begin();

    let lake = open_lake(options, &BootstrapEnv::default(), &mut txn)
        .await
        .with_context(|| format!("failed to attach lake '{lake_name}'"))?;
    tracing::debug!(outcome = %lake.outcome, "attach finished");
    Ok(AttachReport::from(&lake))
}

/// Execute the attach command.
///
/// # Errors
///
/// Returns an error if attaching fails or the report cannot be rendered.
pub async fn execute(args: AttachArgs, config: &Config) -> Result<()> {
    let report = attach(&args).await?;

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_text(&report),
        OutputFormat::Table => print_table(&report),
    }
    Ok(())
}

fn print_text(report: &AttachReport) {
    println!("Lake: {} ({})", report.lake, format_outcome_colored(report.outcome));
    println!("Metadata database: {}", report.metadata_database);
    println!("Metadata schema: {}", report.metadata_schema);
    println!("Data path: {}", report.data_path);
    println!("Encryption: {}", report.encryption);

    if !report.tags.is_empty() {
        println!();
        println!("Tags:");
        for (key, value) in &report.tags {
            println!("  {key} = {value}");
        }
    }
    for (label, settings) in [
        ("Schema", &report.schema_settings),
        ("Table", &report.table_settings),
    ] {
        for (id, overlay) in settings {
            println!();
            println!("{label} {id}:");
            for (key, value) in overlay {
                println!("  {key} = {value}");
            }
        }
    }
}

fn print_table(report: &AttachReport) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct TagRow {
        #[tabled(rename = "Scope")]
        scope: String,
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    fn scoped(label: &str, settings: &BTreeMap<String, BTreeMap<String, String>>) -> Vec<TagRow> {
        settings
            .iter()
            .flat_map(|(id, overlay)| {
                overlay.iter().map(move |(key, value)| TagRow {
                    scope: format!("{label} {id}"),
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .collect()
    }

    let rows: Vec<TagRow> = report
        .tags
        .iter()
        .map(|(key, value)| TagRow {
            scope: "lake".to_string(),
            key: key.clone(),
            value: value.clone(),
        })
        .chain(scoped("schema", &report.schema_settings))
        .chain(scoped("table", &report.table_settings))
        .collect();

    println!(
        "{} {} -> {}",
        report.lake,
        format_outcome_colored(report.outcome),
        report.data_path
    );
    if rows.is_empty() {
        println!("No tags found");
    } else {
        println!("{}", Table::new(rows));
    }
}

fn format_outcome_colored(outcome: &str) -> String {
    if outcome == BootstrapOutcome::Created.as_str() {
        outcome.green().to_string()
    } else {
        outcome.blue().to_string()
    }
}

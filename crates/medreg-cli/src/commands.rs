use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::{json, Value};
use tracing::debug;

use medreg_gate::{GateConfig, GateResult, RecordGate, Verdict};
use medreg_registry::RecordReader;
use medreg_server::{RegistryServer, ServerConfig, StorageConfig};
use medreg_store::FsRecordStore;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Validate(args) => cmd_validate(args, &cli.format),
        Command::List(args) => cmd_list(args, &cli.format),
        Command::Show(args) => cmd_show(args, &cli.format),
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start the async runtime")
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = serve_config(&args)?;
    println!(
        "{} medreg server on {} (capacity {}, storage {})",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        config.registry.capacity,
        storage_label(&config.storage).cyan(),
    );
    runtime()?.block_on(async { RegistryServer::new(config).await?.serve().await })?;
    Ok(())
}

/// Config file (if any) with command-line overrides applied.
fn serve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = &args.data_dir {
        config.storage = StorageConfig::Fs { root: root.clone() };
    }
    if let Some(capacity) = args.capacity {
        config.registry.capacity = capacity;
    }
    config.validate()?;
    Ok(config)
}

fn storage_label(storage: &StorageConfig) -> String {
    match storage {
        StorageConfig::Memory => "memory".into(),
        StorageConfig::Fs { root } => format!("fs:{}", root.display()),
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn cmd_validate(args: ValidateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let candidate = read_json(&args.file)?;
    let result = validate_record(&candidate)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&validation_json(&candidate, &result))?)
        }
        OutputFormat::Text => {
            for stage in &result.stage_results {
                let mark = if stage.passed { "✓".green() } else { "✗".red() };
                println!("  {} {} ({:?})", mark, stage.stage_name, stage.elapsed);
            }
        }
    }

    match result.verdict {
        Verdict::Accepted => {
            if matches!(format, OutputFormat::Text) {
                println!("{} {} is a valid record", "✓".green().bold(), args.file.display());
            }
            Ok(())
        }
        Verdict::Rejected { stage, reason } => {
            bail!("{} rejected by {stage}: {reason}", args.file.display())
        }
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn validate_record(candidate: &Value) -> anyhow::Result<GateResult> {
    let gate = RecordGate::with_default_stages(GateConfig::default())?;
    let result = gate.evaluate(candidate)?;
    debug!(accepted = result.is_accepted(), stages = result.stage_results.len(), "evaluated record");
    Ok(result)
}

fn validation_json(candidate: &Value, result: &GateResult) -> Value {
    let stages: Vec<Value> = result
        .stage_results
        .iter()
        .map(|s| json!({ "stage": s.stage_name, "passed": s.passed, "reason": s.reason }))
        .collect();
    json!({
        "valid": result.is_accepted(),
        "recordId": candidate.get("recordId"),
        "reason": result.rejection_reason(),
        "stages": stages,
    })
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn open_reader(store: &StoreArgs) -> anyhow::Result<RecordReader> {
    debug!(data_dir = %store.data_dir.display(), namespace = %store.namespace, "opening record store read-only");
    let fs = FsRecordStore::open_read_only(&store.data_dir, &store.namespace)?;
    Ok(RecordReader::new(Arc::new(fs)))
}

fn cmd_list(args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let reader = open_reader(&args.store)?;
    let ids = runtime()?.block_on(reader.list_ids())?;

    match format {
        OutputFormat::Json => println!("{}", json!({ "children": ids })),
        OutputFormat::Text => {
            if ids.is_empty() {
                println!("No records in {}.", args.store.namespace.bold());
            }
            for id in &ids {
                println!("{}", id.as_str().yellow());
            }
        }
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let record = fetch_record(&args)?;
    match format {
        OutputFormat::Json => println!("{record}"),
        OutputFormat::Text => {
            println!("Record {}", args.id.yellow().bold());
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }
    Ok(())
}

fn fetch_record(args: &ShowArgs) -> anyhow::Result<Value> {
    let reader = open_reader(&args.store)?;
    match runtime()?.block_on(reader.fetch(&args.id))? {
        Some(record) => Ok(record),
        None => bail!("no record {} in {}", args.id, args.store.namespace),
    }
}

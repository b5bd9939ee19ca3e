use anyhow::{Context, Result, bail};
use sendeplan_pipeline::config::PlanConfig;
use sendeplan_pipeline::processor::{HeaderClassifier, ScheduleAssembler};
use sendeplan_pipeline::table::SheetTable;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const CONFIG_PATH: &str = "src/configs/sendeplan.toml";

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("🚀 Starting Sende- & Belieferungsplan pipeline");

    let config = if Path::new(CONFIG_PATH).exists() {
        PlanConfig::from_file(CONFIG_PATH)
            .with_context(|| format!("Failed to load configuration from {}", CONFIG_PATH))?
    } else {
        warn!("Config file not found at {}, using defaults", CONFIG_PATH);
        PlanConfig::default()
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let rows_path = args.first().cloned().unwrap_or(config.io.rows_path.clone());
    let output_path = args.get(1).cloned().unwrap_or(config.io.output_path.clone());

    info!("Loading customer rows from {}", rows_path);
    let raw = fs::read_to_string(&rows_path)
        .with_context(|| format!("Failed to read customer rows from {}", rows_path))?;
    let records: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of row objects", rows_path))?;

    let table = SheetTable::from_json_records(&records)?;
    info!(
        "Materialized sheet with {} rows, {} columns",
        table.height(),
        table.columns().len()
    );

    let missing: Vec<&String> = config
        .io
        .required_columns
        .iter()
        .filter(|c| !table.has_column(c))
        .collect();
    if !missing.is_empty() {
        bail!("Required columns missing from sheet: {:?}", missing);
    }

    let classifier = HeaderClassifier::new()?;
    let maps = classifier.classify(table.columns())?;
    info!(
        "Recognized sources: {} B-column keys, {} plain-triplet keys, {} DS keys",
        maps.b_columns.len(),
        maps.triplets.len(),
        maps.supplementary.len()
    );
    if maps.b_columns.is_empty() && maps.triplets.is_empty() && maps.supplementary.is_empty() {
        warn!("⚠️ No schedule columns recognized; output will only carry identity data");
    }

    let assembler = ScheduleAssembler::new(&config.labels.plan_type, &config.labels.business_area)?;
    let records = assembler.assemble_all(&table, &maps);

    let json = serde_json::to_string_pretty(&records)?;
    if let Some(parent) = Path::new(&output_path).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, json)
        .with_context(|| format!("Failed to write plan data to {}", output_path))?;

    info!(
        "✅ {} customers embedded, plan data written to {}",
        records.len(),
        output_path
    );

    Ok(())
}

use anyhow::Result;
use sendeplan_pipeline::processor::HeaderClassifier;
use sendeplan_pipeline::table::SheetTable;
use serde_json::Value;
use std::env;
use std::fs;

fn main() -> Result<()> {
    println!("=== DEBUGGING HEADER CLASSIFICATION ===\n");

    // Use the sheet given on the command line, or a built-in sample that
    // triggers all three dialect families at once.
    let columns: Vec<String> = match env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path)?;
            let records: Vec<Value> = serde_json::from_str(&raw)?;
            let table = SheetTable::from_json_records(&records)?;
            table.columns().to_vec()
        }
        None => [
            "Nr",
            "SAP-Nr.",
            "Name",
            "Mo 21 Zeit",
            "Mo 21 Sort",
            "Mo 21 Tag",
            "Mo Z 1011 B_Di",
            "Mo 1011 B_Di",
            "Donn 21 Zeit",
            "Donn 21 Sort",
            "DS Fr zu Mi Zeit",
            "DS Fr zu Mi Sort",
            "DS Fr zu Mi Tag",
            "So 21 Zeit",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    };

    println!("1. Header row ({} columns):", columns.len());
    for c in &columns {
        println!("   {}", c);
    }

    let classifier = HeaderClassifier::new()?;
    let maps = classifier.classify(&columns)?;

    println!("\n2. B-column keys ({}):", maps.b_columns.len());
    for ((day, group, order_day), triple) in &maps.b_columns {
        println!(
            "   {:?} / {} / {:?} -> zeit={} sort={} l={:?}",
            day, group, order_day, triple.time_col, triple.assortment_col, triple.override_col
        );
    }

    println!("\n3. Plain triplets ({}):", maps.triplets.len());
    for ((day, group), triple) in &maps.triplets {
        println!(
            "   {:?} / {} -> zeit={} sort={} tag={:?}",
            day, group, triple.time_col, triple.assortment_col, triple.order_day_col
        );
    }

    println!("\n4. DS keys ({}):", maps.supplementary.len());
    for (key, triple) in &maps.supplementary {
        println!(
            "   {} (liefertag {:?}) -> zeit={} sort={} tag={}",
            key, triple.delivery_day, triple.time_col, triple.assortment_col, triple.order_day_col
        );
    }

    let recognized = maps.b_columns.len() * 2 + maps.triplets.len() * 2 + maps.supplementary.len() * 3;
    println!(
        "\n5. Roughly {} of {} columns participate in a usable triple",
        recognized,
        columns.len()
    );

    Ok(())
}

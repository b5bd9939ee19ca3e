use anyhow::Result;
use sendeplan_pipeline::models::{CanonicalGroup, Source, Weekday};
use sendeplan_pipeline::processor::{HeaderClassifier, ScheduleAssembler};
use sendeplan_pipeline::table::SheetTable;
use serde_json::json;

fn main() -> Result<()> {
    println!("=== TESTING FULL SENDEPLAN PIPELINE ===\n");

    // One sheet exercising all three dialects plus tours and identity.
    let records = vec![
        json!({
            "Nr": "41391",
            "SAP-Nr.": 700123.0,
            "Name": "Metzgerei Muster",
            "Strasse": "Hauptstr. 1",
            "Plz": 97070.0,
            "Ort": "Würzburg",
            "Fachberater": "M. Beispiel",
            "Mo": 1001.0,
            "Mo 21 Zeit": "18:00",
            "Mo 21 Sort": "Fleisch- und Wurstwaren",
            "Mo 21 Tag": "Freitag",
        }),
        json!({
            "Nr": "5001",
            "Name": "Landmarkt Süd",
            "Mo Z 1011 B_Di": "09:30:00",
            "Mo 1011 B_Di": "Wiesenhof Geflügel",
            "DS Fr zu Mi Zeit": "10:00",
            "DS Fr zu Mi Sort": "Tiefkühl",
            "DS Fr zu Mi Tag": "Donnerstag",
        }),
        json!({
            // Blank schedule cells: the (day, group) yields no entries.
            "Nr": "5002",
            "Name": "Leerer Kunde",
            "Mo Z 1011 B_Di": "",
            "Mo 1011 B_Di": null,
        }),
        json!({
            // No customer number: skipped entirely.
            "Nr": "",
            "Name": "Ohne Schlüssel",
        }),
    ];

    let table = SheetTable::from_json_records(&records)?;
    println!(
        "1. Sheet: {} rows, {} columns",
        table.height(),
        table.columns().len()
    );

    let maps = HeaderClassifier::new()?.classify(table.columns())?;
    println!(
        "2. Classified: {} B-keys, {} triplets, {} DS keys",
        maps.b_columns.len(),
        maps.triplets.len(),
        maps.supplementary.len()
    );
    assert_eq!(maps.b_columns.len(), 1);
    assert_eq!(maps.triplets.len(), 1);
    assert_eq!(maps.supplementary.len(), 1);

    let assembler = ScheduleAssembler::new("Standard", "Alle Sortimente Fleischwerk")?;
    let plans = assembler.assemble_all(&table, &maps);
    println!("3. Assembled {} customer records", plans.len());
    assert_eq!(plans.len(), 3);

    // Scenario: plain triplet.
    let c = &plans["41391"];
    assert_eq!(c.entries.len(), 1);
    let e = &c.entries[0];
    assert_eq!(e.delivery_day, Weekday::Monday);
    assert_eq!(e.assortment, "Fleisch- und Wurstwaren");
    assert_eq!(e.order_day, "Freitag");
    assert_eq!(e.cutoff, "18:00 Uhr");
    assert_eq!(e.group, CanonicalGroup::MeatAndSausage);
    assert_eq!(e.priority, 0);
    assert_eq!(c.tours[&Weekday::Monday], "1001");
    assert_eq!(c.sap_number, "700123");
    println!("   41391 ok: {} / {} / {}", e.assortment, e.order_day, e.cutoff);

    // Scenario: B-columns with header-embedded order day, plus DS block.
    let c = &plans["5001"];
    assert_eq!(c.entries.len(), 2);
    let b = &c.entries[0];
    assert_eq!(b.source, Source::BColumns);
    assert_eq!(b.delivery_day, Weekday::Monday);
    assert_eq!(b.order_day, "Dienstag");
    assert_eq!(b.cutoff, "09:30 Uhr");
    assert_eq!(b.group, CanonicalGroup::WiesenhofPoultry);
    let ds = &c.ds[0];
    assert_eq!(ds.ds_key.as_deref(), Some("DS Fr → Mi"));
    assert_eq!(ds.delivery_day, Weekday::Friday);
    println!("   5001 ok: 1 B entry + {} DS entry", c.ds.len());

    // Scenario: blank cells suppress the entry entirely.
    assert!(plans["5002"].entries.is_empty());
    println!("   5002 ok: empty schedule suppressed");

    // Output boundary: plain nested key/value JSON under template names.
    let doc = serde_json::to_value(&plans)?;
    assert_eq!(doc["41391"]["bestell"][0]["liefertag"], "Montag");
    assert_eq!(doc["41391"]["bestell"][0]["bestellschluss"], "18:00 Uhr");
    assert_eq!(doc["5001"]["ds"][0]["ds_key"], "DS Fr → Mi");
    assert_eq!(doc["41391"]["plan_typ"], "Standard");
    println!("4. Renderer JSON contract ok");

    println!("\n✅ Full pipeline behaves as expected");
    Ok(())
}

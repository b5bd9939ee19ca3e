use crate::models::{CustomerRecord, Weekday};
use crate::processor::header_classifier::ClassifiedColumns;
use crate::processor::row_extractor::{RowExtractor, normalize_cell};
use crate::table::{SheetRow, SheetTable};
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const CUSTOMER_NUMBER_COL: &str = "Nr";
pub const SAP_NUMBER_COL: &str = "SAP-Nr.";
pub const NAME_COL: &str = "Name";
pub const STREET_COL: &str = "Strasse";
pub const POSTCODE_COL: &str = "Plz";
pub const CITY_COL: &str = "Ort";
pub const FAX_COL: &str = "Fax";
pub const ADVISOR_COL: &str = "Fachberater";

/// Fixed tour/route columns, one per weekday. These short names are a
/// separate convention from the schedule-dialect day tokens.
pub const TOUR_COLS: [(Weekday, &str); 6] = [
    (Weekday::Monday, "Mo"),
    (Weekday::Tuesday, "Die"),
    (Weekday::Wednesday, "Mitt"),
    (Weekday::Thursday, "Don"),
    (Weekday::Friday, "Fr"),
    (Weekday::Saturday, "Sam"),
];

/// Composes the final per-customer record: extractor output from all
/// three dialects, sorted per delivery day by (dialect priority, display
/// priority, encounter order), plus identity, address and tour fields.
pub struct ScheduleAssembler {
    extractor: RowExtractor,
    plan_type: String,
    business_area: String,
}

impl ScheduleAssembler {
    pub fn new(plan_type: &str, business_area: &str) -> Result<Self> {
        Ok(ScheduleAssembler {
            extractor: RowExtractor::new()?,
            plan_type: plan_type.to_string(),
            business_area: business_area.to_string(),
        })
    }

    /// Assemble one customer row. Returns None when the row has no
    /// customer number: such a row cannot be addressed later and is
    /// skipped entirely.
    pub fn assemble(&self, row: &SheetRow, maps: &ClassifiedColumns) -> Option<CustomerRecord> {
        let customer_number = normalize_cell(row.get(CUSTOMER_NUMBER_COL));
        if customer_number.is_empty() {
            return None;
        }

        let mut entries = self.extractor.extract_entries(row, maps);
        // Stable sort keeps first-encountered order within equal keys.
        entries.sort_by_key(|e| {
            (
                e.delivery_day.delivery_index(),
                e.source.priority(),
                e.priority,
            )
        });
        let ds = entries
            .iter()
            .filter(|e| e.is_supplementary())
            .cloned()
            .collect();

        let mut tours = BTreeMap::new();
        for (day, col) in TOUR_COLS {
            tours.insert(day, normalize_cell(row.get(col)));
        }

        Some(CustomerRecord {
            plan_type: self.plan_type.clone(),
            business_area: self.business_area.clone(),
            customer_number,
            sap_number: normalize_cell(row.get(SAP_NUMBER_COL)),
            name: normalize_cell(row.get(NAME_COL)),
            street: normalize_cell(row.get(STREET_COL)),
            postcode: normalize_cell(row.get(POSTCODE_COL)),
            city: normalize_cell(row.get(CITY_COL)),
            fax: normalize_cell(row.get(FAX_COL)),
            advisor: normalize_cell(row.get(ADVISOR_COL)),
            tours,
            entries,
            ds,
        })
    }

    /// Run the whole batch. The classified maps are built once and shared
    /// read-only across rows; rows have no interdependency.
    pub fn assemble_all(
        &self,
        table: &SheetTable,
        maps: &ClassifiedColumns,
    ) -> BTreeMap<String, CustomerRecord> {
        let mut records = BTreeMap::new();
        let mut skipped = 0usize;

        for (index, row) in table.rows().enumerate() {
            match self.assemble(&row, maps) {
                Some(record) => {
                    records.insert(record.customer_number.clone(), record);
                }
                None => {
                    skipped += 1;
                    warn!("Skipping row {} without customer number", index);
                }
            }
        }

        info!(
            "Assembled {} customer records ({} rows skipped)",
            records.len(),
            skipped
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalGroup, Source};
    use crate::processor::header_classifier::HeaderClassifier;
    use serde_json::json;

    fn assembler() -> ScheduleAssembler {
        ScheduleAssembler::new("Standard", "Alle Sortimente Fleischwerk").unwrap()
    }

    fn setup(records: &[serde_json::Value]) -> (SheetTable, ClassifiedColumns) {
        let table = SheetTable::from_json_records(records).unwrap();
        let maps = HeaderClassifier::new()
            .unwrap()
            .classify(table.columns())
            .unwrap();
        (table, maps)
    }

    #[test]
    fn test_end_to_end_plain_triplet() {
        let (table, maps) = setup(&[json!({
            "Nr": "41391",
            "Mo 21 Zeit": "18:00",
            "Mo 21 Sort": "Fleisch- und Wurstwaren",
            "Mo 21 Tag": "Freitag",
        })]);

        let records = assembler().assemble_all(&table, &maps);
        let record = records.get("41391").unwrap();
        assert_eq!(record.entries.len(), 1);

        let e = &record.entries[0];
        assert_eq!(e.delivery_day, Weekday::Monday);
        assert_eq!(e.assortment, "Fleisch- und Wurstwaren");
        assert_eq!(e.order_day, "Freitag");
        assert_eq!(e.cutoff, "18:00 Uhr");
        assert_eq!(e.group, CanonicalGroup::MeatAndSausage);
        assert_eq!(e.priority, 0);
    }

    #[test]
    fn test_end_to_end_b_columns() {
        let (table, maps) = setup(&[json!({
            "Nr": "5001",
            "Mo Z 1011 B_Di": "09:30",
            "Mo 1011 B_Di": "Wiesenhof Geflügel",
        })]);

        let records = assembler().assemble_all(&table, &maps);
        let e = &records.get("5001").unwrap().entries[0];
        assert_eq!(e.delivery_day, Weekday::Monday);
        assert_eq!(e.order_day, "Dienstag");
        assert_eq!(e.cutoff, "09:30 Uhr");
        assert_eq!(e.group, CanonicalGroup::WiesenhofPoultry);
    }

    #[test]
    fn test_rows_without_customer_number_are_skipped() {
        let (table, maps) = setup(&[
            json!({"Nr": "", "Name": "kein Schlüssel"}),
            json!({"Nr": "77", "Name": "Metzgerei"}),
        ]);

        let records = assembler().assemble_all(&table, &maps);
        assert_eq!(records.len(), 1);
        assert!(records.contains_key("77"));
    }

    #[test]
    fn test_per_day_ordering() {
        // Same delivery day fed from all three dialects. Expected order:
        // B-columns by group priority, then the plain triplet, then DS.
        let (table, maps) = setup(&[json!({
            "Nr": "9",
            // Unknown assortment via B-columns.
            "Mo Z 7 B_Fr": "08:00",
            "Mo 7 B_Fr": "Spezialartikel",
            // Wiesenhof via B-columns, must print before the unknown one.
            "Mo Z 1011 B_Di": "09:30",
            "Mo 1011 B_Di": "Wiesenhof Geflügel",
            // Meat via the plain dialect: lower group priority but later
            // dialect, so it follows every B-column entry.
            "Mo 21 Zeit": "18:00",
            "Mo 21 Sort": "Fleisch- und Wurstwaren",
            "Mo 21 Tag": "Freitag",
            // DS, sorted last.
            "DS Mo zu Di Zeit": "10:00",
            "DS Mo zu Di Sort": "Tiefkühl",
            "DS Mo zu Di Tag": "Montag",
        })]);

        let records = assembler().assemble_all(&table, &maps);
        let entries = &records.get("9").unwrap().entries;
        let order: Vec<(&str, Source)> = entries
            .iter()
            .map(|e| (e.assortment.as_str(), e.source))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Wiesenhof Geflügel", Source::BColumns),
                ("Spezialartikel", Source::BColumns),
                ("Fleisch- und Wurstwaren", Source::PlainTriplet),
                ("Tiefkühl", Source::Supplementary),
            ]
        );
    }

    #[test]
    fn test_ds_entries_exposed_both_ways() {
        let (table, maps) = setup(&[json!({
            "Nr": "12",
            "DS Fr zu Mi Zeit": "10:00",
            "DS Fr zu Mi Sort": "Tiefkühl",
            "DS Fr zu Mi Tag": "Donnerstag",
        })]);

        let records = assembler().assemble_all(&table, &maps);
        let record = records.get("12").unwrap();
        // Tagged in the merged list and mirrored in the ds block.
        assert_eq!(record.entries.len(), 1);
        assert!(record.entries[0].is_supplementary());
        assert_eq!(record.ds, record.entries);
        assert_eq!(record.ds[0].ds_key.as_deref(), Some("DS Fr → Mi"));
    }

    #[test]
    fn test_tours_and_identity_fields() {
        let (table, maps) = setup(&[json!({
            "Nr": "88130",
            "SAP-Nr.": 123456.0,
            "Name": "Metzgerei  Muster",
            "Strasse": "Hauptstr. 1",
            "Plz": 97070.0,
            "Ort": "Würzburg",
            "Fachberater": "M. Beispiel",
            "Mo": 1001.0,
            "Fr": "1002.0",
        })]);

        let records = assembler().assemble_all(&table, &maps);
        let record = records.get("88130").unwrap();
        assert_eq!(record.sap_number, "123456");
        assert_eq!(record.name, "Metzgerei Muster");
        assert_eq!(record.postcode, "97070");
        assert_eq!(record.advisor, "M. Beispiel");
        assert_eq!(record.tours[&Weekday::Monday], "1001");
        assert_eq!(record.tours[&Weekday::Friday], "1002");
        // Days without a tour column value stay blank, not absent.
        assert_eq!(record.tours[&Weekday::Tuesday], "");
        assert_eq!(record.tours.len(), 6);
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let (table, maps) = setup(&[json!({
            "Nr": "41391",
            "Mo 21 Zeit": "18:00",
            "Mo 21 Sort": "Fleisch- und Wurstwaren",
            "Mo 21 Tag": "Freitag",
            "Mo Z 1011 B_Di": "09:30",
            "Mo 1011 B_Di": "Wiesenhof Geflügel",
        })]);

        let asm = assembler();
        let row = table.rows().next().unwrap();
        let first = asm.assemble(&row, &maps).unwrap();
        let second = asm.assemble(&row, &maps).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_record_serializes_to_template_contract() {
        let (table, maps) = setup(&[json!({
            "Nr": "41391",
            "Name": "Metzgerei Muster",
            "Mo 21 Zeit": "18:00",
            "Mo 21 Sort": "Fleisch- und Wurstwaren",
            "Mo 21 Tag": "Freitag",
        })]);

        let records = assembler().assemble_all(&table, &maps);
        let json = serde_json::to_value(&records).unwrap();
        let c = &json["41391"];
        assert_eq!(c["plan_typ"], "Standard");
        assert_eq!(c["bereich"], "Alle Sortimente Fleischwerk");
        assert_eq!(c["kunden_nr"], "41391");
        assert_eq!(c["bestell"][0]["liefertag"], "Montag");
        assert_eq!(c["bestell"][0]["bestellschluss"], "18:00 Uhr");
        assert_eq!(c["tours"]["Montag"], "");
        assert!(c["ds"].as_array().unwrap().is_empty());
    }
}

use crate::models::{ScheduleEntry, Source, SUPPLEMENTARY_PRIORITY, Weekday};
use crate::processor::group_canonicalizer::GroupCanonicalizer;
use crate::processor::header_classifier::ClassifiedColumns;
use crate::table::{CellValue, SheetRow};
use anyhow::Result;
use regex::Regex;

/// Turns one customer row plus the classified column maps into the raw
/// list of schedule entries, one dialect family at a time. Value
/// normalization and empty-entry suppression happen here; display
/// ordering is the assembler's job.
pub struct RowExtractor {
    canonicalizer: GroupCanonicalizer,
    time_hm_rx: Regex,
    hour_only_rx: Regex,
}

impl RowExtractor {
    pub fn new() -> Result<Self> {
        Ok(RowExtractor {
            canonicalizer: GroupCanonicalizer::new(),
            time_hm_rx: Regex::new(r"^(\d{1,2}):(\d{2})$")?,
            hour_only_rx: Regex::new(r"^(\d{1,2})$")?,
        })
    }

    pub fn extract_entries(&self, row: &SheetRow, maps: &ClassifiedColumns) -> Vec<ScheduleEntry> {
        let mut entries = Vec::new();
        self.extract_b_columns(row, maps, &mut entries);
        self.extract_plain_triplets(row, maps, &mut entries);
        self.extract_supplementary(row, maps, &mut entries);
        entries
    }

    /// B-dialect: order day comes from the header token unless the "L"
    /// override column carries a value for this row.
    fn extract_b_columns(
        &self,
        row: &SheetRow,
        maps: &ClassifiedColumns,
        entries: &mut Vec<ScheduleEntry>,
    ) {
        for day in Weekday::ALL {
            let mut keys: Vec<_> = maps
                .b_columns
                .keys()
                .filter(|(d, _, _)| *d == day)
                .collect();
            keys.sort_by(|a, b| {
                (group_sort_key(&a.1), a.2.delivery_index())
                    .cmp(&(group_sort_key(&b.1), b.2.delivery_index()))
            });

            for key in keys {
                let triple = &maps.b_columns[key];
                let assortment = normalize_cell(row.get(&triple.assortment_col));
                let cutoff = self.normalize_time(row.get(&triple.time_col));
                let override_day = triple
                    .override_col
                    .as_deref()
                    .map(|col| normalize_cell(row.get(col)))
                    .unwrap_or_default();

                // The header-embedded order day is always present, so only
                // cell-sourced values count toward suppression here.
                if assortment.is_empty() && cutoff.is_empty() && override_day.is_empty() {
                    continue;
                }

                let order_day = if override_day.is_empty() {
                    key.2.german_name().to_string()
                } else {
                    override_day
                };

                entries.push(self.build_entry(
                    day,
                    assortment,
                    order_day,
                    cutoff,
                    Source::BColumns,
                    None,
                ));
            }
        }
    }

    fn extract_plain_triplets(
        &self,
        row: &SheetRow,
        maps: &ClassifiedColumns,
        entries: &mut Vec<ScheduleEntry>,
    ) {
        for day in Weekday::ALL {
            let mut groups: Vec<_> = maps
                .triplets
                .keys()
                .filter(|(d, _)| *d == day)
                .map(|(_, g)| g)
                .collect();
            groups.sort_by_key(|g| group_sort_key(g));

            for group in groups {
                let triple = &maps.triplets[&(day, group.clone())];
                let assortment = normalize_cell(row.get(&triple.assortment_col));
                let cutoff = self.normalize_time(row.get(&triple.time_col));
                let order_day = triple
                    .order_day_col
                    .as_deref()
                    .map(|col| normalize_cell(row.get(col)))
                    .unwrap_or_default();

                if assortment.is_empty() && cutoff.is_empty() && order_day.is_empty() {
                    continue;
                }

                entries.push(self.build_entry(
                    day,
                    assortment,
                    order_day,
                    cutoff,
                    Source::PlainTriplet,
                    None,
                ));
            }
        }
    }

    /// DS dialect: when the header route named no day, the delivery day is
    /// resolved from the order-day cell; an entry whose day stays
    /// unresolvable is dropped rather than defaulted.
    fn extract_supplementary(
        &self,
        row: &SheetRow,
        maps: &ClassifiedColumns,
        entries: &mut Vec<ScheduleEntry>,
    ) {
        for triple in maps.supplementary.values() {
            let assortment = normalize_cell(row.get(&triple.assortment_col));
            let cutoff = self.normalize_time(row.get(&triple.time_col));
            let order_day = normalize_cell(row.get(&triple.order_day_col));

            if assortment.is_empty() && cutoff.is_empty() && order_day.is_empty() {
                continue;
            }

            let delivery_day = triple
                .delivery_day
                .or_else(|| Weekday::from_any_token(&order_day));
            let Some(delivery_day) = delivery_day else {
                continue;
            };

            entries.push(self.build_entry(
                delivery_day,
                assortment,
                order_day,
                cutoff,
                Source::Supplementary,
                Some(triple.key.clone()),
            ));
        }
    }

    fn build_entry(
        &self,
        delivery_day: Weekday,
        assortment: String,
        order_day: String,
        cutoff: String,
        source: Source,
        ds_key: Option<String>,
    ) -> ScheduleEntry {
        // Canonicalization reads the label text, not the header group
        // token: the token may be an opaque code only the label resolves.
        let group = self.canonicalizer.canonicalize(&assortment);
        let priority = if source == Source::Supplementary {
            SUPPLEMENTARY_PRIORITY
        } else {
            group.priority()
        };
        ScheduleEntry {
            delivery_day,
            assortment,
            order_day,
            cutoff,
            source,
            group,
            priority,
            ds_key,
        }
    }

    /// Cutoff-time normalization: native times and recognizable time
    /// strings all end up as "HH:MM Uhr"; anything else passes through.
    /// A value naming a weekday is an order day leaked into the time
    /// column and reads as empty.
    pub fn normalize_time(&self, cell: Option<&CellValue>) -> String {
        if let Some(CellValue::Time(t)) = cell {
            return format!("{} Uhr", t.format("%H:%M"));
        }

        let value = normalize_cell(cell);
        if value.is_empty() {
            return value;
        }

        let lower = value.to_lowercase();
        if Weekday::ALL
            .iter()
            .any(|d| lower.contains(&d.german_name().to_lowercase()))
        {
            return String::new();
        }
        if lower.contains("uhr") {
            return value;
        }
        if let Some(m) = self.time_hm_rx.captures(&value) {
            let hours: u32 = m[1].parse().unwrap_or(0);
            return format!("{:02}:{} Uhr", hours, &m[2]);
        }
        if let Some(m) = self.hour_only_rx.captures(&value) {
            let hours: u32 = m[1].parse().unwrap_or(0);
            return format!("{hours:02}:00 Uhr");
        }
        value
    }
}

/// String normalization for every cell: non-breaking spaces become plain
/// spaces, whitespace runs collapse, and the "1001.0" numeric-to-text
/// coercion artifact loses its trailing ".0".
pub fn normalize_cell(cell: Option<&CellValue>) -> String {
    let s = match cell {
        None | Some(CellValue::Empty) => return String::new(),
        Some(CellValue::Text(s)) => s.clone(),
        Some(CellValue::Number(n)) => {
            if n.fract().abs() < f64::EPSILON {
                return format!("{}", *n as i64);
            }
            return n.to_string();
        }
        Some(CellValue::Time(t)) => t.format("%H:%M").to_string(),
    };

    let s = s.replace('\u{a0}', " ");
    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    strip_float_artifact(&s)
}

/// Iteration order for raw group tokens within one day: numeric codes
/// first in numeric order, then free-text groups alphabetically. Only a
/// tie-break; canonical-group priority decides the final display order.
pub(crate) fn group_sort_key(group: &str) -> (u8, u64, String) {
    let g = group.trim();
    if !g.is_empty() && g.chars().all(|c| c.is_ascii_digit()) {
        (0, g.parse().unwrap_or(u64::MAX), String::new())
    } else {
        (1, 0, g.to_lowercase())
    }
}

fn strip_float_artifact(s: &str) -> String {
    if let Some(stem) = s.strip_suffix(".0") {
        if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) {
            return stem.to_string();
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalGroup;
    use crate::processor::header_classifier::HeaderClassifier;
    use crate::table::SheetTable;
    use chrono::NaiveTime;
    use serde_json::{Value, json};

    fn table_for(record: Value) -> SheetTable {
        SheetTable::from_json_records(&[record]).unwrap()
    }

    fn classify(table: &SheetTable) -> ClassifiedColumns {
        HeaderClassifier::new()
            .unwrap()
            .classify(table.columns())
            .unwrap()
    }

    #[test]
    fn test_normalize_cell() {
        assert_eq!(normalize_cell(None), "");
        assert_eq!(normalize_cell(Some(&CellValue::Empty)), "");
        assert_eq!(
            normalize_cell(Some(&CellValue::Text("  a\u{a0}\u{a0}b   c ".to_string()))),
            "a b c"
        );
        // Excel numeric-to-text artifact.
        assert_eq!(
            normalize_cell(Some(&CellValue::Text("1001.0".to_string()))),
            "1001"
        );
        assert_eq!(
            normalize_cell(Some(&CellValue::Text("1001".to_string()))),
            "1001"
        );
        assert_eq!(
            normalize_cell(Some(&CellValue::Text("10.5".to_string()))),
            "10.5"
        );
        assert_eq!(normalize_cell(Some(&CellValue::Number(1001.0))), "1001");
        assert_eq!(normalize_cell(Some(&CellValue::Number(18.5))), "18.5");
    }

    #[test]
    fn test_normalize_time() {
        let extractor = RowExtractor::new().unwrap();

        let native = CellValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(extractor.normalize_time(Some(&native)), "09:30 Uhr");

        let s = |v: &str| CellValue::Text(v.to_string());
        assert_eq!(extractor.normalize_time(Some(&s("18:00"))), "18:00 Uhr");
        assert_eq!(extractor.normalize_time(Some(&s("8:15"))), "08:15 Uhr");
        assert_eq!(extractor.normalize_time(Some(&s("8"))), "08:00 Uhr");
        assert_eq!(extractor.normalize_time(Some(&s("18:00 Uhr"))), "18:00 Uhr");
        // Unparseable values pass through unchanged.
        assert_eq!(extractor.normalize_time(Some(&s("bis mittags"))), "bis mittags");
        assert_eq!(extractor.normalize_time(None), "");
    }

    #[test]
    fn test_time_weekday_leak_guard() {
        let extractor = RowExtractor::new().unwrap();
        let s = |v: &str| CellValue::Text(v.to_string());
        // An order day leaked into the time column never survives as a cutoff.
        assert_eq!(extractor.normalize_time(Some(&s("Freitag"))), "");
        assert_eq!(extractor.normalize_time(Some(&s("montag"))), "");
        assert_eq!(extractor.normalize_time(Some(&s("Dienstag 12:00"))), "");
    }

    #[test]
    fn test_plain_triplet_extraction() {
        let table = table_for(json!({
            "Nr": "41391",
            "Mo 21 Zeit": "18:00",
            "Mo 21 Sort": "Fleisch- und Wurstwaren",
            "Mo 21 Tag": "Freitag",
        }));
        let maps = classify(&table);
        let extractor = RowExtractor::new().unwrap();
        let row = table.rows().next().unwrap();

        let entries = extractor.extract_entries(&row, &maps);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.delivery_day, Weekday::Monday);
        assert_eq!(e.assortment, "Fleisch- und Wurstwaren");
        assert_eq!(e.order_day, "Freitag");
        assert_eq!(e.cutoff, "18:00 Uhr");
        assert_eq!(e.source, Source::PlainTriplet);
        assert_eq!(e.group, CanonicalGroup::MeatAndSausage);
        assert_eq!(e.priority, 0);
    }

    #[test]
    fn test_b_column_extraction_with_header_order_day() {
        let table = table_for(json!({
            "Nr": "5001",
            "Mo Z 1011 B_Di": "09:30",
            "Mo 1011 B_Di": "Wiesenhof Geflügel",
        }));
        let maps = classify(&table);
        let extractor = RowExtractor::new().unwrap();
        let row = table.rows().next().unwrap();

        let entries = extractor.extract_entries(&row, &maps);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.delivery_day, Weekday::Monday);
        assert_eq!(e.order_day, "Dienstag");
        assert_eq!(e.cutoff, "09:30 Uhr");
        assert_eq!(e.source, Source::BColumns);
        assert_eq!(e.group, CanonicalGroup::WiesenhofPoultry);
    }

    #[test]
    fn test_b_column_override_column_wins() {
        let table = table_for(json!({
            "Mo Z 1011 B_Di": "09:30",
            "Mo 1011 B_Di": "Wiesenhof Geflügel",
            "Mo L 1011 B_Di": "Mittwoch",
        }));
        let maps = classify(&table);
        let extractor = RowExtractor::new().unwrap();
        let row = table.rows().next().unwrap();

        let entries = extractor.extract_entries(&row, &maps);
        assert_eq!(entries[0].order_day, "Mittwoch");
    }

    #[test]
    fn test_empty_entry_suppression() {
        let table = table_for(json!({
            "Nr": "5001",
            "Mo Z 1011 B_Di": "",
            "Mo 1011 B_Di": null,
            "Di 21 Zeit": " ",
            "Di 21 Sort": "",
            "Di 21 Tag": "",
        }));
        let maps = classify(&table);
        let extractor = RowExtractor::new().unwrap();
        let row = table.rows().next().unwrap();

        assert!(extractor.extract_entries(&row, &maps).is_empty());
    }

    #[test]
    fn test_ds_extraction_day_from_route() {
        let table = table_for(json!({
            "DS Fr zu Mi Zeit": "10:00",
            "DS Fr zu Mi Sort": "Tiefkühl",
            "DS Fr zu Mi Tag": "Donnerstag",
        }));
        let maps = classify(&table);
        let extractor = RowExtractor::new().unwrap();
        let row = table.rows().next().unwrap();

        let entries = extractor.extract_entries(&row, &maps);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.delivery_day, Weekday::Friday);
        assert_eq!(e.ds_key.as_deref(), Some("DS Fr → Mi"));
        assert_eq!(e.source, Source::Supplementary);
        assert_eq!(e.priority, SUPPLEMENTARY_PRIORITY);
    }

    #[test]
    fn test_ds_day_resolved_from_order_day_cell() {
        let table = table_for(json!({
            "DS Geflügel Zeit": "10:00",
            "DS Geflügel Sort": "Wiesenhof",
            "DS Geflügel Tag": "Mittwoch",
        }));
        let maps = classify(&table);
        let extractor = RowExtractor::new().unwrap();
        let row = table.rows().next().unwrap();

        let entries = extractor.extract_entries(&row, &maps);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delivery_day, Weekday::Wednesday);
    }

    #[test]
    fn test_ds_unresolvable_day_is_dropped_not_defaulted() {
        let table = table_for(json!({
            "DS Geflügel Zeit": "10:00",
            "DS Geflügel Sort": "Wiesenhof",
            "DS Geflügel Tag": "n.n.",
        }));
        let maps = classify(&table);
        let extractor = RowExtractor::new().unwrap();
        let row = table.rows().next().unwrap();

        assert!(extractor.extract_entries(&row, &maps).is_empty());
    }

    #[test]
    fn test_dialect_independence() {
        let full = table_for(json!({
            "Mo 21 Zeit": "18:00",
            "Mo 21 Sort": "Fleisch- und Wurstwaren",
            "Mo 21 Tag": "Freitag",
            "Mo Z 1011 B_Di": "09:30",
            "Mo 1011 B_Di": "Wiesenhof Geflügel",
        }));
        let without_b = table_for(json!({
            "Mo 21 Zeit": "18:00",
            "Mo 21 Sort": "Fleisch- und Wurstwaren",
            "Mo 21 Tag": "Freitag",
        }));

        let extractor = RowExtractor::new().unwrap();
        let full_entries: Vec<_> = extractor
            .extract_entries(&full.rows().next().unwrap(), &classify(&full))
            .into_iter()
            .filter(|e| e.source == Source::PlainTriplet)
            .collect();
        let reduced_entries = extractor
            .extract_entries(&without_b.rows().next().unwrap(), &classify(&without_b));

        assert_eq!(full_entries, reduced_entries);
    }
}

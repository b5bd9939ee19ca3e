use crate::models::{FieldKind, Weekday};
use anyhow::{Result, anyhow};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Short day tokens accepted inside headers, longest spellings first so
/// the regex alternation never truncates a token.
const DAY_TOKENS: &str = "Mitt|Donn|Die|Don|Sam|Mo|Di|Mi|Do|Fr|Sa";

/// Recognized field words per kind, exact words plus the synonyms the
/// convention grew over time.
const FIELD_TOKENS: &str = "Zeit|Schluss|Sortiment|Sort|Besttag|Tag";

/// A usable plain-dialect triple: "Mo 21 Zeit" / "Mo 21 Sort" / "Mo 21 Tag".
/// The order-day column is optional; a missing one reads as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTriplet {
    pub time_col: String,
    pub assortment_col: String,
    pub order_day_col: Option<String>,
}

/// A usable B-dialect triple: "Mo Z 0 B_Sa" (time) / "Mo 0 B_Sa"
/// (assortment), order day embedded in the header. The optional "L"
/// column overrides that embedded order day at extraction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BColumnTriple {
    pub time_col: String,
    pub assortment_col: String,
    pub override_col: Option<String>,
}

/// A usable supplementary-carrier triple: "DS Fr zu Mi Zeit/Sort/Tag".
/// `delivery_day` is known when the routing phrase names a source day;
/// otherwise the extractor resolves it from the order-day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementaryTriple {
    pub key: String,
    pub delivery_day: Option<Weekday>,
    pub time_col: String,
    pub assortment_col: String,
    pub order_day_col: String,
}

/// The three dialect lookups, independent because a real header row
/// triggers several families at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedColumns {
    pub triplets: BTreeMap<(Weekday, String), PlainTriplet>,
    pub b_columns: BTreeMap<(Weekday, String, Weekday), BColumnTriple>,
    pub supplementary: BTreeMap<String, SupplementaryTriple>,
}

/// Structured result of matching one header against the dialect
/// patterns, in specificity order; the first match wins per column.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HeaderMatch {
    NoMatch,
    /// Plain-dialect column: "<day> <group> <field>".
    Field {
        day: Weekday,
        group: String,
        field: FieldKind,
    },
    /// B-dialect column: "<day> [Z|L] <group> [B_]<order-day>".
    /// `marker_form` records whether the carrier marker "B" was present,
    /// which matters for cross-variant precedence.
    Carrier {
        day: Weekday,
        group: String,
        field: FieldKind,
        order_day: Weekday,
        marker_form: bool,
    },
    /// Supplementary-carrier column: "DS <route> <field>".
    SupplementaryField {
        key: String,
        delivery_day: Option<Weekday>,
        field: FieldKind,
    },
}

pub struct HeaderClassifier {
    plain_rx: Regex,
    b_marker_rx: Regex,
    b_plain_rx: Regex,
    ds_rx: Regex,
}

impl HeaderClassifier {
    pub fn new() -> Result<Self> {
        let plain_rx = Regex::new(&format!(
            r"(?i)^({DAY_TOKENS})\s+(.+?)\s+({FIELD_TOKENS})$"
        ))?;
        let b_marker_rx = Regex::new(&format!(
            r"(?i)^({DAY_TOKENS})\s+(?:(Z|L)\s+)?(.+?)\s+B[_ ]?({DAY_TOKENS})$"
        ))?;
        let b_plain_rx = Regex::new(&format!(
            r"(?i)^({DAY_TOKENS})\s+(?:(Z|L)\s+)?(.+?)\s+({DAY_TOKENS})$"
        ))?;
        let ds_rx = Regex::new(&format!(r"(?i)^DS\s+(.+?)\s+({FIELD_TOKENS})$"))?;

        Ok(HeaderClassifier {
            plain_rx,
            b_marker_rx,
            b_plain_rx,
            ds_rx,
        })
    }

    /// Run all dialect recognizers over the header row. Headers that match
    /// no pattern are ignored; triples that stay incomplete after the full
    /// scan are dropped. An empty header row is a caller-contract error.
    pub fn classify(&self, columns: &[String]) -> Result<ClassifiedColumns> {
        if columns.is_empty() {
            return Err(anyhow!("cannot classify an empty header row"));
        }

        let mut plain_fields: BTreeMap<(Weekday, String), HashMap<FieldKind, String>> =
            BTreeMap::new();
        let mut carrier_matches: Vec<(bool, Weekday, String, Weekday, FieldKind, String)> =
            Vec::new();
        let mut ds_fields: BTreeMap<String, (Option<Weekday>, HashMap<FieldKind, String>)> =
            BTreeMap::new();

        for column in columns {
            let column = column.trim();
            match self.match_header(column) {
                HeaderMatch::NoMatch => {}
                HeaderMatch::Field { day, group, field } => {
                    plain_fields
                        .entry((day, group))
                        .or_default()
                        .entry(field)
                        .or_insert_with(|| column.to_string());
                }
                HeaderMatch::Carrier {
                    day,
                    group,
                    field,
                    order_day,
                    marker_form,
                } => {
                    carrier_matches.push((
                        marker_form,
                        day,
                        group,
                        order_day,
                        field,
                        column.to_string(),
                    ));
                }
                HeaderMatch::SupplementaryField {
                    key,
                    delivery_day,
                    field,
                } => {
                    let slot = ds_fields.entry(key).or_insert((delivery_day, HashMap::new()));
                    slot.0 = slot.0.or(delivery_day);
                    slot.1.entry(field).or_insert_with(|| column.to_string());
                }
            }
        }

        let mut result = ClassifiedColumns::default();

        // Plain triplets are usable once time and assortment both exist;
        // a missing order-day column stays None (read as empty, not guessed).
        for ((day, group), fields) in plain_fields {
            if let (Some(time_col), Some(assortment_col)) =
                (fields.get(&FieldKind::Time), fields.get(&FieldKind::Assortment))
            {
                result.triplets.insert(
                    (day, group),
                    PlainTriplet {
                        time_col: time_col.clone(),
                        assortment_col: assortment_col.clone(),
                        order_day_col: fields.get(&FieldKind::OrderDay).cloned(),
                    },
                );
            }
        }

        // B-columns: first writer wins per (key, role), and the marker-less
        // variant is written first so it takes precedence over the "B_" form
        // when both name the same (day, group, order-day).
        let mut b_fields: BTreeMap<(Weekday, String, Weekday), HashMap<FieldKind, String>> =
            BTreeMap::new();
        for pass_marker_form in [false, true] {
            for (marker_form, day, group, order_day, field, column) in &carrier_matches {
                if *marker_form != pass_marker_form {
                    continue;
                }
                b_fields
                    .entry((*day, group.clone(), *order_day))
                    .or_default()
                    .entry(*field)
                    .or_insert_with(|| column.clone());
            }
        }
        for (key, fields) in b_fields {
            if let (Some(time_col), Some(assortment_col)) =
                (fields.get(&FieldKind::Time), fields.get(&FieldKind::Assortment))
            {
                result.b_columns.insert(
                    key,
                    BColumnTriple {
                        time_col: time_col.clone(),
                        assortment_col: assortment_col.clone(),
                        override_col: fields.get(&FieldKind::Label).cloned(),
                    },
                );
            }
        }

        // DS triples need all three fields to resolve.
        for (key, (delivery_day, fields)) in ds_fields {
            if let (Some(time_col), Some(assortment_col), Some(order_day_col)) = (
                fields.get(&FieldKind::Time),
                fields.get(&FieldKind::Assortment),
                fields.get(&FieldKind::OrderDay),
            ) {
                result.supplementary.insert(
                    key.clone(),
                    SupplementaryTriple {
                        key,
                        delivery_day,
                        time_col: time_col.clone(),
                        assortment_col: assortment_col.clone(),
                        order_day_col: order_day_col.clone(),
                    },
                );
            }
        }

        info!(
            "Header classification: {} B-column keys, {} plain triplets, {} DS keys ({} columns scanned)",
            result.b_columns.len(),
            result.triplets.len(),
            result.supplementary.len(),
            columns.len()
        );

        Ok(result)
    }

    fn match_header(&self, column: &str) -> HeaderMatch {
        if let Some(m) = self.plain_rx.captures(column) {
            let (Some(day), Some(field)) = (
                Weekday::from_short_token(&m[1]),
                field_kind_from_token(&m[3]),
            ) else {
                return HeaderMatch::NoMatch;
            };
            return HeaderMatch::Field {
                day,
                group: m[2].trim().to_string(),
                field,
            };
        }

        // The marker form is more specific than the marker-less one, so it
        // is tried first; precedence between the two is handled at
        // insertion time, not here.
        for (rx, marker_form) in [(&self.b_marker_rx, true), (&self.b_plain_rx, false)] {
            if let Some(m) = rx.captures(column) {
                let (Some(day), Some(order_day)) = (
                    Weekday::from_short_token(&m[1]),
                    Weekday::from_short_token(&m[4]),
                ) else {
                    return HeaderMatch::NoMatch;
                };
                let field = match m.get(2).map(|z| z.as_str().to_uppercase()) {
                    Some(marker) if marker == "Z" => FieldKind::Time,
                    Some(_) => FieldKind::Label,
                    None => FieldKind::Assortment,
                };
                return HeaderMatch::Carrier {
                    day,
                    group: m[3].trim().to_string(),
                    field,
                    order_day,
                    marker_form,
                };
            }
        }

        if let Some(m) = self.ds_rx.captures(column) {
            let Some(field) = field_kind_from_token(&m[2]) else {
                return HeaderMatch::NoMatch;
            };
            let route = m[1].trim().to_string();
            let (key, delivery_day) = compose_ds_key(&route);
            return HeaderMatch::SupplementaryField {
                key,
                delivery_day,
                field,
            };
        }

        HeaderMatch::NoMatch
    }
}

fn field_kind_from_token(token: &str) -> Option<FieldKind> {
    match token.to_lowercase().as_str() {
        "zeit" | "schluss" => Some(FieldKind::Time),
        "sort" | "sortiment" => Some(FieldKind::Assortment),
        "tag" | "besttag" => Some(FieldKind::OrderDay),
        _ => None,
    }
}

/// Compose the display key for a DS route and pick out the source day of
/// a "Fr zu Mi" routing phrase if one is present. The connector word
/// renders as an arrow: "DS Fr → Mi".
fn compose_ds_key(route: &str) -> (String, Option<Weekday>) {
    let mut delivery_day = None;
    let tokens: Vec<&str> = route
        .split_whitespace()
        .map(|t| {
            if t.eq_ignore_ascii_case("zu") {
                "→"
            } else {
                if delivery_day.is_none() {
                    delivery_day = Weekday::from_any_token(t);
                }
                t
            }
        })
        .collect();
    (format!("DS {}", tokens.join(" ")), delivery_day)
}

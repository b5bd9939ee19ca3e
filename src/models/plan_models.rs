use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plan-level constants printed on every page.
pub const DEFAULT_PLAN_TYPE: &str = "Standard";
pub const DEFAULT_BUSINESS_AREA: &str = "Alle Sortimente Fleischwerk";

/// Canonical delivery weekdays, Monday through Saturday (no Sunday deliveries).
/// Serializes as the full German day name, which is what the print template keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "Montag")]
    Monday,
    #[serde(rename = "Dienstag")]
    Tuesday,
    #[serde(rename = "Mittwoch")]
    Wednesday,
    #[serde(rename = "Donnerstag")]
    Thursday,
    #[serde(rename = "Freitag")]
    Friday,
    #[serde(rename = "Samstag")]
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn german_name(self) -> &'static str {
        match self {
            Weekday::Monday => "Montag",
            Weekday::Tuesday => "Dienstag",
            Weekday::Wednesday => "Mittwoch",
            Weekday::Thursday => "Donnerstag",
            Weekday::Friday => "Freitag",
            Weekday::Saturday => "Samstag",
        }
    }

    /// Parse a full German day name, case-insensitively.
    pub fn from_german(name: &str) -> Option<Weekday> {
        Weekday::ALL
            .into_iter()
            .find(|d| d.german_name().eq_ignore_ascii_case(name.trim()))
    }

    /// Parse the short day tokens that occur inside schedule headers.
    /// The vocabulary grew over the years: Tuesday is "Di" or "Die",
    /// Thursday is "Do", "Don" or "Donn" (the 4-letter form is folded
    /// to "Don" before lookup). Unknown tokens yield None.
    pub fn from_short_token(token: &str) -> Option<Weekday> {
        let mut t = token.trim().to_lowercase();
        if t == "donn" {
            t = "don".to_string();
        }
        match t.as_str() {
            "mo" => Some(Weekday::Monday),
            "di" | "die" => Some(Weekday::Tuesday),
            "mi" | "mitt" => Some(Weekday::Wednesday),
            "do" | "don" => Some(Weekday::Thursday),
            "fr" => Some(Weekday::Friday),
            "sa" | "sam" => Some(Weekday::Saturday),
            _ => None,
        }
    }

    /// Parse either form (full name first, then header abbreviation).
    pub fn from_any_token(token: &str) -> Option<Weekday> {
        Weekday::from_german(token).or_else(|| Weekday::from_short_token(token))
    }

    pub fn delivery_index(self) -> usize {
        Weekday::ALL.iter().position(|d| *d == self).unwrap_or(usize::MAX)
    }
}

/// What a recognized schedule column encodes for its (day, group) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Time,
    Assortment,
    OrderDay,
    /// B-dialect only: the optional "L" column overriding the
    /// header-embedded order day.
    Label,
}

/// The dialect family a schedule entry was sourced from. Priority decides
/// which family's entries come first within a delivery day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    /// "Mo Z 0 B_Sa" style columns, the main source.
    #[serde(rename = "B")]
    BColumns,
    /// "Mo 21 Zeit/Sort/Tag" style triplets.
    #[serde(rename = "21")]
    PlainTriplet,
    /// "DS ..." columns for the supplementary carrier (Durchsteck).
    #[serde(rename = "DS")]
    Supplementary,
}

impl Source {
    pub fn priority(self) -> u8 {
        match self {
            Source::BColumns => 0,
            Source::PlainTriplet => 1,
            Source::Supplementary => 2,
        }
    }
}

/// Dialect-independent assortment identity, used only for display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalGroup {
    MeatAndSausage,
    FreshMeatProcessing,
    WiesenhofPoultry,
    OrganicPoultry,
    SpiceVendor,
    SecondaryVendor,
    PromotionalMaterial,
    Unknown,
}

/// Supplementary-carrier entries slot in between SecondaryVendor and
/// PromotionalMaterial, the only stable position observed in the data.
pub const SUPPLEMENTARY_PRIORITY: u8 = 6;

impl CanonicalGroup {
    /// Fixed display-order priority, lowest prints first. An explicit
    /// total order so the assembler's sort is testable independently
    /// of the canonicalizer's rule list.
    pub fn priority(self) -> u8 {
        match self {
            CanonicalGroup::MeatAndSausage => 0,
            CanonicalGroup::FreshMeatProcessing => 1,
            CanonicalGroup::WiesenhofPoultry => 2,
            CanonicalGroup::OrganicPoultry => 3,
            CanonicalGroup::SpiceVendor => 4,
            CanonicalGroup::SecondaryVendor => 5,
            CanonicalGroup::PromotionalMaterial => 7,
            CanonicalGroup::Unknown => 8,
        }
    }
}

/// One line of a customer's plan. Field names follow the print template's
/// JSON contract (liefertag/sortiment/bestelltag/bestellschluss).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(rename = "liefertag")]
    pub delivery_day: Weekday,
    #[serde(rename = "sortiment")]
    pub assortment: String,
    #[serde(rename = "bestelltag")]
    pub order_day: String,
    #[serde(rename = "bestellschluss")]
    pub cutoff: String,
    pub source: Source,
    pub group: CanonicalGroup,
    pub priority: u8,
    /// Composed key for supplementary-carrier entries, e.g. "DS Fr → Mi".
    #[serde(rename = "ds_key", skip_serializing_if = "Option::is_none")]
    pub ds_key: Option<String>,
}

impl ScheduleEntry {
    pub fn is_supplementary(&self) -> bool {
        self.source == Source::Supplementary
    }
}

/// Everything the document renderer needs for one customer page.
/// Immutable once assembled; keyed by customer number in the output map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "plan_typ")]
    pub plan_type: String,
    #[serde(rename = "bereich")]
    pub business_area: String,
    #[serde(rename = "kunden_nr")]
    pub customer_number: String,
    #[serde(rename = "sap_nr")]
    pub sap_number: String,
    pub name: String,
    #[serde(rename = "strasse")]
    pub street: String,
    #[serde(rename = "plz")]
    pub postcode: String,
    #[serde(rename = "ort")]
    pub city: String,
    pub fax: String,
    #[serde(rename = "fachberater")]
    pub advisor: String,
    /// Per-weekday tour/route code; blank when no tour runs that day.
    pub tours: BTreeMap<Weekday, String>,
    /// All entries (supplementary included) in merged display order:
    /// grouped by delivery day, then (dialect priority, group priority).
    #[serde(rename = "bestell")]
    pub entries: Vec<ScheduleEntry>,
    /// The supplementary-carrier entries again, for templates that render
    /// them as their own block instead of merging.
    pub ds: Vec<ScheduleEntry>,
}

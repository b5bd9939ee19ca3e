use crate::models::CanonicalGroup;
use std::collections::HashMap;

/// Maps a raw assortment label (numeric code, product-line name or vendor
/// name, depending on which header dialect produced it) onto the small
/// fixed set of canonical groups used for display ordering.
///
/// Pure and total: every input resolves, unknowns sort last but still print.
pub struct GroupCanonicalizer {
    code_table: HashMap<&'static str, CanonicalGroup>,
    keyword_rules: Vec<(&'static str, CanonicalGroup)>,
}

impl GroupCanonicalizer {
    pub fn new() -> Self {
        let mut code_table = HashMap::new();

        // Fixed assortment codes as maintained in the source workbook.
        code_table.insert("21", CanonicalGroup::MeatAndSausage);
        code_table.insert("1011", CanonicalGroup::WiesenhofPoultry);
        code_table.insert("1021", CanonicalGroup::OrganicPoultry);
        code_table.insert("1031", CanonicalGroup::FreshMeatProcessing);
        code_table.insert("1041", CanonicalGroup::SpiceVendor);
        code_table.insert("1051", CanonicalGroup::PromotionalMaterial);
        code_table.insert("1061", CanonicalGroup::SecondaryVendor);

        // Keyword rules, checked in order. Compound terms must come before
        // their generic superset terms: "frischfleisch veredlung" would
        // otherwise be swallowed by the plain "fleisch" rule, and bio
        // poultry by the plain "geflügel" rule.
        let keyword_rules = vec![
            ("frischfleisch veredlung", CanonicalGroup::FreshMeatProcessing),
            ("veredlung", CanonicalGroup::FreshMeatProcessing),
            ("wiesenhof", CanonicalGroup::WiesenhofPoultry),
            ("biofino", CanonicalGroup::OrganicPoultry),
            ("bio-geflügel", CanonicalGroup::OrganicPoultry),
            ("bio geflügel", CanonicalGroup::OrganicPoultry),
            ("geflügel", CanonicalGroup::WiesenhofPoultry),
            ("moguntia", CanonicalGroup::SpiceVendor),
            ("gewürz", CanonicalGroup::SpiceVendor),
            ("werbemittel", CanonicalGroup::PromotionalMaterial),
            ("werbung", CanonicalGroup::PromotionalMaterial),
            ("handelsware", CanonicalGroup::SecondaryVendor),
            ("fleisch", CanonicalGroup::MeatAndSausage),
            ("wurst", CanonicalGroup::MeatAndSausage),
        ];

        GroupCanonicalizer {
            code_table,
            keyword_rules,
        }
    }

    pub fn canonicalize(&self, raw: &str) -> CanonicalGroup {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        // 1) A bare numeric token that is a known code decides directly.
        for token in normalized.split_whitespace() {
            if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
                if let Some(group) = self.code_table.get(token) {
                    return *group;
                }
            }
        }

        // 2) Ordered keyword rules, specific before general.
        for (keyword, group) in &self.keyword_rules {
            if normalized.contains(keyword) {
                return *group;
            }
        }

        CanonicalGroup::Unknown
    }
}

impl Default for GroupCanonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_codes() {
        let canon = GroupCanonicalizer::new();

        assert_eq!(canon.canonicalize("21"), CanonicalGroup::MeatAndSausage);
        assert_eq!(canon.canonicalize("1011"), CanonicalGroup::WiesenhofPoultry);
        // Code wins even when embedded in surrounding text.
        assert_eq!(
            canon.canonicalize("Sortiment 1041"),
            CanonicalGroup::SpiceVendor
        );
        // Unknown codes fall through to keyword rules, then Unknown.
        assert_eq!(canon.canonicalize("9999"), CanonicalGroup::Unknown);
    }

    #[test]
    fn test_specific_before_general() {
        let canon = GroupCanonicalizer::new();

        // "fleisch" appears as a substring but the compound rule must win.
        assert_eq!(
            canon.canonicalize("Frischfleisch Veredlung"),
            CanonicalGroup::FreshMeatProcessing
        );
        assert_eq!(
            canon.canonicalize("Fleisch- und Wurstwaren"),
            CanonicalGroup::MeatAndSausage
        );
        // Vendor name beats the generic poultry keyword.
        assert_eq!(
            canon.canonicalize("Wiesenhof Geflügel"),
            CanonicalGroup::WiesenhofPoultry
        );
        assert_eq!(
            canon.canonicalize("Bio Geflügel"),
            CanonicalGroup::OrganicPoultry
        );
        assert_eq!(
            canon.canonicalize("Geflügel frisch"),
            CanonicalGroup::WiesenhofPoultry
        );
    }

    #[test]
    fn test_whitespace_and_case_normalization() {
        let canon = GroupCanonicalizer::new();

        assert_eq!(
            canon.canonicalize("  FRISCHFLEISCH   VEREDLUNG "),
            CanonicalGroup::FreshMeatProcessing
        );
        assert_eq!(
            canon.canonicalize("MOGUNTIA Gewürze"),
            CanonicalGroup::SpiceVendor
        );
    }

    #[test]
    fn test_unknown_is_total_fallback() {
        let canon = GroupCanonicalizer::new();

        assert_eq!(canon.canonicalize(""), CanonicalGroup::Unknown);
        assert_eq!(canon.canonicalize("Tiefkühlkost"), CanonicalGroup::Unknown);
        // Unknown sorts last but is never dropped by the canonicalizer.
        assert_eq!(canon.canonicalize("???").priority(), 8);
    }
}

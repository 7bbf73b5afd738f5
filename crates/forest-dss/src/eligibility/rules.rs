use serde::Serialize;

use super::family::{FamilyProfile, RecordFamily};
use super::record::{CanonicalRecord, DataQualityError, RawRecord};

/// Rule-derived training label for one scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemeLabel {
    pub scheme: &'static str,
    pub eligible: bool,
}

/// Labels for every scheme in a family catalog, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Vec<SchemeLabel>,
}

impl LabelSet {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (&'static str, bool)>) -> Self {
        Self {
            labels: pairs
                .into_iter()
                .map(|(scheme, eligible)| SchemeLabel { scheme, eligible })
                .collect(),
        }
    }

    pub fn get(&self, scheme: &str) -> Option<bool> {
        self.labels
            .iter()
            .find(|label| label.scheme == scheme)
            .map(|label| label.eligible)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemeLabel> {
        self.labels.iter()
    }

    pub fn schemes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.labels.iter().map(|label| label.scheme)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Column name used for the label in exported training data.
    pub fn column_name(scheme: &str) -> String {
        format!("label_{scheme}")
    }
}

/// Canonical record plus its rule-derived labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub record: CanonicalRecord,
    pub labels: LabelSet,
}

/// Stateless per-family rule engine: normalize, fill defaults, derive training labels.
#[derive(Clone, Copy)]
pub struct RuleEngine {
    profile: &'static FamilyProfile,
}

impl RuleEngine {
    pub fn new(family: RecordFamily) -> Self {
        Self {
            profile: family.profile(),
        }
    }

    pub fn family(&self) -> RecordFamily {
        self.profile.family
    }

    pub fn canonicalize(&self, raw: &RawRecord) -> CanonicalRecord {
        CanonicalRecord::build(
            raw.iter(),
            self.profile
                .defaults
                .iter()
                .map(|(field, default)| (*field, default.to_value())),
        )
    }

    pub fn apply(&self, raw: &RawRecord) -> Result<RuleOutcome, DataQualityError> {
        let record = self.canonicalize(raw);
        let labels = (self.profile.derive_labels)(&record)?;
        Ok(RuleOutcome { record, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::record::FieldValue;

    #[test]
    fn labels_follow_catalog_order_for_every_family() {
        for family in RecordFamily::ALL {
            let outcome = RuleEngine::new(family)
                .apply(&RawRecord::new())
                .expect("defaults alone are valid");
            let schemes: Vec<_> = outcome.labels.schemes().collect();
            assert_eq!(schemes, family.catalog(), "{family} label order");
        }
    }

    #[test]
    fn defaults_fill_only_absent_fields() {
        let engine = RuleEngine::new(RecordFamily::Cr);
        let raw = RawRecord::new()
            .with("SHG_VO_Presence", "Yes")
            .with("st_hh_percent", FieldValue::Missing);
        let record = engine.canonicalize(&raw);

        assert_eq!(record.text("shg_vo_presence"), "yes");
        assert_eq!(record.text("drought_or_flood_prone"), "no");
        assert_eq!(
            record.get("distance_to_water_km"),
            Some(&FieldValue::Number(0.0))
        );
        assert_eq!(record.get("st_hh_percent"), Some(&FieldValue::Missing));
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for family in RecordFamily::ALL {
            let engine = RuleEngine::new(family);
            let raw = RawRecord::new()
                .with(" Village ", " Padhrotu ")
                .with("Annual_Income", "45000")
                .with("is_st", "YES");
            let once = engine.canonicalize(&raw);
            let twice = engine.canonicalize(&RawRecord::from(once.clone()));
            assert_eq!(once, twice, "{family} canonicalization");
        }
    }

    #[test]
    fn rule_application_is_deterministic() {
        let engine = RuleEngine::new(RecordFamily::Ifr);
        let raw = RawRecord::new()
            .with("age_of_claimant", 42.0)
            .with("house_type", "Kutcha")
            .with("annual_income", 72000.0);
        assert_eq!(
            engine.apply(&raw).expect("valid"),
            engine.apply(&raw).expect("valid")
        );
    }

    #[test]
    fn column_names_prefix_scheme() {
        assert_eq!(LabelSet::column_name("PMJANMAN"), "label_PMJANMAN");
    }
}

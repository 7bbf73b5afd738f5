//! Community forest-resource (CFR) records.

use crate::eligibility::family::{
    ArtifactLayout, FamilyProfile, FieldDefault, RecordFamily, SchemeMetadata,
};
use crate::eligibility::record::{CanonicalRecord, DataQualityError};
use crate::eligibility::rules::LabelSet;

pub const SCHEMES: &[&str] = &[
    "jjm",
    "pmjanman",
    "dajgua",
    "mgnrega_community",
    "nrlm_community",
    "tribalprod_community",
    "ngogrant",
];

const DEFAULTS: &[(&str, FieldDefault)] = &[
    ("seasonal_income_forest_percent", FieldDefault::Number(0.0)),
    ("forest_condition", FieldDefault::Text("")),
    ("fire_incidents_5yrs", FieldDefault::Text("no")),
    ("water_availability_in_forest", FieldDefault::Text("")),
    ("water_supply_coverage", FieldDefault::Text("")),
    ("electricity_supply_coverage", FieldDefault::Text("")),
    ("road_access_condition", FieldDefault::Text("")),
    ("major_ntfps_collected", FieldDefault::Text("")),
    ("gramsabha_meeting_frequency", FieldDefault::Text("")),
    ("frc_formed", FieldDefault::Text("")),
];

const METADATA: &[(&str, SchemeMetadata)] = &[
    (
        "jjm",
        SchemeMetadata {
            reason: "Village has poor/partial water supply or low water availability.",
            benefit: "Improves safe drinking water access and tap connections.",
            impact: "Reduces water stress and enhances health outcomes.",
        },
    ),
    (
        "pmjanman",
        SchemeMetadata {
            reason: "Forest condition degraded / high NTFP collection workload.",
            benefit: "Targeted tribal development and basic services improvement.",
            impact: "Strengthens socio-economic well-being of tribal communities.",
        },
    ),
    (
        "dajgua",
        SchemeMetadata {
            reason: "Irregular Gram Sabha / fire incidents indicate governance gaps.",
            benefit: "Village development, forest governance and infrastructure support.",
            impact: "Improves collective capacity and forest management.",
        },
    ),
    (
        "mgnrega_community",
        SchemeMetadata {
            reason: "Poor road access or no electricity: infrastructure deficit.",
            benefit: "Creation of durable community assets via MGNREGA.",
            impact: "Supports livelihoods and boosts village infrastructure.",
        },
    ),
    (
        "nrlm_community",
        SchemeMetadata {
            reason: "FRC institution formed: strong community governance.",
            benefit: "Strengthening of SHG/VO institutions under NRLM.",
            impact: "Improves women empowerment and financial inclusion.",
        },
    ),
    (
        "tribalprod_community",
        SchemeMetadata {
            reason: "High dependency on NTFP collection.",
            benefit: "Support for NTFP processing, storage and marketing.",
            impact: "Increases income from forest-based livelihoods.",
        },
    ),
    (
        "ngogrant",
        SchemeMetadata {
            reason: "Degraded forest & fire incidents indicate need for NGO support.",
            benefit: "Grant-in-aid for voluntary tribal welfare organisations.",
            impact: "Improves resilience and socio-economic support systems.",
        },
    ),
];

pub(crate) static PROFILE: FamilyProfile = FamilyProfile {
    family: RecordFamily::Cfr,
    defaults: DEFAULTS,
    catalog: SCHEMES,
    derive_labels,
    metadata: METADATA,
    fallback: SchemeMetadata {
        reason: "Village meets scheme criteria.",
        benefit: "Helps community development.",
        impact: "Improves overall well-being.",
    },
    layout: ArtifactLayout {
        directory: "cfr_models",
        preprocessor: "cfr_preprocessor",
        feature_order: Some("cfr_features"),
        feature_names: None,
        model_prefix: "xgb_",
    },
    attribution: false,
};

fn derive_labels(record: &CanonicalRecord) -> Result<LabelSet, DataQualityError> {
    let degraded = record.equals("forest_condition", "degraded");
    let fire_incidents = record.equals("fire_incidents_5yrs", "yes");
    let collects_ntfp = record.is_filled("major_ntfps_collected");

    Ok(LabelSet::from_pairs([
        (
            "jjm",
            record.is_one_of("water_supply_coverage", &["none", "partial"])
                || record.equals("water_availability_in_forest", "low"),
        ),
        ("pmjanman", degraded || collects_ntfp),
        (
            "dajgua",
            fire_incidents || record.equals("gramsabha_meeting_frequency", "rare"),
        ),
        (
            "mgnrega_community",
            record.equals("road_access_condition", "poor")
                || record.equals("electricity_supply_coverage", "none"),
        ),
        ("nrlm_community", record.equals("frc_formed", "yes")),
        ("tribalprod_community", collects_ntfp),
        ("ngogrant", degraded && fire_incidents),
    ]))
}

#[cfg(test)]
mod tests {
    use crate::eligibility::family::RecordFamily;
    use crate::eligibility::record::RawRecord;
    use crate::eligibility::rules::{LabelSet, RuleEngine};

    fn labels(raw: RawRecord) -> LabelSet {
        RuleEngine::new(RecordFamily::Cfr)
            .apply(&raw)
            .expect("cfr rules never fail")
            .labels
    }

    #[test]
    fn defaults_alone_qualify_for_nothing() {
        let labels = labels(RawRecord::new());
        assert!(labels.iter().all(|label| !label.eligible));
    }

    #[test]
    fn partial_water_supply_qualifies_for_jjm() {
        let labels = labels(RawRecord::new().with("water_supply_coverage", "partial"));
        assert_eq!(labels.get("jjm"), Some(true));
    }

    #[test]
    fn low_forest_water_qualifies_for_jjm() {
        let labels = labels(RawRecord::new().with("Water_Availability_In_Forest", " LOW "));
        assert_eq!(labels.get("jjm"), Some(true));
    }

    #[test]
    fn empty_ntfp_list_leaves_pmjanman_to_forest_condition() {
        let healthy = labels(
            RawRecord::new()
                .with("major_ntfps_collected", "")
                .with("forest_condition", "good"),
        );
        assert_eq!(healthy.get("pmjanman"), Some(false));
        assert_eq!(healthy.get("tribalprod_community"), Some(false));

        let degraded = labels(
            RawRecord::new()
                .with("major_ntfps_collected", "")
                .with("forest_condition", "Degraded"),
        );
        assert_eq!(degraded.get("pmjanman"), Some(true));
    }

    #[test]
    fn ntfp_collection_drives_pmjanman_and_tribal_products() {
        let labels = labels(RawRecord::new().with("major_ntfps_collected", "mahua, tendu"));
        assert_eq!(labels.get("pmjanman"), Some(true));
        assert_eq!(labels.get("tribalprod_community"), Some(true));
    }

    #[test]
    fn ngo_grant_needs_degradation_and_fire() {
        let fire_only = labels(RawRecord::new().with("fire_incidents_5yrs", "yes"));
        assert_eq!(fire_only.get("ngogrant"), Some(false));
        assert_eq!(fire_only.get("dajgua"), Some(true));

        let both = labels(
            RawRecord::new()
                .with("fire_incidents_5yrs", "Yes")
                .with("forest_condition", "degraded"),
        );
        assert_eq!(both.get("ngogrant"), Some(true));
    }

    #[test]
    fn infrastructure_gaps_qualify_for_mgnrega() {
        let labels = labels(RawRecord::new().with("electricity_supply_coverage", "None"));
        assert_eq!(labels.get("mgnrega_community"), Some(true));
        assert_eq!(labels.get("nrlm_community"), Some(false));
    }
}

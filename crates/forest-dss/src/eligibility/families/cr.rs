//! Community forest-rights (CR) claims.

use crate::eligibility::family::{
    ArtifactLayout, FamilyProfile, FieldDefault, RecordFamily, SchemeMetadata,
};
use crate::eligibility::record::{CanonicalRecord, DataQualityError};
use crate::eligibility::rules::LabelSet;

pub const SCHEMES: &[&str] = &[
    "JJM",
    "PMJANMAN",
    "DAJGUA",
    "MGNREGA_COMM",
    "NRLM_VO",
    "TRIBALPROD_COMM",
    "GRANTINAID_VO",
];

const DEFAULTS: &[(&str, FieldDefault)] = &[
    ("ntfp_dependency_percent", FieldDefault::Number(0.0)),
    ("wagelabour_dependency_percent", FieldDefault::Number(0.0)),
    ("st_hh_percent", FieldDefault::Number(0.0)),
    ("distance_to_water_km", FieldDefault::Number(0.0)),
    ("distance_to_road_km", FieldDefault::Number(0.0)),
    ("shg_vo_presence", FieldDefault::Text("no")),
    ("drought_or_flood_prone", FieldDefault::Text("no")),
];

const HAZARD_PRONE: &[&str] = &["drought", "flood", "both", "yes"];

const WATER_DISTANCE_KM: f64 = 1.0;
const PMJANMAN_ST_PERCENT: f64 = 70.0;
const DAJGUA_ST_PERCENT: f64 = 40.0;
const WAGE_LABOUR_PERCENT: f64 = 30.0;
const NTFP_PERCENT: f64 = 30.0;

const METADATA: &[(&str, SchemeMetadata)] = &[
    (
        "JJM",
        SchemeMetadata {
            reason: "Village shows poor or distant access to safe water sources, or is drought/flood prone.",
            benefit: "Improved drinking water supply and household tap connections.",
            impact: "Reduces water stress and improves community health.",
        },
    ),
    (
        "PMJANMAN",
        SchemeMetadata {
            reason: "High concentration of ST households in the village.",
            benefit: "Targeted tribal village development under PM-JANMAN.",
            impact: "Enhances basic services and socio-economic status of tribal communities.",
        },
    ),
    (
        "DAJGUA",
        SchemeMetadata {
            reason: "Village has significant tribal presence needing focused development.",
            benefit: "Converged tribal area development (infrastructure, services, livelihoods).",
            impact: "Improves long-term living conditions in tribal hamlets.",
        },
    ),
    (
        "MGNREGA_COMM",
        SchemeMetadata {
            reason: "High dependency on wage labour in the community.",
            benefit: "Creation of community assets via MGNREGA (ponds, roads, land development).",
            impact: "Supports livelihoods while building durable infrastructure.",
        },
    ),
    (
        "NRLM_VO",
        SchemeMetadata {
            reason: "Presence of SHG/VO federations in the village.",
            benefit: "Strengthening of SHG institutions and village organisations under NRLM.",
            impact: "Improves financial inclusion, women's empowerment and local governance.",
        },
    ),
    (
        "TRIBALPROD_COMM",
        SchemeMetadata {
            reason: "Community shows high dependency on NTFP for livelihoods.",
            benefit: "Support for NTFP collection, value-addition and marketing.",
            impact: "Increases and stabilises incomes from forest-based products.",
        },
    ),
    (
        "GRANTINAID_VO",
        SchemeMetadata {
            reason: "SHG/VO present in an environmentally vulnerable (drought/flood prone) village.",
            benefit: "Grant-in-aid to voluntary organisations working for ST welfare.",
            impact: "Strengthens resilience and welfare programmes for tribal communities.",
        },
    ),
];

pub(crate) static PROFILE: FamilyProfile = FamilyProfile {
    family: RecordFamily::Cr,
    defaults: DEFAULTS,
    catalog: SCHEMES,
    derive_labels,
    metadata: METADATA,
    fallback: SchemeMetadata {
        reason: "Community vulnerability and infrastructure gaps.",
        benefit: "Community-level development and welfare support.",
        impact: "Improves collective resilience and living standards.",
    },
    layout: ArtifactLayout {
        directory: "cr_models",
        preprocessor: "cr_preprocessor",
        feature_order: None,
        feature_names: Some("cr_feature_names"),
        model_prefix: "cr_model_",
    },
    attribution: true,
};

fn derive_labels(record: &CanonicalRecord) -> Result<LabelSet, DataQualityError> {
    let distance_to_water = record.number("distance_to_water_km")?;
    let st_share = record.number("st_hh_percent")?;
    let wage_labour_share = record.number("wagelabour_dependency_percent")?;
    let ntfp_share = record.number("ntfp_dependency_percent")?;
    let hazard_prone = record.is_one_of("drought_or_flood_prone", HAZARD_PRONE);
    let has_vo = record.equals("shg_vo_presence", "yes");

    Ok(LabelSet::from_pairs([
        ("JJM", distance_to_water > WATER_DISTANCE_KM || hazard_prone),
        ("PMJANMAN", st_share > PMJANMAN_ST_PERCENT),
        ("DAJGUA", st_share > DAJGUA_ST_PERCENT),
        ("MGNREGA_COMM", wage_labour_share > WAGE_LABOUR_PERCENT),
        ("NRLM_VO", has_vo),
        ("TRIBALPROD_COMM", ntfp_share > NTFP_PERCENT),
        ("GRANTINAID_VO", has_vo && hazard_prone),
    ]))
}

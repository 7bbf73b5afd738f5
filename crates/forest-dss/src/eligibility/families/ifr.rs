//! Individual forest-rights (IFR) claims.

use crate::eligibility::family::{
    ArtifactLayout, FamilyProfile, FieldDefault, RecordFamily, SchemeMetadata,
};
use crate::eligibility::record::{CanonicalRecord, DataQualityError};
use crate::eligibility::rules::LabelSet;

pub const SCHEMES: &[&str] = &[
    "PMAYG",
    "PMKISAN",
    "MGNREGA_INDIV",
    "NRLM_INDIV",
    "DDUGKY",
    "EMRS",
    "PREMATRIC_ST",
    "POSTMATRIC_ST",
    "NATFELLOWSHIP_ST",
    "NSAP",
    "PMGKAY",
    "TRIBALPROD_INDIV",
];

const DEFAULTS: &[(&str, FieldDefault)] = &[
    ("is_st", FieldDefault::Text("no")),
    ("is_otfd", FieldDefault::Text("no")),
    ("cultivation_area", FieldDefault::Number(0.0)),
    ("annual_income", FieldDefault::Number(0.0)),
    ("age_of_claimant", FieldDefault::Number(0.0)),
    ("house_type", FieldDefault::Text("")),
    ("primary_livelihood", FieldDefault::Text("")),
    ("shg_membership", FieldDefault::Text("no")),
    ("school_going_children", FieldDefault::Text("no")),
    ("highest_education_level", FieldDefault::Text("illiterate")),
    ("elderly_count_60plus", FieldDefault::Number(0.0)),
    ("disability_in_household", FieldDefault::Text("no")),
    ("household_members", FieldDefault::Number(1.0)),
    ("cultivable_land_ownership", FieldDefault::Text("no")),
];

const AFFIRMATIVE: &[&str] = &["yes", "true", "1"];
const FARMING_LIVELIHOODS: &[&str] = &["agriculture", "farmer"];
const FOREST_LIVELIHOODS: &[&str] = &["ntfp", "forest produce", "artisan", "handicraft"];

/// Education levels from lowest to highest; the position is the rank.
const EDUCATION_LEVELS: &[&str] = &[
    "illiterate",
    "primary",
    "middle",
    "high school",
    "higher secondary",
    "diploma",
    "graduation",
    "post graduation",
    "phd",
];

const HIGH_SCHOOL_RANK: usize = 3;
const HIGHER_SECONDARY_RANK: usize = 4;
const GRADUATION_RANK: usize = 6;

const MGNREGA_INCOME_CEILING: f64 = 60_000.0;
const PMGKAY_INCOME_CEILING: f64 = 80_000.0;
const YOUTH_MIN_AGE: f64 = 18.0;
const YOUTH_MAX_AGE: f64 = 35.0;
const PENSION_AGE: f64 = 60.0;

const METADATA: &[(&str, SchemeMetadata)] = &[
    (
        "PMAYG",
        SchemeMetadata {
            reason: "Kutcha or weak housing makes the household eligible for PMAY-G.",
            benefit: "Support to construct or upgrade a pucca house.",
            impact: "Improves long-term housing security and dignity.",
        },
    ),
    (
        "PMKISAN",
        SchemeMetadata {
            reason: "Cultivable land and farming livelihood detected.",
            benefit: "Direct income support to farmer household.",
            impact: "Reduces seasonal financial stress and supports cultivation.",
        },
    ),
    (
        "MGNREGA_INDIV",
        SchemeMetadata {
            reason: "Low income or wage labour dependence.",
            benefit: "Guaranteed wage employment for willing workers.",
            impact: "Stabilises income and helps meet basic needs.",
        },
    ),
    (
        "NRLM_INDIV",
        SchemeMetadata {
            reason: "Self-Help Group membership in the household.",
            benefit: "Access to SHG-based credit and livelihood support.",
            impact: "Strengthens women's economic role and resilience.",
        },
    ),
    (
        "DDUGKY",
        SchemeMetadata {
            reason: "Youth in the age band for skill training.",
            benefit: "Skill development and placement support.",
            impact: "Improves employability and non-farm livelihoods.",
        },
    ),
    (
        "EMRS",
        SchemeMetadata {
            reason: "ST household with school-going children.",
            benefit: "Residential schooling under EMRS.",
            impact: "Improves education outcomes for tribal children.",
        },
    ),
    (
        "PREMATRIC_ST",
        SchemeMetadata {
            reason: "ST child at pre-matric education level.",
            benefit: "Scholarship support for school education.",
            impact: "Reduces dropouts and encourages continued schooling.",
        },
    ),
    (
        "POSTMATRIC_ST",
        SchemeMetadata {
            reason: "ST student in higher secondary or beyond.",
            benefit: "Scholarship for post-matric education.",
            impact: "Improves access to higher education and careers.",
        },
    ),
    (
        "NATFELLOWSHIP_ST",
        SchemeMetadata {
            reason: "ST candidate with graduation or higher.",
            benefit: "Fellowship for advanced studies/research.",
            impact: "Builds long-term academic and leadership capacity.",
        },
    ),
    (
        "NSAP",
        SchemeMetadata {
            reason: "Elderly, widow or disabled member in household.",
            benefit: "Social pension support.",
            impact: "Provides minimum income security to vulnerable persons.",
        },
    ),
    (
        "PMGKAY",
        SchemeMetadata {
            reason: "Low-income household with food security needs.",
            benefit: "Free/subsidised food grain support.",
            impact: "Reduces hunger and improves nutritional security.",
        },
    ),
    (
        "TRIBALPROD_INDIV",
        SchemeMetadata {
            reason: "Livelihood depends on NTFP/forest produce/handicrafts.",
            benefit: "Support for marketing and value addition of tribal products.",
            impact: "Enhances income from traditional livelihoods.",
        },
    ),
];

pub(crate) static PROFILE: FamilyProfile = FamilyProfile {
    family: RecordFamily::Ifr,
    defaults: DEFAULTS,
    catalog: SCHEMES,
    derive_labels,
    metadata: METADATA,
    fallback: SchemeMetadata {
        reason: "Eligibility based on livelihood and vulnerability.",
        benefit: "Direct household-level support.",
        impact: "Improves long-term livelihood security.",
    },
    layout: ArtifactLayout {
        directory: "ifr_models",
        preprocessor: "ifr_preprocessor",
        feature_order: None,
        feature_names: Some("ifr_feature_names"),
        model_prefix: "ifr_model_",
    },
    attribution: true,
};

/// Rank of an education level; unrecognised levels rank with `illiterate`.
pub fn education_rank(level: &str) -> usize {
    let level = level.trim().to_lowercase();
    EDUCATION_LEVELS
        .iter()
        .position(|candidate| *candidate == level)
        .unwrap_or(0)
}

fn derive_labels(record: &CanonicalRecord) -> Result<LabelSet, DataQualityError> {
    let scheduled_tribe = record.is_one_of("is_st", AFFIRMATIVE);
    let shg_member = record.is_one_of("shg_membership", AFFIRMATIVE);
    let school_children = record.equals("school_going_children", "yes");
    let education = education_rank(&record.text("highest_education_level"));
    let livelihood = record.text("primary_livelihood");

    let age = record.number("age_of_claimant")?;
    let income = record.number("annual_income")?;
    let cultivation_area = record.number("cultivation_area")?;
    let elderly = record.number("elderly_count_60plus")?;

    Ok(LabelSet::from_pairs([
        ("PMAYG", record.equals("house_type", "kutcha")),
        (
            "PMKISAN",
            record.equals("cultivable_land_ownership", "yes")
                && cultivation_area > 0.0
                && FARMING_LIVELIHOODS.contains(&&*livelihood),
        ),
        (
            "MGNREGA_INDIV",
            livelihood == "wage labour" || income < MGNREGA_INCOME_CEILING,
        ),
        ("NRLM_INDIV", shg_member),
        ("DDUGKY", (YOUTH_MIN_AGE..=YOUTH_MAX_AGE).contains(&age)),
        ("EMRS", scheduled_tribe && school_children),
        (
            "PREMATRIC_ST",
            scheduled_tribe && school_children && education <= HIGH_SCHOOL_RANK,
        ),
        (
            "POSTMATRIC_ST",
            scheduled_tribe && education >= HIGHER_SECONDARY_RANK,
        ),
        (
            "NATFELLOWSHIP_ST",
            scheduled_tribe && education >= GRADUATION_RANK,
        ),
        (
            "NSAP",
            age >= PENSION_AGE
                || elderly > 0.0
                || record.equals("disability_in_household", "yes"),
        ),
        ("PMGKAY", income < PMGKAY_INCOME_CEILING),
        (
            "TRIBALPROD_INDIV",
            scheduled_tribe && FOREST_LIVELIHOODS.contains(&&*livelihood),
        ),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::record::{FieldValue, RawRecord};
    use crate::eligibility::rules::RuleEngine;

    fn labels(raw: RawRecord) -> LabelSet {
        RuleEngine::new(RecordFamily::Ifr)
            .apply(&raw)
            .expect("record is well formed")
            .labels
    }

    #[test]
    fn education_ranks_match_ladder_positions() {
        assert_eq!(education_rank("illiterate"), 0);
        assert_eq!(education_rank("High School"), HIGH_SCHOOL_RANK);
        assert_eq!(education_rank("higher secondary"), HIGHER_SECONDARY_RANK);
        assert_eq!(education_rank("graduation"), GRADUATION_RANK);
        assert_eq!(education_rank("phd"), 8);
        assert_eq!(education_rank("madrasa"), 0);
    }

    #[test]
    fn young_wage_labourer_qualifies_for_mgnrega_and_ddugky() {
        let labels = labels(
            RawRecord::new()
                .with("age_of_claimant", 30.0)
                .with("primary_livelihood", "Wage Labour")
                .with("annual_income", 150000.0),
        );
        assert_eq!(labels.get("MGNREGA_INDIV"), Some(true));
        assert_eq!(labels.get("DDUGKY"), Some(true));
        assert_eq!(labels.get("NSAP"), Some(false));
    }

    #[test]
    fn youth_band_is_inclusive() {
        for (age, expected) in [(17.0, false), (18.0, true), (35.0, true), (35.5, false)] {
            let labels = labels(RawRecord::new().with("age_of_claimant", age));
            assert_eq!(labels.get("DDUGKY"), Some(expected), "age {age}");
        }
    }

    #[test]
    fn st_graduate_qualifies_for_fellowship_and_post_matric() {
        let labels = labels(
            RawRecord::new()
                .with("highest_education_level", "graduation")
                .with("is_st", "yes"),
        );
        assert_eq!(labels.get("NATFELLOWSHIP_ST"), Some(true));
        assert_eq!(labels.get("POSTMATRIC_ST"), Some(true));
        assert_eq!(labels.get("PREMATRIC_ST"), Some(false));
    }

    #[test]
    fn non_st_graduate_gets_no_st_scholarship() {
        let labels = labels(RawRecord::new().with("highest_education_level", "graduation"));
        assert_eq!(labels.get("NATFELLOWSHIP_ST"), Some(false));
        assert_eq!(labels.get("POSTMATRIC_ST"), Some(false));
    }

    #[test]
    fn pre_matric_requires_children_and_school_level() {
        let labels = labels(
            RawRecord::new()
                .with("is_st", "True")
                .with("school_going_children", "yes")
                .with("highest_education_level", "middle"),
        );
        assert_eq!(labels.get("EMRS"), Some(true));
        assert_eq!(labels.get("PREMATRIC_ST"), Some(true));
    }

    #[test]
    fn numeric_st_flag_is_affirmative() {
        let labels = labels(
            RawRecord::new()
                .with("is_st", 1.0)
                .with("primary_livelihood", "Handicraft"),
        );
        assert_eq!(labels.get("TRIBALPROD_INDIV"), Some(true));
    }

    #[test]
    fn farmer_with_land_qualifies_for_pm_kisan() {
        let labels = labels(
            RawRecord::new()
                .with("cultivable_land_ownership", "Yes")
                .with("cultivation_area", 1.2)
                .with("primary_livelihood", "agriculture"),
        );
        assert_eq!(labels.get("PMKISAN"), Some(true));

        let no_area = self::labels(
            RawRecord::new()
                .with("cultivable_land_ownership", "yes")
                .with("primary_livelihood", "farmer"),
        );
        assert_eq!(no_area.get("PMKISAN"), Some(false));
    }

    #[test]
    fn income_ceilings_are_strict() {
        let labels = labels(
            RawRecord::new()
                .with("annual_income", 60000.0)
                .with("primary_livelihood", "agriculture"),
        );
        assert_eq!(labels.get("MGNREGA_INDIV"), Some(false));
        assert_eq!(labels.get("PMGKAY"), Some(true));
    }

    #[test]
    fn pension_applies_to_elderly_households() {
        let by_age = labels(RawRecord::new().with("age_of_claimant", 60.0));
        assert_eq!(by_age.get("NSAP"), Some(true));

        let by_member = labels(RawRecord::new().with("elderly_count_60plus", 2.0));
        assert_eq!(by_member.get("NSAP"), Some(true));

        let by_disability = labels(RawRecord::new().with("disability_in_household", "YES"));
        assert_eq!(by_disability.get("NSAP"), Some(true));
    }

    #[test]
    fn kutcha_house_qualifies_for_pmay() {
        let labels = labels(RawRecord::new().with("house_type", " Kutcha"));
        assert_eq!(labels.get("PMAYG"), Some(true));
    }

    #[test]
    fn missing_income_does_not_qualify_for_income_schemes() {
        let labels = labels(RawRecord::new().with("annual_income", FieldValue::Missing));
        assert_eq!(labels.get("PMGKAY"), Some(false));
    }

    #[test]
    fn malformed_age_is_reported_by_field() {
        let error = RuleEngine::new(RecordFamily::Ifr)
            .apply(&RawRecord::new().with("age_of_claimant", "thirty"))
            .expect_err("text age rejected");
        assert_eq!(error.field(), "age_of_claimant");
    }
}

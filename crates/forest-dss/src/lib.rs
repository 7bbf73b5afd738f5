//! Decision support for forest-rights welfare schemes.
//!
//! Records from the three forest-rights families (individual claims, community claims and
//! community forest-resource records) are normalized by a per-family rule engine, turned
//! into a feature row by the family's preprocessing artifact, and scored by one binary
//! classifier per scheme. Community and individual results also carry the most influential
//! features behind each score.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod telemetry;

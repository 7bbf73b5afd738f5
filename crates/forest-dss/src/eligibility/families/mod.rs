//! Per-family defaults, scheme catalogs, labelling rules and explanation text.

pub mod cfr;
pub mod cr;
pub mod ifr;

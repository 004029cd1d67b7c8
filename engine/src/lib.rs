//! Harvest and quality prediction engine for the Fielder platform
//!
//! Pure, synchronous building blocks: heat-unit accumulation, phenology
//! resolution, harvest window projection, per-crop quality curves and
//! confidence handling. Nothing in this crate performs I/O; weather and
//! research data arrive as plain values or through [`ResearchCatalog`].

pub mod calendar;
pub mod catalog;
pub mod climate;
pub mod confidence;
pub mod gdd;
pub mod models;
pub mod phenology;
pub mod projector;
pub mod quality;
pub mod types;
pub mod validation;

pub use catalog::ResearchCatalog;
pub use models::*;
pub use types::*;

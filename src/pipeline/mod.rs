//! Batch stages: paged reclassification and full-catalog ranking.

pub mod ranking;
pub mod reclassify;

pub use ranking::{RankingOutcome, RankingStage};
pub use reclassify::{ReclassifyPage, ReclassifyStage};

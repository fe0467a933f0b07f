//! Single-faced / double-faced split
//!
//! A card counts as double-faced when a back image could be obtained for it.
//! The catalog carries no reliable face-layout field, so classification
//! probes the image source instead of trusting metadata.

use crate::cache::CacheKey;
use crate::pipeline::ImagePipeline;
use crate::progress::ProgressUpdate;
use crate::types::{Card, Face, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceSplit {
    pub single_faced: Vec<Card>,
    pub double_faced: Vec<Card>,
}

/// Partition `cards` by back-image availability, preserving input order in
/// each bucket.
pub async fn classify(pipeline: &ImagePipeline, cards: &[Card]) -> Result<FaceSplit> {
    pipeline.ensure_all(cards, Face::Back).await?;

    let mut split = FaceSplit::default();
    for card in cards {
        let key = CacheKey::for_card(card, Face::Back);
        if pipeline.store().exists(&key).await {
            split.double_faced.push(card.clone());
        } else {
            split.single_faced.push(card.clone());
        }
    }

    pipeline.progress().send(ProgressUpdate::Classified {
        single_faced: split.single_faced.len(),
        double_faced: split.double_faced.len(),
    });
    Ok(split)
}

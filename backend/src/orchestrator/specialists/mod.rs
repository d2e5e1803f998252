//! Specialist task handlers
//!
//! Each specialist performs one bounded sub-task for a workflow run and
//! reports exactly one [`SpecialistResult`]. Specialists never return an
//! error: failures become zero-confidence results (or, for the
//! announcement, a template fallback) so the orchestrator always gets a
//! report it can merge.

pub mod announcement;
pub mod pricing;
pub mod recommendations;

pub use announcement::AnnouncementSpecialist;
pub use pricing::{discounted_price, PricingSpecialist};
pub use recommendations::RecommendationSpecialist;

use crate::llm::TextGenerator;
use crate::orchestrator::actions::{SpecialistId, SpecialistResult};
use crate::store::{ItemStore, StoreContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether the announcement specialist may call the text generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Try the text generator, falling back to the template on failure
    #[default]
    Llm,
    /// Always use the template
    Template,
}

/// Input shared by all specialists of one workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistRequest {
    /// Sale discount, 0..=100
    pub discount_percent: u8,
    /// Free-form context (e.g. the sale's name)
    pub context: Option<String>,
    /// Announcement generation mode
    pub generation: GenerationMode,
    /// Caller identity for store reads
    pub store_ctx: StoreContext,
}

/// A worker that handles one sub-task of a workflow
#[async_trait]
pub trait Specialist: Send + Sync {
    /// Which specialist this is
    fn id(&self) -> SpecialistId;

    /// Run the sub-task; never fails
    async fn handle(&self, request: &SpecialistRequest) -> SpecialistResult;
}

/// The three specialists every workflow spawns, in canonical order
pub fn roster(
    store: Arc<dyn ItemStore>,
    generator: Arc<dyn TextGenerator>,
) -> Vec<Arc<dyn Specialist>> {
    vec![
        Arc::new(PricingSpecialist::new(store.clone())),
        Arc::new(RecommendationSpecialist::new(store)),
        Arc::new(AnnouncementSpecialist::new(generator)),
    ]
}

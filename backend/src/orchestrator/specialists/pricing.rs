//! Pricing specialist
//!
//! Proposes a discounted price for every priced listing and a publish
//! action for every draft.

use super::{Specialist, SpecialistRequest};
use crate::orchestrator::actions::{
    PriceUpdate, ProposedAction, Publish, SpecialistId, SpecialistResult,
};
use crate::store::ItemStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

const CONFIDENCE: f64 = 0.95;

/// Round to two decimal places
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Apply `discount_percent` to `price`
///
/// The result is rounded to cents and never exceeds `price`.
pub fn discounted_price(price: f64, discount_percent: u8) -> f64 {
    let discount = f64::from(discount_percent.min(100)) / 100.0;
    round_cents(price * (1.0 - discount)).min(price)
}

/// Pricing analysis specialist (`listings`)
pub struct PricingSpecialist {
    store: Arc<dyn ItemStore>,
}

impl PricingSpecialist {
    /// Create a pricing specialist reading from `store`
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Specialist for PricingSpecialist {
    fn id(&self) -> SpecialistId {
        SpecialistId::Listings
    }

    async fn handle(&self, request: &SpecialistRequest) -> SpecialistResult {
        let items = match self.store.list(&request.store_ctx).await {
            Ok(items) => items,
            Err(e) => {
                warn!(specialist = %self.id(), error = %e, "Failed to read listings");
                return SpecialistResult::failed(format!("Could not read listings: {}", e));
            }
        };

        let price_updates: Vec<ProposedAction> = items
            .iter()
            .filter_map(|item| {
                item.price.map(|price| {
                    ProposedAction::PriceUpdate(PriceUpdate {
                        listing_id: item.id,
                        current_price: price,
                        new_price: discounted_price(price, request.discount_percent),
                        discount_percent: request.discount_percent,
                    })
                })
            })
            .collect();

        let publishes: Vec<ProposedAction> = items
            .iter()
            .filter(|item| item.is_draft())
            .map(|item| ProposedAction::Publish(Publish { listing_id: item.id }))
            .collect();

        let summary = if items.is_empty() {
            "No listings found; nothing to reprice.".to_string()
        } else {
            format!(
                "Proposed a {}% discount on {} listings; {} draft listings ready to publish.",
                request.discount_percent,
                price_updates.len(),
                publishes.len()
            )
        };

        debug!(
            specialist = %self.id(),
            price_updates = price_updates.len(),
            publishes = publishes.len(),
            "Pricing analysis complete"
        );

        let mut actions = price_updates;
        actions.extend(publishes);
        SpecialistResult::new(summary, actions, Vec::new(), CONFIDENCE)
    }
}

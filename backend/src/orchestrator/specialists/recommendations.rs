//! Recommendation specialist
//!
//! Rule-based bundle suggestions: consecutive listings are paired in
//! listing order, up to [`MAX_BUNDLES`] pairs.

use super::{Specialist, SpecialistRequest};
use crate::orchestrator::actions::{Bundle, ProposedAction, SpecialistId, SpecialistResult};
use crate::store::ItemStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of bundles suggested per run
pub const MAX_BUNDLES: usize = 3;

/// Extra discount offered on bundles, in percentage points
pub const BUNDLE_DISCOUNT_BOOST: u8 = 5;

/// Above this many listings the specialist asks about scope
const LARGE_CATALOG: usize = 5;

const CONFIDENCE: f64 = 0.80;

/// Bundle recommendation specialist (`recommendations`)
pub struct RecommendationSpecialist {
    store: Arc<dyn ItemStore>,
}

impl RecommendationSpecialist {
    /// Create a recommendation specialist reading from `store`
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Specialist for RecommendationSpecialist {
    fn id(&self) -> SpecialistId {
        SpecialistId::Recommendations
    }

    async fn handle(&self, request: &SpecialistRequest) -> SpecialistResult {
        let items = match self.store.list(&request.store_ctx).await {
            Ok(items) => items,
            Err(e) => {
                warn!(specialist = %self.id(), error = %e, "Failed to read listings");
                return SpecialistResult::failed(format!(
                    "Could not read listings for recommendations: {}",
                    e
                ));
            }
        };

        let bundles: Vec<Bundle> = items
            .chunks_exact(2)
            .take(MAX_BUNDLES)
            .map(|pair| Bundle {
                ids: pair.iter().map(|item| item.id).collect(),
                suggestion: format!("Bundle \"{}\" with \"{}\"", pair[0].title, pair[1].title),
                discount_boost: BUNDLE_DISCOUNT_BOOST,
            })
            .collect();

        let summary = if bundles.is_empty() {
            format!(
                "Not enough listings to suggest bundles; promote the {}% discount storewide.",
                request.discount_percent
            )
        } else {
            let suggestions: Vec<&str> = bundles.iter().map(|b| b.suggestion.as_str()).collect();
            format!(
                "Offer {} bundles at an extra {}% on top of the {}% discount: {}.",
                bundles.len(),
                BUNDLE_DISCOUNT_BOOST,
                request.discount_percent,
                suggestions.join("; ")
            )
        };

        let mut questions = Vec::new();
        if items.len() > LARGE_CATALOG {
            questions.push(format!(
                "There are {} listings. Should the discount apply to all of them or only a selection?",
                items.len()
            ));
        }
        let drafts = items.iter().filter(|item| item.is_draft()).count();
        if drafts > 0 {
            questions.push(format!(
                "{} listings are still drafts. Should they be published when the sale starts?",
                drafts
            ));
        }

        debug!(
            specialist = %self.id(),
            bundles = bundles.len(),
            questions = questions.len(),
            "Recommendations complete"
        );

        let actions = bundles.into_iter().map(ProposedAction::Bundle).collect();
        SpecialistResult::new(summary, actions, questions, CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::specialists::GenerationMode;
    use crate::store::{InMemoryItemStore, NewItem, StoreContext};

    fn request() -> SpecialistRequest {
        SpecialistRequest {
            discount_percent: 20,
            context: None,
            generation: GenerationMode::Template,
            store_ctx: StoreContext::new("demo-user"),
        }
    }

    async fn store_with(count: usize) -> Arc<InMemoryItemStore> {
        let store = Arc::new(InMemoryItemStore::new());
        let ctx = StoreContext::new("demo-user");
        for i in 0..count {
            let item = store
                .create(&ctx, NewItem::draft(&format!("Item {}", i), 10.0, 1))
                .await
                .unwrap();
            store.publish(&ctx, item.id).await.unwrap();
        }
        store
    }

    fn bundles(result: &SpecialistResult) -> Vec<&Bundle> {
        result
            .actions
            .iter()
            .filter_map(|action| match action {
                ProposedAction::Bundle(bundle) => Some(bundle),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_pairs_consecutive_items() {
        let store = store_with(5).await;
        let listing = store.list(&StoreContext::new("demo-user")).await.unwrap();

        let result = RecommendationSpecialist::new(store).handle(&request()).await;

        let bundles = bundles(&result);
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].ids, vec![listing[0].id, listing[1].id]);
        assert_eq!(bundles[1].ids, vec![listing[2].id, listing[3].id]);
        assert!(bundles.iter().all(|b| b.discount_boost == BUNDLE_DISCOUNT_BOOST));
        assert!(result.questions.is_empty());
        assert_eq!(result.confidence, CONFIDENCE);
    }

    #[tokio::test]
    async fn test_caps_bundles_and_asks_about_large_catalog() {
        let store = store_with(9).await;

        let result = RecommendationSpecialist::new(store).handle(&request()).await;

        assert_eq!(bundles(&result).len(), MAX_BUNDLES);
        assert_eq!(result.questions.len(), 1);
        assert!(result.questions[0].contains("9 listings"));
    }

    #[tokio::test]
    async fn test_asks_about_drafts() {
        let store = Arc::new(InMemoryItemStore::new());
        store
            .create(&StoreContext::new("demo-user"), NewItem::draft("Solo", 10.0, 1))
            .await
            .unwrap();

        let result = RecommendationSpecialist::new(store).handle(&request()).await;

        assert!(bundles(&result).is_empty());
        assert!(result.summary.contains("Not enough listings"));
        assert_eq!(result.questions.len(), 1);
        assert!(result.questions[0].contains("drafts"));
    }

    #[tokio::test]
    async fn test_store_failure_gives_zero_confidence() {
        let store = store_with(2).await;
        store.fail_list().await;

        let result = RecommendationSpecialist::new(store).handle(&request()).await;

        assert_eq!(result.confidence, 0.0);
        assert!(result.actions.is_empty());
    }
}

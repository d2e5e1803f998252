//! Plan merge
//!
//! Folds the three specialist results into one [`MergedPlan`]. Fields are
//! built by walking results in specialist order, so the plan does not
//! depend on the order in which reports arrived.

use crate::orchestrator::actions::{
    Announcement, Bundle, Faq, PriceUpdate, ProposedAction, Publish, SpecialistId,
    SpecialistResult,
};
use crate::orchestrator::state::WorkflowError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User-reviewable plan derived from all specialist results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedPlan {
    /// Price changes to apply
    pub price_updates: Vec<PriceUpdate>,
    /// Listings to publish
    pub publish_actions: Vec<Publish>,
    /// Bundle suggestions (advisory)
    pub bundle_suggestions: Vec<Bundle>,
    /// Announcement from the support specialist
    pub announcement: Option<Announcement>,
    /// Support FAQ entries
    pub faq: Vec<Faq>,
    /// Questions from all specialists, in specialist order
    pub all_questions: Vec<String>,
}

impl MergedPlan {
    /// Number of store mutations the executor will attempt
    pub fn mutation_count(&self) -> usize {
        self.price_updates.len() + self.publish_actions.len()
    }
}

/// Merge specialist results into a plan
///
/// # Returns
/// * `Ok(MergedPlan)` - When every specialist has reported
/// * `Err(WorkflowError::MissingResults)` - Naming the specialists that have not
pub fn merge(
    results: &BTreeMap<SpecialistId, SpecialistResult>,
) -> Result<MergedPlan, WorkflowError> {
    let missing: Vec<SpecialistId> = SpecialistId::ALL
        .into_iter()
        .filter(|id| !results.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(WorkflowError::MissingResults(missing));
    }

    let mut plan = MergedPlan::default();

    // BTreeMap iterates in SpecialistId order
    for (id, result) in results {
        for action in &result.actions {
            match action {
                ProposedAction::PriceUpdate(update) => plan.price_updates.push(update.clone()),
                ProposedAction::Publish(publish) => plan.publish_actions.push(publish.clone()),
                ProposedAction::Bundle(bundle) => plan.bundle_suggestions.push(bundle.clone()),
                ProposedAction::Announcement(announcement) => {
                    if *id == SpecialistId::Support && plan.announcement.is_none() {
                        plan.announcement = Some(announcement.clone());
                    }
                }
                ProposedAction::Faq(faq) => plan.faq.push(faq.clone()),
            }
        }
        plan.all_questions.extend(result.questions.iter().cloned());
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::actions::{Channel, GeneratedBy};
    use crate::orchestrator::specialists::GenerationMode;
    use crate::orchestrator::state::{PrepareRequest, Signal, WorkflowState, WorkflowStatus};
    use crate::store::StoreContext;
    use uuid::Uuid;

    fn announcement(title: &str) -> Announcement {
        Announcement {
            title: title.to_string(),
            body: "body".to_string(),
            channels: vec![Channel::Email],
            generated_by: GeneratedBy::Template,
        }
    }

    fn sample_results() -> Vec<(SpecialistId, SpecialistResult)> {
        let listing = Uuid::new_v4();
        vec![
            (
                SpecialistId::Listings,
                SpecialistResult::new(
                    "pricing",
                    vec![
                        ProposedAction::PriceUpdate(PriceUpdate {
                            listing_id: listing,
                            current_price: 10.0,
                            new_price: 8.0,
                            discount_percent: 20,
                        }),
                        ProposedAction::Publish(Publish { listing_id: listing }),
                    ],
                    vec!["listings question".to_string()],
                    0.95,
                ),
            ),
            (
                SpecialistId::Recommendations,
                SpecialistResult::new(
                    "recs",
                    vec![ProposedAction::Bundle(Bundle {
                        ids: vec![listing],
                        suggestion: "pair".to_string(),
                        discount_boost: 5,
                    })],
                    vec!["recs question".to_string()],
                    0.8,
                ),
            ),
            (
                SpecialistId::Support,
                SpecialistResult::new(
                    "support",
                    vec![
                        ProposedAction::Announcement(announcement("first")),
                        ProposedAction::Announcement(announcement("second")),
                        ProposedAction::Faq(Faq {
                            question: "q".to_string(),
                            answer: "a".to_string(),
                        }),
                    ],
                    vec!["support question".to_string()],
                    0.9,
                ),
            ),
        ]
    }

    #[test]
    fn test_merge_collects_each_kind() {
        let results: BTreeMap<_, _> = sample_results().into_iter().collect();
        let plan = merge(&results).unwrap();

        assert_eq!(plan.price_updates.len(), 1);
        assert_eq!(plan.publish_actions.len(), 1);
        assert_eq!(plan.bundle_suggestions.len(), 1);
        assert_eq!(plan.faq.len(), 1);
        assert_eq!(plan.announcement.unwrap().title, "first");
        assert_eq!(
            plan.all_questions,
            vec!["listings question", "recs question", "support question"]
        );
    }

    /// Plan produced by reporting `results` to a fresh workflow in the given order
    fn plan_after_reports(
        results: &[(SpecialistId, SpecialistResult)],
        order: [usize; 3],
    ) -> MergedPlan {
        let mut state = WorkflowState::new(Uuid::new_v4());
        state
            .apply(Signal::Prepare(PrepareRequest {
                discount_percent: 20,
                context: None,
                generation: GenerationMode::Template,
                store_ctx: StoreContext::new("demo-user"),
            }))
            .unwrap();
        for index in order {
            let (id, result) = results[index].clone();
            state.apply(Signal::SpecialistReported { id, result }).unwrap();
        }
        assert_eq!(state.status, WorkflowStatus::Ready);
        state.plan.unwrap()
    }

    #[test]
    fn test_plan_is_independent_of_arrival_order() {
        let results = sample_results();
        let expected = plan_after_reports(&results, [0, 1, 2]);
        assert_eq!(
            expected.all_questions,
            vec!["listings question", "recs question", "support question"]
        );

        for order in [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
            assert_eq!(
                plan_after_reports(&results, order),
                expected,
                "arrival order {:?}",
                order
            );
        }
    }

    #[test]
    fn test_announcement_only_from_support() {
        let mut results: BTreeMap<_, _> = sample_results().into_iter().collect();
        results.insert(
            SpecialistId::Listings,
            SpecialistResult::new(
                "pricing",
                vec![ProposedAction::Announcement(announcement("wrong source"))],
                vec![],
                0.5,
            ),
        );
        results.insert(SpecialistId::Support, SpecialistResult::failed("down"));

        let plan = merge(&results).unwrap();
        assert!(plan.announcement.is_none());
    }

    #[test]
    fn test_merge_requires_all_specialists() {
        let mut results: BTreeMap<_, _> = sample_results().into_iter().collect();
        results.remove(&SpecialistId::Recommendations);

        match merge(&results) {
            Err(WorkflowError::MissingResults(missing)) => {
                assert_eq!(missing, vec![SpecialistId::Recommendations])
            }
            other => panic!("expected missing results, got {:?}", other),
        }
    }
}

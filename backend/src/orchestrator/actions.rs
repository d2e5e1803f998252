//! Proposed actions and specialist results
//!
//! Specialists describe the changes they want as [`ProposedAction`]s. The
//! set of action kinds is closed so that merging and execution match on
//! every kind exhaustively.

use crate::store::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a specialist
///
/// The declaration order (listings, recommendations, support) is the
/// canonical order used when merging results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistId {
    /// Pricing analysis
    Listings,
    /// Bundle recommendations
    Recommendations,
    /// Announcement drafting
    Support,
}

impl SpecialistId {
    /// All specialists in canonical order
    pub const ALL: [SpecialistId; 3] = [
        SpecialistId::Listings,
        SpecialistId::Recommendations,
        SpecialistId::Support,
    ];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistId::Listings => "listings",
            SpecialistId::Recommendations => "recommendations",
            SpecialistId::Support => "support",
        }
    }
}

impl fmt::Display for SpecialistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change a listing's price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Listing to update
    pub listing_id: ItemId,
    /// Price before the discount
    pub current_price: f64,
    /// Discounted price, rounded to cents
    pub new_price: f64,
    /// Discount applied
    pub discount_percent: u8,
}

/// Publish a draft listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publish {
    /// Listing to publish
    pub listing_id: ItemId,
}

/// Suggest selling listings together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Listings in the bundle
    pub ids: Vec<ItemId>,
    /// Human-readable suggestion
    pub suggestion: String,
    /// Extra discount (percentage points) for buying the bundle
    pub discount_boost: u8,
}

/// Distribution channel for an announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Email newsletter
    Email,
    /// Social media post
    Social,
    /// Storefront banner
    Banner,
}

/// How an announcement's copy was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedBy {
    /// Drafted by the text generation service
    Llm,
    /// Deterministic fallback template
    Template,
}

/// Sale announcement copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    /// Headline
    pub title: String,
    /// Body text
    pub body: String,
    /// Where to send it
    pub channels: Vec<Channel>,
    /// Copy source
    pub generated_by: GeneratedBy,
}

/// Frequently asked question for support staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    /// Question
    pub question: String,
    /// Answer
    pub answer: String,
}

/// A change proposed by a specialist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposedAction {
    /// Change a listing's price
    PriceUpdate(PriceUpdate),
    /// Publish a draft listing
    Publish(Publish),
    /// Suggest a bundle
    Bundle(Bundle),
    /// Announce the sale
    Announcement(Announcement),
    /// Support FAQ entry
    Faq(Faq),
}

impl ProposedAction {
    /// Kind tag of this action
    pub fn kind(&self) -> ActionKind {
        match self {
            ProposedAction::PriceUpdate(_) => ActionKind::PriceUpdate,
            ProposedAction::Publish(_) => ActionKind::Publish,
            ProposedAction::Bundle(_) => ActionKind::Bundle,
            ProposedAction::Announcement(_) => ActionKind::Announcement,
            ProposedAction::Faq(_) => ActionKind::Faq,
        }
    }
}

/// Kind of a [`ProposedAction`], used in execution records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// See [`PriceUpdate`]
    PriceUpdate,
    /// See [`Publish`]
    Publish,
    /// See [`Bundle`]
    Bundle,
    /// See [`Announcement`]
    Announcement,
    /// See [`Faq`]
    Faq,
}

/// The single report a specialist sends back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistResult {
    /// One-paragraph summary, including any failure explanation
    pub summary: String,
    /// Proposed actions in the order the specialist produced them
    pub actions: Vec<ProposedAction>,
    /// Clarifying questions for the user
    pub questions: Vec<String>,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl SpecialistResult {
    /// Build a result, clamping confidence to [0, 1]
    pub fn new(
        summary: impl Into<String>,
        actions: Vec<ProposedAction>,
        questions: Vec<String>,
        confidence: f64,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            summary: summary.into(),
            actions,
            questions,
            confidence,
        }
    }

    /// A zero-confidence result with no actions
    pub fn failed(summary: impl Into<String>) -> Self {
        Self::new(summary, Vec::new(), Vec::new(), 0.0)
    }
}

//! Announcement specialist
//!
//! Drafts the sale announcement through the text generator and falls back
//! to a fixed template whenever generation is unavailable or returns
//! something unusable. Both paths produce the same fields.

use super::{GenerationMode, Specialist, SpecialistRequest};
use crate::llm::{GenerationError, TextGenerator};
use crate::orchestrator::actions::{
    Announcement, Channel, Faq, GeneratedBy, ProposedAction, SpecialistId, SpecialistResult,
};
use crate::orchestrator::constants::{ANNOUNCEMENT_MAX_TOKENS, ANNOUNCEMENT_TEMPERATURE};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

const LLM_CONFIDENCE: f64 = 0.85;
const TEMPLATE_CONFIDENCE: f64 = 0.90;

/// Channels every announcement goes out on
pub const ANNOUNCEMENT_CHANNELS: [Channel; 3] = [Channel::Email, Channel::Social, Channel::Banner];

const SCHEDULING_QUESTION: &str =
    "Should the announcement go out immediately or be scheduled for a later date?";

/// Copy returned by the model
#[derive(Debug, Deserialize)]
struct DraftCopy {
    title: String,
    body: String,
}

/// Build the generation prompt
pub fn announcement_prompt(discount_percent: u8, context: Option<&str>) -> String {
    format!(
        "You are writing a short sale announcement for an online shop.\n\
         Discount: {}% off.\n\
         Context: {}\n\
         Respond with a JSON object with exactly two string fields: \
         \"title\" (under 80 characters) and \"body\" (two or three sentences).",
        discount_percent,
        context.unwrap_or("general storewide sale")
    )
}

/// Deterministic announcement used when generation is not available
pub fn template_announcement(discount_percent: u8, context: Option<&str>) -> Announcement {
    let title = match context {
        Some(context) => format!("{}: {}% Off Storewide", context, discount_percent),
        None => format!("{}% Off Storewide", discount_percent),
    };
    Announcement {
        title,
        body: format!(
            "For a limited time, enjoy {}% off everything in the shop. \
             Browse our latest listings and find something you love before the sale ends.",
            discount_percent
        ),
        channels: ANNOUNCEMENT_CHANNELS.to_vec(),
        generated_by: GeneratedBy::Template,
    }
}

/// Parse model output into announcement copy
///
/// Accepts a bare JSON object, optionally wrapped in a markdown code fence.
fn parse_draft(text: &str) -> Result<Announcement, GenerationError> {
    let trimmed = text.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let draft: DraftCopy =
        serde_json::from_str(json).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    if draft.title.trim().is_empty() || draft.body.trim().is_empty() {
        return Err(GenerationError::EmptyResponse(
            "announcement title or body is blank".to_string(),
        ));
    }

    Ok(Announcement {
        title: draft.title.trim().to_string(),
        body: draft.body.trim().to_string(),
        channels: ANNOUNCEMENT_CHANNELS.to_vec(),
        generated_by: GeneratedBy::Llm,
    })
}

fn faqs(discount_percent: u8) -> Vec<Faq> {
    vec![
        Faq {
            question: "How long does the sale last?".to_string(),
            answer: format!(
                "The {}% discount runs for a limited time; the storefront banner shows the end date.",
                discount_percent
            ),
        },
        Faq {
            question: "Can the discount be combined with bundle offers?".to_string(),
            answer: format!(
                "Yes. Bundle offers add their extra discount on top of the {}% sale price.",
                discount_percent
            ),
        },
    ]
}

/// Announcement drafting specialist (`support`)
pub struct AnnouncementSpecialist {
    generator: Arc<dyn TextGenerator>,
}

impl AnnouncementSpecialist {
    /// Create an announcement specialist using `generator`
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    async fn generate(&self, request: &SpecialistRequest) -> Result<Announcement, GenerationError> {
        if request.generation == GenerationMode::Template {
            return Err(GenerationError::Disabled);
        }
        let prompt = announcement_prompt(request.discount_percent, request.context.as_deref());
        let text = self
            .generator
            .complete(&prompt, ANNOUNCEMENT_MAX_TOKENS, ANNOUNCEMENT_TEMPERATURE)
            .await?;
        parse_draft(&text)
    }
}

#[async_trait]
impl Specialist for AnnouncementSpecialist {
    fn id(&self) -> SpecialistId {
        SpecialistId::Support
    }

    async fn handle(&self, request: &SpecialistRequest) -> SpecialistResult {
        let (announcement, confidence, note) = match self.generate(request).await {
            Ok(announcement) => (announcement, LLM_CONFIDENCE, String::new()),
            Err(e) => {
                if !matches!(e, GenerationError::Disabled) {
                    warn!(specialist = %self.id(), error = %e, "Generation failed, using template");
                }
                (
                    template_announcement(request.discount_percent, request.context.as_deref()),
                    TEMPLATE_CONFIDENCE,
                    format!(" Used template copy ({}).", e.category()),
                )
            }
        };

        debug!(
            specialist = %self.id(),
            generated_by = ?announcement.generated_by,
            "Announcement drafted"
        );

        let summary = format!(
            "Drafted announcement \"{}\" for email, social and banner.{}",
            announcement.title, note
        );

        let mut actions = vec![ProposedAction::Announcement(announcement)];
        actions.extend(faqs(request.discount_percent).into_iter().map(ProposedAction::Faq));

        SpecialistResult::new(
            summary,
            actions,
            vec![SCHEDULING_QUESTION.to_string()],
            confidence,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{DisabledGenerator, GeminiClient};
    use crate::store::StoreContext;
    use mockito::Server;
    use serial_test::serial;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            Err(GenerationError::Timeout(30))
        }
    }

    fn request(generation: GenerationMode) -> SpecialistRequest {
        SpecialistRequest {
            discount_percent: 20,
            context: Some("Spring Sale".to_string()),
            generation,
            store_ctx: StoreContext::new("demo-user"),
        }
    }

    fn announcement(result: &SpecialistResult) -> &Announcement {
        result
            .actions
            .iter()
            .find_map(|action| match action {
                ProposedAction::Announcement(a) => Some(a),
                _ => None,
            })
            .expect("result should contain an announcement")
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_to_template() {
        let specialist = AnnouncementSpecialist::new(Arc::new(FailingGenerator));

        let result = specialist.handle(&request(GenerationMode::Llm)).await;

        assert_eq!(result.confidence, 0.90);
        let announcements = result
            .actions
            .iter()
            .filter(|a| matches!(a, ProposedAction::Announcement(_)))
            .count();
        assert_eq!(announcements, 1);
        let a = announcement(&result);
        assert_eq!(a.generated_by, GeneratedBy::Template);
        assert_eq!(
            a.channels,
            vec![Channel::Email, Channel::Social, Channel::Banner]
        );
        assert!(result.summary.contains("template"));
    }

    #[tokio::test]
    async fn test_fallback_summary_does_not_leak_api_key() {
        let client = GeminiClient::new("SUPER-SECRET-KEY", "m").with_base_url("http://127.0.0.1:1");
        let specialist = AnnouncementSpecialist::new(Arc::new(client));

        let result = specialist.handle(&request(GenerationMode::Llm)).await;

        assert_eq!(announcement(&result).generated_by, GeneratedBy::Template);
        assert!(!result.summary.contains("SUPER-SECRET-KEY"));
        assert!(!result.summary.contains("key="));
        assert!(result.summary.contains("Used template copy (generation"));
    }

    #[tokio::test]
    #[serial]
    async fn test_fallback_summary_does_not_echo_upstream_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/m:generateContent")
            .with_status(500)
            .with_body("internal trace: db=prod-replica-7 token=abc123")
            .create_async()
            .await;
        let client = GeminiClient::new("SUPER-SECRET-KEY", "m").with_base_url(server.url());
        let specialist = AnnouncementSpecialist::new(Arc::new(client));

        let result = specialist.handle(&request(GenerationMode::Llm)).await;

        mock.assert_async().await;
        assert_eq!(announcement(&result).generated_by, GeneratedBy::Template);
        assert!(!result.summary.contains("prod-replica-7"));
        assert!(!result.summary.contains("abc123"));
        assert!(!result.summary.contains("SUPER-SECRET-KEY"));
        assert!(result.summary.contains("generation service error 500"));
    }

    #[tokio::test]
    async fn test_llm_copy_is_used() {
        let specialist = AnnouncementSpecialist::new(Arc::new(FixedGenerator(
            "```json\n{\"title\": \"Spring into savings\", \"body\": \"Everything is 20% off.\"}\n```",
        )));

        let result = specialist.handle(&request(GenerationMode::Llm)).await;

        let a = announcement(&result);
        assert_eq!(a.generated_by, GeneratedBy::Llm);
        assert_eq!(a.title, "Spring into savings");
        assert_eq!(a.channels.len(), 3);
        assert_eq!(result.confidence, LLM_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let specialist =
            AnnouncementSpecialist::new(Arc::new(FixedGenerator("Big sale this week!")));

        let result = specialist.handle(&request(GenerationMode::Llm)).await;

        assert_eq!(announcement(&result).generated_by, GeneratedBy::Template);
        assert_eq!(result.confidence, TEMPLATE_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_blank_fields_fall_back() {
        let specialist =
            AnnouncementSpecialist::new(Arc::new(FixedGenerator(r#"{"title": " ", "body": "x"}"#)));

        let result = specialist.handle(&request(GenerationMode::Llm)).await;

        assert_eq!(announcement(&result).generated_by, GeneratedBy::Template);
    }

    #[tokio::test]
    async fn test_template_mode_skips_generator() {
        let specialist = AnnouncementSpecialist::new(Arc::new(FixedGenerator(
            r#"{"title": "never used", "body": "never used"}"#,
        )));

        let result = specialist.handle(&request(GenerationMode::Template)).await;

        let a = announcement(&result);
        assert_eq!(a.generated_by, GeneratedBy::Template);
        assert_eq!(a.title, "Spring Sale: 20% Off Storewide");
    }

    #[tokio::test]
    async fn test_faqs_and_question() {
        let specialist = AnnouncementSpecialist::new(Arc::new(DisabledGenerator));

        let result = specialist.handle(&request(GenerationMode::Llm)).await;

        let faqs = result
            .actions
            .iter()
            .filter(|a| matches!(a, ProposedAction::Faq(_)))
            .count();
        assert_eq!(faqs, 2);
        assert_eq!(result.questions, vec![SCHEDULING_QUESTION.to_string()]);
    }

    #[test]
    fn test_prompt_mentions_discount_and_context() {
        let prompt = announcement_prompt(35, Some("Black Friday"));
        assert!(prompt.contains("35% off"));
        assert!(prompt.contains("Black Friday"));
        assert!(announcement_prompt(10, None).contains("general storewide sale"));
    }
}

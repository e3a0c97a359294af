//! Recommendation Dispatcher — runs an ordered list of stages, short-circuiting on the
//! first one that produces an outcome.
//!
//! Standard order: catalog rules → grade/intent heuristics → generative fallback.
//! Stages can be added, removed or reordered without touching `Dispatcher::recommend`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::RecommendError;
use crate::llm_client::{GenerationRequest, LlmError, TextGenerator};
use crate::recommend::catalog::RuleCatalog;
use crate::recommend::digest::context_digest;
use crate::recommend::heuristics::apply_heuristics;
use crate::recommend::matcher::{match_category, matched_patterns};
use crate::recommend::models::{RecommendationOutcome, SessionContext};
use crate::recommend::prompts::build_system_prompt;

/// One step of the fallthrough chain.
///
/// `Ok(None)` means "not mine, try the next stage". Only fallible stages return `Err`.
#[async_trait]
pub trait RecommendationStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        message: &str,
        context: &SessionContext,
    ) -> Result<Option<RecommendationOutcome>, RecommendError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog rules
// ────────────────────────────────────────────────────────────────────────────

pub struct CatalogStage {
    catalog: Arc<RuleCatalog>,
}

impl CatalogStage {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl RecommendationStage for CatalogStage {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn attempt(
        &self,
        message: &str,
        context: &SessionContext,
    ) -> Result<Option<RecommendationOutcome>, RecommendError> {
        // Match and pattern extraction must see the same table.
        let snapshot = self.catalog.snapshot();

        Ok(match_category(&snapshot, message, context).map(|rule| {
            debug!(category = %rule.category, strength = ?rule.strength, "Catalog rule matched");
            RecommendationOutcome::from_rule(rule, matched_patterns(&snapshot, message))
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Grade / intent heuristics
// ────────────────────────────────────────────────────────────────────────────

pub struct HeuristicStage;

#[async_trait]
impl RecommendationStage for HeuristicStage {
    fn name(&self) -> &'static str {
        "heuristics"
    }

    async fn attempt(
        &self,
        message: &str,
        context: &SessionContext,
    ) -> Result<Option<RecommendationOutcome>, RecommendError> {
        Ok(apply_heuristics(message, context.grade).map(|(check, reply)| {
            debug!(check, "Heuristic matched");
            RecommendationOutcome::from_heuristic(reply)
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generative fallback
// ────────────────────────────────────────────────────────────────────────────

/// Delegates to the external text generator. Always answers or fails; never
/// passes to a later stage.
pub struct GenerativeStage {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    after_rules: bool,
}

impl GenerativeStage {
    /// `after_rules` adds a note to the prompt that the rule stages found nothing.
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration, after_rules: bool) -> Self {
        Self {
            generator,
            timeout,
            after_rules,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }

    /// One bounded, unretried call to the generator.
    pub async fn reply(
        &self,
        message: &str,
        context: &SessionContext,
    ) -> Result<String, RecommendError> {
        if !self.generator.is_configured() {
            return Err(LlmError::MissingApiKey.into());
        }

        let system_prompt =
            build_system_prompt(&context_digest(context), message, self.after_rules);
        let request = GenerationRequest::new(system_prompt, message.to_string());

        let secs = self.timeout.as_secs();
        let text = tokio::time::timeout(self.timeout, self.generator.generate(&request))
            .await
            .unwrap_or_else(|_| Err(LlmError::Timeout { secs }))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyContent.into());
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl RecommendationStage for GenerativeStage {
    fn name(&self) -> &'static str {
        "generative"
    }

    async fn attempt(
        &self,
        message: &str,
        context: &SessionContext,
    ) -> Result<Option<RecommendationOutcome>, RecommendError> {
        info!("No rule matched, delegating to generative fallback");
        let reply = self.reply(message, context).await?;
        Ok(Some(RecommendationOutcome::from_ai(reply)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ────────────────────────────────────────────────────────────────────────────

pub struct Dispatcher {
    stages: Vec<Arc<dyn RecommendationStage>>,
}

impl Dispatcher {
    pub fn new(stages: Vec<Arc<dyn RecommendationStage>>) -> Self {
        Self { stages }
    }

    /// catalog → heuristics → generative fallback.
    pub fn standard(
        catalog: Arc<RuleCatalog>,
        generator: Arc<dyn TextGenerator>,
        timeout: Duration,
    ) -> Self {
        let stages: Vec<Arc<dyn RecommendationStage>> = vec![
            Arc::new(CatalogStage::new(catalog)) as Arc<dyn RecommendationStage>,
            Arc::new(HeuristicStage),
            Arc::new(GenerativeStage::new(generator, timeout, true)),
        ];
        Self::new(stages)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Resolves a message to exactly one outcome, or a fatal error.
    pub async fn recommend(
        &self,
        message: &str,
        context: &SessionContext,
    ) -> Result<RecommendationOutcome, RecommendError> {
        let span = info_span!("recommend", request_id = %Uuid::new_v4());
        self.run_stages(message, context).instrument(span).await
    }

    async fn run_stages(
        &self,
        message: &str,
        context: &SessionContext,
    ) -> Result<RecommendationOutcome, RecommendError> {
        for stage in &self.stages {
            match stage.attempt(message, context).await {
                Ok(Some(outcome)) => {
                    info!(stage = stage.name(), source = ?outcome.source, "Recommendation resolved");
                    return Ok(outcome);
                }
                Ok(None) => debug!(stage = stage.name(), "Stage passed"),
                Err(e) => {
                    if e.is_configuration() {
                        warn!(stage = stage.name(), "Recommendation unavailable: {e}");
                    } else {
                        error!(stage = stage.name(), "Recommendation failed: {e}");
                    }
                    return Err(e);
                }
            }
        }

        Err(RecommendError::Configuration(
            "No recommendation stage produced a reply".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::recommend::heuristics::BEGINNER_GUIDANCE;
    use crate::recommend::models::{Confidence, RuleEntry, Source, StrengthTag};

    /// Fake generator that records every request it receives.
    struct RecordingGenerator {
        reply: Result<String, u16>,
        calls: AtomicUsize,
        last_request: Mutex<Option<GenerationRequest>>,
    }

    impl RecordingGenerator {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "upstream exploded".to_string(),
                }),
            }
        }
    }

    struct UnconfiguredGenerator;

    #[async_trait]
    impl TextGenerator for UnconfiguredGenerator {
        fn is_configured(&self) -> bool {
            false
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            panic!("unconfigured generator must never be called");
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    fn standard(generator: Arc<dyn TextGenerator>) -> Dispatcher {
        Dispatcher::standard(
            Arc::new(RuleCatalog::builtin()),
            generator,
            Duration::from_secs(30),
        )
    }

    fn ctx(grade: Option<u32>, interests: &[&str]) -> SessionContext {
        SessionContext {
            grade,
            interests: interests.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_stage_order() {
        let dispatcher = standard(RecordingGenerator::replying("x"));
        assert_eq!(
            dispatcher.stage_names(),
            vec!["catalog", "heuristics", "generative"]
        );
    }

    #[tokio::test]
    async fn test_interest_aligned_rule_outcome() {
        let generator = RecordingGenerator::replying("unused");
        let dispatcher = standard(generator.clone());

        let outcome = dispatcher
            .recommend("I love programming", &ctx(None, &["coding"]))
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Rules);
        assert_eq!(outcome.category.as_deref(), Some("coding"));
        assert_eq!(outcome.strength, Some(StrengthTag::InterestAligned));
        assert_eq!(outcome.confidence, Confidence::High);
        assert_eq!(outcome.matched_patterns, vec!["coding"]);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_keyword_only_rule_outcome() {
        let dispatcher = standard(RecordingGenerator::replying("unused"));

        let outcome = dispatcher
            .recommend("I want to join a robotics club", &ctx(Some(10), &["engineering"]))
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Rules);
        assert_eq!(outcome.category.as_deref(), Some("robotics"));
        assert_eq!(outcome.strength, Some(StrengthTag::KeywordOnly));
        assert_eq!(outcome.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn test_matched_patterns_lists_losing_categories_too() {
        let dispatcher = standard(RecordingGenerator::replying("unused"));

        let outcome = dispatcher
            .recommend("I like python, guitar and biology", &ctx(None, &[]))
            .await
            .unwrap();

        assert_eq!(outcome.category.as_deref(), Some("coding"));
        assert_eq!(outcome.matched_patterns, vec!["coding", "music", "science"]);
    }

    #[tokio::test]
    async fn test_rule_path_is_idempotent() {
        let dispatcher = standard(RecordingGenerator::replying("unused"));
        let context = ctx(Some(10), &["music"]);

        let first = dispatcher.recommend("piano and robots", &context).await.unwrap();
        let second = dispatcher.recommend("piano and robots", &context).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.category.as_deref(), Some("robotics"));
    }

    #[tokio::test]
    async fn test_heuristic_outcome_has_no_patterns() {
        let generator = RecordingGenerator::replying("unused");
        let dispatcher = standard(generator.clone());

        let outcome = dispatcher
            .recommend("I'm new here, want to explore", &ctx(Some(9), &[]))
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Rules);
        assert_eq!(outcome.reply, BEGINNER_GUIDANCE);
        assert_eq!(outcome.confidence, Confidence::Medium);
        assert!(outcome.matched_patterns.is_empty());
        assert!(outcome.category.is_none());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_message_falls_through_to_fallback() {
        let generator = RecordingGenerator::replying("  Tell me more about yourself!  ");
        let dispatcher = standard(generator.clone());

        let outcome = dispatcher
            .recommend("", &ctx(Some(9), &["coding"]))
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Ai);
        assert_eq!(outcome.reply, "Tell me more about yourself!");
        assert_eq!(outcome.confidence, Confidence::Medium);
        assert!(outcome.matched_patterns.is_empty());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_ai_path_without_matching_categories() {
        let catalog = Arc::new(RuleCatalog::new(vec![
            RuleEntry::new("coding", &["python"], "Coding!"),
            RuleEntry::new("music", &["guitar"], "Music!"),
        ]));
        let generator = RecordingGenerator::replying("Try the Science Olympiad and Art Club.");
        let dispatcher = Dispatcher::new(vec![
            Arc::new(CatalogStage::new(catalog)) as Arc<dyn RecommendationStage>,
            Arc::new(GenerativeStage::new(
                generator.clone(),
                Duration::from_secs(30),
                true,
            )),
        ]);

        let outcome = dispatcher
            .recommend(
                "I'm not sure what clubs fit science and art",
                &ctx(Some(10), &["science", "art"]),
            )
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Ai);
        assert_eq!(outcome.confidence, Confidence::Medium);
        assert!(outcome.matched_patterns.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_receives_digest_and_message() {
        let generator = RecordingGenerator::replying("ok");
        let dispatcher = standard(generator.clone());
        let context = SessionContext {
            grade: Some(10),
            interests: vec!["chess".to_string()],
            query_history: vec!["q1".into(), "q2".into(), "q3".into(), "q4".into()],
            ..Default::default()
        };

        dispatcher.recommend("hmm, not sure", &context).await.unwrap();

        let request = generator.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.user_message, "hmm, not sure");
        assert_eq!(request.max_output_tokens, 500);
        assert!(request.system_prompt.contains("User is in grade 10."));
        assert!(request.system_prompt.contains("User interests: chess."));
        assert!(request.system_prompt.contains("Previous queries: q2; q3; q4."));
        assert!(request
            .system_prompt
            .contains("Rule-based matching didn't find a clear match"));
    }

    #[tokio::test]
    async fn test_fallback_prompt_keeps_braced_context_verbatim() {
        let generator = RecordingGenerator::replying("ok");
        let dispatcher = standard(generator.clone());
        let context = SessionContext {
            interests: vec!["{message}".to_string()],
            ..Default::default()
        };

        dispatcher.recommend("hello", &context).await.unwrap();

        let request = generator.last_request.lock().unwrap().clone().unwrap();
        assert!(request
            .system_prompt
            .contains("Context about the user: User interests: {message}."));
    }

    #[tokio::test]
    async fn test_unconfigured_fallback_is_configuration_error() {
        let dispatcher = standard(Arc::new(UnconfiguredGenerator));

        let err = dispatcher
            .recommend("hmm, not sure", &SessionContext::default())
            .await
            .unwrap_err();

        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_rules_still_work_without_provider() {
        let dispatcher = standard(Arc::new(UnconfiguredGenerator));

        let outcome = dispatcher
            .recommend("I play soccer", &SessionContext::default())
            .await
            .unwrap();

        assert_eq!(outcome.category.as_deref(), Some("sports"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_retried() {
        let generator = RecordingGenerator::failing(500);
        let dispatcher = standard(generator.clone());

        let err = dispatcher
            .recommend("hmm, not sure", &SessionContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RecommendError::Provider(_)));
        assert!(err.to_string().contains("upstream exploded"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_provider_reply_is_provider_error() {
        let dispatcher = standard(RecordingGenerator::replying("   "));

        let err = dispatcher
            .recommend("hmm, not sure", &SessionContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RecommendError::Provider(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_provider_error() {
        let dispatcher = Dispatcher::standard(
            Arc::new(RuleCatalog::builtin()),
            Arc::new(SlowGenerator),
            Duration::from_secs(2),
        );

        let err = dispatcher
            .recommend("hmm, not sure", &SessionContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RecommendError::Provider(_)));
        assert!(err.to_string().contains("timed out after 2s"));
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_configuration_error() {
        let dispatcher = Dispatcher::new(vec![Arc::new(HeuristicStage) as Arc<dyn RecommendationStage>]);

        let err = dispatcher
            .recommend("", &SessionContext::default())
            .await
            .unwrap_err();

        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_upserted_rule_takes_effect() {
        let catalog = Arc::new(RuleCatalog::builtin());
        let dispatcher = Dispatcher::standard(
            catalog.clone(),
            Arc::new(UnconfiguredGenerator),
            Duration::from_secs(30),
        );

        catalog
            .upsert("chess", vec!["chess".to_string()], "♟️ Chess Club!".to_string())
            .unwrap();

        let outcome = dispatcher
            .recommend("I love chess", &ctx(None, &["Chess"]))
            .await
            .unwrap();

        assert_eq!(outcome.category.as_deref(), Some("chess"));
        assert_eq!(outcome.strength, Some(StrengthTag::InterestAligned));
        assert_eq!(outcome.matched_patterns, vec!["chess"]);
    }
}

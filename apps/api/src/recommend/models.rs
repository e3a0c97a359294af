use serde::{Deserialize, Serialize};

/// Accumulated session context sent alongside each message.
/// Absent fields deserialize to `None` / empty, never to "missing".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionContext {
    pub grade: Option<u32>,
    pub interests: Vec<String>,
    #[serde(alias = "experience_types")]
    pub experience_types: Vec<String>,
    #[serde(alias = "clubs_viewed")]
    pub clubs_viewed: Vec<String>,
    #[serde(alias = "query_history")]
    pub query_history: Vec<String>,
}

impl SessionContext {
    /// Case-insensitive membership test against the stated interests.
    /// Uses full Unicode lower-casing, the same folding applied to catalog keys.
    pub fn has_interest(&self, category: &str) -> bool {
        let category = category.trim().to_lowercase();
        self.interests
            .iter()
            .any(|interest| interest.trim().to_lowercase() == category)
    }
}

/// Inbound request record, produced by the transport layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub message: String,
    #[serde(default, alias = "session_data")]
    pub session_data: SessionContext,
}

/// A single catalog entry: a club category, its trigger keywords and canned reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntry {
    pub category: String,
    /// Lower-cased, deduplicated, first-seen order.
    pub keywords: Vec<String>,
    pub response_template: String,
}

impl RuleEntry {
    pub fn new(category: &str, keywords: &[&str], response_template: &str) -> Self {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_string()).collect();
        Self::from_parts(category, keywords, response_template.to_string())
    }

    /// Normalizes the category key and keyword set.
    pub fn from_parts(category: &str, keywords: Vec<String>, response_template: String) -> Self {
        let mut normalized: Vec<String> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }

        Self {
            category: category.trim().to_lowercase(),
            keywords: normalized,
            response_template,
        }
    }

    /// True when any keyword occurs as a substring of the already lower-cased message.
    pub fn hits(&self, message_lower: &str) -> bool {
        self.keywords.iter().any(|k| message_lower.contains(k.as_str()))
    }
}

/// Whether a rule match is corroborated by the student's stated interests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrengthTag {
    InterestAligned,
    KeywordOnly,
}

impl StrengthTag {
    pub fn confidence(self) -> Confidence {
        match self {
            StrengthTag::InterestAligned => Confidence::High,
            StrengthTag::KeywordOnly => Confidence::Medium,
        }
    }
}

/// Result of the category matcher. At most one category per request.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub category: String,
    pub reply: String,
    pub strength: StrengthTag,
}

/// Provenance of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Rules,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

/// The unit returned to the transport layer. Request-scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOutcome {
    pub source: Source,
    pub reply: String,
    pub confidence: Confidence,
    /// Every category whose keywords hit the message, in catalog order.
    /// Empty for heuristic and AI replies.
    pub matched_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<StrengthTag>,
}

impl RecommendationOutcome {
    pub fn from_rule(rule: RuleMatch, matched_patterns: Vec<String>) -> Self {
        Self {
            source: Source::Rules,
            reply: rule.reply,
            confidence: rule.strength.confidence(),
            matched_patterns,
            category: Some(rule.category),
            strength: Some(rule.strength),
        }
    }

    pub fn from_heuristic(reply: &str) -> Self {
        Self {
            source: Source::Rules,
            reply: reply.to_string(),
            confidence: Confidence::Medium,
            matched_patterns: vec![],
            category: None,
            strength: None,
        }
    }

    pub fn from_ai(reply: String) -> Self {
        Self {
            source: Source::Ai,
            reply,
            confidence: Confidence::Medium,
            matched_patterns: vec![],
            category: None,
            strength: None,
        }
    }
}

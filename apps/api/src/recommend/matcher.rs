//! Matcher — first-match-wins evaluation of the rule catalog.
//!
//! No scoring across categories: the first entry (in catalog order) with any keyword
//! occurring as a substring of the lower-cased message wins.

use crate::recommend::models::{RuleEntry, RuleMatch, SessionContext, StrengthTag};

pub const INTEREST_ALIGNED_SUFFIX: &str = "(Perfect match based on your interests!)";
pub const KEYWORD_ONLY_SUFFIX: &str = "(This might interest you based on your message!)";

/// Returns the first category whose keywords hit the message, tagged by whether the
/// category is also one of the student's stated interests.
pub fn match_category(
    catalog: &[RuleEntry],
    message: &str,
    context: &SessionContext,
) -> Option<RuleMatch> {
    if message.is_empty() {
        return None;
    }

    let message_lower = message.to_lowercase();
    let entry = catalog.iter().find(|entry| entry.hits(&message_lower))?;

    let (strength, suffix) = if context.has_interest(&entry.category) {
        (StrengthTag::InterestAligned, INTEREST_ALIGNED_SUFFIX)
    } else {
        (StrengthTag::KeywordOnly, KEYWORD_ONLY_SUFFIX)
    };

    Some(RuleMatch {
        category: entry.category.clone(),
        reply: format!("{} {}", entry.response_template, suffix),
        strength,
    })
}

/// Every category whose keywords hit the message, in catalog order. Computed
/// independently of which category won the match.
pub fn matched_patterns(catalog: &[RuleEntry], message: &str) -> Vec<String> {
    let message_lower = message.to_lowercase();
    catalog
        .iter()
        .filter(|entry| entry.hits(&message_lower))
        .map(|entry| entry.category.clone())
        .collect()
}

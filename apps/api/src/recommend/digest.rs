use crate::recommend::models::SessionContext;

/// How many trailing history entries are included in the digest.
const HISTORY_WINDOW: usize = 3;

const EMPTY_DIGEST: &str = "No prior context available.";

/// Flattens the session context into the one-paragraph summary embedded in the
/// fallback system prompt. Empty parts are omitted.
pub fn context_digest(context: &SessionContext) -> String {
    let mut digest = String::new();

    if let Some(grade) = context.grade.filter(|g| *g > 0) {
        digest.push_str(&format!("User is in grade {grade}. "));
    }
    if !context.interests.is_empty() {
        digest.push_str(&format!("User interests: {}. ", context.interests.join(", ")));
    }
    if !context.experience_types.is_empty() {
        digest.push_str(&format!(
            "Experience types: {}. ",
            context.experience_types.join(", ")
        ));
    }
    if !context.clubs_viewed.is_empty() {
        digest.push_str(&format!(
            "Previously viewed clubs: {}. ",
            context.clubs_viewed.join(", ")
        ));
    }
    if !context.query_history.is_empty() {
        let start = context.query_history.len().saturating_sub(HISTORY_WINDOW);
        digest.push_str(&format!(
            "Previous queries: {}. ",
            context.query_history[start..].join("; ")
        ));
    }

    let digest = digest.trim_end();
    if digest.is_empty() {
        EMPTY_DIGEST.to_string()
    } else {
        digest.to_string()
    }
}

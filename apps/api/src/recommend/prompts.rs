// Prompt fragments for the generative fallback.

/// Persona opening the system prompt.
pub const RECOMMENDER_PERSONA: &str = "\
You are a helpful Smart Club Recommender for the school club website.
Your role is to help students discover clubs that match their interests and personality.";

/// Behavioural guidelines, one per line.
pub const RECOMMENDER_GUIDELINES: &str = "\
Guidelines:
- Be friendly, encouraging, and helpful
- Focus on club recommendations and discovery
- Ask clarifying questions when needed
- Provide specific club suggestions when possible
- Keep responses concise but informative
- Use emojis appropriately to make responses engaging
- If the user asks about specific clubs, provide detailed information
- If the user is unsure, guide them through the discovery process
- Never mention \"AI\" or \"artificial intelligence\" - you are a Smart Club Recommender
- Present yourself as an intelligent recommendation system, not an AI
- Provide personalized recommendations based on the user's context";

/// Appended when the rule stages ran and found nothing.
pub const NO_RULE_MATCH_NOTE: &str = "Note: Rule-based matching didn't find a clear match, \
    so provide smart personalized recommendations.";

/// Builds the fallback system prompt from the context digest and raw message.
///
/// Digest and message are inserted verbatim in a single pass; brace sequences in
/// student-supplied text are never interpreted.
pub fn build_system_prompt(digest: &str, message: &str, after_rules: bool) -> String {
    let note = if after_rules {
        format!("\n\n{NO_RULE_MATCH_NOTE}")
    } else {
        String::new()
    };

    format!(
        "{RECOMMENDER_PERSONA}\n\n\
         Context about the user: {digest}\n\n\
         {RECOMMENDER_GUIDELINES}{note}\n\n\
         Respond naturally to their message: \"{message}\""
    )
}

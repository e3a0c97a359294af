//! Grade/intent heuristics — consulted only when no catalog category matched.
//!
//! Ordered, first-wins. Replies carry no category and never count towards
//! `matched_patterns`.

const BEGINNER_CUES: &[&str] = &["new", "beginner", "start", "learn", "explore"];
const LEADERSHIP_CUES: &[&str] = &["leadership", "lead", "mentor", "college", "career"];
const QUESTION_CUES: &[&str] = &["what", "which", "recommend", "suggest", "help"];
const EXPERIENCED_CUES: &[&str] = &["experienced", "advanced", "expert", "pro"];
const NOVICE_CUES: &[&str] = &["beginner", "new", "learning", "start"];

const UNDERCLASS_MAX_GRADE: u32 = 9;
const UPPERCLASS_MIN_GRADE: u32 = 11;

pub const BEGINNER_GUIDANCE: &str = "🌟 As a newer student, I recommend starting with clubs that \
    match your interests. The Coding Club, Art Club, or Science Club are great for exploring new \
    passions and making friends!";

pub const LEADERSHIP_GUIDANCE: &str = "🎓 As an upperclassman, consider leadership roles in clubs! \
    The Business Club, Debate Club, or becoming a mentor in Coding Club could be great for college \
    applications and personal growth.";

pub const CLARIFYING_QUESTION: &str = "🤔 I'd be happy to help you find the right club! What are \
    your main interests or hobbies? I can suggest clubs that match your passions and goals.";

pub const EXPERIENCED_GUIDANCE: &str = "🚀 For experienced students, consider taking on leadership \
    roles or starting new initiatives in clubs that match your expertise! You could mentor others \
    and make a real impact.";

pub const NOVICE_GUIDANCE: &str = "🌱 Great! Many clubs welcome beginners and offer mentorship \
    programs. Consider joining clubs that align with your interests - it's a great way to learn \
    and meet new people!";

/// A single heuristic check: a predicate over the lower-cased message and grade.
struct Heuristic {
    name: &'static str,
    applies: fn(&str, Option<u32>) -> bool,
    reply: &'static str,
}

/// Evaluation order matters: the first applicable check supplies the reply.
const HEURISTICS: &[Heuristic] = &[
    Heuristic {
        name: "underclass_beginner",
        applies: |msg, grade| {
            grade.is_some_and(|g| g <= UNDERCLASS_MAX_GRADE) && contains_any(msg, BEGINNER_CUES)
        },
        reply: BEGINNER_GUIDANCE,
    },
    Heuristic {
        name: "upperclass_leadership",
        applies: |msg, grade| {
            grade.is_some_and(|g| g >= UPPERCLASS_MIN_GRADE) && contains_any(msg, LEADERSHIP_CUES)
        },
        reply: LEADERSHIP_GUIDANCE,
    },
    Heuristic {
        name: "club_question",
        applies: |msg, _| contains_any(msg, QUESTION_CUES) && msg.contains("club"),
        reply: CLARIFYING_QUESTION,
    },
    Heuristic {
        name: "experienced",
        applies: |msg, _| contains_any(msg, EXPERIENCED_CUES),
        reply: EXPERIENCED_GUIDANCE,
    },
    Heuristic {
        name: "novice",
        applies: |msg, _| contains_any(msg, NOVICE_CUES),
        reply: NOVICE_GUIDANCE,
    },
];

fn contains_any(message_lower: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| message_lower.contains(cue))
}

/// Returns `(check name, reply)` for the first heuristic that applies.
///
/// A grade of 0 is treated as "not provided".
pub fn apply_heuristics(message: &str, grade: Option<u32>) -> Option<(&'static str, &'static str)> {
    if message.is_empty() {
        return None;
    }

    let message_lower = message.to_lowercase();
    let grade = grade.filter(|g| *g > 0);

    HEURISTICS
        .iter()
        .find(|h| (h.applies)(&message_lower, grade))
        .map(|h| (h.name, h.reply))
}

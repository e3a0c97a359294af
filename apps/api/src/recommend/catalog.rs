//! Rule Catalog — ordered table of club categories, their trigger keywords and replies.
//!
//! Order is precedence: when a message hits keywords from several categories, the
//! earliest entry wins. The built-in order is:
//!
//! coding → business → robotics → debate → art → music → sports → science
//!
//! Readers take an `Arc` snapshot; `upsert` builds a fresh table and swaps it in,
//! so a request always evaluates against a single consistent table.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::errors::AppError;
use crate::recommend::models::RuleEntry;

pub type CatalogSnapshot = Arc<Vec<RuleEntry>>;

pub struct RuleCatalog {
    entries: RwLock<CatalogSnapshot>,
}

impl RuleCatalog {
    /// Builds a catalog from entries in precedence order.
    /// A repeated category replaces the earlier one in place.
    pub fn new(entries: Vec<RuleEntry>) -> Self {
        let mut table: Vec<RuleEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            insert_or_replace(&mut table, entry);
        }
        Self {
            entries: RwLock::new(Arc::new(table)),
        }
    }

    /// The catalog shipped with the service.
    pub fn builtin() -> Self {
        Self::new(builtin_entries())
    }

    /// Current table. Cheap: clones the `Arc`, not the entries.
    pub fn snapshot(&self) -> CatalogSnapshot {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Category keys in precedence order.
    pub fn list_categories(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|entry| entry.category.clone())
            .collect()
    }

    /// Inserts a new category at the end of the precedence order, or replaces an
    /// existing one in its current position. Keywords are lower-cased.
    pub fn upsert(
        &self,
        category: &str,
        keywords: Vec<String>,
        response_template: String,
    ) -> Result<RuleEntry, AppError> {
        let entry = RuleEntry::from_parts(category, keywords, response_template);

        if entry.category.is_empty() {
            return Err(AppError::Validation("category cannot be empty".to_string()));
        }
        if entry.keywords.is_empty() {
            return Err(AppError::Validation(
                "at least one non-empty keyword is required".to_string(),
            ));
        }
        if entry.response_template.trim().is_empty() {
            return Err(AppError::Validation(
                "responseTemplate cannot be empty".to_string(),
            ));
        }

        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next: Vec<RuleEntry> = (**guard).clone();
        let replaced = insert_or_replace(&mut next, entry.clone());
        *guard = Arc::new(next);

        info!(
            category = %entry.category,
            keywords = entry.keywords.len(),
            replaced,
            "Rule catalog entry upserted"
        );

        Ok(entry)
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Returns true when an existing entry was replaced.
fn insert_or_replace(table: &mut Vec<RuleEntry>, entry: RuleEntry) -> bool {
    match table.iter_mut().find(|e| e.category == entry.category) {
        Some(existing) => {
            *existing = entry;
            true
        }
        None => {
            table.push(entry);
            false
        }
    }
}

fn builtin_entries() -> Vec<RuleEntry> {
    vec![
        RuleEntry::new(
            "coding",
            &[
                "coding",
                "programming",
                "code",
                "software",
                "development",
                "python",
                "javascript",
                "java",
                "web dev",
                "computer science",
                "tech",
            ],
            "🎯 Perfect match! The Coding Club is ideal for you! It offers hands-on programming \
             projects, hackathons, mentorship opportunities, and connects you with like-minded \
             tech enthusiasts. You'll build real projects and develop skills that are valuable \
             for college and career.",
        ),
        RuleEntry::new(
            "business",
            &[
                "business",
                "entrepreneur",
                "startup",
                "finance",
                "marketing",
                "management",
                "leadership",
                "commerce",
                "economics",
            ],
            "💼 Excellent choice! The Business Club (FBLA/DECA) is perfect for you! It focuses on \
             entrepreneurship, real-world case studies, leadership development, and business \
             competitions. Great for building skills that colleges and employers value.",
        ),
        RuleEntry::new(
            "robotics",
            &[
                "robotics",
                "robot",
                "engineering",
                "mechanical",
                "arduino",
                "sensors",
                "automation",
                "STEM",
                "technology",
            ],
            "🤖 Awesome! The Robotics Club is a fantastic fit! You'll work on building robots, \
             programming microcontrollers, competing in robotics competitions, and developing \
             engineering skills. Perfect for STEM enthusiasts!",
        ),
        RuleEntry::new(
            "debate",
            &[
                "debate",
                "speaking",
                "public speaking",
                "argument",
                "persuasion",
                "politics",
                "current events",
                "speech",
                "forensics",
            ],
            "🗣️ Great match! The Debate Club is perfect for you! It develops critical thinking, \
             public speaking, research skills, and confidence. Excellent for college applications \
             and future leadership roles.",
        ),
        RuleEntry::new(
            "art",
            &[
                "art",
                "drawing",
                "painting",
                "creative",
                "design",
                "visual",
                "sketching",
                "digital art",
                "graphic design",
            ],
            "🎨 Perfect! The Art Club is ideal for creative minds! It's a supportive space to \
             explore different mediums, techniques, and styles. Great for building a portfolio \
             and expressing your creativity.",
        ),
        RuleEntry::new(
            "music",
            &[
                "music",
                "band",
                "instrument",
                "singing",
                "guitar",
                "piano",
                "orchestra",
                "choir",
                "musical",
                "performance",
            ],
            "🎵 Wonderful! The Music Club welcomes all musicians! Whether you play an instrument, \
             sing, or want to learn, there's a place for you. Great for building confidence, \
             teamwork, and musical skills.",
        ),
        RuleEntry::new(
            "sports",
            &[
                "sports",
                "athletic",
                "fitness",
                "basketball",
                "soccer",
                "tennis",
                "volleyball",
                "track",
                "athletics",
                "team",
            ],
            "🏅 Great choice! Our Sports Clubs offer opportunities for competition, fitness, and \
             teamwork. Whether you're competitive or just want to stay active, there's a sport \
             for everyone!",
        ),
        RuleEntry::new(
            "science",
            &[
                "science",
                "research",
                "experiment",
                "chemistry",
                "biology",
                "physics",
                "lab",
                "scientific",
                "STEM",
            ],
            "🔬 Excellent! The Science Club is perfect for curious minds! You'll conduct \
             experiments, attend science fairs, explore cutting-edge research, and develop \
             critical thinking skills. Great for STEM careers!",
        ),
    ]
}

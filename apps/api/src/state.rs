use std::sync::Arc;
use std::time::Duration;

use crate::llm_client::TextGenerator;
use crate::recommend::catalog::RuleCatalog;
use crate::recommend::dispatcher::{Dispatcher, GenerativeStage};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read-mostly; `upsert` swaps in a new snapshot.
    pub catalog: Arc<RuleCatalog>,
    pub dispatcher: Arc<Dispatcher>,
    /// Direct generative access for `/api/ai`, without the "no rule matched" note.
    pub ai: Arc<GenerativeStage>,
}

impl AppState {
    pub fn new(
        catalog: Arc<RuleCatalog>,
        generator: Arc<dyn TextGenerator>,
        fallback_timeout: Duration,
    ) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::standard(
                catalog.clone(),
                generator.clone(),
                fallback_timeout,
            )),
            ai: Arc::new(GenerativeStage::new(generator, fallback_timeout, false)),
            catalog,
        }
    }
}

//! Shared state for the HTTP handlers.

use std::sync::Arc;

use crate::pipeline::{ArticlePipeline, Environment};

/// Handler state. Cloned per request; the pipeline sits behind an `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    /// `None` when the pipeline failed to start; article requests get 503.
    pub pipeline: Option<Arc<ArticlePipeline>>,
    pub environment: Environment,
}

impl AppState {
    pub fn ready(pipeline: Arc<ArticlePipeline>, environment: Environment) -> Self {
        Self {
            pipeline: Some(pipeline),
            environment,
        }
    }

    /// State for a server whose pipeline could not be built.
    pub fn not_ready(environment: Environment) -> Self {
        Self {
            pipeline: None,
            environment,
        }
    }
}

use std::sync::Arc;

use crate::pipeline::LookupPipeline;
use crate::refresh::RefreshOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LookupPipeline>,

    pub orchestrator: Arc<RefreshOrchestrator>,
}

impl AppState {
    pub fn new(pipeline: Arc<LookupPipeline>, orchestrator: Arc<RefreshOrchestrator>) -> Self {
        Self {
            pipeline,
            orchestrator,
        }
    }
}

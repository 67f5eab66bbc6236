// Application state: storage, LLM client and the analysis pipeline.
use crate::config::Config;
use crate::llm::LlmClient;
use crate::orchestrator::Orchestrator;
use crate::storage::{build_storage, StorageBackend};
use anyhow::Result;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn StorageBackend>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let storage = build_storage(&config.storage);
        storage.ensure_initialized()?;
        let llm = LlmClient::new(reqwest::Client::new(), config.llm.clone());
        let orchestrator = Orchestrator::new(llm, storage.clone());
        Ok(Self {
            config,
            storage,
            orchestrator,
        })
    }
}

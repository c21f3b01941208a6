use std::sync::Arc;

use crate::config::AppConfig;
use crate::corpus::CorpusStore;
use crate::llm::ChatClient;
use crate::pipeline::{AnswerGenerator, Orchestrator};
use crate::rerank::Reranker;

pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Arc<Self>> {
        let store = CorpusStore::connect(&config.storage.database_path).await?;
        let reranker = Arc::new(Reranker::new(&config.agent));
        let chat = Arc::new(ChatClient::new(&config.agent));
        let generator = AnswerGenerator::new(chat);
        let orchestrator = Orchestrator::new(store, reranker, generator, config.agent.top_k);

        Ok(Arc::new(AppState {
            config,
            orchestrator,
        }))
    }
}

//! The retrieval-augmented answer pipeline.
//!
//! One invocation per question: load the corpus, rank titles against the
//! question, assemble the top article bodies, then stream the generated
//! answer. Every failure mode is absorbed into the fragment stream itself, so
//! consumers always see a non-empty, terminating sequence of fragments.

pub mod assembler;
pub mod generator;
pub mod prompt;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::errors::ApiError;
use crate::corpus::CorpusStore;
use crate::rerank::RelevanceRanker;

pub use generator::AnswerGenerator;

const SYSTEM_ERROR_PREFIX: &str = "电力交易智能问答系统发生错误:";

#[derive(Clone)]
pub struct Orchestrator {
    store: CorpusStore,
    ranker: Arc<dyn RelevanceRanker>,
    generator: AnswerGenerator,
    top_k: usize,
}

impl Orchestrator {
    pub fn new(
        store: CorpusStore,
        ranker: Arc<dyn RelevanceRanker>,
        generator: AnswerGenerator,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            ranker,
            generator,
            top_k,
        }
    }

    /// Run the pipeline for one question, returning its fragment stream.
    ///
    /// The stream is always non-empty and always terminates: a failure before
    /// generation yields exactly one system-error fragment, and the generator
    /// itself converts its failures into a single error fragment.
    pub fn answer_stream(&self, question: String) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);
        let pipeline = self.clone();

        tokio::spawn(async move {
            if let Err(err) = pipeline.run(&question, &tx).await {
                tracing::error!("pipeline failed before generation: {}", err);
                let _ = tx.send(format!("{}{}", SYSTEM_ERROR_PREFIX, err)).await;
            }
        });

        rx
    }

    async fn run(&self, question: &str, tx: &mpsc::Sender<String>) -> Result<(), ApiError> {
        let articles = self.store.load_all().await?;
        tracing::info!("loaded {} articles for question: {}", articles.len(), question);

        let references = if articles.is_empty() {
            // Degraded context, not an error: still attempt a best-effort
            // answer from general knowledge.
            Vec::new()
        } else {
            let titles: Vec<String> = articles.iter().map(|a| a.title.clone()).collect();
            let ranked = self.ranker.rank(question, &titles, self.top_k).await;
            let corpus: HashMap<String, String> = articles
                .into_iter()
                .map(|a| (a.title, a.content))
                .collect();
            assembler::assemble(&ranked, &corpus)
        };

        let mut fragments = self.generator.generate(question, &references).await;
        while let Some(fragment) = fragments.recv().await {
            if tx.send(fragment).await.is_err() {
                // Caller went away; dropping `fragments` releases the
                // upstream connection.
                return Ok(());
            }
        }
        Ok(())
    }
}

//! Client for the upstream reranking service.

use std::cmp::Ordering;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::AgentConfig;
use crate::core::errors::ApiError;

/// One candidate title scored against the query.
///
/// `index` is the position in the candidate list that was submitted upstream,
/// so duplicate titles stay unambiguous. `rank` is 1-based, assigned by
/// strictly descending `relevance_score`.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub index: usize,
    pub title: String,
    pub relevance_score: f64,
    pub rank: usize,
}

#[async_trait]
pub trait RelevanceRanker: Send + Sync {
    /// Rank `candidates` by relevance to `query`, returning at most `top_k`
    /// results. Never fails: an unreachable or misbehaving upstream yields an
    /// empty result, which callers must read as "no usable candidates".
    async fn rank(&self, query: &str, candidates: &[String], top_k: usize) -> Vec<RankedCandidate>;
}

#[derive(Clone)]
pub struct Reranker {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Reranker {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.rerank_model.clone(),
        }
    }

    async fn request_rank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<RerankResponse, ApiError> {
        let url = format!("{}/rerank", self.base_url);
        let body = json!({
            "model": self.model,
            "query": query,
            "documents": documents,
            "top_n": top_n,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(ApiError::Internal(format!(
                "rerank request failed with status {}",
                res.status()
            )));
        }

        res.json().await.map_err(ApiError::internal)
    }
}

#[async_trait]
impl RelevanceRanker for Reranker {
    async fn rank(&self, query: &str, candidates: &[String], top_k: usize) -> Vec<RankedCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        match self.request_rank(query, candidates, top_k).await {
            Ok(response) => order_candidates(response.results, candidates, top_k),
            Err(err) => {
                // No retry: an unavailable reranker degrades to no references.
                tracing::warn!("rerank call failed, proceeding without ranking: {}", err);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f64,
}

/// Re-sort upstream results by descending score on our side; the upstream
/// tie-break policy is not contractually guaranteed, ours is: original
/// candidate order.
fn order_candidates(
    results: Vec<RerankResult>,
    candidates: &[String],
    top_k: usize,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = results
        .into_iter()
        .filter(|r| r.index < candidates.len())
        .map(|r| RankedCandidate {
            index: r.index,
            title: candidates[r.index].clone(),
            relevance_score: r.relevance_score,
            rank: 0,
        })
        .collect();

    ranked.sort_by_key(|c| c.index);
    ranked.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(top_k);
    for (position, candidate) in ranked.iter_mut().enumerate() {
        candidate.rank = position + 1;
    }
    ranked
}

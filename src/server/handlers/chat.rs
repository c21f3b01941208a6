//! The question-answering endpoint.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;

use crate::core::errors::ApiError;
use crate::server::sse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_stream() -> bool {
    true
}

/// POST /api/chat
///
/// `stream: true` (the default) answers over `text/event-stream`; otherwise
/// the fragment stream is drained into one JSON object. Only malformed input
/// is rejected here; everything downstream fail-softs into the stream.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("请求体必须是JSON格式".to_string()))?;

    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("问题不能为空".to_string()));
    }

    tracing::info!("收到问题: {}", question);
    let fragments = state.orchestrator.answer_stream(question.clone());

    if request.stream {
        let frames = sse::encode(question, fragments);
        let body = Body::from_stream(ReceiverStream::new(frames).map(Ok::<_, Infallible>));
        Ok((
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            body,
        )
            .into_response())
    } else {
        let mut fragments = fragments;
        let mut response_text = String::new();
        while let Some(fragment) = fragments.recv().await {
            response_text.push_str(&fragment);
        }

        tracing::info!("非流式回答完成，问题: {}", question);
        Ok(Json(json!({
            "question": question,
            "response": response_text,
            "timestamp": Utc::now().to_rfc3339(),
            "status": "success",
        }))
        .into_response())
    }
}

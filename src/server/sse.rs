//! Typed server-sent-event envelopes and framing.
//!
//! Every pipeline invocation becomes: one `start` event, one `content` event
//! per fragment, and one terminal `end` event carrying the accumulated
//! response. The `error` event type is reserved for failures of the encoding
//! layer itself; pipeline failures arrive as ordinary content fragments.

use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Start { timestamp: f64, question: String },
    Content { content: String, timestamp: f64 },
    End { complete_response: String, timestamp: f64 },
    Error { error: String, timestamp: f64 },
}

impl SseEvent {
    pub fn start(question: String) -> Self {
        SseEvent::Start {
            timestamp: unix_now(),
            question,
        }
    }

    pub fn content(content: String) -> Self {
        SseEvent::Content {
            content,
            timestamp: unix_now(),
        }
    }

    pub fn end(complete_response: String) -> Self {
        SseEvent::End {
            complete_response,
            timestamp: unix_now(),
        }
    }

    pub fn error(error: String) -> Self {
        SseEvent::Error {
            error,
            timestamp: unix_now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            SseEvent::Start { .. } => "start",
            SseEvent::Content { .. } => "content",
            SseEvent::End { .. } => "end",
            SseEvent::Error { .. } => "error",
        }
    }

    /// Serialize to the wire framing: `event: <type>\ndata: <json>\n\n`.
    ///
    /// The JSON payload uses sorted keys, so the same event value always
    /// frames to identical bytes.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        let payload = match self {
            SseEvent::Start { timestamp, question } => json!({
                "timestamp": timestamp,
                "question": question,
            }),
            SseEvent::Content { content, timestamp } => json!({
                "content": content,
                "timestamp": timestamp,
            }),
            SseEvent::End {
                complete_response,
                timestamp,
            } => json!({
                "complete_response": complete_response,
                "timestamp": timestamp,
            }),
            SseEvent::Error { error, timestamp } => json!({
                "error": error,
                "timestamp": timestamp,
            }),
        };
        let data = serde_json::to_string(&payload)?;
        Ok(format!("event: {}\ndata: {}\n\n", self.event_type(), data))
    }
}

fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Wrap a fragment stream in framed events for transport.
///
/// Emits `start` before consuming anything, one `content` per fragment in
/// arrival order, and `end` with the full concatenation once the fragment
/// stream closes. A failure of the encoding layer itself produces one
/// terminal `error` event; a transport hang-up just stops the encoder.
pub fn encode(question: String, mut fragments: mpsc::Receiver<String>) -> mpsc::Receiver<Bytes> {
    let (tx, rx) = mpsc::channel::<Bytes>(32);

    tokio::spawn(async move {
        if !emit(&tx, SseEvent::start(question)).await {
            return;
        }

        let mut complete_response = String::new();
        while let Some(fragment) = fragments.recv().await {
            complete_response.push_str(&fragment);
            if !emit(&tx, SseEvent::content(fragment)).await {
                return;
            }
        }

        emit(&tx, SseEvent::end(complete_response)).await;
    });

    rx
}

/// Frame and send one event. Returns false once the encoder should stop:
/// either the transport hung up, or framing failed (in which case a terminal
/// `error` event is attempted first).
async fn emit(tx: &mpsc::Sender<Bytes>, event: SseEvent) -> bool {
    match event.to_frame() {
        Ok(frame) => tx.send(Bytes::from(frame)).await.is_ok(),
        Err(err) => {
            tracing::error!("sse framing failed: {}", err);
            let fallback = SseEvent::error(format!("流式输出错误: {}", err))
                .to_frame()
                .unwrap_or_else(|_| "event: error\ndata: {}\n\n".to_string());
            let _ = tx.send(Bytes::from(fallback)).await;
            false
        }
    }
}

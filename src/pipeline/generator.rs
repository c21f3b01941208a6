//! Error-absorbing token stream over the chat provider.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::llm::{ChatProvider, ChatRequest};

use super::prompt;

const ERROR_PREFIX: &str = "错误：";

/// Produces the answer as a lazy fragment stream.
///
/// Fragments are forwarded as soon as the upstream model emits them; nothing
/// waits for stream completion. Any failure, at invocation or mid-stream,
/// becomes exactly one literal `错误：<message>` fragment followed by stream
/// end, so this component never errors past its boundary.
#[derive(Clone)]
pub struct AnswerGenerator {
    chat: Arc<dyn ChatProvider>,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self { chat }
    }

    pub async fn generate(&self, question: &str, references: &[String]) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);
        let request = ChatRequest::new(prompt::build_messages(question, references));

        match self.chat.stream_chat(request).await {
            Ok(mut upstream) => {
                tokio::spawn(async move {
                    while let Some(item) = upstream.recv().await {
                        match item {
                            Ok(delta) => {
                                if tx.send(delta).await.is_err() {
                                    // Consumer gone: dropping `upstream`
                                    // closes the live connection.
                                    return;
                                }
                            }
                            Err(err) => {
                                tracing::error!("generation stream broke: {}", err);
                                let _ = tx.send(format!("{}{}", ERROR_PREFIX, err)).await;
                                return;
                            }
                        }
                    }
                });
            }
            Err(err) => {
                tracing::error!("generation call failed: {}", err);
                let _ = tx.send(format!("{}{}", ERROR_PREFIX, err)).await;
            }
        }

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::core::errors::ApiError;

    struct FailingProvider;

    #[async_trait]
    impl ChatProvider for FailingProvider {
        async fn stream_chat(
            &self,
            _request: ChatRequest,
        ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
            Err(ApiError::Internal("quota exceeded".to_string()))
        }
    }

    /// Hands out a receiver whose sender side the test keeps, to observe
    /// cancellation propagation.
    struct HeldStreamProvider {
        handle: Mutex<Option<mpsc::Sender<Result<String, ApiError>>>>,
    }

    #[async_trait]
    impl ChatProvider for HeldStreamProvider {
        async fn stream_chat(
            &self,
            _request: ChatRequest,
        ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
            let (tx, rx) = mpsc::channel(32);
            *self.handle.lock().unwrap() = Some(tx);
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn invocation_failure_becomes_one_error_fragment() {
        let generator = AnswerGenerator::new(Arc::new(FailingProvider));
        let mut rx = generator.generate("问题", &[]).await;

        let fragment = rx.recv().await.unwrap();
        assert!(fragment.starts_with("错误："));
        assert!(fragment.contains("quota exceeded"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_consumer_releases_the_upstream_stream() {
        let provider = Arc::new(HeldStreamProvider {
            handle: Mutex::new(None),
        });
        let generator = AnswerGenerator::new(provider.clone());

        let rx = generator.generate("问题", &[]).await;
        let upstream_tx = provider.handle.lock().unwrap().take().unwrap();

        // Push one fragment into the still-attached pipeline, then disconnect
        // the consumer.
        upstream_tx.send(Ok("片段".to_string())).await.unwrap();
        drop(rx);

        // The forwarding task must notice and drop its receiver, which shows
        // up here as a closed channel.
        let mut closed = false;
        for _ in 0..50 {
            if upstream_tx.is_closed() {
                closed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(closed, "upstream stream was not released after consumer drop");
    }
}

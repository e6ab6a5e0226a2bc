use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{InferenceClient, InferenceError, RawCompletion};

/// How long to keep trying while the provider reports the model as loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
        }
    }
}

/// Wraps another client and retries only on `InferenceError::ModelLoading`.
/// Every other failure is returned on the spot.
pub struct RetryingClient {
    inner: Arc<dyn InferenceClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn InferenceClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl InferenceClient for RetryingClient {
    async fn generate(&self, prompt: &str) -> Result<RawCompletion, InferenceError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.generate(prompt).await {
                Err(InferenceError::ModelLoading { estimated_time }) if attempt < max_attempts => {
                    warn!(
                        "Model loading (attempt {attempt}/{max_attempts}, estimated {:?}s), retrying after {}s...",
                        estimated_time,
                        self.policy.delay.as_secs()
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of outcomes and counts calls.
    struct ScriptedClient {
        outcomes: Mutex<VecDeque<Result<RawCompletion, InferenceError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<Result<RawCompletion, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl InferenceClient for ScriptedClient {
        async fn generate(&self, _prompt: &str) -> Result<RawCompletion, InferenceError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RawCompletion::default()))
        }
    }

    fn loading() -> Result<RawCompletion, InferenceError> {
        Err(InferenceError::ModelLoading {
            estimated_time: Some(20.0),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_model_is_ready() {
        let inner = ScriptedClient::new(vec![loading(), Ok(RawCompletion::from("Gift: Kite"))]);
        let client = RetryingClient::new(inner.clone(), RetryPolicy::default());

        let started = tokio::time::Instant::now();
        let completion = client.generate("prompt").await.unwrap();

        assert_eq!(completion.as_str(), "Gift: Kite");
        assert_eq!(inner.calls(), 2);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let inner = ScriptedClient::new(vec![loading(), loading(), loading(), loading()]);
        let client = RetryingClient::new(inner.clone(), RetryPolicy::default());

        let err = client.generate("prompt").await.unwrap_err();

        assert!(err.is_model_loading());
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let inner = ScriptedClient::new(vec![Err(InferenceError::Api {
            status: 401,
            message: "bad token".to_string(),
        })]);
        let client = RetryingClient::new(inner.clone(), RetryPolicy::default());

        let err = client.generate("prompt").await.unwrap_err();

        assert!(matches!(err, InferenceError::Api { status: 401, .. }));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_success_makes_single_call() {
        let inner = ScriptedClient::new(vec![Ok(RawCompletion::from("Gift: Mug"))]);
        let client = RetryingClient::new(inner.clone(), RetryPolicy::default());

        client.generate("prompt").await.unwrap();

        assert_eq!(inner.calls(), 1);
    }
}

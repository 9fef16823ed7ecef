use std::{sync::Arc, time::Duration};

use metrics::{counter, histogram};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::{
    classify::{classify_error_body, classify_transport},
    types::{BackendReply, RenderBackend, RenderFailure, RenderRequest, RenderResponse},
};

pub const METRIC_RENDER_ATTEMPT_TOTAL: &str = "vitrine_render_attempt_total";
pub const METRIC_RENDER_RETRY_TOTAL: &str = "vitrine_render_retry_total";
pub const METRIC_RENDER_FALLBACK_TOTAL: &str = "vitrine_render_fallback_total";
pub const METRIC_RENDER_MS: &str = "vitrine_render_ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    /// Rendered documents at or below this many characters are treated as stubs.
    pub min_html_length: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
            min_html_length: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered { html: String, attempts: u32 },
    Fallback { failure: RenderFailure, attempts: u32 },
}

impl RenderOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            RenderOutcome::Rendered { attempts, .. } | RenderOutcome::Fallback { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RenderOutcome::Fallback { .. })
    }
}

/// Calls the renderer under a bounded retry policy. Never returns an error:
/// every failure path ends in [`RenderOutcome::Fallback`].
#[derive(Clone)]
pub struct RenderInvoker {
    backend: Arc<dyn RenderBackend>,
    policy: RetryPolicy,
}

impl RenderInvoker {
    pub fn new(backend: Arc<dyn RenderBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub async fn invoke(&self, request: &RenderRequest) -> RenderOutcome {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        let failure = loop {
            attempt += 1;
            counter!(METRIC_RENDER_ATTEMPT_TOTAL).increment(1);

            let failure = match self.backend.render_theme(request).await {
                Ok(reply) if reply.is_success() => match self.accept(reply) {
                    Ok(html) => {
                        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                        histogram!(METRIC_RENDER_MS).record(elapsed_ms);
                        info!(
                            target = "vitrine::render::invoker",
                            theme = %request.theme_path,
                            attempt,
                            elapsed_ms,
                            html_len = html.len(),
                            "Theme rendered"
                        );
                        return RenderOutcome::Rendered {
                            html,
                            attempts: attempt,
                        };
                    }
                    // A well-formed but unusable answer is a content problem.
                    Err(failure) => break failure,
                },
                Ok(reply) => RenderFailure::Status {
                    status: reply.status,
                    class: classify_error_body(&reply.body),
                },
                Err(error) => RenderFailure::Transport {
                    class: classify_transport(&error),
                    error,
                },
            };

            let class = failure.class();
            if !class.is_retryable() || attempt >= max_attempts {
                break failure;
            }

            warn!(
                target = "vitrine::render::invoker",
                theme = %request.theme_path,
                attempt,
                classification = class.as_str(),
                error = %failure,
                backoff_ms = self.policy.backoff.as_millis() as u64,
                "Render attempt failed; retrying"
            );
            counter!(METRIC_RENDER_RETRY_TOTAL).increment(1);
            sleep(self.policy.backoff).await;
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_RENDER_MS).record(elapsed_ms);
        counter!(METRIC_RENDER_FALLBACK_TOTAL).increment(1);
        warn!(
            target = "vitrine::render::invoker",
            theme = %request.theme_path,
            attempts = attempt,
            classification = failure.class().as_str(),
            error = %failure,
            elapsed_ms,
            "Render degraded to fallback document"
        );

        RenderOutcome::Fallback {
            failure,
            attempts: attempt,
        }
    }

    fn accept(&self, reply: BackendReply) -> Result<String, RenderFailure> {
        let response: RenderResponse = serde_json::from_str(&reply.body)
            .map_err(|err| RenderFailure::invalid(format!("unexpected body shape: {err}")))?;
        if !response.success {
            return Err(RenderFailure::invalid("renderer reported success=false"));
        }
        let html = response
            .html
            .ok_or_else(|| RenderFailure::invalid("missing html payload"))?;
        let length = html.chars().count();
        if length <= self.policy.min_html_length {
            debug!(
                target = "vitrine::render::invoker",
                length,
                min = self.policy.min_html_length,
                "Rendered html below length floor"
            );
            return Err(RenderFailure::invalid(format!(
                "html payload too short ({length} chars)"
            )));
        }
        Ok(html)
    }
}

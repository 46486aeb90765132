//! Round-trip execution
//!
//! Executes a step against the live context: merge onto the inherited template,
//! build the matcher, dispatch (once, or polled for `eventually` steps), then
//! bind the captured variables into the context.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::common::config::EventuallyConfig;
use crate::common::{Error, Result};
use crate::context::{ContextHandle, Variables};

use super::client::{HttpResponse, Transport};
use super::matcher::ResponseMatcher;
use super::merge::merge;
use super::{Eventually, RoundTrip};

/// Runs round trips through a transport
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    defaults: EventuallyConfig,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>, defaults: EventuallyConfig) -> Self {
        Self {
            transport,
            defaults,
        }
    }

    /// Execute one step and bind its captures into the context
    ///
    /// Returns the variables captured by this step.
    pub async fn execute(&self, ctx: &ContextHandle, step: &RoundTrip) -> Result<Variables> {
        let (merged, vars) = {
            let ctx = ctx.lock().await;
            (merge(&ctx.round_trip_template, step), ctx.variables.clone())
        };
        tracing::info!("STEP {}", merged.description);

        let matcher = ResponseMatcher::new(&merged, &vars)?;

        let resp = match merged.response.eventually {
            Some(policy) => self.poll(&merged, &vars, &matcher, policy).await?,
            None => {
                let resp = self.transport.do_request(&vars, &merged).await?;
                matcher.check(&resp)?;
                resp
            }
        };

        let captured = matcher.variables(&resp)?;
        if !captured.is_empty() {
            tracing::debug!("Captured {:?}", captured.keys().collect::<Vec<_>>());
            ctx.lock().await.bind(captured.clone());
        }
        Ok(captured)
    }

    /// Execute an ordered flow, stopping at the first failing step
    pub async fn run_flow(&self, ctx: &ContextHandle, flow: &[RoundTrip]) -> Result<()> {
        for (i, step) in flow.iter().enumerate() {
            if let Err(e) = self.execute(ctx, step).await {
                tracing::warn!("Step {}/{} failed: {}", i + 1, flow.len(), e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Poll until the response matches or the deadline passes
    async fn poll(
        &self,
        rt: &RoundTrip,
        vars: &Variables,
        matcher: &ResponseMatcher,
        policy: Eventually,
    ) -> Result<HttpResponse> {
        let timeout = policy.timeout.unwrap_or_else(|| self.defaults.timeout());
        let interval = policy
            .interval
            .unwrap_or_else(|| self.defaults.interval())
            .max(Duration::from_millis(1));

        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let last = match self.transport.do_request(vars, rt).await {
                Ok(resp) => match matcher.check(&resp) {
                    Ok(()) => {
                        tracing::debug!("Matched after {} attempts", attempts);
                        return Ok(resp);
                    }
                    Err(e) => e,
                },
                // Only an unreachable target is worth retrying
                Err(e @ Error::Transport(_)) => e,
                Err(e) => return Err(e),
            };

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(Error::EventuallyTimeout {
                    timeout,
                    attempts,
                    last: last.to_string(),
                });
            }
            tracing::debug!("Attempt {} did not match: {}", attempts, last);
            tokio::time::sleep(interval.min(timeout - elapsed)).await;
        }
    }
}

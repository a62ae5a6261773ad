//! Bounded retry against a single game-service instance.
//!
//! # Responsibilities
//! - Make up to `max_retries` sequential tries against one target
//! - Route every try through the target's circuit breaker
//! - Wait a fixed backoff between tries
//!
//! # Design Decisions
//! - Breaker-open is never retried; it propagates immediately so the
//!   failover controller can move to the next instance
//! - Transport errors and non-2xx/3xx statuses are both retryable; the
//!   breaker counts them identically
//! - Exhausting the budget yields `InstanceExhausted` naming the target

use std::time::Duration;

use crate::http::forwarder::{Forward, ForwardedResponse};
use crate::load_balancer::Target;
use crate::resilience::circuit_breaker::BreakerError;
use crate::routing::context::ProxyContext;
use crate::routing::error::RouteError;

/// Retry bounds for one instance.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum tries against a single instance.
    pub max_retries: u32,

    /// Fixed delay between tries.
    pub backoff: Duration,
}

/// Try `target` up to `policy.max_retries` times through its breaker.
///
/// Returns the first successful response, `RouteError::BreakerOpen` as soon
/// as the breaker rejects a try, or `RouteError::InstanceExhausted` once the
/// budget is spent.
pub async fn attempt_with_retries<F: Forward>(
    forwarder: &F,
    target: &Target,
    ctx: &ProxyContext,
    policy: &RetryPolicy,
) -> Result<ForwardedResponse, RouteError> {
    let url = target.request_url(ctx.path_and_query());

    for attempt in 1..=policy.max_retries {
        if target.breaker.is_open() {
            tracing::info!(target = %target.name, "Circuit breaker is open, skipping retries");
            return Err(RouteError::BreakerOpen {
                target: target.name.clone(),
            });
        }

        tracing::debug!(target = %target.name, attempt, "Forwarding attempt");

        let result = target
            .breaker
            .call(|| async {
                forwarder
                    .forward(&target.name, &url, ctx)
                    .await?
                    .ensure_success(&target.name)
            })
            .await;

        match result {
            Ok(response) => return Ok(response),
            Err(BreakerError::Open) => {
                tracing::info!(target = %target.name, "Circuit breaker is now open, skipping further retries");
                return Err(RouteError::BreakerOpen {
                    target: target.name.clone(),
                });
            }
            Err(BreakerError::Inner(err)) => {
                tracing::warn!(target = %target.name, attempt, error = %err, "Attempt failed");
            }
        }

        if attempt < policy.max_retries {
            tokio::time::sleep(policy.backoff).await;
        }
    }

    Err(RouteError::InstanceExhausted {
        target: target.name.clone(),
        attempts: policy.max_retries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::forwarder::test_support::{MockForward, MockResponse};
    use crate::resilience::circuit_breaker::BreakerState;

    fn target() -> Target {
        Target::from_config("http://game_a:5001/", 3, Duration::from_secs(60)).unwrap()
    }

    fn ctx() -> ProxyContext {
        ProxyContext::get("board/validate")
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_success() {
        let forwarder = MockForward::default().respond("http://game_a:5001/", MockResponse::Ok);
        let target = target();

        let response = attempt_with_retries(&forwarder, &target, &ctx(), &policy())
            .await
            .unwrap();
        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(forwarder.calls_to("http://game_a:5001/"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_exhausts() {
        let forwarder =
            MockForward::default().respond("http://game_a:5001/", MockResponse::Refused);
        let target = target();

        let err = attempt_with_retries(&forwarder, &target, &ctx(), &policy())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouteError::InstanceExhausted { attempts: 3, .. }
        ));
        assert_eq!(forwarder.calls_to("http://game_a:5001/"), 3);
        // Threshold of 3 reached on the last try.
        assert_eq!(target.breaker.state(), BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_error_status_counts_as_failure() {
        let forwarder =
            MockForward::default().respond("http://game_a:5001/", MockResponse::Status(500));
        let target = target();

        let err = attempt_with_retries(&forwarder, &target, &ctx(), &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::InstanceExhausted { .. }));
        assert_eq!(target.breaker.state(), BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_short_circuits_without_forwarding() {
        let forwarder = MockForward::default().respond("http://game_a:5001/", MockResponse::Ok);
        let target = target();
        target.breaker.record_failure();
        target.breaker.record_failure();
        target.breaker.record_failure();

        let err = attempt_with_retries(&forwarder, &target, &ctx(), &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::BreakerOpen { .. }));
        assert_eq!(forwarder.calls_to("http://game_a:5001/"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn mid_loop_trip_stops_retrying() {
        // Breaker trips after 2 failures but the retry budget is 3; the
        // third try must be rejected by the breaker, not forwarded.
        let forwarder =
            MockForward::default().respond("http://game_a:5001/", MockResponse::Refused);
        let target = Target::from_config("http://game_a:5001/", 2, Duration::from_secs(60)).unwrap();

        let err = attempt_with_retries(&forwarder, &target, &ctx(), &policy())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::BreakerOpen { .. }));
        assert_eq!(forwarder.calls_to("http://game_a:5001/"), 2);
    }
}

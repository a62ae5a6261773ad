//! Failover controller for the game-service pool.
//!
//! # Responsibilities
//! - Gate every request behind the global circuit breaker
//! - Draw candidates from the round-robin pool, skipping targets already
//!   tried this request and targets with an open breaker
//! - Delegate each candidate to the retry executor
//! - Record exactly one global-breaker failure per exhausted sequence

use std::time::Duration;

use crate::http::forwarder::{Forward, ForwardedResponse};
use crate::load_balancer::TargetPool;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::retries::{attempt_with_retries, RetryPolicy};
use crate::routing::context::ProxyContext;
use crate::routing::error::RouteError;

/// Long-lived routing state for the game tier: the pool, the global breaker,
/// and the retry policy. One instance per process, shared by reference with
/// every request handler.
#[derive(Debug)]
pub struct FailoverRouter<F> {
    pool: TargetPool,
    global_breaker: CircuitBreaker,
    retry: RetryPolicy,
    max_reroutes: usize,
    forwarder: F,
}

impl<F: Forward> FailoverRouter<F> {
    pub fn new(
        pool: TargetPool,
        global_fail_max: u32,
        global_open_duration: Duration,
        retry: RetryPolicy,
        max_reroutes: usize,
        forwarder: F,
    ) -> Self {
        Self {
            pool,
            global_breaker: CircuitBreaker::new("global_cb", global_fail_max, global_open_duration),
            retry,
            max_reroutes,
            forwarder,
        }
    }

    /// Entry point for one proxied game-service request.
    ///
    /// Fails fast with `GlobalBreakerOpen` before contacting any instance
    /// when the global breaker rejects the sequence; otherwise runs the
    /// failover loop and reports its outcome back to the global breaker.
    pub async fn route(&self, mut ctx: ProxyContext) -> Result<ForwardedResponse, RouteError> {
        if self.global_breaker.try_acquire().is_err() {
            tracing::info!("Global circuit breaker is open, failing fast");
            return Err(RouteError::GlobalBreakerOpen);
        }

        match self.try_instances(&mut ctx).await {
            Ok(response) => {
                self.global_breaker.record_success();
                Ok(response)
            }
            Err(err) => {
                // The instance loop absorbed every per-target error, so the
                // breaker must be told about the failed sequence explicitly.
                self.global_breaker.record_failure();
                tracing::error!(error = %err, "All attempts to proxy the request have failed");
                Err(err)
            }
        }
    }

    /// The bounded failover loop: at most `min(pool, max_reroutes)` distinct
    /// targets per request.
    async fn try_instances(
        &self,
        ctx: &mut ProxyContext,
    ) -> Result<ForwardedResponse, RouteError> {
        let budget = self.max_reroutes.min(self.pool.len());

        while ctx.tried_count() < budget {
            let target = self.pool.next();

            if !ctx.mark_tried(&target.name) {
                continue;
            }

            if target.breaker.is_open() {
                tracing::info!(target = %target.name, "Circuit breaker is open, skipping instance");
                continue;
            }

            match attempt_with_retries(&self.forwarder, &target, ctx, &self.retry).await {
                Ok(response) => return Ok(response),
                Err(RouteError::BreakerOpen { target }) => {
                    tracing::info!(target = %target, "Instance skipped, breaker opened");
                }
                Err(RouteError::InstanceExhausted { target, attempts }) => {
                    tracing::warn!(target = %target, attempts, "Instance exhausted, rerouting");
                }
                Err(err) => return Err(err),
            }
        }

        Err(RouteError::AllInstancesUnavailable)
    }

    /// The pool behind this router (health/introspection).
    pub fn pool(&self) -> &TargetPool {
        &self.pool
    }

    /// The breaker guarding whole failover sequences.
    pub fn global_breaker(&self) -> &CircuitBreaker {
        &self.global_breaker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::forwarder::test_support::{MockForward, MockResponse};
    use crate::resilience::circuit_breaker::BreakerState;

    const A: &str = "http://a:5001/";
    const B: &str = "http://b:5001/";
    const C: &str = "http://c:5001/";

    fn pool(urls: &[&str]) -> TargetPool {
        let urls: Vec<String> = urls.iter().map(|s| s.to_string()).collect();
        TargetPool::from_urls(&urls, 3, Duration::from_secs(60)).unwrap()
    }

    fn router(pool: TargetPool, forwarder: MockForward) -> FailoverRouter<MockForward> {
        FailoverRouter::new(
            pool,
            1,
            Duration::from_secs(300),
            RetryPolicy {
                max_retries: 3,
                backoff: Duration::from_millis(100),
            },
            3,
            forwarder,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn fails_over_to_healthy_instance() {
        let forwarder = MockForward::default()
            .respond(A, MockResponse::Refused)
            .respond(B, MockResponse::Refused)
            .respond(C, MockResponse::Ok);
        let router = router(pool(&[A, B, C]), forwarder);

        let response = router.route(ProxyContext::get("games")).await.unwrap();
        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(router.forwarder.calls_to(A), 3);
        assert_eq!(router.forwarder.calls_to(B), 3);
        assert_eq!(router.forwarder.calls_to(C), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_failures_open_breakers_then_route_directly() {
        let forwarder = MockForward::default()
            .respond(A, MockResponse::Refused)
            .respond(B, MockResponse::Refused)
            .respond(C, MockResponse::Ok);
        let router = router(pool(&[A, B, C]), forwarder);

        // One request exhausts A and B (3 tries each, fail_max = 3) before
        // succeeding on C.
        router.route(ProxyContext::get("games")).await.unwrap();
        let [a, b, _] = router.pool().targets() else {
            panic!("pool size");
        };
        assert_eq!(a.breaker.state(), BreakerState::Open);
        assert_eq!(b.breaker.state(), BreakerState::Open);

        // Subsequent requests skip A and B without any network call.
        router.route(ProxyContext::get("games")).await.unwrap();
        assert_eq!(router.forwarder.calls_to(A), 3);
        assert_eq!(router.forwarder.calls_to(B), 3);
        assert_eq!(router.forwarder.calls_to(C), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn all_breakers_open_fails_without_network_calls() {
        let forwarder = MockForward::default();
        let router = router(pool(&[A, B, C]), forwarder);
        for target in router.pool().targets() {
            for _ in 0..3 {
                target.breaker.record_failure();
            }
        }

        let err = router.route(ProxyContext::get("games")).await.unwrap_err();
        assert!(matches!(err, RouteError::AllInstancesUnavailable));
        assert_eq!(router.forwarder.total_calls(), 0);
        // Exactly one failure recorded: fail_max = 1 means the global
        // breaker is now open.
        assert_eq!(router.global_breaker().state(), BreakerState::Open);

        // Next request fails fast at the gate.
        let err = router.route(ProxyContext::get("games")).await.unwrap_err();
        assert!(matches!(err, RouteError::GlobalBreakerOpen));
        assert_eq!(router.forwarder.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn max_reroutes_bounds_distinct_targets() {
        let urls = [A, B, C, "http://d:5001/", "http://e:5001/"];
        let forwarder = MockForward::default().respond_all(MockResponse::Refused);
        let router = router(pool(&urls), forwarder);

        let err = router.route(ProxyContext::get("games")).await.unwrap_err();
        assert!(matches!(err, RouteError::AllInstancesUnavailable));
        // Pool of 5, max_reroutes = 3: exactly 3 distinct targets contacted.
        let contacted = urls
            .iter()
            .filter(|url| router.forwarder.calls_to(url) > 0)
            .count();
        assert_eq!(contacted, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn global_breaker_reprobes_after_cooldown() {
        let forwarder = MockForward::default().respond_all(MockResponse::Refused);
        let router = router(pool(&[A]), forwarder);

        router.route(ProxyContext::get("games")).await.unwrap_err();
        assert_eq!(router.global_breaker().state(), BreakerState::Open);

        // Let both the per-instance (60s) and global (300s) cooldowns pass,
        // and let the backend recover.
        tokio::time::advance(Duration::from_secs(301)).await;
        router.forwarder.set_response(A, MockResponse::Ok);

        let response = router.route(ProxyContext::get("games")).await.unwrap();
        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(router.global_breaker().state(), BreakerState::Closed);
    }
}

//! Per-client sliding-window rate limiting.
//!
//! [`RateLimiter`] keeps the request timestamps of each client IP seen within
//! the window and refuses a request once `max_requests` are already in it.
//! The client table is bounded: stale entries are swept at most once per
//! window, and when the table is still full the least recently seen client
//! is evicted to make room.
//!
//! [`RateLimit`] applies one limiter to every request and, optionally,
//! stricter limiters to path prefixes such as `/api/auth`. Refused requests
//! get `429 Too Many Requests` with a `retry-after` header in seconds.

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr};
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderValue, RETRY_AFTER};
use actix_web::{Error, ResponseError};
use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::Error as DomainError;

/// Default bound on the number of clients tracked per limiter.
pub const DEFAULT_MAX_TRACKED_CLIENTS: usize = 10_000;

/// Request allowance per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited {
        /// Time until the oldest request in the window expires.
        retry_after: Duration,
    },
}

#[derive(Debug)]
struct ClientWindow {
    hits: VecDeque<DateTime<Utc>>,
    last_seen: DateTime<Utc>,
}

impl ClientWindow {
    fn prune(&mut self, cutoff: DateTime<Utc>) {
        while self.hits.front().is_some_and(|hit| *hit <= cutoff) {
            self.hits.pop_front();
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    clients: HashMap<IpAddr, ClientWindow>,
    last_sweep: Option<DateTime<Utc>>,
}

/// Sliding-window limiter keyed by client IP.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    window: TimeDelta,
    max_tracked_clients: usize,
    clock: Arc<dyn Clock>,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Build a limiter tracking at most `max_tracked_clients` clients.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use vetconsult::middleware::rate_limit::{Decision, RateLimitPolicy, RateLimiter};
    ///
    /// let limiter = RateLimiter::new(
    ///     RateLimitPolicy { max_requests: 1, window: Duration::from_secs(60) },
    ///     100,
    ///     Arc::new(mockable::DefaultClock),
    /// );
    /// let client = "203.0.113.9".parse().expect("ip");
    /// assert_eq!(limiter.check(client), Decision::Allowed);
    /// assert!(matches!(limiter.check(client), Decision::Limited { .. }));
    /// ```
    pub fn new(policy: RateLimitPolicy, max_tracked_clients: usize, clock: Arc<dyn Clock>) -> Self {
        let window = TimeDelta::from_std(policy.window).unwrap_or(TimeDelta::MAX);
        Self {
            policy,
            window,
            max_tracked_clients: max_tracked_clients.max(1),
            clock,
            state: Mutex::new(LimiterState::default()),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    fn lock_state(&self) -> MutexGuard<'_, LimiterState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record a request from `client` unless it would exceed the allowance.
    pub fn check(&self, client: IpAddr) -> Decision {
        self.evaluate(client, true)
    }

    /// Report what [`Self::check`] would decide without recording a hit.
    pub fn peek(&self, client: IpAddr) -> Decision {
        self.evaluate(client, false)
    }

    fn evaluate(&self, client: IpAddr, record: bool) -> Decision {
        let now = self.clock.utc();
        let cutoff = now - self.window;
        let mut state = self.lock_state();

        if !state.clients.contains_key(&client) {
            self.make_room(&mut state, now, cutoff);
        }

        let entry = state.clients.entry(client).or_insert_with(|| ClientWindow {
            hits: VecDeque::new(),
            last_seen: now,
        });
        entry.prune(cutoff);
        entry.last_seen = now;

        let limit = usize::try_from(self.policy.max_requests).unwrap_or(usize::MAX);
        if entry.hits.len() >= limit {
            let retry_after = entry
                .hits
                .front()
                .and_then(|oldest| (*oldest + self.window - now).to_std().ok())
                .unwrap_or(self.policy.window);
            return Decision::Limited { retry_after };
        }
        if record {
            entry.hits.push_back(now);
        }
        Decision::Allowed
    }

    fn make_room(&self, state: &mut LimiterState, now: DateTime<Utc>, cutoff: DateTime<Utc>) {
        if state.clients.len() < self.max_tracked_clients {
            return;
        }
        let sweep_due = state
            .last_sweep
            .is_none_or(|last| now - last >= self.window);
        if sweep_due {
            state.clients.retain(|_, window| {
                window.prune(cutoff);
                !window.hits.is_empty()
            });
            state.last_sweep = Some(now);
            debug!(tracked = state.clients.len(), "rate limiter swept idle clients");
        }
        if state.clients.len() >= self.max_tracked_clients {
            let oldest = state
                .clients
                .iter()
                .min_by_key(|(_, window)| window.last_seen)
                .map(|(ip, _)| *ip);
            if let Some(ip) = oldest {
                state.clients.remove(&ip);
            }
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.lock_state().clients.len()
    }
}

/// Middleware applying a global limiter plus optional per-prefix limiters.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use actix_web::App;
/// use vetconsult::middleware::rate_limit::{RateLimit, RateLimitPolicy, RateLimiter};
///
/// let limiter = |max_requests| {
///     Arc::new(RateLimiter::new(
///         RateLimitPolicy { max_requests, window: Duration::from_secs(900) },
///         10_000,
///         Arc::new(mockable::DefaultClock),
///     ))
/// };
/// let app = App::new().wrap(RateLimit::new(limiter(100)).with_prefix("/api/auth", limiter(5)));
/// ```
#[derive(Clone)]
pub struct RateLimit {
    global: Arc<RateLimiter>,
    prefixes: Vec<(String, Arc<RateLimiter>)>,
}

impl RateLimit {
    pub fn new(global: Arc<RateLimiter>) -> Self {
        Self {
            global,
            prefixes: Vec::new(),
        }
    }

    /// Also apply `limiter` to requests whose path starts with `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>, limiter: Arc<RateLimiter>) -> Self {
        self.prefixes.push((prefix.into(), limiter));
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limits: self.clone(),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limits: RateLimit,
}

fn client_ip(req: &ServiceRequest) -> IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn limited_response(req: ServiceRequest, retry_after: Duration) -> ServiceResponse {
    // Round up so clients never retry before the window has slid.
    let seconds = retry_after
        .as_secs()
        .saturating_add(u64::from(retry_after.subsec_nanos() > 0))
        .max(1);
    let error = DomainError::rate_limited("too many requests, please try again later")
        .with_details(serde_json::json!({ "retryAfterSeconds": seconds }));
    let mut response = error.error_response();
    response
        .headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from(seconds));
    req.into_response(response)
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = client_ip(&req);
        let path = req.path().to_owned();
        let limiters: Vec<&Arc<RateLimiter>> = std::iter::once(&self.limits.global)
            .chain(
                self.limits
                    .prefixes
                    .iter()
                    .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
                    .map(|(_, limiter)| limiter),
            )
            .collect();
        // A refusal from any limiter must not consume the others' allowance.
        let refused = limiters
            .iter()
            .map(|limiter| limiter.peek(client))
            .chain(limiters.iter().map(|limiter| limiter.check(client)))
            .find_map(|decision| match decision {
                Decision::Limited { retry_after } => Some(retry_after),
                Decision::Allowed => None,
            });
        if let Some(retry_after) = refused {
            warn!(%client, %path, retry_after_secs = retry_after.as_secs(), "rate limit exceeded");
            let response = limited_response(req, retry_after).map_into_right_body();
            return Box::pin(async move { Ok(response) });
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let response = service.call(req).await?;
            Ok(response.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::clock::{MutableClock, fixture_timestamp};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::{fixture, rstest};
    use std::net::SocketAddr;

    const WINDOW: Duration = Duration::from_secs(60);

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::new(fixture_timestamp()))
    }

    fn limiter(max_requests: u32, tracked: usize, clock: &Arc<MutableClock>) -> RateLimiter {
        RateLimiter::new(
            RateLimitPolicy {
                max_requests,
                window: WINDOW,
            },
            tracked,
            Arc::clone(clock) as Arc<dyn Clock>,
        )
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(203, 0, 113, last))
    }

    #[rstest]
    fn admits_exactly_max_requests_per_window(clock: Arc<MutableClock>) {
        let limiter = limiter(3, 10, &clock);

        let decisions: Vec<Decision> = (0..4).map(|_| limiter.check(ip(1))).collect();

        assert_eq!(&decisions[..3], &[Decision::Allowed; 3]);
        assert_eq!(
            decisions[3],
            Decision::Limited {
                retry_after: WINDOW
            }
        );
    }

    #[rstest]
    fn window_slides(clock: Arc<MutableClock>) {
        let limiter = limiter(2, 10, &clock);
        assert_eq!(limiter.check(ip(1)), Decision::Allowed);
        clock.advance(Duration::from_secs(30));
        assert_eq!(limiter.check(ip(1)), Decision::Allowed);
        assert_eq!(
            limiter.check(ip(1)),
            Decision::Limited {
                retry_after: Duration::from_secs(30)
            }
        );

        clock.advance(Duration::from_secs(30));

        assert_eq!(limiter.check(ip(1)), Decision::Allowed);
    }

    #[rstest]
    fn clients_are_counted_separately(clock: Arc<MutableClock>) {
        let limiter = limiter(1, 10, &clock);
        assert_eq!(limiter.check(ip(1)), Decision::Allowed);
        assert_eq!(limiter.check(ip(2)), Decision::Allowed);
        assert!(matches!(limiter.check(ip(1)), Decision::Limited { .. }));
    }

    #[rstest]
    fn full_table_sweeps_idle_clients(clock: Arc<MutableClock>) {
        let limiter = limiter(5, 2, &clock);
        limiter.check(ip(1));
        limiter.check(ip(2));
        clock.advance(WINDOW + Duration::from_secs(1));

        limiter.check(ip(3));

        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[rstest]
    fn full_table_evicts_least_recently_seen(clock: Arc<MutableClock>) {
        let limiter = limiter(1, 2, &clock);
        limiter.check(ip(1));
        clock.advance(Duration::from_secs(1));
        limiter.check(ip(2));
        clock.advance(Duration::from_secs(1));

        limiter.check(ip(3));

        assert_eq!(limiter.tracked_clients(), 2);
        // ip(1) was evicted, so it starts a fresh window.
        assert_eq!(limiter.check(ip(1)), Decision::Allowed);
        assert!(matches!(limiter.check(ip(3)), Decision::Limited { .. }));
    }

    #[rstest]
    #[actix_web::test]
    async fn auth_prefix_has_its_own_stricter_limit(clock: Arc<MutableClock>) {
        let global = Arc::new(limiter(10, 10, &clock));
        let auth = Arc::new(limiter(1, 10, &clock));
        let app = actix_test::init_service(
            App::new()
                .wrap(RateLimit::new(global).with_prefix("/api/auth", auth))
                .route("/api/auth/login", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/api/other", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let peer: SocketAddr = "203.0.113.7:4000".parse().expect("socket addr");

        let mut outcomes = Vec::new();
        for uri in ["/api/auth/login", "/api/auth/login", "/api/other"] {
            let req = actix_test::TestRequest::get().uri(uri).peer_addr(peer).to_request();
            let res = actix_test::call_service(&app, req).await;
            let retry = res
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            outcomes.push((res.status(), retry));
        }

        assert_eq!(
            outcomes,
            vec![
                (StatusCode::OK, None),
                (StatusCode::TOO_MANY_REQUESTS, Some("60".to_owned())),
                (StatusCode::OK, None),
            ]
        );
    }

    #[rstest]
    fn peek_does_not_record_a_hit(clock: Arc<MutableClock>) {
        let limiter = limiter(1, 10, &clock);

        assert_eq!(limiter.peek(ip(1)), Decision::Allowed);
        assert_eq!(limiter.peek(ip(1)), Decision::Allowed);
        assert_eq!(limiter.check(ip(1)), Decision::Allowed);
        assert!(matches!(limiter.peek(ip(1)), Decision::Limited { .. }));
    }

    #[rstest]
    #[actix_web::test]
    async fn refused_auth_requests_leave_global_allowance_intact(clock: Arc<MutableClock>) {
        let global = Arc::new(limiter(2, 10, &clock));
        let auth = Arc::new(limiter(1, 10, &clock));
        let app = actix_test::init_service(
            App::new()
                .wrap(RateLimit::new(Arc::clone(&global)).with_prefix("/api/auth", auth))
                .route("/api/auth/login", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/api/other", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let peer: SocketAddr = "203.0.113.8:4000".parse().expect("socket addr");

        let mut statuses = Vec::new();
        for uri in [
            "/api/auth/login",
            "/api/auth/login",
            "/api/auth/login",
            "/api/other",
        ] {
            let req = actix_test::TestRequest::get().uri(uri).peer_addr(peer).to_request();
            statuses.push(actix_test::call_service(&app, req).await.status());
        }

        assert_eq!(
            statuses,
            vec![
                StatusCode::OK,
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::OK,
            ]
        );
        assert!(matches!(
            global.check(peer.ip()),
            Decision::Limited { .. }
        ));
    }
}

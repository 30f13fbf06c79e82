use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::{mapref::entry::Entry, DashMap};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Allows each client one request per window
///
/// Clients are keyed by peer IP. The map holds at most `max_clients` entries;
/// when it is full, expired windows are pruned and a new client is refused
/// until room frees up.
pub struct RateLimiter {
    clients: DashMap<IpAddr, Instant>,
    window: Duration,
    max_clients: usize,
}

impl RateLimiter {
    pub fn new(window: Duration, max_clients: usize) -> Self {
        Self {
            clients: DashMap::new(),
            window,
            max_clients: max_clients.max(1),
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        if !self.clients.contains_key(&ip) && self.clients.len() >= self.max_clients {
            self.prune(now);
            if self.clients.len() >= self.max_clients {
                warn!(client_ip = %ip, "Rate limiter is full, refusing new client");
                return false;
            }
        }

        match self.clients.entry(ip) {
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) < self.window {
                    return false;
                }
                entry.insert(now);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Drop clients whose window has passed
    pub fn prune(&self, now: Instant) {
        let before = self.clients.len();
        self.clients
            .retain(|_, last| now.saturating_duration_since(*last) < self.window);
        debug!(removed = before.saturating_sub(self.clients.len()), "Pruned rate limiter");
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Reject requests from clients that are inside their window
///
/// Requests without a peer address pass through unchecked.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Some(ip) = client_ip {
        if !limiter.check(ip) {
            debug!(client_ip = %ip, "Rate limited request");
            return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_second_request_inside_window_is_rejected() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 10);
        let start = Instant::now();

        assert!(limiter.check_at(ip(1), start));
        assert!(!limiter.check_at(ip(1), start + Duration::from_millis(500)));
        assert!(limiter.check_at(ip(1), start + Duration::from_secs(1)));
    }

    #[test]
    fn test_clients_are_limited_independently() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 10);
        let start = Instant::now();

        assert!(limiter.check_at(ip(1), start));
        assert!(limiter.check_at(ip(2), start));
        assert!(!limiter.check_at(ip(2), start));
    }

    #[test]
    fn test_map_is_bounded() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 2);
        let start = Instant::now();

        assert!(limiter.check_at(ip(1), start));
        assert!(limiter.check_at(ip(2), start));
        assert!(!limiter.check_at(ip(3), start));
        assert_eq!(limiter.tracked_clients(), 2);

        // Expired windows make room for new clients
        assert!(limiter.check_at(ip(3), start + Duration::from_secs(2)));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}

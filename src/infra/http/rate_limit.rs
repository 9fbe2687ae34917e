use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Outcome of a limiter check. A denial carries the time until the oldest
/// counted request ages out and a slot frees up, which is what goes into
/// the `Retry-After` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Denied { retry_after: Duration },
}

/// Sliding-window limiter for the public listener, one bucket of request
/// timestamps per caller address.
///
/// Quiet callers are swept out: at most once per window the whole map is
/// scanned and buckets whose newest request has aged out are dropped, so
/// the map tracks currently active callers rather than every address the
/// process has ever seen.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    visitors: Arc<DashMap<String, Vec<Instant>>>,
    last_sweep: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            visitors: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn allow(&self, caller: &str) -> Decision {
        self.allow_at(caller, Instant::now())
    }

    fn allow_at(&self, caller: &str, now: Instant) -> Decision {
        self.sweep_stale(now);

        let mut stamps = self.visitors.entry(caller.to_string()).or_default();
        stamps.retain(|stamp| now.duration_since(*stamp) < self.window);

        if stamps.len() as u32 >= self.max_requests {
            // Oldest surviving stamp is the next one to leave the window.
            let oldest = stamps.first().copied().unwrap_or(now);
            let retry_after = self
                .window
                .saturating_sub(now.duration_since(oldest))
                .max(Duration::from_secs(1));
            return Decision::Denied { retry_after };
        }

        stamps.push(now);
        Decision::Allowed {
            remaining: self.max_requests - stamps.len() as u32,
        }
    }

    /// Drop buckets whose newest request predates the window. Runs at most
    /// once per window, amortized over incoming requests.
    fn sweep_stale(&self, now: Instant) {
        {
            let Ok(mut last) = self.last_sweep.lock() else {
                return;
            };
            if now.duration_since(*last) < self.window {
                return;
            }
            *last = now;
        }
        let window = self.window;
        self.visitors
            .retain(|_, stamps| stamps.iter().any(|stamp| now.duration_since(*stamp) < window));
    }
}

//! store/throttle: минимальный интервал между запросами к API.
//!
//! Интервал отсчитывается от момента получения предыдущего ответа,
//! а не от его отправки. interval = 0 отключает ожидание.

use std::time::{Duration, Instant};

use crate::metrics::record_throttle_wait;

#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_response: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_response: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// How long `wait()` would sleep right now.
    pub fn pending(&self) -> Duration {
        match self.last_response {
            Some(t) => self.interval.saturating_sub(t.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Block until the interval since the last response has passed.
    pub fn wait(&self) {
        let d = self.pending();
        if !d.is_zero() {
            record_throttle_wait(d.as_millis() as u64);
            std::thread::sleep(d);
        }
    }

    /// Call after each response (success or failure).
    pub fn mark(&mut self) {
        self.last_response = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_never_waits() {
        let mut t = Throttle::from_millis(0);
        t.mark();
        assert_eq!(t.pending(), Duration::ZERO);
    }

    #[test]
    fn first_request_is_free() {
        let t = Throttle::from_millis(10_000);
        assert_eq!(t.pending(), Duration::ZERO);
    }

    #[test]
    fn waits_out_the_interval() {
        let mut t = Throttle::from_millis(30);
        t.mark();
        assert!(t.pending() > Duration::ZERO);
        let started = Instant::now();
        t.wait();
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(t.pending(), Duration::ZERO);
    }
}

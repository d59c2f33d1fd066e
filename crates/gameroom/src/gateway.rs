use super::*;
use std::time::Duration;
use tokio::time::Instant;

/// Outbound delivery seam. Implemented by the transport layer; rooms only
/// ever talk to connections through it.
///
/// Delivery is best-effort and must not block: a room calls this from its
/// own task while holding no locks.
pub trait Gateway: Send + Sync {
    fn deliver(&self, to: &Recipients, event: &Event);
}

/// Debounces snapshot emission.
///
/// Lazy requests inside one interval collapse into a single send at the end
/// of it. Forced requests always go out immediately.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            pending: false,
        }
    }
    /// Registers a snapshot request. Returns true when it should be sent now.
    pub fn request(&mut self, urgency: Urgency, now: Instant) -> bool {
        let ready = self.last.is_none_or(|t| now >= t + self.interval);
        if urgency == Urgency::Forced || ready {
            self.last = Some(now);
            self.pending = false;
            true
        } else {
            self.pending = true;
            false
        }
    }
    /// Releases a deferred snapshot once its interval has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(at) if now >= at => {
                self.last = Some(now);
                self.pending = false;
                true
            }
            _ => false,
        }
    }
    /// When a deferred snapshot becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .then_some(self.last)
            .flatten()
            .map(|t| t + self.interval)
    }
}

/// Gateway that keeps everything it is handed. For tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    sent: std::sync::Mutex<Vec<(Recipients, Event)>>,
}

#[cfg(test)]
impl Recorder {
    pub(crate) fn take(&self) -> Vec<(Recipients, Event)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
    /// Events delivered to `handle`, oldest first.
    pub(crate) fn inbox(&self, handle: Handle) -> Vec<Event> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to.contains(handle))
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[cfg(test)]
impl Gateway for Recorder {
    fn deliver(&self, to: &Recipients, event: &Event) {
        self.sent.lock().unwrap().push((to.clone(), event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }
    #[test]
    fn first_request_goes_out() {
        let mut throttle = Throttle::new(ms(250));
        assert!(throttle.request(Urgency::Lazy, Instant::now()));
        assert!(throttle.deadline().is_none());
    }
    #[test]
    fn lazy_requests_coalesce() {
        let now = Instant::now();
        let mut throttle = Throttle::new(ms(250));
        assert!(throttle.request(Urgency::Lazy, now));
        assert!(!throttle.request(Urgency::Lazy, now + ms(10)));
        assert!(!throttle.request(Urgency::Lazy, now + ms(20)));
        assert_eq!(throttle.deadline(), Some(now + ms(250)));
        assert!(!throttle.poll(now + ms(100)));
        assert!(throttle.poll(now + ms(250)));
        assert!(!throttle.poll(now + ms(600)));
    }
    #[test]
    fn forced_requests_skip_the_wait() {
        let now = Instant::now();
        let mut throttle = Throttle::new(ms(250));
        assert!(throttle.request(Urgency::Lazy, now));
        assert!(!throttle.request(Urgency::Lazy, now + ms(10)));
        assert!(throttle.request(Urgency::Forced, now + ms(20)));
        assert!(throttle.deadline().is_none());
    }
}

/// Trailing-edge debounce over an explicit millisecond clock.
///
/// Every `schedule` pushes the deadline out by `wait_ms`; `fire` returns `true`
/// once the burst has been quiet for a full window, and then resets. The host
/// owns the actual timer and only has to call `fire` when it thinks the
/// window may have elapsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debouncer {
    wait_ms: f64,
    deadline: Option<f64>,
}

impl Debouncer {
    pub const fn new(wait_ms: f64) -> Self {
        Self {
            wait_ms,
            deadline: None,
        }
    }

    pub const fn wait_ms(&self) -> f64 {
        self.wait_ms
    }

    pub fn schedule(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.wait_ms);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        self.deadline.is_some_and(|deadline| now_ms >= deadline)
    }

    pub fn fire(&mut self, now_ms: f64) -> bool {
        if self.is_due(now_ms) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_debouncer_never_fires() {
        let mut d = Debouncer::new(100.0);
        assert!(!d.is_pending());
        assert!(!d.fire(1_000.0));
    }

    #[test]
    fn burst_fires_once_after_quiet_window() {
        let mut d = Debouncer::new(100.0);
        d.schedule(0.0);
        d.schedule(40.0);
        d.schedule(90.0);
        assert!(!d.fire(150.0));
        assert!(d.fire(190.0));
        assert!(!d.fire(500.0));
    }
}

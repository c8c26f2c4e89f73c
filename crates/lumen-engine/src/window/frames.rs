use std::time::Duration;

use crate::time::{FrameHost, FrameToken};

/// Outstanding frame requests of one window.
///
/// Each request carries the clock time it becomes due; plain requests are due
/// immediately. The runtime redraws a window only once a request is due, and
/// sleeps until the earliest deadline otherwise.
#[derive(Debug, Default)]
pub struct FrameRequests {
    next: u64,
    pending: Vec<(FrameToken, Duration)>,
    spare: Vec<FrameToken>,
}

impl FrameRequests {
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Earliest deadline among the outstanding requests.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|&(_, at)| at).min()
    }

    pub fn is_due(&self, now: Duration) -> bool {
        self.next_due().is_some_and(|at| at <= now)
    }

    /// Moves out the requests due at `now`, in request order.
    pub fn take_due(&mut self, now: Duration) -> Vec<FrameToken> {
        let mut due = std::mem::take(&mut self.spare);
        self.pending.retain(|&(token, at)| {
            if at <= now {
                due.push(token);
                false
            } else {
                true
            }
        });
        due
    }

    /// Returns a buffer obtained from [`take_due`](Self::take_due) for reuse.
    pub fn recycle(&mut self, mut due: Vec<FrameToken>) {
        due.clear();
        self.spare = due;
    }
}

impl FrameHost for FrameRequests {
    fn request_frame(&mut self) -> FrameToken {
        self.request_frame_at(Duration::ZERO)
    }

    fn request_frame_at(&mut self, at: Duration) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.pending.push((token, at));
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.pending.retain(|&(t, _)| t != token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn requests_become_due_once() {
        let mut frames = FrameRequests::default();
        let a = frames.request_frame();
        let b = frames.request_frame();
        assert_ne!(a, b);
        assert!(frames.is_pending());

        let due = frames.take_due(ms(0));
        assert_eq!(due, vec![a, b]);
        assert!(!frames.is_pending());
        frames.recycle(due);

        assert!(frames.take_due(ms(0)).is_empty());
    }

    #[test]
    fn cancelled_request_is_not_delivered() {
        let mut frames = FrameRequests::default();
        let a = frames.request_frame();
        frames.cancel_frame(a);
        frames.cancel_frame(a);
        assert!(!frames.is_pending());
    }

    // ── deadlines ─────────────────────────────────────────────────────────

    #[test]
    fn deadline_request_waits_until_due() {
        let mut frames = FrameRequests::default();
        let later = frames.request_frame_at(ms(60));
        assert!(frames.is_pending());
        assert_eq!(frames.next_due(), Some(ms(60)));
        assert!(!frames.is_due(ms(59)));
        assert!(frames.take_due(ms(59)).is_empty());

        assert!(frames.is_due(ms(60)));
        assert_eq!(frames.take_due(ms(60)), vec![later]);
        assert_eq!(frames.next_due(), None);
    }

    #[test]
    fn immediate_request_does_not_release_a_later_one() {
        let mut frames = FrameRequests::default();
        let later = frames.request_frame_at(ms(100));
        let now = frames.request_frame();

        assert_eq!(frames.next_due(), Some(ms(0)));
        assert_eq!(frames.take_due(ms(10)), vec![now]);
        assert_eq!(frames.next_due(), Some(ms(100)));
        assert_eq!(frames.take_due(ms(100)), vec![later]);
    }
}

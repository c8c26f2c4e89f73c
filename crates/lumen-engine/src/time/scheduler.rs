use std::time::Duration;

/// Identifies one outstanding frame request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameToken(pub u64);

/// Something that can deliver "next frame" callbacks.
///
/// The window runtime implements this per window; tests use a counter.
pub trait FrameHost {
    /// Requests one frame callback. The returned token comes back with it.
    fn request_frame(&mut self) -> FrameToken;

    /// Requests a frame callback no earlier than `at`, on the timeline of the
    /// `now` passed to [`AnimationScheduler::on_tick`].
    ///
    /// Hosts without a timer may deliver it early.
    fn request_frame_at(&mut self, at: Duration) -> FrameToken {
        let _ = at;
        self.request_frame()
    }

    /// Cancels an outstanding request. Unknown tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Outcome of [`AnimationScheduler::on_tick`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Tick {
    /// The callback ran.
    Fired,
    /// Less than one interval has passed since the last run.
    Throttled,
    /// The token is not the pending one (cancelled or superseded).
    Stale,
}

/// Interval-throttled animation loop on top of a [`FrameHost`].
///
/// While running there is exactly one outstanding frame request. On each
/// delivered frame the callback runs if at least `interval` has passed since
/// it last ran (the first frame always runs), and the next frame is requested
/// for [`next_deadline`](Self::next_deadline) either way.
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    interval: Duration,
    pending: Option<FrameToken>,
    previous: Option<Duration>,
}

impl AnimationScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            previous: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Earliest time the callback may run again; `None` before the first run.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.previous.map(|p| p.saturating_add(self.interval))
    }

    /// Starts the loop. No-op when already running.
    pub fn resume<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.pending.is_none() {
            self.pending = Some(self.request(host));
        }
    }

    fn request<H: FrameHost + ?Sized>(&self, host: &mut H) -> FrameToken {
        match self.next_deadline() {
            Some(at) => host.request_frame_at(at),
            None => host.request_frame(),
        }
    }

    /// Stops the loop. No-op when already stopped.
    pub fn suspend<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(token) = self.pending.take() {
            host.cancel_frame(token);
        }
    }

    /// Handles a delivered frame at `now` (a monotonic timestamp).
    pub fn on_tick<H, F>(&mut self, host: &mut H, token: FrameToken, now: Duration, f: F) -> Tick
    where
        H: FrameHost + ?Sized,
        F: FnOnce(),
    {
        if self.pending != Some(token) {
            log::trace!("ignoring stale frame token {token:?}");
            return Tick::Stale;
        }

        let due = match self.previous {
            None => true,
            Some(previous) => now.saturating_sub(previous) >= self.interval,
        };

        let outcome = if due {
            self.previous = Some(now);
            f();
            Tick::Fired
        } else {
            Tick::Throttled
        };

        self.pending = Some(self.request(host));
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingHost {
        next: u64,
        outstanding: Vec<FrameToken>,
        cancelled: Vec<FrameToken>,
        deadlines: Vec<Option<Duration>>,
    }

    impl FrameHost for CountingHost {
        fn request_frame(&mut self) -> FrameToken {
            self.deadlines.push(None);
            self.next += 1;
            let token = FrameToken(self.next);
            self.outstanding.push(token);
            token
        }

        fn request_frame_at(&mut self, at: Duration) -> FrameToken {
            let token = self.request_frame();
            *self.deadlines.last_mut().unwrap() = Some(at);
            token
        }

        fn cancel_frame(&mut self, token: FrameToken) {
            self.outstanding.retain(|t| *t != token);
            self.cancelled.push(token);
        }
    }

    impl CountingHost {
        // Delivers the oldest outstanding frame.
        fn deliver(&mut self) -> FrameToken {
            self.outstanding.remove(0)
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    // ── throttling ────────────────────────────────────────────────────────

    #[test]
    fn fires_on_first_frame_then_once_per_interval() {
        let mut host = CountingHost::default();
        let mut s = AnimationScheduler::new(ms(60));
        s.resume(&mut host);

        let mut fired = Vec::new();
        for now in [0, 16, 33, 50, 66] {
            let token = host.deliver();
            s.on_tick(&mut host, token, ms(now), || fired.push(now));
        }

        assert_eq!(fired, vec![0, 66]);
        assert_eq!(host.outstanding.len(), 1, "one request stays outstanding");
    }

    #[test]
    fn zero_interval_fires_every_frame() {
        let mut host = CountingHost::default();
        let mut s = AnimationScheduler::new(Duration::ZERO);
        s.resume(&mut host);
        let mut count = 0;
        for now in 0..4 {
            let token = host.deliver();
            s.on_tick(&mut host, token, ms(now), || count += 1);
        }
        assert_eq!(count, 4);
    }

    // ── deadlines ─────────────────────────────────────────────────────────

    #[test]
    fn next_frame_is_requested_for_the_interval_deadline() {
        let mut host = CountingHost::default();
        let mut s = AnimationScheduler::new(ms(60));
        assert_eq!(s.next_deadline(), None);
        s.resume(&mut host);

        for now in [0, 16, 33, 64] {
            let token = host.deliver();
            s.on_tick(&mut host, token, ms(now), || {});
        }

        // resume, fired at 0, throttled at 16 and 33, fired at 64
        assert_eq!(
            host.deadlines,
            vec![None, Some(ms(60)), Some(ms(60)), Some(ms(60)), Some(ms(124))]
        );
        assert_eq!(s.next_deadline(), Some(ms(124)));
    }

    #[test]
    fn resume_after_suspend_keeps_the_deadline() {
        let mut host = CountingHost::default();
        let mut s = AnimationScheduler::new(ms(60));
        s.resume(&mut host);
        let t = host.deliver();
        s.on_tick(&mut host, t, ms(10), || {});
        s.suspend(&mut host);
        s.resume(&mut host);
        assert_eq!(host.deadlines.last(), Some(&Some(ms(70))));
    }

    // ── suspend / resume ──────────────────────────────────────────────────

    #[test]
    fn resume_is_idempotent() {
        let mut host = CountingHost::default();
        let mut s = AnimationScheduler::new(ms(60));
        s.resume(&mut host);
        s.resume(&mut host);
        assert_eq!(host.outstanding.len(), 1);
    }

    #[test]
    fn suspend_cancels_and_is_idempotent() {
        let mut host = CountingHost::default();
        let mut s = AnimationScheduler::new(ms(60));
        s.resume(&mut host);
        s.suspend(&mut host);
        s.suspend(&mut host);
        assert!(!s.is_running());
        assert!(host.outstanding.is_empty());
        assert_eq!(host.cancelled, vec![FrameToken(1)]);
    }

    #[test]
    fn stale_token_does_not_fire_or_request() {
        let mut host = CountingHost::default();
        let mut s = AnimationScheduler::new(ms(60));
        s.resume(&mut host);
        let token = host.deliver();
        s.suspend(&mut host);

        let mut fired = false;
        let outcome = s.on_tick(&mut host, token, ms(0), || fired = true);

        assert_eq!(outcome, Tick::Stale);
        assert!(!fired);
        assert!(host.outstanding.is_empty());
    }

    #[test]
    fn interval_is_measured_from_last_run_across_suspend() {
        let mut host = CountingHost::default();
        let mut s = AnimationScheduler::new(ms(60));
        s.resume(&mut host);
        let t = host.deliver();
        assert_eq!(s.on_tick(&mut host, t, ms(0), || {}), Tick::Fired);

        s.suspend(&mut host);
        s.resume(&mut host);
        let t = host.deliver();
        assert_eq!(s.on_tick(&mut host, t, ms(30), || {}), Tick::Throttled);
    }
}

use std::time::Duration;

use log::{debug, info, trace};

use crate::clock::Clock;
use crate::session::{Phase, SessionState};
use crate::ticker::{TickId, TickScheduler, TickTask};

/// Fine enough for a smooth countdown, coarse enough to avoid busy wake-ups
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Sole owner and writer of the session state.
///
/// Holds at most one armed tick source at a time. Every transition out of
/// `Running` (expiry, reset, restart, drop) cancels it first.
pub struct SessionController<C: Clock, S: TickScheduler> {
    state: SessionState,
    clock: C,
    scheduler: S,
    tick_interval: Duration,
    tick_task: Option<TickTask>,
    next_tick_id: TickId,
}

impl<C: Clock, S: TickScheduler> SessionController<C, S> {
    pub fn new(clock: C, scheduler: S, tick_interval: Duration) -> Self {
        Self {
            state: SessionState::new(),
            clock,
            scheduler,
            tick_interval,
            tick_task: None,
            next_tick_id: TickId(1),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Id of the armed tick source, if any
    pub fn active_tick(&self) -> Option<TickId> {
        self.tick_task.as_ref().map(TickTask::id)
    }

    /// Start a fresh session, superseding whatever was going on
    pub fn start(&mut self) {
        self.cancel_ticks();

        let now = self.clock.now();
        self.state.begin(now);

        let id = self.next_tick_id;
        self.next_tick_id = id.next();
        self.tick_task = Some(self.scheduler.arm(id, self.tick_interval));

        info!("session started (tick source {:?})", id);
    }

    /// Recompute the countdown; finishes the session once time is up
    pub fn tick(&mut self) {
        if !self.state.is_running() {
            return;
        }
        let now = self.clock.now();
        if self.state.refresh(now) {
            self.cancel_ticks();
            info!(
                "session finished: {} clicks, {:.2} clicks/s",
                self.state.click_count(),
                self.state.clicks_per_second()
            );
        }
    }

    /// Route a tick from a scheduler. Ticks from a superseded source are dropped.
    /// Returns true if the tick was applied.
    pub fn on_tick(&mut self, id: TickId) -> bool {
        match self.active_tick() {
            Some(active) if active == id => {
                self.tick();
                true
            }
            _ => {
                trace!("ignoring stale tick {:?}", id);
                false
            }
        }
    }

    /// Count a tap; a no-op outside `Running`. Returns true if it counted.
    pub fn register_tap(&mut self) -> bool {
        // a tap that lands after the deadline but before the next tick
        // must not count, so settle the clock first
        self.tick();
        self.state.tap()
    }

    pub fn reset(&mut self) {
        self.cancel_ticks();
        if self.state.phase() != Phase::Idle {
            debug!("session reset from {}", self.state.phase());
        }
        self.state.clear();
    }

    fn cancel_ticks(&mut self) {
        if let Some(task) = self.tick_task.take() {
            debug!("cancelling tick source {:?}", task.id());
            task.cancel();
        }
    }
}

impl<C: Clock, S: TickScheduler> Drop for SessionController<C, S> {
    fn drop(&mut self) {
        self.cancel_ticks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::{TOTAL_DURATION, TOTAL_DURATION_MS};
    use crate::ticker::ManualTickScheduler;

    fn controller() -> (
        SessionController<ManualClock, ManualTickScheduler>,
        ManualClock,
        ManualTickScheduler,
    ) {
        let clock = ManualClock::new();
        let sched = ManualTickScheduler::new();
        let ctl = SessionController::new(clock.clone(), sched.clone(), DEFAULT_TICK_INTERVAL);
        (ctl, clock, sched)
    }

    #[test]
    fn starts_idle_without_ticks() {
        let (ctl, _clock, sched) = controller();
        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(ctl.state().remaining(), TOTAL_DURATION);
        assert!(ctl.active_tick().is_none());
        assert_eq!(sched.armed_count(), 0);
    }

    #[test]
    fn start_arms_one_tick_source_at_configured_interval() {
        let (mut ctl, _clock, sched) = controller();
        ctl.start();
        assert_eq!(ctl.phase(), Phase::Running);
        assert_eq!(sched.live_count(), 1);
        assert_eq!(sched.last().unwrap().every, DEFAULT_TICK_INTERVAL);
    }

    #[test]
    fn restart_replaces_the_tick_source() {
        let (mut ctl, _clock, sched) = controller();
        ctl.start();
        let first = ctl.active_tick().unwrap();
        ctl.start();
        let second = ctl.active_tick().unwrap();

        assert_ne!(first, second);
        assert_eq!(sched.armed_count(), 2);
        assert_eq!(sched.live_ids(), vec![second]);
    }

    #[test]
    fn stale_tick_is_ignored() {
        let (mut ctl, clock, _sched) = controller();
        ctl.start();
        let stale = ctl.active_tick().unwrap();
        ctl.start();

        clock.advance_ms(1_000);
        assert!(!ctl.on_tick(stale));
        assert_eq!(ctl.state().remaining_ms(), TOTAL_DURATION_MS);

        let live = ctl.active_tick().unwrap();
        assert!(ctl.on_tick(live));
        assert_eq!(ctl.state().remaining_ms(), 4_000);
    }

    #[test]
    fn expiry_cancels_ticks() {
        let (mut ctl, clock, sched) = controller();
        ctl.start();
        let id = ctl.active_tick().unwrap();
        clock.advance_ms(5_010);
        assert!(ctl.on_tick(id));

        assert_eq!(ctl.phase(), Phase::Finished);
        assert!(ctl.active_tick().is_none());
        assert_eq!(sched.live_count(), 0);
        // a tick already queued before the cancel lands afterwards
        assert!(!ctl.on_tick(id));
    }

    #[test]
    fn tap_after_deadline_before_tick_is_rejected() {
        let (mut ctl, clock, _sched) = controller();
        ctl.start();
        assert!(ctl.register_tap());
        clock.advance_ms(5_003);
        assert!(!ctl.register_tap());
        assert_eq!(ctl.state().click_count(), 1);
        assert_eq!(ctl.phase(), Phase::Finished);
    }

    #[test]
    fn reset_cancels_and_clears() {
        let (mut ctl, clock, sched) = controller();
        ctl.start();
        ctl.register_tap();
        clock.advance_ms(700);
        ctl.tick();
        ctl.reset();

        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(ctl.state().click_count(), 0);
        assert_eq!(ctl.state().remaining(), TOTAL_DURATION);
        assert!(ctl.state().end_at().is_none());
        assert_eq!(sched.live_count(), 0);
    }

    #[test]
    fn reset_while_idle_is_harmless() {
        let (mut ctl, _clock, sched) = controller();
        ctl.reset();
        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(sched.armed_count(), 0);
    }

    #[test]
    fn drop_cancels_live_tick_source() {
        let (mut ctl, _clock, sched) = controller();
        ctl.start();
        assert_eq!(sched.live_count(), 1);
        drop(ctl);
        assert_eq!(sched.live_count(), 0);
    }

    #[test]
    fn tick_while_idle_does_nothing() {
        let (mut ctl, clock, _sched) = controller();
        clock.advance_ms(10_000);
        ctl.tick();
        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(ctl.state().remaining(), TOTAL_DURATION);
    }
}

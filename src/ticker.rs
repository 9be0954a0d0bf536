use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::runtime::TaprEvent;

/// Identifies one armed tick source. Ticks carrying a stale id are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl TickId {
    pub fn next(self) -> Self {
        TickId(self.0.wrapping_add(1))
    }
}

/// Handle to a live periodic tick source. Dropping it cancels the source.
#[derive(Debug)]
pub struct TickTask {
    id: TickId,
    cancelled: Arc<AtomicBool>,
}

impl TickTask {
    pub fn new(id: TickId) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> TickId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Shared flag a scheduler watches to know when to stop
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(self) {
        // Drop does the work
    }
}

impl Drop for TickTask {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Arms periodic tick sources for the session controller
pub trait TickScheduler {
    fn arm(&mut self, id: TickId, every: Duration) -> TickTask;
}

/// Production scheduler: one sleeper thread per armed source, feeding
/// `TaprEvent::Tick(id)` into the app's event channel.
#[derive(Clone, Debug)]
pub struct ThreadTickScheduler {
    tx: Sender<TaprEvent>,
}

impl ThreadTickScheduler {
    pub fn new(tx: Sender<TaprEvent>) -> Self {
        Self { tx }
    }
}

impl TickScheduler for ThreadTickScheduler {
    fn arm(&mut self, id: TickId, every: Duration) -> TickTask {
        let task = TickTask::new(id);
        let cancelled = task.cancel_flag();
        let tx = self.tx.clone();

        thread::spawn(move || loop {
            thread::sleep(every);
            if cancelled.load(Ordering::SeqCst) {
                log::trace!("tick source {id:?} stopped");
                break;
            }
            if tx.send(TaprEvent::Tick(id)).is_err() {
                break;
            }
        });

        task
    }
}

#[derive(Debug, Clone)]
pub struct ArmRecord {
    pub id: TickId,
    pub every: Duration,
    cancelled: Arc<AtomicBool>,
}

impl ArmRecord {
    pub fn is_live(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}

/// Test scheduler that never fires on its own; it just records what was armed.
/// Clones share the same record list.
#[derive(Debug, Clone, Default)]
pub struct ManualTickScheduler {
    armed: Rc<RefCell<Vec<ArmRecord>>>,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed_count(&self) -> usize {
        self.armed.borrow().len()
    }

    pub fn live_count(&self) -> usize {
        self.armed.borrow().iter().filter(|r| r.is_live()).count()
    }

    pub fn live_ids(&self) -> Vec<TickId> {
        self.armed
            .borrow()
            .iter()
            .filter(|r| r.is_live())
            .map(|r| r.id)
            .collect()
    }

    pub fn last(&self) -> Option<ArmRecord> {
        self.armed.borrow().last().cloned()
    }
}

impl TickScheduler for ManualTickScheduler {
    fn arm(&mut self, id: TickId, every: Duration) -> TickTask {
        let task = TickTask::new(id);
        self.armed.borrow_mut().push(ArmRecord {
            id,
            every,
            cancelled: task.cancel_flag(),
        });
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Instant;

    #[test]
    fn dropping_task_cancels_it() {
        let task = TickTask::new(TickId(7));
        let flag = task.cancel_flag();
        assert!(!task.is_cancelled());
        task.cancel();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn tick_ids_increase() {
        assert_eq!(TickId(1).next(), TickId(2));
        assert_eq!(TickId(u64::MAX).next(), TickId(0));
    }

    #[test]
    fn manual_scheduler_tracks_liveness() {
        let mut sched = ManualTickScheduler::new();
        let a = sched.arm(TickId(1), Duration::from_millis(50));
        let b = sched.arm(TickId(2), Duration::from_millis(50));
        assert_eq!(sched.live_count(), 2);

        drop(a);
        assert_eq!(sched.live_ids(), vec![TickId(2)]);
        assert_eq!(sched.armed_count(), 2);

        b.cancel();
        assert_eq!(sched.live_count(), 0);
    }

    #[test]
    fn thread_scheduler_sends_ticks_with_its_id() {
        let (tx, rx) = mpsc::channel();
        let mut sched = ThreadTickScheduler::new(tx);
        let task = sched.arm(TickId(3), Duration::from_millis(5));

        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(TaprEvent::Tick(id)) => assert_eq!(id, TickId(3)),
            other => panic!("expected a tick, got {other:?}"),
        }
        drop(task);
    }

    #[test]
    fn thread_scheduler_stops_after_cancel() {
        let (tx, rx) = mpsc::channel();
        let mut sched = ThreadTickScheduler::new(tx);
        let task = sched.arm(TickId(1), Duration::from_millis(5));
        // let it run a little, then cancel and drain
        let _ = rx.recv_timeout(Duration::from_secs(2));
        task.cancel();
        std::thread::sleep(Duration::from_millis(30));
        while rx.try_recv().is_ok() {}

        let deadline = Instant::now() + Duration::from_millis(60);
        while Instant::now() < deadline {
            assert!(
                rx.recv_timeout(Duration::from_millis(10)).is_err(),
                "cancelled source kept ticking"
            );
        }
    }
}

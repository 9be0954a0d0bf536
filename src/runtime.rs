use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};

use crate::ticker::TickId;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum TaprEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick(TickId),
}

/// Source of app events (keyboard, mouse, resize, ticks)
pub trait EventSource {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TaprEvent, RecvTimeoutError>;
}

/// Event source over the app's mpsc channel. Terminal input and tick
/// sources all feed the same channel so events are handled in arrival order.
pub struct ChannelEventSource {
    rx: Receiver<TaprEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<TaprEvent>) -> Self {
        Self { rx }
    }

    /// A fresh channel: the sender goes to producers, the source to the runner
    pub fn channel() -> (Sender<TaprEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TaprEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pump crossterm events into `tx` from a background thread
pub fn spawn_terminal_reader(tx: Sender<TaprEvent>) {
    std::thread::spawn(move || loop {
        let evt = match event::read() {
            Ok(CtEvent::Key(key)) => TaprEvent::Key(key),
            Ok(CtEvent::Mouse(mouse)) => TaprEvent::Mouse(mouse),
            Ok(CtEvent::Resize(_, _)) => TaprEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                log::error!("terminal reader stopped: {e}");
                break;
            }
        };
        if tx.send(evt).is_err() {
            break;
        }
    });
}

/// What a single runner step produced
#[derive(Clone, Debug)]
pub enum Step {
    Event(TaprEvent),
    /// Nothing arrived within the frame timeout
    Idle,
    /// Every producer is gone
    Disconnected,
}

/// Runner that advances the application one event at a time
pub struct Runner<E: EventSource> {
    event_source: E,
    frame_timeout: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, frame_timeout: Duration) -> Self {
        Self {
            event_source,
            frame_timeout,
        }
    }

    /// Blocks up to the frame timeout and returns the next event
    pub fn step(&self) -> Step {
        match self.event_source.recv_timeout(self.frame_timeout) {
            Ok(ev) => Step::Event(ev),
            Err(RecvTimeoutError::Timeout) => Step::Idle,
            Err(RecvTimeoutError::Disconnected) => Step::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn step_returns_idle_on_timeout() {
        let (_tx, es) = ChannelEventSource::channel();
        let runner = Runner::new(es, Duration::from_millis(1));

        assert_matches!(runner.step(), Step::Idle);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, es) = ChannelEventSource::channel();
        tx.send(TaprEvent::Resize).unwrap();
        tx.send(TaprEvent::Tick(TickId(4))).unwrap();
        let runner = Runner::new(es, Duration::from_millis(10));

        assert_matches!(runner.step(), Step::Event(TaprEvent::Resize));
        assert_matches!(runner.step(), Step::Event(TaprEvent::Tick(TickId(4))));
    }

    #[test]
    fn step_reports_disconnect() {
        let (tx, es) = ChannelEventSource::channel();
        drop(tx);
        let runner = Runner::new(es, Duration::from_millis(10));

        assert_matches!(runner.step(), Step::Disconnected);
    }
}

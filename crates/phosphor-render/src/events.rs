use crossbeam::channel::{self, Receiver, Sender};

use crate::targets::Size;

/// Notifications posted by the windowing host between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEvent {
    Resize(Size),
    StartPlayback,
    RestartPlayback,
}

/// What accumulated since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingEvents {
    /// Latest requested size; earlier ones in the same batch are dropped.
    pub resize: Option<Size>,
    pub start: bool,
    pub restart: bool,
}

/// Event queue drained once at the start of each tick.
///
/// Hosts post from callbacks through cloned [`EventSender`]s; the render
/// loop is the only reader, so nothing reaches core state mid-pass.
pub struct EventQueue {
    tx: Sender<ScopeEvent>,
    rx: Receiver<ScopeEvent>,
}

/// Cloneable posting handle.
#[derive(Clone)]
pub struct EventSender(Sender<ScopeEvent>);

impl EventSender {
    pub fn send(&self, event: ScopeEvent) {
        // The queue owns a receiver for as long as any sender can exist.
        let _ = self.0.send(event);
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> EventSender {
        EventSender(self.tx.clone())
    }

    pub fn send(&self, event: ScopeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn drain(&self) -> PendingEvents {
        let mut pending = PendingEvents::default();
        for event in self.rx.try_iter() {
            match event {
                ScopeEvent::Resize(size) => pending.resize = Some(size),
                ScopeEvent::StartPlayback => pending.start = true,
                ScopeEvent::RestartPlayback => pending.restart = true,
            }
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_keeps_latest_size() {
        let queue = EventQueue::new();
        queue.send(ScopeEvent::Resize(Size::new(100, 100)));
        queue.send(ScopeEvent::Resize(Size::new(300, 200)));
        let pending = queue.drain();
        assert_eq!(pending.resize, Some(Size::new(300, 200)));
        assert!(!pending.start);
        assert_eq!(queue.drain(), PendingEvents::default());
    }

    #[test]
    fn test_sender_from_another_thread() {
        let queue = EventQueue::new();
        let tx = queue.sender();
        std::thread::spawn(move || {
            tx.send(ScopeEvent::StartPlayback);
            tx.send(ScopeEvent::RestartPlayback);
        })
        .join()
        .unwrap();
        let pending = queue.drain();
        assert!(pending.start && pending.restart);
        assert_eq!(pending.resize, None);
    }
}

//! Pedal input channel — mpsc bridge from the MIDI thread to the event loop.

use std::sync::mpsc;

/// Events a foot controller can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedalEvent {
    /// Step through the series; +1 is "forward" as the session sees it.
    Step(i8),
    /// Start/stop the drone.
    ToggleDrone,
    /// Start/stop the metronome.
    ToggleTick,
}

/// Sender half — cloned into the MIDI callback.
pub type PedalSender = mpsc::Sender<PedalEvent>;

/// Receiver half — held by the TUI event loop.
pub struct PedalReceiver {
    rx: mpsc::Receiver<PedalEvent>,
}

impl PedalReceiver {
    /// Non-blocking poll for the next pedal event.
    pub fn poll(&self) -> Option<PedalEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<PedalEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Create a connected sender/receiver pair.
pub fn pedal_channel() -> (PedalSender, PedalReceiver) {
    let (tx, rx) = mpsc::channel();
    (tx, PedalReceiver { rx })
}

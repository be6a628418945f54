//! Trigger pin capability
//!
//! The target raises a GPIO around the operation under test so external
//! equipment can time its fault injection. Register access lives in the
//! platform implementation of [`TriggerPin`]; the protocol code only sees
//! these three operations.

/// Output pin used as a measurement/glitch trigger
pub trait TriggerPin {
    /// Put the pin in output mode, driven low
    fn configure_pin(&mut self);

    /// Drive the pin high
    fn set_pin(&mut self);

    /// Drive the pin low
    fn clear_pin(&mut self);
}

/// Holds the trigger high for as long as it lives
pub struct TriggerGuard<'a, P: TriggerPin + ?Sized> {
    pin: &'a mut P,
}

impl<'a, P: TriggerPin + ?Sized> TriggerGuard<'a, P> {
    pub fn new(pin: &'a mut P) -> Self {
        pin.set_pin();
        Self { pin }
    }
}

impl<P: TriggerPin + ?Sized> Drop for TriggerGuard<'_, P> {
    fn drop(&mut self) {
        self.pin.clear_pin();
    }
}

/// Pin that records every operation (host-side dry runs and tests)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingPin {
    pub events: Vec<PinEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Configure,
    Set,
    Clear,
}

impl RecordingPin {
    /// Current level, `false` before the first `set_pin`
    pub fn is_high(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find(|e| **e != PinEvent::Configure)
            .is_some_and(|e| *e == PinEvent::Set)
    }
}

impl TriggerPin for RecordingPin {
    fn configure_pin(&mut self) {
        self.events.push(PinEvent::Configure);
    }

    fn set_pin(&mut self) {
        self.events.push(PinEvent::Set);
    }

    fn clear_pin(&mut self) {
        self.events.push(PinEvent::Clear);
    }
}

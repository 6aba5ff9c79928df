//! Limit switch input.

use embedded_hal::digital::InputPin;

/// Logical reading of a limit switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    /// Switch is pressed / triggered.
    Active,
    /// Switch is released.
    Inactive,
}

impl SwitchState {
    /// `true` for [`SwitchState::Active`].
    #[inline]
    pub fn is_active(self) -> bool {
        self == SwitchState::Active
    }
}

/// Polled, non-blocking reader for a homing switch.
///
/// Pull-up/pull-down and polarity are the implementor's concern.
pub trait SwitchReader {
    /// Read the current switch state.
    fn read(&mut self) -> SwitchState;
}

impl<S: SwitchReader + ?Sized> SwitchReader for &mut S {
    #[inline]
    fn read(&mut self) -> SwitchState {
        (**self).read()
    }
}

/// [`SwitchReader`] over an embedded-hal 1.0 input pin.
pub struct PinSwitch<PIN: InputPin> {
    pin: PIN,
    /// Active when the pin reads low (switch to ground with pull-up).
    active_low: bool,
}

impl<PIN: InputPin> PinSwitch<PIN> {
    /// Switch wired to ground with a pull-up: low means pressed.
    pub fn active_low(pin: PIN) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    /// Switch wired to supply with a pull-down: high means pressed.
    pub fn active_high(pin: PIN) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// Create with explicit polarity.
    pub fn new(pin: PIN, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    /// Release the pin.
    pub fn release(self) -> PIN {
        self.pin
    }
}

impl<PIN: InputPin> SwitchReader for PinSwitch<PIN> {
    /// A failed read is reported as `Inactive`; the homing debounce re-read
    /// and the travel bound keep a flaky input from confirming anything.
    fn read(&mut self) -> SwitchState {
        match self.pin.is_low() {
            Ok(low) if low == self.active_low => SwitchState::Active,
            Ok(_) => SwitchState::Inactive,
            Err(_) => {
                warn!("switch read failed");
                SwitchState::Inactive
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn test_active_low_polarity() {
        let pin = PinMock::new(&[
            Transaction::get(State::Low),
            Transaction::get(State::High),
        ]);

        let mut switch = PinSwitch::active_low(pin);
        assert_eq!(switch.read(), SwitchState::Active);
        assert_eq!(switch.read(), SwitchState::Inactive);

        switch.release().done();
    }

    #[test]
    fn test_active_high_polarity() {
        let pin = PinMock::new(&[
            Transaction::get(State::Low),
            Transaction::get(State::High),
        ]);

        let mut switch = PinSwitch::active_high(pin);
        assert_eq!(switch.read(), SwitchState::Inactive);
        assert_eq!(switch.read(), SwitchState::Active);

        switch.release().done();
    }
}

use embedded_hal::digital::InputPin;

/// Samples the timezone button once per tick. The button pulls the pin low while pressed.
pub struct InputWatcher<P> {
    pin: P,
    was_pressed: bool,
}

impl<P: InputPin> InputWatcher<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            was_pressed: false,
        }
    }

    /// True on the sample where the button goes down; holding it does not repeat.
    pub fn pressed(&mut self) -> bool {
        let is_pressed = match self.pin.is_low() {
            Ok(low) => low,
            Err(err) => {
                log::warn!("Reading button failed: {err:?}");
                false
            }
        };
        let edge = is_pressed && !self.was_pressed;
        self.was_pressed = is_pressed;
        edge
    }
}

/*!
Standard controller: strobe latch plus serial shift-out on $4016/$4017.

Buttons occupy one bit each in the order the console reads them out:
A, B, Select, Start, Up, Down, Left, Right (bit 0 through bit 7).
While the strobe is high, reads keep returning the live A state; once the
strobe drops, each read shifts out the next latched bit, and reads past
the eighth return 1.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    #[inline]
    pub fn mask(self) -> u8 {
        match self {
            Button::A => 1 << 0,
            Button::B => 1 << 1,
            Button::Select => 1 << 2,
            Button::Start => 1 << 3,
            Button::Up => 1 << 4,
            Button::Down => 1 << 5,
            Button::Left => 1 << 6,
            Button::Right => 1 << 7,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Controller {
    /// Live button states, bit set = pressed.
    buttons: u8,
    /// Snapshot captured while the strobe was high.
    latched: u8,
    strobe: bool,
    /// Next bit to shift out; 8 or more means the report is exhausted.
    index: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    /// Replace the whole button state with a mask in `Button` bit order.
    pub fn set_buttons(&mut self, mask: u8) {
        self.buttons = mask;
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// CPU write to $4016; only bit 0 matters.
    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = (value & 1) != 0;
        if self.strobe {
            self.latch();
        }
    }

    /// CPU read from $4016/$4017; only bit 0 of the result is driven.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.latch();
            self.latched & 1
        } else if self.index < 8 {
            let bit = (self.latched >> self.index) & 1;
            self.index += 1;
            bit
        } else {
            1
        }
    }

    /// Read without side effects, for inspection.
    pub fn peek(&self) -> u8 {
        if self.strobe {
            self.buttons & 1
        } else if self.index < 8 {
            (self.latched >> self.index) & 1
        } else {
            1
        }
    }

    #[inline]
    fn latch(&mut self) {
        self.latched = self.buttons;
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_shift_order() {
        let mut pad = Controller::new();
        // A, Start, Left
        pad.set_buttons((1 << 0) | (1 << 3) | (1 << 6));

        pad.write_strobe(1);
        pad.write_strobe(0);

        let expected = [1, 0, 0, 1, 0, 0, 1, 0];
        for &e in &expected {
            assert_eq!(pad.read(), e);
        }
        // Exhausted report reads as 1
        assert_eq!(pad.read(), 1);
        assert_eq!(pad.read(), 1);
    }

    #[test]
    fn strobe_high_tracks_live_a() {
        let mut pad = Controller::new();
        pad.set_button(Button::A, true);

        pad.write_strobe(1);
        for _ in 0..4 {
            assert_eq!(pad.read(), 1);
        }
        pad.set_button(Button::A, false);
        assert_eq!(pad.read(), 0);
    }

    #[test]
    fn restrobe_restarts_report() {
        let mut pad = Controller::new();
        pad.set_buttons(1); // A only
        pad.write_strobe(1);
        pad.write_strobe(0);
        assert_eq!(pad.read(), 1);
        assert_eq!(pad.read(), 0);

        pad.write_strobe(1);
        pad.write_strobe(0);
        assert_eq!(pad.read(), 1);
    }
}

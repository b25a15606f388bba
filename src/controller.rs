/*!
Input devices behind the two serial ports ($4016/$4017).

Port protocol:
- A CPU write to $4016 drives the strobe line (bit 0) of both ports.
- A CPU read of $4016 (port 1) or $4017 (port 2) returns the device's five
  data bits in bits 0-4; bits 5-7 keep the open-bus value.

Devices:
- `Controller`: the standard pad. Buttons shift out serially in the order
  A, B, Select, Start, Up, Down, Left, Right (bit 0 through bit 7). While
  strobe is high the pad keeps re-latching and every read returns A. After
  eight reads, further reads return 1.
- `Zapper`: the light gun. Bit 3 is the light sensor (0 = light seen), bit 4
  the trigger (1 = pulled). Light is seen when the beam has recently drawn a
  bright pixel at the aim point.
*/

use std::fmt;

/// What a device can observe about the picture when it is read.
#[derive(Clone, Copy)]
pub struct PortContext<'a> {
    /// ARGB frame buffer, `y * 256 + x`.
    pub frame: &'a [u32],
    pub scanline: u16,
    pub dot: u16,
}

impl fmt::Debug for PortContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortContext")
            .field("scanline", &self.scanline)
            .field("dot", &self.dot)
            .finish()
    }
}

/// A device plugged into one of the two input ports.
pub trait InputDevice {
    /// $4016 write, bit 0.
    fn strobe(&mut self, high: bool);

    /// Port read; only the low five bits are significant.
    fn read(&mut self, ctx: &PortContext<'_>) -> u8;
}

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
    fn mask(self) -> u8 {
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

#[derive(Clone, Debug)]
pub struct Controller {
    // Current live button states. Bit set = pressed.
    buttons: u8,

    // Latched button states captured during strobe or on-demand when strobe is high.
    latched: u8,

    // If true, reads always reflect A button (bit 0 of latched). If false, reads shift serially.
    strobe: bool,

    // Read index [0..=8). 0..7 -> bits A..Right. >=8 -> return 1 on further reads.
    index: u8,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            buttons: 0,
            latched: 0,
            strobe: false,
            index: 0,
        }
    }

    // Set or clear a button.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    // Convenience helpers.
    pub fn press(&mut self, button: Button) {
        self.set_button(button, true);
    }

    pub fn release(&mut self, button: Button) {
        self.set_button(button, false);
    }

    // Replace the entire current button state with the provided mask.
    // Bit set = pressed. Bit layout matches Button::mask ordering.
    pub fn set_state_mask(&mut self, mask: u8) {
        self.buttons = mask;
    }

    /// Next serial bit.
    pub fn shift_out(&mut self) -> u8 {
        if self.strobe {
            // While strobe is high, re-latch on each read and always return A state.
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

    #[inline]
    fn latch(&mut self) {
        self.latched = self.buttons;
        self.index = 0;
    }

    pub fn strobe_high(&self) -> bool {
        self.strobe
    }

    pub fn current_mask(&self) -> u8 {
        self.buttons
    }
}

impl InputDevice for Controller {
    fn strobe(&mut self, high: bool) {
        self.strobe = high;
        if high {
            self.latch();
        }
    }

    fn read(&mut self, _ctx: &PortContext<'_>) -> u8 {
        self.shift_out()
    }
}

// -------------- Zapper --------------

/// Scanlines after the beam passes the aim point during which the sensor
/// still reports light.
pub const ZAPPER_PERSISTENCE_LINES: u16 = 20;

/// Minimum R+G+B of a pixel the sensor registers.
const ZAPPER_BRIGHTNESS: u32 = 0x180;

#[derive(Clone, Debug, Default)]
pub struct Zapper {
    aim: Option<(u16, u16)>,
    trigger: bool,
}

impl Zapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point at a screen coordinate, or `None` when aimed off screen.
    pub fn aim(&mut self, target: Option<(u16, u16)>) {
        self.aim = target.filter(|&(x, y)| x < 256 && y < 240);
    }

    pub fn set_trigger(&mut self, pulled: bool) {
        self.trigger = pulled;
    }

    fn senses_light(&self, ctx: &PortContext<'_>) -> bool {
        let Some((x, y)) = self.aim else {
            return false;
        };
        // The beam must have drawn the aim point recently in this frame.
        let drawn = ctx.scanline > y || (ctx.scanline == y && ctx.dot > x + 1);
        if !drawn || ctx.scanline >= y + ZAPPER_PERSISTENCE_LINES {
            return false;
        }
        let Some(&argb) = ctx.frame.get(y as usize * 256 + x as usize) else {
            return false;
        };
        let sum = ((argb >> 16) & 0xFF) + ((argb >> 8) & 0xFF) + (argb & 0xFF);
        sum >= ZAPPER_BRIGHTNESS
    }
}

impl InputDevice for Zapper {
    fn strobe(&mut self, _high: bool) {}

    fn read(&mut self, ctx: &PortContext<'_>) -> u8 {
        let dark = if self.senses_light(ctx) { 0 } else { 0x08 };
        let trigger = if self.trigger { 0x10 } else { 0 };
        dark | trigger
    }
}

// -------------- Port --------------

/// What is plugged into a port.
#[derive(Clone, Debug, Default)]
pub enum Port {
    #[default]
    Empty,
    Controller(Controller),
    Zapper(Zapper),
}

impl Port {
    pub fn controller() -> Self {
        Port::Controller(Controller::new())
    }

    pub fn zapper() -> Self {
        Port::Zapper(Zapper::new())
    }

    pub fn as_controller_mut(&mut self) -> Option<&mut Controller> {
        match self {
            Port::Controller(pad) => Some(pad),
            _ => None,
        }
    }

    pub fn as_zapper_mut(&mut self) -> Option<&mut Zapper> {
        match self {
            Port::Zapper(gun) => Some(gun),
            _ => None,
        }
    }

    /// Full CPU-visible byte: device bits 0-4, open bus bits 5-7.
    pub fn read_port(&mut self, ctx: &PortContext<'_>, open_bus: u8) -> u8 {
        (self.read(ctx) & 0x1F) | (open_bus & 0xE0)
    }
}

impl InputDevice for Port {
    fn strobe(&mut self, high: bool) {
        match self {
            Port::Empty => {}
            Port::Controller(pad) => pad.strobe(high),
            Port::Zapper(gun) => gun.strobe(high),
        }
    }

    fn read(&mut self, ctx: &PortContext<'_>) -> u8 {
        match self {
            Port::Empty => 0,
            Port::Controller(pad) => pad.read(ctx),
            Port::Zapper(gun) => gun.read(ctx),
        }
    }
}

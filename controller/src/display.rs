use embedded_hal::i2c::I2c;
use thermostat_common::{
    segment::{self, Frame},
    Screen,
};

pub const HT16K33_ADDRESS: u8 = 0x70;

const CMD_OSCILLATOR_ON: u8 = 0x21;
const CMD_DISPLAY_ON: u8 = 0x81;
const CMD_BRIGHTNESS: u8 = 0xE0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Written,
    /// The value has no representation on the display; nothing was sent.
    Rejected,
}

/// HT16K33-driven 5-position 7-segment display.
#[derive(Debug)]
pub struct SegmentDisplay<I> {
    i2c: I,
}

impl<I: I2c> SegmentDisplay<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn begin(&mut self, brightness: u8) -> Result<(), I::Error> {
        self.i2c.write(HT16K33_ADDRESS, &[CMD_OSCILLATOR_ON])?;
        self.i2c.write(HT16K33_ADDRESS, &[CMD_DISPLAY_ON])?;
        self.set_brightness(brightness)
    }

    pub fn set_brightness(&mut self, brightness: u8) -> Result<(), I::Error> {
        self.i2c
            .write(HT16K33_ADDRESS, &[CMD_BRIGHTNESS | brightness.min(0x0F)])
    }

    pub fn render(&mut self, screen: Screen) -> Result<RenderOutcome, I::Error> {
        let frame = match screen {
            Screen::Placeholder => Some(segment::placeholder_frame()),
            Screen::Blank => Some(segment::blank_frame()),
            Screen::Temperature(tenths) | Screen::Setpoint(tenths) => {
                segment::temperature_frame(tenths)
            }
            Screen::Humidity(percent) => segment::humidity_frame(percent),
        };

        match frame {
            Some(frame) => {
                self.show(frame)?;
                Ok(RenderOutcome::Written)
            }
            None => Ok(RenderOutcome::Rejected),
        }
    }

    fn show(&mut self, frame: Frame) -> Result<(), I::Error> {
        for (position, byte) in frame.iter().enumerate() {
            self.i2c.write(HT16K33_ADDRESS, &[(position * 2) as u8, *byte])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use thermostat_common::segment::{GLYPH_H, GLYPH_MINUS};

    use super::*;
    use crate::sim::SimWorld;

    #[test]
    fn begin_powers_on_with_brightness() {
        let world = SimWorld::new();
        let mut display = SegmentDisplay::new(world.i2c());

        display.begin(0x3F).unwrap();

        let panel = world.panel();
        assert!(panel.oscillator_on);
        assert!(panel.display_on);
        assert_eq!(panel.brightness, 0x0F);
    }

    #[test]
    fn temperature_writes_every_position() {
        let world = SimWorld::new();
        let mut display = SegmentDisplay::new(world.i2c());

        assert_eq!(
            display.render(Screen::Temperature(753)).unwrap(),
            RenderOutcome::Written
        );
        assert_eq!(world.frame(), [0x00, 0x07, 0x00, 0x6D | 0x80, 0x4F]);
        assert_eq!(world.display_writes(), 5);
    }

    #[test]
    fn humidity_and_placeholder_frames() {
        let world = SimWorld::new();
        let mut display = SegmentDisplay::new(world.i2c());

        display.render(Screen::Humidity(47)).unwrap();
        assert_eq!(world.frame(), [GLYPH_H, 0x00, 0x00, 0x66, 0x07]);

        display.render(Screen::Placeholder).unwrap();
        assert_eq!(
            world.frame(),
            [GLYPH_MINUS, GLYPH_MINUS, 0x00, GLYPH_MINUS, GLYPH_MINUS]
        );
    }

    #[test]
    fn out_of_range_value_is_silently_rejected() {
        let world = SimWorld::new();
        let mut display = SegmentDisplay::new(world.i2c());
        display.render(Screen::Temperature(700)).unwrap();
        let writes = world.display_writes();

        assert_eq!(
            display.render(Screen::Temperature(1_200)).unwrap(),
            RenderOutcome::Rejected
        );
        assert_eq!(world.display_writes(), writes);
        assert_eq!(world.frame(), segment::temperature_frame(700).unwrap());
    }

    #[test]
    fn bus_failure_is_returned() {
        let world = SimWorld::new();
        let mut display = SegmentDisplay::new(world.i2c());
        world.set_bus_failure(true);

        assert!(display.render(Screen::Blank).is_err());
    }
}

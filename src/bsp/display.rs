use display_interface::DisplayError as InterfaceError;
use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_5X8},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use esp_hal::{Blocking, i2c::master::I2c};
use ssd1306::{I2CDisplayInterface, Ssd1306, mode::BufferedGraphicsMode, prelude::*};
use thiserror::Error;
use world_clock::{impl_from_variant, system::display::TextDisplay};

pub type Panel = Ssd1306<
    I2CInterface<I2c<'static, Blocking>>,
    DisplaySize128x32,
    BufferedGraphicsMode<DisplaySize128x32>,
>;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Display interface error: {0:?}")]
    Interface(InterfaceError),
}
impl_from_variant!(DisplayError, Interface, InterfaceError);

pub type DisplayResult<T> = Result<T, DisplayError>;

/// The SSD1306 panel, drawn with an 8 px tall font so four lines fill its 32 rows.
pub struct Oled {
    panel: Panel,
}

impl Oled {
    pub fn init(i2c: I2c<'static, Blocking>) -> DisplayResult<Self> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut panel = Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        panel.init()?;
        panel.clear_buffer();
        panel.flush()?;
        let me = Self { panel };
        Ok(me)
    }
}

impl TextDisplay for Oled {
    type Error = DisplayError;

    fn clear(&mut self) {
        self.panel.clear_buffer();
    }

    fn text(&mut self, text: &str, x: i32, y: i32) -> DisplayResult<()> {
        let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(&mut self.panel)?;
        Ok(())
    }

    fn flush(&mut self) -> DisplayResult<()> {
        self.panel.flush()?;
        Ok(())
    }
}

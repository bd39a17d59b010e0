use esp_hal::{
    Blocking,
    gpio::{Input, InputConfig, Pull},
    i2c::master::{Config as I2cConfig, ConfigError as I2cConfigError, I2c},
    peripherals::Peripherals,
    rng::Rng,
    rtc_cntl::Rtc,
    time::Rate,
    timer::{systimer::SystemTimer, timg::TimerGroup},
};
use esp_wifi::{
    EspWifiController,
    wifi::{Interfaces, WifiController},
};
use thiserror::Error;
use world_clock::mk_static;

use crate::wifi::WifiError;

pub use self::{
    display::{DisplayError, Oled},
    rtc::ChipRtc,
};

mod display;
mod rtc;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("WiFi initialization failed")]
    WifiInitFail,
    #[error("I2C initialization error: {0}")]
    I2cConfigError(#[from] I2cConfigError),
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),
    #[error("WiFi error: {0}")]
    WiFi(#[from] WifiError),
    #[error("{0} already taken")]
    Taken(&'static str),
}

pub type BoardResult<T> = Result<T, BoardError>;

pub struct Board {
    rng: Rng,
    wifi_controller: Option<WifiController<'static>>,
    wifi_interfaces: Option<Interfaces<'static>>,
    display: Option<Oled>,
    rtc: Option<ChipRtc>,
    button: Option<Input<'static>>,
}

impl Board {
    pub fn init(peripherals: Peripherals) -> BoardResult<Self> {
        let timg0 = TimerGroup::new(peripherals.TIMG0);
        let rng = Rng::new(peripherals.RNG);

        let systimer = SystemTimer::new(peripherals.SYSTIMER);
        esp_hal_embassy::init(systimer.alarm0);

        // WiFi
        let esp_wifi_ctrl =
            esp_wifi::init(timg0.timer0, rng).map_err(|_| BoardError::WifiInitFail)?;
        let esp_wifi_ctrl = mk_static!(EspWifiController<'static>, esp_wifi_ctrl);

        let (wifi_controller, wifi_interfaces) =
            esp_wifi::wifi::new(esp_wifi_ctrl, peripherals.WIFI)
                .map_err(|_| BoardError::WifiInitFail)?;

        // SSD1306 128x32 on I2C
        let sda = peripherals.GPIO5;
        let scl = peripherals.GPIO6;

        let i2c: I2c<'static, Blocking> = I2c::new(
            peripherals.I2C0,
            I2cConfig::default().with_frequency(Rate::from_khz(400)),
        )?
        .with_sda(sda)
        .with_scl(scl);
        let display = Oled::init(i2c)?;

        // Timezone button, pressed = low
        let button = Input::new(peripherals.GPIO9, InputConfig::default().with_pull(Pull::Up));

        let rtc = ChipRtc::new(Rtc::new(peripherals.LPWR));

        let me = Self {
            rng,
            wifi_controller: Some(wifi_controller),
            wifi_interfaces: Some(wifi_interfaces),
            display: Some(display),
            rtc: Some(rtc),
            button: Some(button),
        };

        Ok(me)
    }

    pub fn rng(&self) -> Rng {
        self.rng
    }

    pub fn take_wifi_controller(&mut self) -> BoardResult<WifiController<'static>> {
        self.wifi_controller.take().ok_or(BoardError::Taken("WiFi controller"))
    }

    pub fn take_wifi_interfaces(&mut self) -> BoardResult<Interfaces<'static>> {
        self.wifi_interfaces.take().ok_or(BoardError::Taken("WiFi interfaces"))
    }

    pub fn take_display(&mut self) -> BoardResult<Oled> {
        self.display.take().ok_or(BoardError::Taken("Display"))
    }

    pub fn take_rtc(&mut self) -> BoardResult<ChipRtc> {
        self.rtc.take().ok_or(BoardError::Taken("RTC"))
    }

    pub fn take_button(&mut self) -> BoardResult<Input<'static>> {
        self.button.take().ok_or(BoardError::Taken("Button"))
    }
}

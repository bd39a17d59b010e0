#![no_std]
#![no_main]

use core::convert::Infallible;

use embassy_executor::Spawner;
use embassy_time::Delay;
use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use world_clock::{ClockController, Config, Devices, TimezoneRegistry, mk_static};

use crate::{
    bsp::{Board, BoardError},
    wifi::{StackConnector, WifiInterface, WifiRadio},
};

esp_bootloader_esp_idf::esp_app_desc!();

mod bsp;
mod wifi;

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) -> ! {
    let Err(err) = fallible_main(spawner).await;
    log::error!("Main failed: {err}");
    panic!("{err}");
}

async fn fallible_main(spawner: Spawner) -> Result<Infallible, BoardError> {
    esp_println::logger::init_logger_from_env();
    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(size: 72 * 1024);

    let mut board = Board::init(peripherals)?;
    let config: &'static Config = mk_static!(Config, Config::default());
    log::info!("Time service: {}", config.time_service().host());

    let wifi = WifiInterface::init(&spawner, board.rng(), board.take_wifi_interfaces()?)?;

    let devices = Devices {
        radio: WifiRadio::new(board.take_wifi_controller()?, wifi.stack()),
        connector: StackConnector::new(wifi.stack(), config.time_service().fetch_timeout()),
        rtc: board.take_rtc()?,
        button: board.take_button()?,
        screen: board.take_display()?,
        delay: Delay,
        free_memory: free_heap,
    };

    let mut clock = ClockController::new(config, TimezoneRegistry::default(), devices);
    clock.run().await
}

fn free_heap() -> usize {
    esp_alloc::HEAP.free()
}

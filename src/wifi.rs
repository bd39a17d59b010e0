use embassy_executor::{SpawnError, Spawner};
use embassy_net::{
    Runner, Stack, StackResources,
    dns::{DnsQueryType, Error as DnsError},
    tcp::{ConnectError, TcpSocket},
};
use embassy_time::Duration;
use esp_hal::rng::Rng;
use esp_wifi::wifi::{
    ClientConfiguration, Configuration, Interfaces, WifiController, WifiDevice,
    WifiError as RadioError,
};
use thiserror::Error;
use world_clock::{http::TcpConnector, impl_from_variant, mk_static, network::Radio};

#[derive(Debug, Error)]
pub enum WifiError {
    #[error("Spawn error: {0}")]
    SpawnError(#[from] SpawnError),
}

pub type WifiResult<T> = Result<T, WifiError>;

/// The network stack on top of the station interface. DHCP runs in `net_task`.
pub struct WifiInterface {
    stack: Stack<'static>,
}

impl WifiInterface {
    pub fn init(spawner: &Spawner, rng: Rng, interfaces: Interfaces<'static>) -> WifiResult<Self> {
        let wifi_interface = interfaces.sta;

        let net_config = embassy_net::Config::dhcpv4(Default::default());

        let seed = (rng.random() as u64) << 32 | rng.random() as u64;

        let (stack, runner) = embassy_net::new(
            wifi_interface,
            net_config,
            mk_static!(StackResources<3>, StackResources::<3>::new()),
            seed,
        );

        spawner.spawn(net_task(runner))?;

        Ok(Self { stack })
    }

    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }
}

/// Station mode radio that is only powered while a sync is in progress.
pub struct WifiRadio {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl WifiRadio {
    pub fn new(controller: WifiController<'static>, stack: Stack<'static>) -> Self {
        Self { controller, stack }
    }
}

impl Radio for WifiRadio {
    type Error = RadioError;

    async fn connect(&mut self, ssid: &str, password: &str) -> Result<(), RadioError> {
        let client_config = Configuration::Client(ClientConfiguration {
            ssid: ssid.into(),
            password: password.into(),
            ..Default::default()
        });
        self.controller.set_configuration(&client_config)?;

        if !matches!(self.controller.is_started(), Ok(true)) {
            log::info!("Starting wifi");
            self.controller.start_async().await?;
        }

        log::debug!("About to connect...");
        self.controller.connect()
    }

    fn is_connected(&mut self) -> bool {
        matches!(self.controller.is_connected(), Ok(true)) && self.stack.is_config_up()
    }

    async fn disconnect(&mut self) -> Result<(), RadioError> {
        log::debug!("Stopping wifi");
        self.controller.stop_async().await
    }
}

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("DNS lookup failed: {0:?}")]
    Dns(DnsError),
    #[error("No address for host")]
    NoAddress,
    #[error("TCP connect failed: {0:?}")]
    Tcp(ConnectError),
}
impl_from_variant!(ConnectorError, Dns, DnsError);
impl_from_variant!(ConnectorError, Tcp, ConnectError);

/// Opens TCP sockets over the WiFi stack. One socket at a time, reusing the same buffers.
pub struct StackConnector {
    stack: Stack<'static>,
    timeout: Duration,
    rx_buffer: [u8; 1536],
    tx_buffer: [u8; 512],
}

impl StackConnector {
    /// `timeout` bounds every socket operation, so a stalled server cannot hang a fetch.
    pub fn new(stack: Stack<'static>, timeout: Duration) -> Self {
        Self {
            stack,
            timeout,
            rx_buffer: [0; 1536],
            tx_buffer: [0; 512],
        }
    }
}

impl TcpConnector for StackConnector {
    type Error = ConnectorError;
    type Connection<'a> = TcpSocket<'a>;

    async fn connect(&mut self, host: &str, port: u16) -> Result<TcpSocket<'_>, ConnectorError> {
        let addresses = self.stack.dns_query(host, DnsQueryType::A).await?;
        let address = addresses.first().copied().ok_or(ConnectorError::NoAddress)?;
        log::debug!("{host} resolved to {address}");

        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
        socket.set_timeout(Some(self.timeout));
        socket.connect((address, port)).await?;
        Ok(socket)
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

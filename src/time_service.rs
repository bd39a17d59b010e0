use core::fmt::Write as _;

use heapless::String;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    config::TimeServiceConfig,
    http::{self, HttpError, TcpConnector},
    timezone::TimezoneId,
};

/// Receive buffer for one response, headers included.
pub const RESPONSE_BUFFER_SIZE: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network down")]
    Network,
    #[error("http {0}")]
    Http(u16),
    #[error("bad response")]
    Decode,
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Connect | HttpError::Io => Self::Network,
            HttpError::Overflow | HttpError::Malformed => Self::Decode,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// The two fields of a `/api/timezone/<zone>` reply that the clock cares about.
///
/// Borrows from the client's receive buffer and is meant to be parsed and dropped right away.
#[derive(Debug, Default, Deserialize)]
pub struct TimeServiceResponse<'a> {
    #[serde(default, borrow)]
    pub datetime: Option<&'a str>,
    #[serde(default)]
    pub unixtime: Option<i64>,
}

pub struct TimeServiceClient<N> {
    connector: N,
    config: &'static TimeServiceConfig,
    buffer: [u8; RESPONSE_BUFFER_SIZE],
}

impl<N: TcpConnector> TimeServiceClient<N> {
    pub fn new(connector: N, config: &'static TimeServiceConfig) -> Self {
        Self {
            connector,
            config,
            buffer: [0; RESPONSE_BUFFER_SIZE],
        }
    }

    pub fn connector(&self) -> &N {
        &self.connector
    }

    /// One GET for `timezone`; retries are the caller's business.
    pub async fn fetch(&mut self, timezone: TimezoneId) -> FetchResult<TimeServiceResponse<'_>> {
        let mut path: String<96> = String::new();
        write!(path, "{}{}", self.config.path_prefix(), timezone).map_err(|_| FetchError::Decode)?;
        log::info!("GET http://{}{}", self.config.host(), path);

        let response = http::get(
            &mut self.connector,
            self.config.host(),
            self.config.port(),
            &path,
            &mut self.buffer,
        )
        .await?;

        if !response.is_success() {
            log::warn!("Time service answered {}", response.status);
            return Err(FetchError::Http(response.status));
        }

        serde_json_core::from_slice::<TimeServiceResponse<'_>>(response.body)
            .map(|(decoded, _)| decoded)
            .map_err(|err| {
                log::warn!("Time service body not understood: {err:?}");
                FetchError::Decode
            })
    }
}

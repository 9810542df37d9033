use std::time::Duration;

use reqwest::Client;

use crate::errors::{AppError, AppResult};

/// Build the shared HTTP client used for the remote store, image fetching
/// and notifications.
///
/// Only a connection timeout is applied; request durations are left to the
/// transport defaults.
pub fn build_client(connect_timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(AppError::from)
}

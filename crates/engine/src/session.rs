//! Session - Configuration plus the client talking to the APIs

use gateway::{ApiClient, Transport};
use shared::{Config, InitOptions, Result};
use std::sync::Arc;

/// Everything a request needs: where to cache and how to connect
#[derive(Debug)]
pub struct Session {
    config: Config,
    client: ApiClient,
}

impl Session {
    /// Session sending requests over the network
    pub fn new(config: Config) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// Load the configuration file and open a session
    pub fn init(options: InitOptions) -> Result<Self> {
        Self::new(Config::init(options)?)
    }

    /// Session sending requests through `transport`
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let client = ApiClient::with_transport(&config, transport);
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

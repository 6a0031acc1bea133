// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Database implementation for the Dremio Flight ADBC driver.

use crate::client::{DremioFlightClient, FlightClientConfig, FlightTransport};
use crate::connection::Connection;
use crate::descriptor::{parse_port, ConnectionParams};
use crate::error::Error;
use crate::logging::{init_logging, LogConfig};
use adbc_core::error::Result;
use adbc_core::options::{OptionConnection, OptionDatabase, OptionValue};
use adbc_core::Optionable;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Prefix for options passed through verbatim as descriptor tokens.
const PASSTHROUGH_PREFIX: &str = "dremio.option.";

/// Represents a database instance that holds connection configuration.
///
/// A Database is created from a Driver and is used to establish Connections.
/// Configuration can be given as a connection URL (`uri`), as individual
/// options, or both; individual options win over URL components.
#[derive(Debug, Default)]
pub struct Database {
    // Core configuration
    uri: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    schema: Option<String>,
    token: Option<String>,

    // Extra descriptor tokens, in the order they were set
    extra_options: Vec<(String, String)>,

    // Transport configuration
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,

    // Logging configuration
    log_config: LogConfig,
}

impl Database {
    /// Creates a new Database instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the configured URI.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Returns the explicitly configured host.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the explicitly configured port.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the configured default schema.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Merge the URL and the individual options into connection parameters.
    pub fn connection_params(&self) -> crate::error::Result<ConnectionParams> {
        let mut params = match self.uri {
            Some(ref uri) => ConnectionParams::from_url(uri)?,
            None => ConnectionParams::new(),
        };

        if self.host.is_some() {
            params.host = self.host.clone();
        }
        if self.port.is_some() {
            params.port = self.port;
        }
        if self.username.is_some() {
            params.user = self.username.clone();
        }
        if self.password.is_some() {
            params.password = self.password.clone();
        }
        if self.schema.is_some() {
            params.schema = self.schema.clone();
        }
        for (key, value) in &self.extra_options {
            params.push_option(key.clone(), value.clone());
        }
        if let Some(ref token) = self.token {
            params.push_option("Token", token.clone());
        }
        Ok(params)
    }

    /// Parse a string option value.
    fn parse_string_option(value: &OptionValue) -> Option<String> {
        match value {
            OptionValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Parse an integer option value.
    fn parse_int_option(value: &OptionValue) -> Option<i64> {
        match value {
            OptionValue::String(s) => s.parse().ok(),
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Parse a port option value.
    fn parse_port_option(value: &OptionValue) -> Option<u16> {
        match value {
            OptionValue::String(s) => parse_port(s).ok(),
            OptionValue::Int(i) => u16::try_from(*i).ok().filter(|p| *p != 0),
            _ => None,
        }
    }

    /// Parse a millisecond duration option value.
    fn parse_millis_option(value: &OptionValue) -> Option<Duration> {
        Self::parse_int_option(value)
            .and_then(|v| u64::try_from(v).ok())
            .map(Duration::from_millis)
    }

    fn set_string(
        slot: &mut Option<String>,
        key: &OptionDatabase,
        value: &OptionValue,
    ) -> Result<()> {
        match Self::parse_string_option(value) {
            Some(v) => {
                *slot = Some(v);
                Ok(())
            }
            None => Err(Error::set_invalid_option(key, value).to_adbc()),
        }
    }

    fn not_set(name: &str) -> adbc_core::error::Error {
        Error::InvalidState(format!("option '{}' is not set", name)).to_adbc()
    }
}

impl Optionable for Database {
    type Option = OptionDatabase;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> Result<()> {
        match key {
            OptionDatabase::Uri => Self::set_string(&mut self.uri, &key, &value),
            OptionDatabase::Username => Self::set_string(&mut self.username, &key, &value),
            OptionDatabase::Password => Self::set_string(&mut self.password, &key, &value),
            OptionDatabase::Other(ref s) => match s.as_str() {
                // Core options
                "dremio.host" => Self::set_string(&mut self.host, &key, &value),
                "dremio.port" => {
                    if let Some(v) = Self::parse_port_option(&value) {
                        self.port = Some(v);
                        Ok(())
                    } else {
                        Err(Error::set_invalid_option(&key, &value).to_adbc())
                    }
                }
                "dremio.schema" => Self::set_string(&mut self.schema, &key, &value),
                "dremio.token" => Self::set_string(&mut self.token, &key, &value),

                // Transport options
                "dremio.connect_timeout_ms" => {
                    if let Some(v) = Self::parse_millis_option(&value) {
                        self.connect_timeout = Some(v);
                        Ok(())
                    } else {
                        Err(Error::set_invalid_option(&key, &value).to_adbc())
                    }
                }
                "dremio.request_timeout_ms" => {
                    if let Some(v) = Self::parse_millis_option(&value) {
                        self.request_timeout = Some(v);
                        Ok(())
                    } else {
                        Err(Error::set_invalid_option(&key, &value).to_adbc())
                    }
                }

                // Logging options
                "dremio.log_level" => match Self::parse_string_option(&value) {
                    Some(v) if LogConfig::parse_level(&v).is_some() => {
                        self.log_config.level = Some(v);
                        Ok(())
                    }
                    _ => Err(Error::set_invalid_option(&key, &value).to_adbc()),
                },
                "dremio.log_file" => Self::set_string(&mut self.log_config.file, &key, &value),

                other => match other.strip_prefix(PASSTHROUGH_PREFIX) {
                    Some(name) if !name.is_empty() => match Self::parse_string_option(&value) {
                        Some(v) => {
                            let name = name.to_string();
                            match self.extra_options.iter_mut().find(|(k, _)| *k == name) {
                                Some(entry) => entry.1 = v,
                                None => self.extra_options.push((name, v)),
                            }
                            Ok(())
                        }
                        None => Err(Error::set_invalid_option(&key, &value).to_adbc()),
                    },
                    _ => Err(Error::unknown_option(&key).to_adbc()),
                },
            },
            _ => Err(Error::unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        match key {
            OptionDatabase::Uri => self.uri.clone().ok_or_else(|| Self::not_set("uri")),
            OptionDatabase::Username => self
                .username
                .clone()
                .ok_or_else(|| Self::not_set("username")),
            OptionDatabase::Other(ref s) => match s.as_str() {
                "dremio.host" => self.host.clone().ok_or_else(|| Self::not_set(s)),
                "dremio.schema" => self.schema.clone().ok_or_else(|| Self::not_set(s)),
                "dremio.log_level" => self
                    .log_config
                    .level
                    .clone()
                    .ok_or_else(|| Self::not_set(s)),
                "dremio.log_file" => self
                    .log_config
                    .file
                    .clone()
                    .ok_or_else(|| Self::not_set(s)),
                other => match other.strip_prefix(PASSTHROUGH_PREFIX) {
                    Some(name) => self
                        .extra_options
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone())
                        .ok_or_else(|| Self::not_set(s)),
                    None => Err(Error::unknown_option(&key).to_adbc()),
                },
            },
            _ => Err(Error::unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(Error::unknown_option(&key).to_adbc())
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        match key {
            OptionDatabase::Other(ref s) => match s.as_str() {
                "dremio.port" => self
                    .port
                    .map(i64::from)
                    .ok_or_else(|| Self::not_set(s)),
                "dremio.connect_timeout_ms" => self
                    .connect_timeout
                    .map(|d| d.as_millis() as i64)
                    .ok_or_else(|| Self::not_set(s)),
                "dremio.request_timeout_ms" => self
                    .request_timeout
                    .map(|d| d.as_millis() as i64)
                    .ok_or_else(|| Self::not_set(s)),
                _ => Err(Error::unknown_option(&key).to_adbc()),
            },
            _ => Err(Error::unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(Error::unknown_option(&key).to_adbc())
    }
}

impl adbc_core::Database for Database {
    type ConnectionType = Connection;

    fn new_connection(&self) -> Result<Self::ConnectionType> {
        // Initialize logging (first call wins; subsequent calls are no-ops)
        init_logging(&self.log_config);

        let params = self.connection_params().map_err(|e| e.to_adbc())?;
        let mut config = FlightClientConfig::from_params(&params).map_err(|e| e.to_adbc())?;
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout = timeout;
        }
        config.request_timeout = self.request_timeout;

        debug!(
            "Creating connection to {} (schema: {:?})",
            config.endpoint_uri(),
            config.schema
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::InvalidState(format!("failed to create async runtime: {}", e)).to_adbc()
            })?;

        let schema = config.schema.clone();
        let transport: Arc<dyn FlightTransport> = {
            let _guard = runtime.enter();
            Arc::new(DremioFlightClient::new(config).map_err(|e| e.to_adbc())?)
        };

        Ok(Connection::new_with_runtime(transport, schema, runtime))
    }

    fn new_connection_with_opts(
        &self,
        opts: impl IntoIterator<Item = (OptionConnection, OptionValue)>,
    ) -> Result<Self::ConnectionType> {
        let mut connection = self.new_connection()?;
        for (key, value) in opts {
            connection.set_option(key, value)?;
        }
        Ok(connection)
    }
}

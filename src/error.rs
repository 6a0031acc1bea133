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

//! Error types for the Dremio Flight ADBC driver.
//!
//! Driver internals return [`Error`]; the ADBC trait implementations convert
//! it into [`adbc_core::error::Error`] at the boundary via [`Error::to_adbc`].
//!
//! Classification:
//! - [`Error::Configuration`]: malformed or missing connection parameters,
//!   detected before any network call
//! - [`Error::Transport`]: Flight RPC submission or read failures
//! - [`Error::UnsupportedType`]: a remote type name with no client type
//! - [`Error::Cancelled`]: the owning connection was closed or cancelled
//!   while a result stream was open

use adbc_core::error::Status;
use arrow_flight::error::FlightError;
use arrow_schema::ArrowError;
use std::fmt;
use thiserror::Error;

/// Canonical driver error.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed connection parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failure talking to the Flight endpoint.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        /// Set when the server rejected the credentials.
        unauthenticated: bool,
    },

    /// The remote type name is not present in the type mapping table.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The stream was abandoned because its connection went away.
    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Driver result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a transport failure that is not an auth rejection.
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
            unauthenticated: false,
        }
    }

    /// An option was given a value of the wrong kind.
    pub fn set_invalid_option(key: &impl fmt::Debug, value: &impl fmt::Debug) -> Self {
        Error::InvalidArgument(format!("invalid value {:?} for option {:?}", value, key))
    }

    /// An option key this driver does not recognise.
    pub fn unknown_option(key: &impl fmt::Debug) -> Self {
        Error::NotFound(format!("unknown option {:?}", key))
    }

    /// ADBC status code for this error.
    pub fn status(&self) -> Status {
        match self {
            Error::Configuration(_) | Error::InvalidArgument(_) => Status::InvalidArguments,
            Error::Transport {
                unauthenticated: true,
                ..
            } => Status::Unauthenticated,
            Error::Transport { .. } => Status::IO,
            Error::UnsupportedType(_) | Error::NotImplemented(_) => Status::NotImplemented,
            Error::Cancelled(_) => Status::Cancelled,
            Error::InvalidState(_) => Status::InvalidState,
            Error::NotFound(_) => Status::NotFound,
            Error::Arrow(_) => Status::InvalidData,
        }
    }

    /// Convert into the ADBC error surfaced to client libraries.
    pub fn to_adbc(&self) -> adbc_core::error::Error {
        adbc_core::error::Error::with_message_and_status(self.to_string(), self.status())
    }
}

impl From<Error> for adbc_core::error::Error {
    fn from(err: Error) -> Self {
        err.to_adbc()
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        let unauthenticated = matches!(
            status.code(),
            tonic::Code::Unauthenticated | tonic::Code::PermissionDenied
        );
        Error::Transport {
            message: format!("{:?}: {}", status.code(), status.message()),
            unauthenticated,
        }
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        Error::transport(format!("channel error: {}", err))
    }
}

impl From<FlightError> for Error {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::Arrow(e) => Error::Arrow(e),
            FlightError::Tonic(status) => Error::from(tonic::Status::clone(&status)),
            other => Error::transport(other.to_string()),
        }
    }
}

//! Cause classification shared by store and model failures.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Broad cause of a failure talking to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Unknown,
}

impl ErrorCategory {
    /// Classify an HTTP status code returned by a collaborator.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            408 => Self::Timeout,
            429 => Self::RateLimit,
            500..=599 => Self::Server,
            _ => Self::Api,
        }
    }

    /// Classify a transport-level failure.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Serialization
        } else if err.is_builder() {
            Self::Configuration
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            Self::Network
        } else {
            Self::Unknown
        }
    }
}

//! Structured error types for devsim.
//!
//! All fallible public APIs return `Result<T, DevsimError>`. Every variant
//! describes wiring or protocol misuse: errors are raised synchronously at
//! the point of misuse and are never retried by the simulation loop.

use thiserror::Error;

use crate::device::DeviceId;
use crate::event::Target;
use crate::signal::Signal;
use crate::time::SimTime;

/// The top-level error type for the devsim kernel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DevsimError {
    // ── Scheduling errors ─────────────────────────────────

    /// Attempted to schedule an event before the current time.
    #[error("cannot schedule event at {requested} when current time is {current}")]
    Scheduling {
        requested: SimTime,
        current: SimTime,
    },

    /// An action was scheduled or dispatched by anyone but the device
    /// that declares it.
    #[error("{target} is an action and can only be scheduled by its own device")]
    ExternalAction { target: Target },

    // ── State machine errors ──────────────────────────────

    /// A transition was attempted from a state it does not allow, or named
    /// a state the device does not declare.
    #[error(
        "device {device:?}: operation {operation:?} not allowed in state {current:?} \
         (allowed from {allowed:?})"
    )]
    InvalidState {
        device: String,
        operation: String,
        current: String,
        allowed: Vec<String>,
    },

    // ── Registry errors ───────────────────────────────────

    /// An output name was referenced but never registered.
    #[error("device {device:?} has no output named {name:?}")]
    UnknownOutput { device: String, name: String },

    /// An action name was referenced but is not declared by the device.
    #[error("device {device:?} has no action named {name:?}")]
    UnknownAction { device: String, name: String },

    /// An input name was referenced but is not declared by the device.
    #[error("device {device:?} has no input named {name:?}")]
    UnknownInput { device: String, name: String },

    /// A name was registered twice in the same namespace.
    #[error("{scope:?} already has an entry named {name:?}")]
    DuplicateName { scope: String, name: String },

    /// An event targets a device id that is not in the registry.
    #[error("device {0} is not registered")]
    UnknownDevice(DeviceId),

    /// A device was looked up by a name nobody registered.
    #[error("no device named {0:?}")]
    UnknownDeviceName(String),

    // ── Configuration / value errors ──────────────────────

    /// A timing or configuration value is out of range.
    #[error("invalid configuration for {field}: {reason}")]
    Configuration { field: String, reason: String },

    /// A device received a signal it cannot interpret.
    #[error("device {device:?}: {operation} cannot use value {value}: {reason}")]
    InvalidValue {
        device: String,
        operation: String,
        value: Signal,
        reason: String,
    },
}

impl DevsimError {
    /// Shorthand for a [`DevsimError::Configuration`].
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DevsimError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for `Result<T, DevsimError>`.
pub type DevsimResult<T> = Result<T, DevsimError>;

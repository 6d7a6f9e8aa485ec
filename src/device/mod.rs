//! Device abstraction: a validated state machine with named outputs,
//! inputs and self-scheduled actions.
//!
//! Devices never call each other. They interact only through events
//! dispatched by the [`EventQueue`](crate::queue::EventQueue), which
//! reaches them through the [`DeviceRegistry`].
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`id`] | [`DeviceId`], [`DeviceHandle`] |
//! | [`core`] | [`DeviceCore`], [`Output`] |
//! | [`traits`] | [`Device`] trait + type-erased [`AnyDevice`] |
//! | [`registry`] | [`DeviceRegistry`] |
//! | [`builtin`] | [`CpuClock`], [`DataMemory`], [`ProgramMemory`] |

pub mod builtin;
pub mod core;
pub mod id;
pub mod registry;
pub mod traits;

// Flat re-exports so external callers can use `devsim::device::DeviceId` etc.
pub use self::core::{DeviceCore, Output};
pub use builtin::{CpuClock, DataMemory, ProgramMemory};
pub use id::{DeviceHandle, DeviceId};
pub use registry::DeviceRegistry;
pub use traits::{AnyDevice, Device};

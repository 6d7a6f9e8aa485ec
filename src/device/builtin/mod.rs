//! Reference devices: a phase clock and two memory models.
//!
//! They are thin consumers of [`DeviceCore`](crate::device::DeviceCore)
//! and double as worked examples of the [`Device`](crate::device::Device)
//! contract.

pub mod clock;
pub mod data_memory;
pub mod memory;
pub mod program_memory;

pub use clock::{ClockAction, ClockConfig, ClockInput, ClockState, CpuClock};
pub use data_memory::{DataMemory, DataMemoryConfig, DmAction, DmInput, DmState};
pub use memory::MemoryArray;
pub use program_memory::{PmAction, PmInput, PmState, ProgramMemory, ProgramMemoryConfig};

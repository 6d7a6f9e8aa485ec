//! # devsim — Discrete-Event Device Simulation
//!
//! A simulation kernel for timed digital hardware models: clocks,
//! memories and anything else that can be described as a validated state
//! machine reacting to timed inputs. No async, no threads, no wall-clock
//! time; a single event queue decides what happens next.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────┐
//! │        EventQueue          │ ← run / until / step
//! │  ┌──────────────────────┐  │
//! │  │      Scheduler       │  │ ← min-heap keyed by (time, id)
//! │  └──────────────────────┘  │
//! └─────────────┬──────────────┘
//!               │ Dispatch
//! ┌─────────────▼──────────────┐
//! │      DeviceRegistry        │ ← owns devices, publishes trace
//! │  ┌────────┐  ┌──────────┐  │
//! │  │ Device │  │  Tracer  │  │
//! │  │  core  │  │  sinks   │  │
//! │  └────────┘  └──────────┘  │
//! └────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use devsim::device::builtin::{PmInput, ProgramMemory, ProgramMemoryConfig};
//! use devsim::{DeviceRegistry, Event, EventQueue, Signal, Tracer};
//!
//! let content = (0..8).map(|n| Signal::int(n * 10)).collect();
//! let pm = ProgramMemory::with_content("pm", 3, content, ProgramMemoryConfig::default()).unwrap();
//!
//! let mut registry = DeviceRegistry::with_tracer(Tracer::silent());
//! let pm = registry.add(pm).unwrap();
//!
//! let mut queue = EventQueue::new();
//! queue.add(Event::input(1.0, pm, PmInput::Addr, 4).unwrap()).unwrap();
//! queue.add(Event::pulse(3.0, pm, PmInput::Read).unwrap()).unwrap();
//! queue.run(&mut registry).unwrap();
//!
//! let output = registry.output(pm.id(), "output").unwrap();
//! assert_eq!(output.value(), &Signal::int(40));
//! assert_eq!(output.updated().as_f64(), 8.0);
//! ```

pub mod api;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod names;
pub mod queue;
pub mod scenario;
pub mod scheduler;
pub mod signal;
pub mod time;
pub mod trace;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience.
pub use api::{DeviceSnapshot, SimulationApi, StepResult};
pub use device::{
    AnyDevice, CpuClock, DataMemory, Device, DeviceCore, DeviceHandle, DeviceId, DeviceRegistry,
    Output, ProgramMemory,
};
pub use error::{DevsimError, DevsimResult};
pub use event::{Event, EventId, HandlerRef, Target};
pub use names::NameSet;
pub use queue::{Dispatch, EventQueue};
pub use scenario::ScenarioId;
pub use scheduler::Scheduler;
pub use signal::{Scalar, Signal};
pub use time::SimTime;
pub use trace::{LogSink, TraceKind, TracePattern, TraceRecord, TraceSink, Tracer};

//! Reference scenarios for the built-in devices.
//!
//! Each scenario registers its devices, subscribes to every trace item and
//! enqueues its stimulus. The binary and the WASM wrapper both start from
//! here.

use std::str::FromStr;

use crate::api::SimulationApi;
use crate::device::builtin::{
    ClockConfig, ClockInput, CpuClock, DataMemory, DataMemoryConfig, DmInput, PmInput,
    ProgramMemory, ProgramMemoryConfig,
};
use crate::device::DeviceRegistry;
use crate::error::DevsimResult;
use crate::event::Event;
use crate::queue::EventQueue;
use crate::signal::Signal;
use crate::trace::Tracer;

/// Identifies a reference scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// A five-phase clock started at 0.1.
    Clock,
    /// One read cycle then one read/write cycle on a 3-bit data memory.
    DataMemory,
    /// Two address/read cycles on a 3-bit program memory.
    ProgramMemory,
}

impl ScenarioId {
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Clock,
            ScenarioId::DataMemory,
            ScenarioId::ProgramMemory,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Clock => "clock",
            ScenarioId::DataMemory => "data-memory",
            ScenarioId::ProgramMemory => "program-memory",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Clock => "CPU clock cycling through five named phases every 10 time units",
            ScenarioId::DataMemory => "data memory: read slot 3, then read and overwrite slot 2",
            ScenarioId::ProgramMemory => "program memory: read slot 2, deselect, then read slot 5",
        }
    }

    /// Where a run stops when the caller gives no horizon.
    ///
    /// The clock never drains its queue, so it needs one.
    pub fn default_horizon(&self) -> Option<f64> {
        match self {
            ScenarioId::Clock => Some(100.0),
            ScenarioId::DataMemory | ScenarioId::ProgramMemory => None,
        }
    }

    /// Register the devices and stimulus of this scenario.
    pub fn build(&self, tracer: Tracer) -> DevsimResult<SimulationApi> {
        let mut registry = DeviceRegistry::with_tracer(tracer);
        let mut queue = EventQueue::new();
        match self {
            ScenarioId::Clock => {
                let clock = registry.add(CpuClock::new("clk", ClockConfig::default())?)?;
                queue.add(Event::pulse(0.1, clock, ClockInput::Start)?)?;
            }
            ScenarioId::DataMemory => {
                let content = [1, 5, 2, 6, 3, 7, 4, 0].iter().map(|&n| Signal::int(n)).collect();
                let dm = registry.add(DataMemory::with_content(
                    "dm8",
                    3,
                    content,
                    DataMemoryConfig::default(),
                )?)?;
                queue.add_all(vec![
                    Event::input(1.0, dm, DmInput::Addr, 3)?,
                    Event::pulse(10.0, dm, DmInput::Select)?,
                    Event::pulse(20.0, dm, DmInput::Deselect)?,
                    Event::input(50.0, dm, DmInput::Addr, 2)?,
                    Event::pulse(52.0, dm, DmInput::Select)?,
                    Event::input(60.0, dm, DmInput::Write, 7)?,
                    Event::pulse(70.0, dm, DmInput::Deselect)?,
                ])?;
            }
            ScenarioId::ProgramMemory => {
                let content = ["zero", "one", "two", "three", "four", "five", "six", "seven"]
                    .iter()
                    .map(|&s| Signal::text(s))
                    .collect();
                let pm = registry.add(ProgramMemory::with_content(
                    "pm8",
                    3,
                    content,
                    ProgramMemoryConfig::default(),
                )?)?;
                queue.add_all(vec![
                    Event::input(1.0, pm, PmInput::Addr, 2)?,
                    Event::pulse(3.0, pm, PmInput::Read)?,
                    Event::pulse(10.0, pm, PmInput::Deselect)?,
                    Event::input(20.0, pm, PmInput::Addr, 5)?,
                    Event::pulse(22.0, pm, PmInput::Read)?,
                ])?;
            }
        }
        registry.trace_all("*");
        Ok(SimulationApi::new(queue, registry))
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clock" | "cpu-clock" | "cpu_clock" => Ok(ScenarioId::Clock),
            "data-memory" | "data_memory" | "dm" => Ok(ScenarioId::DataMemory),
            "program-memory" | "program_memory" | "pm" => Ok(ScenarioId::ProgramMemory),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

//! `ProgramMemory`: a read-only memory addressed once per select cycle.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::config::check_delay;
use crate::device::core::DeviceCore;
use crate::device::traits::Device;
use crate::error::DevsimResult;
use crate::signal::Signal;

use super::memory::MemoryArray;

crate::name_set! {
    pub enum PmState {
        Idle => "idle",
        Addressing => "addressing",
        ReadReady => "read_ready",
        Reading => "reading",
        Deselecting => "deselecting",
    }
}

crate::name_set! {
    pub enum PmInput {
        Addr => "inp_addr",
        Read => "inp_read",
        Deselect => "inp_deselect",
    }
}

crate::name_set! {
    pub enum PmAction {
        Addressed => "act_addressed",
        ValueOut => "act_value_out",
        Deselected => "act_deselected",
    }
}

pub const OUTPUT: &str = "output";

/// Timings of a [`ProgramMemory`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ProgramMemoryConfig {
    pub t_address: f64,
    pub t_read: f64,
    pub t_deselect: f64,
    pub empty_value: Signal,
}

impl Default for ProgramMemoryConfig {
    fn default() -> Self {
        ProgramMemoryConfig {
            t_address: 1.0,
            t_read: 5.0,
            t_deselect: 1.0,
            empty_value: Signal::int(0),
        }
    }
}

impl ProgramMemoryConfig {
    pub fn validate(&self) -> DevsimResult<()> {
        check_delay("t_address", self.t_address)?;
        check_delay("t_read", self.t_read)?;
        check_delay("t_deselect", self.t_deselect)
    }
}

/// A program memory of `2^address_width` slots.
///
/// `inp_addr` (from idle) latches an address and the memory becomes
/// read-ready after `t_address`. Each `inp_read` presents the addressed
/// slot on `output` after `t_read` and returns to read-ready, so one
/// address can be read repeatedly. `inp_deselect` returns to idle after
/// `t_deselect`.
#[derive(Debug, Clone)]
pub struct ProgramMemory {
    core: DeviceCore<PmState, PmAction>,
    config: ProgramMemoryConfig,
    memory: MemoryArray,
    address: usize,
}

impl ProgramMemory {
    pub fn new(name: impl Into<String>, address_width: u32, config: ProgramMemoryConfig) -> DevsimResult<Self> {
        config.validate()?;
        let memory = MemoryArray::filled(address_width, config.empty_value.clone())?;
        Self::build(name.into(), memory, config)
    }

    pub fn with_content(
        name: impl Into<String>,
        address_width: u32,
        content: Vec<Signal>,
        config: ProgramMemoryConfig,
    ) -> DevsimResult<Self> {
        config.validate()?;
        let memory = MemoryArray::from_content(address_width, content)?;
        Self::build(name.into(), memory, config)
    }

    fn build(name: String, memory: MemoryArray, config: ProgramMemoryConfig) -> DevsimResult<Self> {
        let mut core = DeviceCore::new(name, PmState::Idle);
        core.add_output(OUTPUT, Signal::Undefined)?;
        Ok(ProgramMemory {
            core,
            config,
            memory,
            address: 0,
        })
    }

    pub fn config(&self) -> &ProgramMemoryConfig {
        &self.config
    }

    pub fn content(&self) -> &[Signal] {
        self.memory.slots()
    }

    pub fn address(&self) -> usize {
        self.address
    }
}

impl Device for ProgramMemory {
    type State = PmState;
    type Input = PmInput;
    type Action = PmAction;

    fn core(&self) -> &DeviceCore<PmState, PmAction> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore<PmState, PmAction> {
        &mut self.core
    }

    fn on_input(&mut self, input: PmInput, value: Signal) -> DevsimResult<()> {
        match input {
            PmInput::Addr => {
                let address = self.memory.decode(self.core.name(), "inp_addr", &value)?;
                self.core
                    .transition("inp_addr", &[PmState::Idle], PmState::Addressing)?;
                self.address = address;
                self.core.act_after(PmAction::Addressed, self.config.t_address)
            }
            PmInput::Read => {
                self.core
                    .transition("inp_read", &[PmState::ReadReady], PmState::Reading)?;
                self.core.act_after(PmAction::ValueOut, self.config.t_read)
            }
            PmInput::Deselect => {
                self.core.transition(
                    "inp_deselect",
                    &[PmState::Idle, PmState::ReadReady],
                    PmState::Deselecting,
                )?;
                self.core
                    .act_after(PmAction::Deselected, self.config.t_deselect)
            }
        }
    }

    fn on_action(&mut self, action: PmAction) -> DevsimResult<()> {
        match action {
            PmAction::Addressed => {
                self.core
                    .transition("act_addressed", &[PmState::Addressing], PmState::ReadReady)
            }
            PmAction::ValueOut => {
                self.core
                    .transition("act_value_out", &[PmState::Reading], PmState::ReadReady)?;
                let value = self.memory.read(self.address).clone();
                self.core.out(OUTPUT, value)
            }
            PmAction::Deselected => {
                self.core
                    .transition("act_deselected", &[PmState::Deselecting], PmState::Idle)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NameSet;

    #[test]
    fn test_declared_names() {
        assert_eq!(
            PmState::names(),
            vec!["idle", "addressing", "read_ready", "reading", "deselecting"]
        );
        assert_eq!(PmInput::from_name("inp_read"), Some(PmInput::Read));
        assert_eq!(PmAction::from_name("act_read_done"), None);
    }

    #[test]
    fn test_initial_output_undefined() {
        let pm = ProgramMemory::new("pm", 3, ProgramMemoryConfig::default()).unwrap();
        assert_eq!(pm.core().value(OUTPUT).unwrap(), &Signal::Undefined);
        assert_eq!(pm.core().state(), PmState::Idle);
        assert_eq!(pm.content().len(), 8);
    }
}

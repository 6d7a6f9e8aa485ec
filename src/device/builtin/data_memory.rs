//! `DataMemory`: a read/write memory with address, select, write and
//! deselect cycles.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::config::check_delay;
use crate::device::core::DeviceCore;
use crate::device::traits::Device;
use crate::error::{DevsimError, DevsimResult};
use crate::signal::Signal;

use super::memory::MemoryArray;

crate::name_set! {
    pub enum DmState {
        Idle => "idle",
        AddressChanging => "address_changing",
        Reading => "reading",
        ReadDone => "read_done",
        Writing => "writing",
        WriteDone => "write_done",
        Deselecting => "deselecting",
    }
}

crate::name_set! {
    pub enum DmInput {
        Addr => "inp_addr",
        Select => "inp_select",
        Write => "inp_write",
        Deselect => "inp_deselect",
    }
}

crate::name_set! {
    pub enum DmAction {
        AddressSettled => "act_address_settled",
        ReadDone => "act_read_done",
        WriteDone => "act_write_done",
        Deselected => "act_deselected",
    }
}

pub const OUTPUT: &str = "output";

/// Timings of a [`DataMemory`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct DataMemoryConfig {
    /// Address latch settling time.
    pub t_address: f64,
    /// Select to data valid.
    pub t_read: f64,
    /// Write strobe to data stored.
    pub t_write: f64,
    /// Deselect to idle.
    pub t_deselect: f64,
    /// Fill value when no content is supplied.
    pub empty_value: Signal,
}

impl Default for DataMemoryConfig {
    fn default() -> Self {
        DataMemoryConfig {
            t_address: 1.0,
            t_read: 5.0,
            t_write: 5.0,
            t_deselect: 2.0,
            empty_value: Signal::int(0),
        }
    }
}

impl DataMemoryConfig {
    pub fn validate(&self) -> DevsimResult<()> {
        check_delay("t_address", self.t_address)?;
        check_delay("t_read", self.t_read)?;
        check_delay("t_write", self.t_write)?;
        check_delay("t_deselect", self.t_deselect)
    }
}

/// A data memory of `2^address_width` slots.
///
/// Cycle: `inp_addr` latches a masked address, which settles after
/// `t_address`. `inp_select` drives the output `Undefined` and presents
/// the addressed slot `t_read` later. While the read data is valid,
/// `inp_write` stores its payload into the same slot after `t_write`.
/// `inp_deselect` returns to idle after `t_deselect`.
///
/// Reads leave the slot unchanged.
#[derive(Debug, Clone)]
pub struct DataMemory {
    core: DeviceCore<DmState, DmAction>,
    config: DataMemoryConfig,
    memory: MemoryArray,
    address: Option<usize>,
    write_value: Option<Signal>,
}

impl DataMemory {
    /// A memory with every slot holding `config.empty_value`.
    pub fn new(name: impl Into<String>, address_width: u32, config: DataMemoryConfig) -> DevsimResult<Self> {
        config.validate()?;
        let memory = MemoryArray::filled(address_width, config.empty_value.clone())?;
        Self::build(name.into(), memory, config)
    }

    /// A memory preloaded with `content`, which must have `2^address_width` entries.
    pub fn with_content(
        name: impl Into<String>,
        address_width: u32,
        content: Vec<Signal>,
        config: DataMemoryConfig,
    ) -> DevsimResult<Self> {
        config.validate()?;
        let memory = MemoryArray::from_content(address_width, content)?;
        Self::build(name.into(), memory, config)
    }

    fn build(name: String, memory: MemoryArray, config: DataMemoryConfig) -> DevsimResult<Self> {
        let mut core = DeviceCore::new(name, DmState::Idle);
        core.add_output(OUTPUT, Signal::Zero)?;
        Ok(DataMemory {
            core,
            config,
            memory,
            address: None,
            write_value: None,
        })
    }

    pub fn config(&self) -> &DataMemoryConfig {
        &self.config
    }

    pub fn content(&self) -> &[Signal] {
        self.memory.slots()
    }

    /// The latched address, if one has been set.
    pub fn address(&self) -> Option<usize> {
        self.address
    }

    fn latched(&self, operation: &str) -> DevsimResult<usize> {
        self.address.ok_or_else(|| DevsimError::InvalidValue {
            device: self.core.name().to_string(),
            operation: operation.to_string(),
            value: Signal::Undefined,
            reason: "no address has been latched".to_string(),
        })
    }
}

impl Device for DataMemory {
    type State = DmState;
    type Input = DmInput;
    type Action = DmAction;

    fn core(&self) -> &DeviceCore<DmState, DmAction> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore<DmState, DmAction> {
        &mut self.core
    }

    fn on_input(&mut self, input: DmInput, value: Signal) -> DevsimResult<()> {
        match input {
            DmInput::Addr => {
                let address = self.memory.decode(self.core.name(), "inp_addr", &value)?;
                self.core
                    .transition("inp_addr", &[DmState::Idle], DmState::AddressChanging)?;
                self.address = Some(address);
                self.core
                    .act_after(DmAction::AddressSettled, self.config.t_address)
            }
            DmInput::Select => {
                self.core.ensure("inp_select", &[DmState::Idle])?;
                self.latched("inp_select")?;
                self.core
                    .transition("inp_select", &[DmState::Idle], DmState::Reading)?;
                self.core.out(OUTPUT, Signal::Undefined)?;
                self.core.act_after(DmAction::ReadDone, self.config.t_read)
            }
            DmInput::Write => {
                self.core
                    .transition("inp_write", &[DmState::ReadDone], DmState::Writing)?;
                self.write_value = Some(value);
                self.core.act_after(DmAction::WriteDone, self.config.t_write)
            }
            DmInput::Deselect => {
                self.core.transition(
                    "inp_deselect",
                    &[DmState::Idle, DmState::ReadDone, DmState::WriteDone],
                    DmState::Deselecting,
                )?;
                self.core
                    .act_after(DmAction::Deselected, self.config.t_deselect)
            }
        }
    }

    fn on_action(&mut self, action: DmAction) -> DevsimResult<()> {
        match action {
            DmAction::AddressSettled => self.core.transition(
                "act_address_settled",
                &[DmState::AddressChanging],
                DmState::Idle,
            ),
            DmAction::ReadDone => {
                self.core
                    .transition("act_read_done", &[DmState::Reading], DmState::ReadDone)?;
                let address = self.latched("act_read_done")?;
                let value = self.memory.read(address).clone();
                self.core.out(OUTPUT, value)
            }
            DmAction::WriteDone => {
                self.core
                    .transition("act_write_done", &[DmState::Writing], DmState::WriteDone)?;
                let address = self.latched("act_write_done")?;
                let value = self.write_value.take().unwrap_or_default();
                self.memory.write(address, value);
                Ok(())
            }
            DmAction::Deselected => {
                self.core
                    .transition("act_deselected", &[DmState::Deselecting], DmState::Idle)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_with_empty_value() {
        let dm = DataMemory::new("dm", 2, DataMemoryConfig::default()).unwrap();
        assert_eq!(dm.content(), vec![Signal::int(0); 4].as_slice());
        assert_eq!(dm.core().value(OUTPUT).unwrap(), &Signal::Zero);
        assert_eq!(dm.address(), None);
    }

    #[test]
    fn test_content_length_checked() {
        let err = DataMemory::with_content(
            "dm",
            3,
            vec![Signal::int(1); 5],
            DataMemoryConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DevsimError::Configuration { .. }));
    }

    #[test]
    fn test_negative_timing_rejected() {
        let config = DataMemoryConfig {
            t_write: -1.0,
            ..DataMemoryConfig::default()
        };
        let err = DataMemory::new("dm", 3, config).unwrap_err();
        assert_eq!(
            err,
            DevsimError::config("t_write", "expected a non-negative time, got -1")
        );
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_partial_config_document() {
        let config: DataMemoryConfig = serde_json::from_str(r#"{"t_read": 3.5}"#).unwrap();
        assert_eq!(config.t_read, 3.5);
        assert_eq!(config.t_write, 5.0);
        assert_eq!(config.empty_value, Signal::int(0));
    }
}

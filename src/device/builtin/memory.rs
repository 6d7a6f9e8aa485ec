//! Storage shared by the memory models: a fixed array of signals
//! addressed by a masked integer.

use crate::config::slot_count;
use crate::error::{DevsimError, DevsimResult};
use crate::signal::Signal;

/// `2^width` signal slots.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryArray {
    width: u32,
    slots: Vec<Signal>,
}

impl MemoryArray {
    /// Every slot holds `empty`.
    pub fn filled(width: u32, empty: Signal) -> DevsimResult<Self> {
        let n = slot_count(width)?;
        Ok(MemoryArray {
            width,
            slots: vec![empty; n],
        })
    }

    /// Use `content` as-is; its length must be exactly `2^width`.
    pub fn from_content(width: u32, content: Vec<Signal>) -> DevsimResult<Self> {
        let n = slot_count(width)?;
        if content.len() != n {
            return Err(DevsimError::config(
                "content",
                format!(
                    "{} slots supplied, address width {} needs {}",
                    content.len(),
                    width,
                    n
                ),
            ));
        }
        Ok(MemoryArray {
            width,
            slots: content,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Interpret `value` as an address, keeping only the low `width` bits.
    pub fn decode(&self, device: &str, operation: &str, value: &Signal) -> DevsimResult<usize> {
        let raw = value.as_int().ok_or_else(|| DevsimError::InvalidValue {
            device: device.to_string(),
            operation: operation.to_string(),
            value: value.clone(),
            reason: "address must be an integer".to_string(),
        })?;
        let mask = (1i64 << self.width) - 1;
        Ok((raw & mask) as usize)
    }

    /// Slot contents. `address` must come from [`MemoryArray::decode`].
    pub fn read(&self, address: usize) -> &Signal {
        &self.slots[address]
    }

    pub fn write(&mut self, address: usize, value: Signal) {
        self.slots[address] = value;
    }

    pub fn slots(&self) -> &[Signal] {
        &self.slots
    }
}

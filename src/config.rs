//! Validation helpers shared by device configuration structs.
//!
//! Each device type owns an immutable config struct whose `Default` holds
//! the declared timing defaults. Callers override fields with struct update
//! syntax (or a partial serde document under the `serialize` feature), and
//! the device constructor validates the merged result once.

use crate::error::{DevsimError, DevsimResult};

/// Widest memory address bus a device may declare.
pub const MAX_ADDRESS_WIDTH: u32 = 24;

/// A delay: finite and non-negative.
pub fn check_delay(field: &str, value: f64) -> DevsimResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DevsimError::config(
            field,
            format!("expected a non-negative time, got {}", value),
        ));
    }
    Ok(())
}

/// A repeat period: finite and strictly positive, so periodic actions
/// always make progress in time.
pub fn check_period(field: &str, value: f64) -> DevsimResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DevsimError::config(
            field,
            format!("expected a positive period, got {}", value),
        ));
    }
    Ok(())
}

/// Number of slots addressed by `width` address bits.
pub fn slot_count(width: u32) -> DevsimResult<usize> {
    if width > MAX_ADDRESS_WIDTH {
        return Err(DevsimError::config(
            "address_width",
            format!("{} exceeds the maximum of {}", width, MAX_ADDRESS_WIDTH),
        ));
    }
    Ok(1usize << width)
}

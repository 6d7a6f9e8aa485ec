//! `CpuClock`: cycles through N named phases, one phase per period.

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::config::check_period;
use crate::device::core::DeviceCore;
use crate::device::traits::Device;
use crate::error::{DevsimError, DevsimResult};
use crate::signal::Signal;
use crate::time::SimTime;

crate::name_set! {
    pub enum ClockState {
        Idle => "idle",
        Ticking => "ticking",
    }
}

crate::name_set! {
    pub enum ClockInput {
        Start => "start",
        Stop => "stop",
    }
}

crate::name_set! {
    pub enum ClockAction {
        DoTick => "do_tick",
    }
}

pub const OUT_PHASE_NUMBER: &str = "out_phase_number";
pub const OUT_PHASE_NAME: &str = "out_phase_name";
const STOPPED: &str = "<stopped>";

/// Timing and phase layout of a [`CpuClock`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ClockConfig {
    /// Time between consecutive ticks.
    pub t_period: f64,
    pub phase_names: Vec<String>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            t_period: 10.0,
            phase_names: ["P0_@PM", "P1_=IR", "P2_=K", "P3_@DM", "P4_adc_sto"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> DevsimResult<()> {
        check_period("t_period", self.t_period)?;
        if self.phase_names.is_empty() {
            return Err(DevsimError::config("phase_names", "a clock needs at least one phase"));
        }
        Ok(())
    }
}

/// Name of the decoded output for phase `i`.
pub fn phase_output(i: usize) -> String {
    format!("out_phase_{}", i)
}

/// A free-running phase clock.
///
/// `start` begins ticking at once with phase 0. Every tick publishes the
/// phase number and name, clears the previous phase's decoded output to
/// `Zero` and sets the current one to `1`, then schedules the next tick
/// one period later. `stop` returns to idle; the tick already in the
/// queue is recognized as stale and ignored.
#[derive(Debug, Clone)]
pub struct CpuClock {
    core: DeviceCore<ClockState, ClockAction>,
    config: ClockConfig,
    /// Phase emitted by the next tick.
    next_phase: usize,
    /// Decoded output currently high, if any.
    lit: Option<usize>,
    /// Due time of the only tick that is still live.
    scheduled_tick: Option<SimTime>,
    ticks: u64,
}

impl CpuClock {
    pub fn new(name: impl Into<String>, config: ClockConfig) -> DevsimResult<Self> {
        config.validate()?;
        let mut core = DeviceCore::new(name, ClockState::Idle);
        core.add_output(OUT_PHASE_NUMBER, Signal::int(-1))?;
        core.add_output(OUT_PHASE_NAME, Signal::text(STOPPED))?;
        for i in 0..config.phase_names.len() {
            core.add_output(phase_output(i), Signal::Zero)?;
        }
        Ok(CpuClock {
            core,
            config,
            next_phase: 0,
            lit: None,
            scheduled_tick: None,
            ticks: 0,
        })
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn phase_count(&self) -> usize {
        self.config.phase_names.len()
    }

    /// Number of ticks emitted so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn schedule_tick(&mut self, at: SimTime) -> DevsimResult<()> {
        self.core.act(ClockAction::DoTick, at)?;
        self.scheduled_tick = Some(at);
        Ok(())
    }

    fn tick(&mut self) -> DevsimResult<()> {
        let now = self.core.now();
        if self.core.state() != ClockState::Ticking || self.scheduled_tick != Some(now) {
            tracing::debug!(device = %self.core.name(), %now, "ignoring stale tick");
            return Ok(());
        }

        let next = now.plus(self.config.t_period)?;
        let phase = self.next_phase;
        self.core.out(OUT_PHASE_NUMBER, Signal::int(phase as i64))?;
        self.core
            .out(OUT_PHASE_NAME, Signal::text(self.config.phase_names[phase].as_str()))?;
        if let Some(prev) = self.lit {
            self.core.out(&phase_output(prev), Signal::Zero)?;
        }
        self.core.out(&phase_output(phase), Signal::int(1))?;
        self.lit = Some(phase);
        self.next_phase = (phase + 1) % self.phase_count();
        self.ticks += 1;
        self.schedule_tick(next)
    }
}

impl Device for CpuClock {
    type State = ClockState;
    type Input = ClockInput;
    type Action = ClockAction;

    fn core(&self) -> &DeviceCore<ClockState, ClockAction> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore<ClockState, ClockAction> {
        &mut self.core
    }

    fn on_input(&mut self, input: ClockInput, _value: Signal) -> DevsimResult<()> {
        match input {
            ClockInput::Start => {
                self.core
                    .transition("start", &[ClockState::Idle], ClockState::Ticking)?;
                self.next_phase = 0;
                let now = self.core.now();
                self.schedule_tick(now)
            }
            ClockInput::Stop => {
                self.core
                    .transition("stop", &[ClockState::Ticking], ClockState::Idle)?;
                self.scheduled_tick = None;
                self.core.out(OUT_PHASE_NUMBER, Signal::int(-1))?;
                self.core.out(OUT_PHASE_NAME, Signal::text(STOPPED))?;
                if let Some(prev) = self.lit.take() {
                    self.core.out(&phase_output(prev), Signal::Zero)?;
                }
                Ok(())
            }
        }
    }

    fn on_action(&mut self, action: ClockAction) -> DevsimResult<()> {
        match action {
            ClockAction::DoTick => self.tick(),
        }
    }
}

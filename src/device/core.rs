//! `DeviceCore`: the state machine, output registry and effect buffer
//! every device embeds.
//!
//! The current state is private to this module. Device handlers can only
//! change it through [`DeviceCore::transition`], which validates the state
//! being left.

use std::collections::BTreeMap;

use crate::error::{DevsimError, DevsimResult};
use crate::names::NameSet;
use crate::signal::Signal;
use crate::time::SimTime;
use crate::trace::{Subscriptions, TraceKind, TraceRecord};

// ── Output ────────────────────────────────────────────────────────────

/// A named, timestamped signal owned by one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    name: String,
    value: Signal,
    updated: SimTime,
    /// Every value this output has held, starting with its initial value.
    history: Vec<(SimTime, Signal)>,
}

impl Output {
    fn new(name: String, initial: Signal, at: SimTime) -> Self {
        Output {
            name,
            value: initial.clone(),
            updated: at,
            history: vec![(at, initial)],
        }
    }

    fn update(&mut self, at: SimTime, value: Signal) -> DevsimResult<()> {
        if at.is_before(self.updated) {
            return Err(DevsimError::Scheduling {
                requested: at,
                current: self.updated,
            });
        }
        self.value = value.clone();
        self.updated = at;
        self.history.push((at, value));
        Ok(())
    }

    /// Drop every update after the first `len` history entries.
    fn restore(&mut self, len: usize) {
        self.history.truncate(len);
        if let Some((at, value)) = self.history.last() {
            self.value = value.clone();
            self.updated = *at;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Signal {
        &self.value
    }

    /// Time of the last update.
    pub fn updated(&self) -> SimTime {
        self.updated
    }

    pub fn history(&self) -> &[(SimTime, Signal)] {
        &self.history
    }

    /// The value in effect at time `t`: the last update at or before `t`.
    ///
    /// Several updates at the same instant resolve to the latest one.
    pub fn value_at(&self, t: SimTime) -> Option<&Signal> {
        self.history
            .iter()
            .rev()
            .find(|(at, _)| *at <= t)
            .map(|(_, v)| v)
    }
}

// ── DeviceCore ────────────────────────────────────────────────────────

/// Shared machinery for a device with states `S` and actions `A`.
///
/// Scheduled actions and trace records produced while a handler runs are
/// buffered here. The registry collects them only once the handler has
/// returned `Ok`. A failing handler is rolled back instead: its buffer is
/// thrown away and the state and outputs return to what they were when the
/// event was dispatched, so nothing it did is visible and nothing goes
/// unreported.
#[derive(Debug, Clone)]
pub struct DeviceCore<S, A> {
    name: String,
    state: S,
    outputs: BTreeMap<String, Output>,
    subscriptions: Subscriptions,
    now: SimTime,
    pending: Vec<(SimTime, A)>,
    records: Vec<TraceRecord>,
    /// State at the start of the current handler.
    saved_state: S,
    /// History length of each output the current handler has written.
    touched: Vec<(String, usize)>,
}

impl<S: NameSet, A: NameSet> DeviceCore<S, A> {
    pub fn new(name: impl Into<String>, initial: S) -> Self {
        DeviceCore {
            name: name.into(),
            state: initial,
            outputs: BTreeMap::new(),
            subscriptions: Subscriptions::new(),
            now: SimTime::ZERO,
            pending: Vec::new(),
            records: Vec::new(),
            saved_state: initial,
            touched: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> S {
        self.state
    }

    /// Time of the event currently (or most recently) being handled.
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn in_state(&self, allowed: &[S]) -> bool {
        allowed.contains(&self.state)
    }

    // ── Outputs ───────────────────────────────────────────────

    /// Register an output holding `initial`.
    pub fn add_output(&mut self, name: impl Into<String>, initial: Signal) -> DevsimResult<()> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(DevsimError::DuplicateName {
                scope: self.name.clone(),
                name,
            });
        }
        let output = Output::new(name.clone(), initial, self.now);
        self.outputs.insert(name, output);
        Ok(())
    }

    /// Set output `name` to `value` at the current time.
    pub fn out(&mut self, name: &str, value: Signal) -> DevsimResult<()> {
        let now = self.now;
        let output = self
            .outputs
            .get_mut(name)
            .ok_or_else(|| DevsimError::UnknownOutput {
                device: self.name.clone(),
                name: name.to_string(),
            })?;
        if !self.touched.iter().any(|(n, _)| n == name) {
            self.touched.push((name.to_string(), output.history.len()));
        }
        output.update(now, value.clone())?;
        self.records.push(TraceRecord {
            time: now,
            device: self.name.clone(),
            kind: TraceKind::Output,
            item: name.to_string(),
            value: Some(value),
        });
        Ok(())
    }

    pub fn output(&self, name: &str) -> DevsimResult<&Output> {
        self.outputs.get(name).ok_or_else(|| DevsimError::UnknownOutput {
            device: self.name.clone(),
            name: name.to_string(),
        })
    }

    /// Current value of output `name`.
    pub fn value(&self, name: &str) -> DevsimResult<&Signal> {
        self.output(name).map(Output::value)
    }

    /// All outputs, ordered by name.
    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    // ── Actions ───────────────────────────────────────────────

    /// Schedule `action` on this device at time `at`.
    pub fn act(&mut self, action: A, at: SimTime) -> DevsimResult<()> {
        if at.is_before(self.now) {
            return Err(DevsimError::Scheduling {
                requested: at,
                current: self.now,
            });
        }
        self.pending.push((at, action));
        Ok(())
    }

    /// Schedule `action` `delay` time units from now.
    pub fn act_after(&mut self, action: A, delay: f64) -> DevsimResult<()> {
        let at = self.now.plus(delay)?;
        self.act(action, at)
    }

    /// Schedule an action given by name.
    pub fn act_named(&mut self, action: &str, at: SimTime) -> DevsimResult<()> {
        let resolved = A::from_name(action).ok_or_else(|| DevsimError::UnknownAction {
            device: self.name.clone(),
            name: action.to_string(),
        })?;
        self.act(resolved, at)
    }

    // ── State machine ─────────────────────────────────────────

    /// Fail unless the current state is one of `allowed`.
    pub fn ensure(&self, operation: &str, allowed: &[S]) -> DevsimResult<()> {
        if self.in_state(allowed) {
            return Ok(());
        }
        Err(DevsimError::InvalidState {
            device: self.name.clone(),
            operation: operation.to_string(),
            current: self.state.name().to_string(),
            allowed: allowed.iter().map(|s| s.name().to_string()).collect(),
        })
    }

    /// Move to `to` if the current state is one of `allowed`.
    ///
    /// On failure the state is left unchanged.
    pub fn transition(&mut self, operation: &str, allowed: &[S], to: S) -> DevsimResult<()> {
        self.ensure(operation, allowed)?;
        tracing::trace!(
            device = %self.name,
            operation,
            from = self.state.name(),
            to = to.name(),
            "transition"
        );
        self.state = to;
        Ok(())
    }

    /// [`transition`](Self::transition) with states given by name.
    ///
    /// Any name the device does not declare is an `InvalidState` error.
    pub fn transition_named(&mut self, operation: &str, allowed: &[&str], to: &str) -> DevsimResult<()> {
        let undeclared = || DevsimError::InvalidState {
            device: self.name.clone(),
            operation: operation.to_string(),
            current: self.state.name().to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        };
        let resolved = allowed
            .iter()
            .map(|name| S::from_name(name))
            .collect::<Option<Vec<S>>>()
            .ok_or_else(undeclared)?;
        let to = S::from_name(to).ok_or_else(undeclared)?;
        self.transition(operation, &resolved, to)
    }

    // ── Tracing ───────────────────────────────────────────────

    /// Report this device's outputs, inputs and actions matching `pattern`.
    pub fn trace(&mut self, pattern: &str) {
        self.subscriptions.subscribe(pattern);
    }

    pub fn untrace(&mut self, pattern: &str) -> bool {
        self.subscriptions.unsubscribe(pattern)
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    // ── Dispatch plumbing ─────────────────────────────────────

    pub(crate) fn begin(&mut self, now: SimTime) {
        self.now = self.now.latest(now);
        self.pending.clear();
        self.records.clear();
        self.saved_state = self.state;
        self.touched.clear();
    }

    /// Undo everything since [`begin`](Self::begin).
    pub(crate) fn rollback(&mut self) {
        if self.state != self.saved_state {
            tracing::trace!(
                device = %self.name,
                from = self.state.name(),
                to = self.saved_state.name(),
                "rollback"
            );
        }
        self.state = self.saved_state;
        for (name, len) in self.touched.drain(..) {
            if let Some(output) = self.outputs.get_mut(&name) {
                output.restore(len);
            }
        }
        self.pending.clear();
        self.records.clear();
    }

    pub(crate) fn fired(&mut self, kind: TraceKind, item: &str, value: Option<Signal>) {
        self.records.push(TraceRecord {
            time: self.now,
            device: self.name.clone(),
            kind,
            item: item.to_string(),
            value,
        });
    }

    pub(crate) fn take_effects(&mut self) -> (Vec<(SimTime, A)>, Vec<TraceRecord>) {
        self.touched.clear();
        (
            std::mem::take(&mut self.pending),
            std::mem::take(&mut self.records),
        )
    }
}

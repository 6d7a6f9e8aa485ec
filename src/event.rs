//! Event records for the device simulation kernel.
//!
//! An `Event` names *what* should run and *when*: a due time, a target
//! (device id + input or action index) and an optional signal payload.
//! Events carry no reference to the device itself, only enough to find
//! and invoke the handler at dispatch time.

use std::cmp::Ordering;

use crate::device::{Device, DeviceHandle, DeviceId};
use crate::error::DevsimResult;
use crate::names::NameSet;
use crate::signal::Signal;
use crate::time::SimTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// A strictly-increasing enqueue sequence number.
///
/// Two events due at the same `SimTime` are dispatched in `EventId`
/// order, which is enqueue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

// ── Event ID Generator ───────────────────────────────────────────────

/// Deterministic, strictly-increasing event-ID generator.
///
/// Each scheduler owns exactly one. The simulation is single-threaded, so
/// the counter is trivially deterministic.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next event ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the next ID without consuming it.
    #[cfg(test)]
    pub(crate) fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Target ────────────────────────────────────────────────────────────

/// Which handler of a device an event invokes.
///
/// The index is the handler's position in the device type's
/// [`NameSet::ALL`] list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum HandlerRef {
    Input(usize),
    Action(usize),
}

/// The device and handler an event is addressed to.
///
/// Targets are read-only outside the crate. Input targets come from
/// [`Event::input`], [`Event::pulse`] or
/// [`DeviceRegistry::input_named`](crate::DeviceRegistry::input_named);
/// action targets only from a device's own [`DeviceCore::act`](crate::DeviceCore::act).
///
/// ```compile_fail
/// use devsim::{DeviceId, HandlerRef, Target};
///
/// let forged = Target { device: DeviceId::new(0), handler: HandlerRef::Action(1) };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Target {
    pub(crate) device: DeviceId,
    pub(crate) handler: HandlerRef,
}

impl Target {
    pub(crate) fn input(device: DeviceId, input: usize) -> Self {
        Target {
            device,
            handler: HandlerRef::Input(input),
        }
    }

    pub(crate) fn action(device: DeviceId, action: usize) -> Self {
        Target {
            device,
            handler: HandlerRef::Action(action),
        }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn handler(&self) -> HandlerRef {
        self.handler
    }

    pub fn is_action(&self) -> bool {
        matches!(self.handler, HandlerRef::Action(_))
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.handler {
            HandlerRef::Input(i) => write!(f, "{}.in#{}", self.device, i),
            HandlerRef::Action(i) => write!(f, "{}.act#{}", self.device, i),
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────

/// A scheduled handler invocation.
///
/// Events are built through [`Event::input`] and [`Event::pulse`]; there is
/// no public constructor taking an arbitrary [`Target`].
///
/// ```compile_fail
/// use devsim::{Event, SimTime};
///
/// fn forge(event: &Event) -> Event {
///     Event::new(SimTime::ZERO, event.target(), None)
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Event {
    /// The simulated time at which this event should be dispatched.
    pub(crate) due: SimTime,
    pub(crate) target: Target,
    pub(crate) payload: Option<Signal>,
}

impl Event {
    pub(crate) fn new(due: SimTime, target: Target, payload: Option<Signal>) -> Self {
        Event {
            due,
            target,
            payload,
        }
    }

    /// Build an event that drives `input` of the device behind `handle`
    /// at time `at` with `value`.
    pub fn input<D: Device>(
        at: f64,
        handle: DeviceHandle<D>,
        input: D::Input,
        value: impl Into<Signal>,
    ) -> DevsimResult<Event> {
        Ok(Event::new(
            SimTime::new(at)?,
            Target::input(handle.id(), input.index()),
            Some(value.into()),
        ))
    }

    /// Like [`Event::input`] but with no payload.
    pub fn pulse<D: Device>(at: f64, handle: DeviceHandle<D>, input: D::Input) -> DevsimResult<Event> {
        Ok(Event::new(
            SimTime::new(at)?,
            Target::input(handle.id(), input.index()),
            None,
        ))
    }

    pub(crate) fn action(due: SimTime, device: DeviceId, action: usize) -> Event {
        Event::new(due, Target::action(device, action), None)
    }

    pub fn due(&self) -> SimTime {
        self.due
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn payload(&self) -> Option<&Signal> {
        self.payload.as_ref()
    }
}

// ── Scheduled ─────────────────────────────────────────────────────────

/// An event that has been accepted by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled {
    pub(crate) id: EventId,
    pub(crate) event: Event,
}

impl Scheduled {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn event(&self) -> &Event {
        &self.event
    }
}

impl Eq for Scheduled {}

/// Ordering: smallest `(due, id)` first.
///
/// `BinaryHeap` is a max-heap, so the natural ordering is reversed here.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .due
            .cmp(&self.event.due)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

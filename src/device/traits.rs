//! The `Device` trait and its type-erased counterpart `AnyDevice`.

use std::any::Any;

use crate::error::{DevsimError, DevsimResult};
use crate::event::HandlerRef;
use crate::names::NameSet;
use crate::signal::Signal;
use crate::time::SimTime;
use crate::trace::{Subscriptions, TraceKind, TraceRecord};

use super::core::{DeviceCore, Output};

// ── Device ────────────────────────────────────────────────────────────

/// Trait implemented by every simulated device.
///
/// A device declares closed sets of states, inputs and actions and embeds
/// a [`DeviceCore`] holding its state and outputs. Inputs are driven by
/// events built outside the device; actions are only ever scheduled by the
/// device itself through [`DeviceCore::act`].
///
/// # Contract
///
/// Handlers **must**:
/// - Change state only through [`DeviceCore::transition`].
/// - Validate before touching fields of their own. A handler that returns
///   `Err` has its state, outputs, actions and trace records rolled back
///   by the core, but the core cannot see the device's private fields.
/// - Be deterministic for equal inputs.
///
/// Once a device is added to a [`DeviceRegistry`](crate::DeviceRegistry)
/// it is only reachable as `&D`, so handlers run only when the event queue
/// dispatches to them.
///
/// # Example
///
/// ```rust
/// use devsim::{name_set, Device, DeviceCore, DevsimResult, Signal};
///
/// name_set! { pub enum LatchState { Open => "open", Held => "held" } }
/// name_set! { pub enum LatchInput { Hold => "hold" } }
/// name_set! { pub enum LatchAction { Release => "release" } }
///
/// struct Latch { core: DeviceCore<LatchState, LatchAction> }
///
/// impl Device for Latch {
///     type State = LatchState;
///     type Input = LatchInput;
///     type Action = LatchAction;
///
///     fn core(&self) -> &DeviceCore<LatchState, LatchAction> { &self.core }
///     fn core_mut(&mut self) -> &mut DeviceCore<LatchState, LatchAction> { &mut self.core }
///
///     fn on_input(&mut self, _input: LatchInput, value: Signal) -> DevsimResult<()> {
///         self.core.transition("hold", &[LatchState::Open], LatchState::Held)?;
///         self.core.out("q", value)?;
///         self.core.act_after(LatchAction::Release, 3.0)
///     }
///
///     fn on_action(&mut self, _action: LatchAction) -> DevsimResult<()> {
///         self.core.transition("release", &[LatchState::Held], LatchState::Open)?;
///         self.core.out("q", Signal::Zero)
///     }
/// }
/// ```
pub trait Device: 'static {
    type State: NameSet;
    type Input: NameSet;
    type Action: NameSet;

    fn core(&self) -> &DeviceCore<Self::State, Self::Action>;
    fn core_mut(&mut self) -> &mut DeviceCore<Self::State, Self::Action>;

    /// React to an externally scheduled input.
    fn on_input(&mut self, input: Self::Input, value: Signal) -> DevsimResult<()>;

    /// React to one of this device's own scheduled actions.
    fn on_action(&mut self, action: Self::Action) -> DevsimResult<()>;
}

// ── AnyDevice ─────────────────────────────────────────────────────────

/// What a successful handler left behind: actions to enqueue (by index)
/// and trace records to publish.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Effects {
    pub(crate) actions: Vec<(SimTime, usize)>,
    pub(crate) records: Vec<TraceRecord>,
}

/// Read-only, object-safe view of a [`Device`], implemented for every
/// device type.
///
/// Lets heterogeneous devices be inspected by name without knowing their
/// concrete types.
pub trait AnyDevice {
    fn name(&self) -> &str;
    fn state_name(&self) -> &'static str;
    /// Name of an input or action, `None` if the index is out of range.
    fn handler_name(&self, handler: HandlerRef) -> Option<&'static str>;
    fn input_index(&self, name: &str) -> Option<usize>;
    fn output(&self, name: &str) -> DevsimResult<&Output>;
    /// Registered output names, sorted.
    fn output_names(&self) -> Vec<String>;
    fn subscriptions(&self) -> &Subscriptions;
    fn as_any(&self) -> &dyn Any;
}

/// The mutable half of a type-erased device, which only the registry
/// holds: running handlers and changing subscriptions.
pub(crate) trait DeviceSlot: AnyDevice {
    fn view(&self) -> &dyn AnyDevice;
    fn subscribe(&mut self, pattern: &str);
    fn unsubscribe(&mut self, pattern: &str) -> bool;

    /// Run one handler at `now` and collect its effects.
    ///
    /// On error the device is rolled back to where it was before the call.
    fn invoke(&mut self, now: SimTime, handler: HandlerRef, payload: Option<Signal>) -> DevsimResult<Effects>;
}

impl<D: Device> AnyDevice for D {
    fn name(&self) -> &str {
        self.core().name()
    }

    fn state_name(&self) -> &'static str {
        self.core().state().name()
    }

    fn handler_name(&self, handler: HandlerRef) -> Option<&'static str> {
        match handler {
            HandlerRef::Input(i) => D::Input::from_index(i).map(NameSet::name),
            HandlerRef::Action(i) => D::Action::from_index(i).map(NameSet::name),
        }
    }

    fn input_index(&self, name: &str) -> Option<usize> {
        D::Input::from_name(name).map(NameSet::index)
    }

    fn output(&self, name: &str) -> DevsimResult<&Output> {
        self.core().output(name)
    }

    fn output_names(&self) -> Vec<String> {
        self.core().outputs().map(|o| o.name().to_string()).collect()
    }

    fn subscriptions(&self) -> &Subscriptions {
        self.core().subscriptions()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<D: Device> DeviceSlot for D {
    fn view(&self) -> &dyn AnyDevice {
        self
    }

    fn subscribe(&mut self, pattern: &str) {
        self.core_mut().trace(pattern);
    }

    fn unsubscribe(&mut self, pattern: &str) -> bool {
        self.core_mut().untrace(pattern)
    }

    fn invoke(&mut self, now: SimTime, handler: HandlerRef, payload: Option<Signal>) -> DevsimResult<Effects> {
        self.core_mut().begin(now);
        let result = match handler {
            HandlerRef::Input(i) => match D::Input::from_index(i) {
                Some(input) => {
                    self.core_mut()
                        .fired(TraceKind::Input, input.name(), payload.clone());
                    self.on_input(input, payload.unwrap_or_default())
                }
                None => Err(DevsimError::UnknownInput {
                    device: self.core().name().to_string(),
                    name: format!("#{}", i),
                }),
            },
            HandlerRef::Action(i) => match D::Action::from_index(i) {
                Some(action) => {
                    self.core_mut().fired(TraceKind::Action, action.name(), None);
                    self.on_action(action)
                }
                None => Err(DevsimError::UnknownAction {
                    device: self.core().name().to_string(),
                    name: format!("#{}", i),
                }),
            },
        };

        if let Err(err) = result {
            self.core_mut().rollback();
            return Err(err);
        }
        let (pending, records) = self.core_mut().take_effects();
        Ok(Effects {
            actions: pending
                .into_iter()
                .map(|(at, action)| (at, action.index()))
                .collect(),
            records,
        })
    }
}

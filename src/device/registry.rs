//! `DeviceRegistry`: owns all devices and dispatches events to them.

use std::collections::BTreeMap;

use crate::error::{DevsimError, DevsimResult};
use crate::event::{Event, HandlerRef, Target};
use crate::queue::Dispatch;
use crate::signal::Signal;
use crate::time::SimTime;
use crate::trace::Tracer;

use super::core::Output;
use super::id::{DeviceHandle, DeviceId};
use super::traits::{AnyDevice, Device, DeviceSlot};

/// Owns a set of heterogeneous devices and the tracer they report to.
///
/// Implements [`Dispatch`], so it can be passed directly to
/// [`EventQueue::run`](crate::queue::EventQueue::run). Registered devices
/// are only handed out by shared reference.
///
/// ```compile_fail
/// use devsim::device::builtin::{ProgramMemory, ProgramMemoryConfig};
/// use devsim::DeviceRegistry;
///
/// let mut registry = DeviceRegistry::new();
/// let pm = registry
///     .add(ProgramMemory::new("pm", 2, ProgramMemoryConfig::default()).unwrap())
///     .unwrap();
/// let _ = registry.get_mut(pm);
/// ```
pub struct DeviceRegistry {
    devices: Vec<Box<dyn DeviceSlot>>,
    names: BTreeMap<String, DeviceId>,
    tracer: Tracer,
    /// Actions scheduled by devices and not yet dispatched, keyed by
    /// `(target, due)`.
    issued: BTreeMap<(DeviceId, usize, SimTime), u32>,
}

impl DeviceRegistry {
    /// A registry whose tracer logs through `tracing`.
    pub fn new() -> Self {
        Self::with_tracer(Tracer::new())
    }

    pub fn with_tracer(tracer: Tracer) -> Self {
        DeviceRegistry {
            devices: Vec::new(),
            names: BTreeMap::new(),
            tracer,
            issued: BTreeMap::new(),
        }
    }

    /// Register a device. Device names must be unique.
    pub fn add<D: Device>(&mut self, device: D) -> DevsimResult<DeviceHandle<D>> {
        let name = device.core().name().to_string();
        if self.names.contains_key(&name) {
            return Err(DevsimError::DuplicateName {
                scope: "registry".to_string(),
                name,
            });
        }
        let id = DeviceId::new(self.devices.len());
        self.names.insert(name, id);
        self.devices.push(Box::new(device));
        Ok(DeviceHandle::new(id))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Look up a device id by device name.
    pub fn lookup(&self, name: &str) -> Option<DeviceId> {
        self.names.get(name).copied()
    }

    /// Borrow a device without knowing its type.
    pub fn device(&self, id: DeviceId) -> DevsimResult<&dyn AnyDevice> {
        self.devices
            .get(id.index())
            .map(|d| d.view())
            .ok_or(DevsimError::UnknownDevice(id))
    }

    fn device_mut(&mut self, id: DeviceId) -> DevsimResult<&mut Box<dyn DeviceSlot>> {
        self.devices
            .get_mut(id.index())
            .ok_or(DevsimError::UnknownDevice(id))
    }

    /// Every device, in registration order.
    pub fn devices(&self) -> impl Iterator<Item = &dyn AnyDevice> {
        self.devices.iter().map(|d| d.view())
    }

    /// Borrow a device through its typed handle.
    pub fn get<D: Device>(&self, handle: DeviceHandle<D>) -> DevsimResult<&D> {
        self.devices
            .get(handle.id().index())
            .and_then(|d| d.as_any().downcast_ref::<D>())
            .ok_or(DevsimError::UnknownDevice(handle.id()))
    }

    /// Output `name` of device `id`.
    pub fn output(&self, id: DeviceId, name: &str) -> DevsimResult<&Output> {
        self.device(id)?.output(name)
    }

    // ── Tracing ───────────────────────────────────────────────

    /// Subscribe to `pattern` on one device.
    pub fn trace(&mut self, id: DeviceId, pattern: &str) -> DevsimResult<()> {
        self.device_mut(id)?.subscribe(pattern);
        Ok(())
    }

    pub fn untrace(&mut self, id: DeviceId, pattern: &str) -> DevsimResult<bool> {
        Ok(self.device_mut(id)?.unsubscribe(pattern))
    }

    /// Subscribe to `pattern` on every device.
    pub fn trace_all(&mut self, pattern: &str) {
        self.tracer.subscribe(pattern);
    }

    pub fn untrace_all(&mut self, pattern: &str) -> bool {
        self.tracer.unsubscribe(pattern)
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut Tracer {
        &mut self.tracer
    }

    // ── Event construction by name ────────────────────────────

    /// Build an input event from device and input names.
    ///
    /// For setup code that only has names at hand (scenario files, the
    /// command line). Typed code should prefer [`Event::input`].
    pub fn input_named(
        &self,
        at: f64,
        device: &str,
        input: &str,
        value: Option<Signal>,
    ) -> DevsimResult<Event> {
        let id = self
            .lookup(device)
            .ok_or_else(|| DevsimError::UnknownDeviceName(device.to_string()))?;
        let index = self
            .device(id)?
            .input_index(input)
            .ok_or_else(|| DevsimError::UnknownInput {
                device: device.to_string(),
                name: input.to_string(),
            })?;
        Ok(Event::new(SimTime::new(at)?, Target::input(id, index), value))
    }

    /// Consume one outstanding action issued to device `id` for `due`.
    fn redeem(&mut self, id: DeviceId, action: usize, due: SimTime) -> Option<()> {
        let key = (id, action, due);
        let count = self.issued.get_mut(&key)?;
        *count -= 1;
        if *count == 0 {
            self.issued.remove(&key);
        }
        Some(())
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.names)
            .field("tracer", &self.tracer)
            .field("issued", &self.issued.len())
            .finish()
    }
}

impl Dispatch for DeviceRegistry {
    fn dispatch(&mut self, now: SimTime, event: &Event) -> DevsimResult<Vec<Event>> {
        let id = event.target.device;
        if let HandlerRef::Action(action) = event.target.handler {
            self.redeem(id, action, event.due)
                .ok_or(DevsimError::ExternalAction {
                    target: event.target,
                })?;
        }
        let device = self
            .devices
            .get_mut(id.index())
            .ok_or(DevsimError::UnknownDevice(id))?;

        let effects = device.invoke(now, event.target.handler, event.payload.clone())?;
        for record in effects.records {
            self.tracer.publish(record, device.subscriptions());
        }

        Ok(effects
            .actions
            .into_iter()
            .map(|(at, action)| {
                *self.issued.entry((id, action, at)).or_insert(0) += 1;
                Event::action(at, id, action)
            })
            .collect())
    }

    fn describe(&self, event: &Event) -> String {
        let target = event.target;
        match self.devices.get(target.device.index()) {
            Some(device) => format!(
                "{}.{}",
                device.name(),
                device.handler_name(target.handler).unwrap_or("?")
            ),
            None => target.to_string(),
        }
    }
}

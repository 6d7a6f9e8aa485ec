//! Step-by-step simulation API for external interfaces.
//!
//! Pairs an [`EventQueue`] with the [`DeviceRegistry`] it drives and
//! exposes stepping, inspection and JSON export. This is what the CLI and
//! the WASM binding are built on.

use crate::device::DeviceRegistry;
use crate::error::DevsimResult;
use crate::queue::{Dispatch, EventQueue};
use crate::signal::Signal;

// ── StepResult ────────────────────────────────────────────────────────

/// Result of a single simulation step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct StepResult {
    /// The event that was dispatched.
    pub event_id: u64,
    /// Simulated time of the event.
    pub time: f64,
    /// Target handler, e.g. `pm8.inp_read`.
    pub description: String,
    /// Total events processed so far.
    pub total_events: u64,
}

/// Current state and outputs of one device.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceSnapshot {
    pub name: String,
    pub state: String,
    pub outputs: Vec<(String, Signal)>,
}

// ── SimulationApi ─────────────────────────────────────────────────────

/// A queue and its devices, driven together.
#[derive(Debug)]
pub struct SimulationApi {
    queue: EventQueue,
    registry: DeviceRegistry,
}

impl SimulationApi {
    pub fn new(queue: EventQueue, registry: DeviceRegistry) -> Self {
        SimulationApi { queue, registry }
    }

    /// Dispatch one event. Returns `None` once the queue is empty.
    pub fn step(&mut self) -> DevsimResult<Option<StepResult>> {
        let Some(next) = self.queue.step_one(&mut self.registry)? else {
            return Ok(None);
        };
        Ok(Some(StepResult {
            event_id: next.id.raw(),
            time: next.event.due.as_f64(),
            description: self.registry.describe(&next.event),
            total_events: self.queue.events_processed(),
        }))
    }

    /// Run to completion. Returns the number of events processed.
    pub fn run(&mut self) -> DevsimResult<u64> {
        self.queue.run(&mut self.registry)
    }

    /// Run up to `n` steps. Returns the number actually processed.
    pub fn run_steps(&mut self, n: u64) -> DevsimResult<u64> {
        self.queue.step(n, &mut self.registry)
    }

    /// Run every event due at or before `t`.
    pub fn until(&mut self, t: f64) -> DevsimResult<u64> {
        self.queue.until(t, &mut self.registry)
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn current_time(&self) -> f64 {
        self.queue.now().as_f64()
    }

    pub fn events_processed(&self) -> u64 {
        self.queue.events_processed()
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.queue.set_verbose(verbose);
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.registry
    }

    /// Delivered trace records as display lines.
    pub fn trace_lines(&self) -> Vec<String> {
        self.registry.tracer().lines()
    }

    pub fn fingerprint(&self) -> u64 {
        self.registry.tracer().fingerprint()
    }

    /// State and outputs of every device, in registration order.
    pub fn snapshot(&self) -> Vec<DeviceSnapshot> {
        self.registry
            .devices()
            .map(|device| DeviceSnapshot {
                name: device.name().to_string(),
                state: device.state_name().to_string(),
                outputs: device
                    .output_names()
                    .into_iter()
                    .filter_map(|name| {
                        device
                            .output(&name)
                            .ok()
                            .map(|o| (name.clone(), o.value().clone()))
                    })
                    .collect(),
            })
            .collect()
    }

    // ── JSON Export ───────────────────────────────────────────

    /// Export the device snapshot as a JSON string.
    #[cfg(feature = "serialize")]
    pub fn state_json(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|_| "[]".into())
    }

    /// Export the delivered trace records as a JSON array string.
    #[cfg(feature = "serialize")]
    pub fn trace_json(&self) -> String {
        serde_json::to_string_pretty(self.registry.tracer().records())
            .unwrap_or_else(|_| "[]".into())
    }
}

#[cfg(test)]
mod tests {
    use crate::scenario::ScenarioId;
    use crate::trace::Tracer;

    #[test]
    fn test_step_reports_dispatched_event() {
        let mut api = ScenarioId::ProgramMemory.build(Tracer::silent()).unwrap();

        let first = api.step().unwrap().unwrap();
        assert_eq!(first.time, 1.0);
        assert_eq!(first.description, "pm8.inp_addr");
        assert_eq!(first.total_events, 1);

        let second = api.step().unwrap().unwrap();
        assert_eq!(second.description, "pm8.act_addressed");
        assert_eq!(second.time, 2.0);
    }

    #[test]
    fn test_run_to_completion() {
        let mut api = ScenarioId::ProgramMemory.build(Tracer::silent()).unwrap();
        // Five inputs, each followed by one action.
        assert_eq!(api.run().unwrap(), 10);
        assert!(api.is_finished());
        assert!(api.step().unwrap().is_none());
        assert_eq!(api.current_time(), 27.0);
    }

    #[test]
    fn test_snapshot() {
        let mut api = ScenarioId::ProgramMemory.build(Tracer::silent()).unwrap();
        api.run().unwrap();
        let snapshot = api.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "pm8");
        assert_eq!(snapshot[0].state, "read_ready");
        assert_eq!(
            snapshot[0].outputs,
            vec![("output".to_string(), crate::signal::Signal::text("five"))]
        );
    }

    #[test]
    fn test_run_steps_stops_short() {
        let mut api = ScenarioId::Clock.build(Tracer::silent()).unwrap();
        assert_eq!(api.run_steps(4).unwrap(), 4);
        assert_eq!(api.events_processed(), 4);
        assert!(!api.is_finished());
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_trace_json_is_an_array() {
        let mut api = ScenarioId::ProgramMemory.build(Tracer::silent()).unwrap();
        api.run().unwrap();
        let value: serde_json::Value = serde_json::from_str(&api.trace_json()).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), api.trace_lines().len());
        assert_eq!(records[0]["item"], "inp_addr");
    }
}

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::api::SimulationApi;
use crate::scenario::ScenarioId;
use crate::trace::Tracer;

/// WASM binding for the simulation API.
///
/// Exposes a reference scenario to JavaScript one step at a time.
#[wasm_bindgen]
pub struct Simulator {
    api: SimulationApi,
}

#[wasm_bindgen]
impl Simulator {
    /// Create a simulator for the named scenario (default: program-memory).
    #[wasm_bindgen(constructor)]
    pub fn new(scenario: Option<String>) -> Result<Simulator, JsValue> {
        console_error_panic_hook::set_once();

        let id = match scenario {
            Some(name) => name.parse::<ScenarioId>().map_err(|e| JsValue::from_str(&e))?,
            None => ScenarioId::ProgramMemory,
        };
        let api = id
            .build(Tracer::silent())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Simulator { api })
    }

    /// Execute a single step.
    /// Returns a JSON string describing what happened, or `None` if finished.
    pub fn step(&mut self) -> Result<Option<String>, JsValue> {
        let result = self
            .api
            .step()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(result.map(|r| serde_json::to_string(&r).unwrap_or_else(|_| "{}".into())))
    }

    /// Run up to `n` steps.
    pub fn run_steps(&mut self, n: u32) -> Result<u32, JsValue> {
        self.api
            .run_steps(n as u64)
            .map(|done| done as u32)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Run every event due at or before `t`.
    pub fn run_until(&mut self, t: f64) -> Result<u32, JsValue> {
        self.api
            .until(t)
            .map(|done| done as u32)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Export device states and outputs as a JSON string.
    pub fn state_json(&self) -> String {
        self.api.state_json()
    }

    /// Export the trace history as a JSON string.
    pub fn trace_json(&self) -> String {
        self.api.trace_json()
    }

    /// Returns `true` if no events are pending.
    pub fn is_finished(&self) -> bool {
        self.api.is_finished()
    }

    /// Current simulated time.
    pub fn current_time(&self) -> f64 {
        self.api.current_time()
    }

    pub fn fingerprint(&self) -> String {
        format!("{:016x}", self.api.fingerprint())
    }
}

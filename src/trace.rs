//! Trace subscriptions and the diagnostic record stream.
//!
//! Every output update and every input/action firing produces a
//! [`TraceRecord`]. Records that match a subscription, either one scoped to
//! the originating device or a global one, are delivered to the
//! [`Tracer`]'s sinks and kept for later inspection.

use crate::signal::{Scalar, Signal};
use crate::time::SimTime;

// ── Hash utility ──────────────────────────────────────────────────────

/// Combine two u64 hashes deterministically.
pub fn hash_combine(a: u64, b: u64) -> u64 {
    let mut h = a;
    h = h.wrapping_mul(0x517cc1b727220a95);
    h = h.wrapping_add(b);
    h ^= h >> 32;
    h
}

/// Hash a byte slice deterministically (FNV-1a variant).
pub fn hash_bytes(data: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for &b in data {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

// ── Pattern ───────────────────────────────────────────────────────────

/// A subscription pattern over item names.
///
/// `"*"` matches everything, `"out_*"` matches by prefix, anything else
/// must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TracePattern {
    All,
    Prefix(String),
    Exact(String),
}

impl TracePattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            TracePattern::All
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            TracePattern::Prefix(prefix.to_string())
        } else {
            TracePattern::Exact(pattern.to_string())
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            TracePattern::All => true,
            TracePattern::Prefix(p) => name.starts_with(p.as_str()),
            TracePattern::Exact(n) => n == name,
        }
    }
}

impl From<&str> for TracePattern {
    fn from(pattern: &str) -> Self {
        TracePattern::parse(pattern)
    }
}

impl std::fmt::Display for TracePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TracePattern::All => write!(f, "*"),
            TracePattern::Prefix(p) => write!(f, "{}*", p),
            TracePattern::Exact(n) => write!(f, "{}", n),
        }
    }
}

/// An ordered set of patterns; the subscription state of one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    patterns: Vec<TracePattern>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Subscriptions::default()
    }

    /// Add a pattern. Subscribing twice to the same pattern is a no-op.
    pub fn subscribe(&mut self, pattern: &str) {
        let pattern = TracePattern::parse(pattern);
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    /// Remove a pattern. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, pattern: &str) -> bool {
        let pattern = TracePattern::parse(pattern);
        let before = self.patterns.len();
        self.patterns.retain(|p| *p != pattern);
        self.patterns.len() != before
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[TracePattern] {
        &self.patterns
    }
}

// ── Records ───────────────────────────────────────────────────────────

/// What produced a trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum TraceKind {
    Input,
    Action,
    Output,
}

/// One observation: an output update or a handler firing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceRecord {
    pub time: SimTime,
    pub device: String,
    pub kind: TraceKind,
    /// Output, input or action name.
    pub item: String,
    /// The new output value, or the input payload. `None` for actions.
    pub value: Option<Signal>,
}

impl TraceRecord {
    fn hash(&self) -> u64 {
        let mut h = hash_combine(0, self.time.as_f64().to_bits());
        h = hash_combine(h, hash_bytes(self.device.as_bytes()));
        h = hash_combine(h, self.kind as u64);
        h = hash_combine(h, hash_bytes(self.item.as_bytes()));
        hash_combine(
            h,
            match &self.value {
                None => 0,
                Some(Signal::Undefined) => 1,
                Some(Signal::Zero) => 2,
                Some(Signal::Defined(Scalar::Int(n))) => hash_combine(3, *n as u64),
                Some(Signal::Defined(Scalar::Text(s))) => hash_combine(4, hash_bytes(s.as_bytes())),
            },
        )
    }
}

impl std::fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.kind, &self.value) {
            (TraceKind::Output, Some(v)) => {
                write!(f, "[{}] {}.{} <- {}", self.time, self.device, self.item, v)
            }
            (TraceKind::Output, None) => write!(f, "[{}] {}.{}", self.time, self.device, self.item),
            (TraceKind::Input, Some(v)) => {
                write!(f, "[{}] {} input {}({})", self.time, self.device, self.item, v)
            }
            (TraceKind::Input, None) => {
                write!(f, "[{}] {} input {}()", self.time, self.device, self.item)
            }
            (TraceKind::Action, _) => {
                write!(f, "[{}] {} action {}", self.time, self.device, self.item)
            }
        }
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────

/// A consumer of delivered trace records.
pub trait TraceSink {
    fn record(&mut self, record: &TraceRecord);
}

impl<F> TraceSink for F
where
    F: FnMut(&TraceRecord),
{
    fn record(&mut self, record: &TraceRecord) {
        (self)(record)
    }
}

/// Forwards records to `tracing` under the `devsim::trace` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&mut self, record: &TraceRecord) {
        tracing::info!(target: "devsim::trace", "{}", record);
    }
}

// ── Tracer ────────────────────────────────────────────────────────────

/// Delivers matching records to sinks and keeps them in order.
///
/// Records arrive in dispatch order, so every sink sees them in simulated
/// time order with the queue's FIFO tie-break.
pub struct Tracer {
    global: Subscriptions,
    sinks: Vec<Box<dyn TraceSink>>,
    records: Vec<TraceRecord>,
    fingerprint: u64,
}

impl Tracer {
    /// A tracer with a single [`LogSink`].
    pub fn new() -> Self {
        Tracer {
            global: Subscriptions::new(),
            sinks: vec![Box::new(LogSink)],
            records: Vec::new(),
            fingerprint: 0,
        }
    }

    /// A tracer with no sinks; records are only kept.
    pub fn silent() -> Self {
        Tracer {
            sinks: Vec::new(),
            ..Tracer::new()
        }
    }

    pub fn add_sink(&mut self, sink: impl TraceSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Subscribe to `pattern` on every device.
    pub fn subscribe(&mut self, pattern: &str) {
        self.global.subscribe(pattern);
    }

    pub fn unsubscribe(&mut self, pattern: &str) -> bool {
        self.global.unsubscribe(pattern)
    }

    /// Deliver `record` if it matches the global subscriptions or the
    /// originating device's own `scoped` subscriptions.
    pub fn publish(&mut self, record: TraceRecord, scoped: &Subscriptions) {
        if !(scoped.matches(&record.item) || self.global.matches(&record.item)) {
            return;
        }
        for sink in &mut self.sinks {
            sink.record(&record);
        }
        self.fingerprint = hash_combine(self.fingerprint, record.hash());
        self.records.push(record);
    }

    /// All delivered records, in delivery order.
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Delivered records as display lines.
    pub fn lines(&self) -> Vec<String> {
        self.records.iter().map(ToString::to_string).collect()
    }

    /// Hash chain over every delivered record.
    ///
    /// Two runs of the same scenario produce the same fingerprint.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.fingerprint = 0;
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("global", &self.global)
            .field("sinks", &self.sinks.len())
            .field("records", &self.records.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn record(t: f64, item: &str, value: Option<Signal>) -> TraceRecord {
        TraceRecord {
            time: SimTime::new(t).unwrap(),
            device: "dm8".into(),
            kind: if value.is_some() { TraceKind::Output } else { TraceKind::Action },
            item: item.into(),
            value,
        }
    }

    #[test]
    fn test_pattern_parse() {
        assert_eq!(TracePattern::parse("*"), TracePattern::All);
        assert_eq!(TracePattern::parse("out_*"), TracePattern::Prefix("out_".into()));
        assert_eq!(TracePattern::parse("output"), TracePattern::Exact("output".into()));
        assert_eq!(TracePattern::parse("out_*").to_string(), "out_*");
    }

    #[test]
    fn test_subscriptions_add_remove() {
        let mut subs = Subscriptions::new();
        subs.subscribe("output");
        subs.subscribe("output");
        assert_eq!(subs.patterns().len(), 1);
        assert!(subs.matches("output"));
        assert!(subs.unsubscribe("output"));
        assert!(!subs.unsubscribe("output"));
        assert!(!subs.matches("output"));
        assert!(subs.is_empty());
    }

    #[test]
    fn test_publish_filters_by_scope() {
        let mut tracer = Tracer::silent();
        let mut scoped = Subscriptions::new();
        scoped.subscribe("output");

        tracer.publish(record(1.0, "output", Some(Signal::int(6))), &scoped);
        tracer.publish(record(2.0, "act_read_done", None), &scoped);
        assert_eq!(tracer.records().len(), 1);

        tracer.subscribe("act_*");
        tracer.publish(record(3.0, "act_read_done", None), &Subscriptions::new());
        assert_eq!(tracer.records().len(), 2);
    }

    #[test]
    fn test_sinks_receive_delivered_records() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut tracer = Tracer::silent();
        let sink_seen = Rc::clone(&seen);
        tracer.add_sink(move |r: &TraceRecord| sink_seen.borrow_mut().push(r.item.clone()));
        tracer.subscribe("*");

        tracer.publish(record(1.0, "output", Some(Signal::Undefined)), &Subscriptions::new());
        assert_eq!(*seen.borrow(), vec!["output".to_string()]);
    }

    #[test]
    fn test_record_display() {
        assert_eq!(
            record(15.0, "output", Some(Signal::int(6))).to_string(),
            "[T=15.000] dm8.output <- 6"
        );
        assert_eq!(
            record(17.0, "act_deselected", None).to_string(),
            "[T=17.000] dm8 action act_deselected"
        );
    }

    #[test]
    fn test_fingerprint_depends_on_content() {
        let all = {
            let mut s = Subscriptions::new();
            s.subscribe("*");
            s
        };
        let mut a = Tracer::silent();
        let mut b = Tracer::silent();
        a.publish(record(1.0, "output", Some(Signal::int(1))), &all);
        b.publish(record(1.0, "output", Some(Signal::int(1))), &all);
        assert_eq!(a.fingerprint(), b.fingerprint());

        b.publish(record(2.0, "output", Some(Signal::Zero)), &all);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}

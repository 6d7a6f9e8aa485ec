//! The event queue: the simulation's execution loop.
//!
//! Drives the scheduler: pops events, advances simulated time, dispatches
//! to a [`Dispatch`] implementation and enqueues whatever follow-up events
//! the handler returns. The loop is synchronous and single-threaded.

use crate::error::{DevsimError, DevsimResult};
use crate::event::{Event, EventId, Scheduled};
use crate::scheduler::Scheduler;
use crate::time::SimTime;

// ── Dispatch trait ────────────────────────────────────────────────────

/// Something that can execute events.
///
/// Handlers do not touch the queue: they return follow-up events as data,
/// and the queue inserts them after the handler has returned successfully.
pub trait Dispatch {
    /// Execute `event` at simulated time `now`.
    fn dispatch(&mut self, now: SimTime, event: &Event) -> DevsimResult<Vec<Event>>;

    /// Human-readable name of an event's target, used by verbose logging.
    fn describe(&self, event: &Event) -> String {
        event.target.to_string()
    }
}

/// A dispatcher backed by a closure, handy for tests.
impl<F> Dispatch for F
where
    F: FnMut(SimTime, &Event) -> DevsimResult<Vec<Event>>,
{
    fn dispatch(&mut self, now: SimTime, event: &Event) -> DevsimResult<Vec<Event>> {
        (self)(now, event)
    }
}

// ── EventQueue ────────────────────────────────────────────────────────

/// Top-level simulation driver.
///
/// Owns the scheduler and the current time. It never owns devices; they
/// are reached through the [`Dispatch`] passed to `run`, `until` and
/// `step`.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    scheduler: Scheduler,
    now: SimTime,
    events_processed: u64,
    verbose: bool,
}

impl EventQueue {
    /// Create a queue at time zero.
    pub fn new() -> Self {
        EventQueue {
            scheduler: Scheduler::new(),
            now: SimTime::ZERO,
            events_processed: 0,
            verbose: false,
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn len(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// Due time of the next pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.scheduler.peek_time()
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Log every dispatch at INFO instead of DEBUG.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Actions only enter the queue as follow-ups of their own device.
    fn check_external(&self, event: &Event) -> DevsimResult<()> {
        if event.target.is_action() {
            return Err(DevsimError::ExternalAction {
                target: event.target,
            });
        }
        self.check_causal(event)
    }

    fn check_causal(&self, event: &Event) -> DevsimResult<()> {
        if event.due.is_before(self.now) {
            return Err(DevsimError::Scheduling {
                requested: event.due,
                current: self.now,
            });
        }
        Ok(())
    }

    /// Enqueue a single input event.
    ///
    /// Fails with [`DevsimError::ExternalAction`] for an event that targets
    /// an action, e.g. one copied out of [`step_one`](Self::step_one).
    pub fn add(&mut self, event: Event) -> DevsimResult<EventId> {
        self.check_external(&event)?;
        Ok(self.scheduler.schedule(event))
    }

    /// Enqueue a batch of input events, all or nothing.
    ///
    /// Every event is checked before any is inserted; insertion keeps the
    /// batch order, which is also the dispatch order for equal due times.
    pub fn add_all(&mut self, events: impl IntoIterator<Item = Event>) -> DevsimResult<Vec<EventId>> {
        let events: Vec<Event> = events.into_iter().collect();
        for event in &events {
            self.check_external(event)?;
        }
        Ok(self.insert(events))
    }

    /// Insert follow-ups returned by a dispatcher. These may be actions.
    fn add_follow_ups(&mut self, events: Vec<Event>) -> DevsimResult<()> {
        for event in &events {
            self.check_causal(event)?;
        }
        self.insert(events);
        Ok(())
    }

    fn insert(&mut self, events: Vec<Event>) -> Vec<EventId> {
        events
            .into_iter()
            .map(|e| self.scheduler.schedule(e))
            .collect()
    }

    /// Dispatch one event: pop, advance time, invoke, enqueue follow-ups.
    ///
    /// Returns `Ok(None)` when the queue is empty.
    pub fn step_one(&mut self, dispatcher: &mut dyn Dispatch) -> DevsimResult<Option<Scheduled>> {
        let Some(next) = self.scheduler.pop_next() else {
            return Ok(None);
        };

        // Accepted events are never in the past, so time cannot go backward.
        self.now = self.now.latest(next.event.due);
        self.events_processed += 1;

        let payload = next
            .event
            .payload
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        if self.verbose {
            tracing::info!(
                time = %self.now,
                id = %next.id,
                target = %dispatcher.describe(&next.event),
                payload = %payload,
                "dispatch"
            );
        } else {
            tracing::debug!(
                time = %self.now,
                id = %next.id,
                target = %dispatcher.describe(&next.event),
                payload = %payload,
                "dispatch"
            );
        }

        let follow_ups = dispatcher.dispatch(self.now, &next.event)?;
        self.add_follow_ups(follow_ups)?;
        Ok(Some(next))
    }

    /// Run until the queue is empty.
    ///
    /// Returns the number of events dispatched by this call.
    pub fn run(&mut self, dispatcher: &mut dyn Dispatch) -> DevsimResult<u64> {
        let start = self.events_processed;
        while self.step_one(dispatcher)?.is_some() {}
        Ok(self.events_processed - start)
    }

    /// Dispatch every event due at or before `t`, then stop.
    ///
    /// The current time ends at the last dispatched event's time (or stays
    /// where it was); it is not advanced to `t`.
    pub fn until(&mut self, t: f64, dispatcher: &mut dyn Dispatch) -> DevsimResult<u64> {
        let limit = SimTime::new(t)?;
        let start = self.events_processed;
        while self.peek_time().is_some_and(|due| due <= limit) {
            self.step_one(dispatcher)?;
        }
        Ok(self.events_processed - start)
    }

    /// Dispatch up to `n` events.
    ///
    /// Returns the number actually dispatched, which is less than `n` only
    /// if the queue ran dry.
    pub fn step(&mut self, n: u64, dispatcher: &mut dyn Dispatch) -> DevsimResult<u64> {
        let start = self.events_processed;
        for _ in 0..n {
            if self.step_one(dispatcher)?.is_none() {
                break;
            }
        }
        Ok(self.events_processed - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;
    use crate::event::{HandlerRef, Target};

    type Out = DevsimResult<Vec<Event>>;

    fn t(x: f64) -> SimTime {
        SimTime::new(x).unwrap()
    }

    fn ev(x: f64, tag: usize) -> Event {
        Event::new(t(x), Target::input(DeviceId::new(0), tag), None)
    }

    fn tag_of(event: &Event) -> usize {
        match event.target.handler {
            HandlerRef::Action(i) | HandlerRef::Input(i) => i,
        }
    }

    #[test]
    fn test_basic_execution_loop() {
        let mut queue = EventQueue::new();
        queue.add_all([ev(10.0, 1), ev(20.0, 2), ev(30.0, 3)]).unwrap();

        let mut log = Vec::new();
        let processed = queue
            .run(&mut |_now: SimTime, e: &Event| -> Out {
                log.push(tag_of(e));
                Ok(Vec::new())
            })
            .unwrap();

        assert_eq!(processed, 3);
        assert_eq!(log, vec![1, 2, 3]);
        assert_eq!(queue.now(), t(30.0));
    }

    #[test]
    fn test_handler_schedules_followup() {
        let mut queue = EventQueue::new();
        queue.add(ev(0.0, 0)).unwrap();

        let mut log = Vec::new();
        queue
            .run(&mut |now: SimTime, e: &Event| -> Out {
                log.push(now.as_f64());
                if now < t(30.0) {
                    Ok(vec![ev(now.as_f64() + 10.0, tag_of(e))])
                } else {
                    Ok(Vec::new())
                }
            })
            .unwrap();

        assert_eq!(log, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_add_in_past_is_rejected() {
        let mut queue = EventQueue::new();
        queue.add(ev(5.0, 0)).unwrap();
        queue.run(&mut |_: SimTime, _: &Event| -> Out { Ok(Vec::new()) }).unwrap();

        let err = queue.add(ev(4.0, 0)).unwrap_err();
        assert!(matches!(err, DevsimError::Scheduling { .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_add_all_is_all_or_nothing() {
        let mut queue = EventQueue::new();
        queue.add(ev(5.0, 0)).unwrap();
        queue.step(1, &mut |_: SimTime, _: &Event| -> Out { Ok(Vec::new()) }).unwrap();

        let result = queue.add_all([ev(6.0, 1), ev(1.0, 2), ev(7.0, 3)]);
        assert!(result.is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_follow_up_in_past_aborts_run() {
        let mut queue = EventQueue::new();
        queue.add_all([ev(10.0, 0), ev(20.0, 1)]).unwrap();

        let result = queue.run(&mut |_: SimTime, _: &Event| -> Out { Ok(vec![ev(1.0, 9)]) });
        assert!(matches!(result, Err(DevsimError::Scheduling { .. })));
        // The second event was never reached.
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.events_processed(), 1);
    }

    #[test]
    fn test_until_stops_at_limit_and_never_rewinds() {
        let mut queue = EventQueue::new();
        queue.add_all([ev(1.0, 0), ev(5.0, 1), ev(5.0, 2), ev(9.0, 3)]).unwrap();
        let mut noop = |_: SimTime, _: &Event| -> Out { Ok(Vec::new()) };

        assert_eq!(queue.until(5.0, &mut noop).unwrap(), 3);
        assert_eq!(queue.now(), t(5.0));
        assert_eq!(queue.len(), 1);

        // Nothing due before 7.0: time stays at the last dispatch.
        assert_eq!(queue.until(7.0, &mut noop).unwrap(), 0);
        assert_eq!(queue.now(), t(5.0));

        assert_eq!(queue.until(2.0, &mut noop).unwrap(), 0);
        assert_eq!(queue.now(), t(5.0));
    }

    #[test]
    fn test_step_limits_dispatch() {
        let mut queue = EventQueue::new();
        for i in 0..10 {
            queue.add(ev(i as f64, i)).unwrap();
        }
        let mut noop = |_: SimTime, _: &Event| -> Out { Ok(Vec::new()) };

        assert_eq!(queue.step(4, &mut noop).unwrap(), 4);
        assert_eq!(queue.len(), 6);
        assert_eq!(queue.step(100, &mut noop).unwrap(), 6);
        assert!(queue.is_empty());
        assert_eq!(queue.events_processed(), 10);
    }

    #[test]
    fn test_same_instant_follow_up_runs_after_existing_peers() {
        let mut queue = EventQueue::new();
        queue.add_all([ev(1.0, 1), ev(1.0, 2)]).unwrap();

        let mut order = Vec::new();
        queue
            .run(&mut |now: SimTime, e: &Event| -> Out {
                let tag = tag_of(e);
                order.push(tag);
                if tag == 1 {
                    Ok(vec![Event::action(now, DeviceId::new(0), 3)])
                } else {
                    Ok(Vec::new())
                }
            })
            .unwrap();

        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_actions_cannot_be_added_from_outside() {
        let mut queue = EventQueue::new();
        queue.add(ev(1.0, 0)).unwrap();
        let mut echo = |now: SimTime, _: &Event| -> Out { Ok(vec![Event::action(now, DeviceId::new(0), 1)]) };

        let first = queue.step_one(&mut echo).unwrap().unwrap();
        let action = queue.step_one(&mut echo).unwrap().unwrap();
        assert!(!first.event().target().is_action());
        assert!(action.event().target().is_action());

        let err = queue.add(action.event().clone()).unwrap_err();
        assert_eq!(
            err,
            DevsimError::ExternalAction {
                target: action.event().target()
            }
        );
        let err = queue.add_all([ev(2.0, 0), action.event().clone()]).unwrap_err();
        assert!(matches!(err, DevsimError::ExternalAction { .. }));
        // Only the echo's own follow-up is pending.
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = EventQueue::new();
        let processed = queue.run(&mut |_: SimTime, _: &Event| -> Out { Ok(Vec::new()) }).unwrap();
        assert_eq!(processed, 0);
        assert!(queue.is_empty());
        assert_eq!(queue.now(), SimTime::ZERO);
    }
}

//! Property coverage for event ordering, causality and device outputs.

use devsim::device::builtin::clock::OUT_PHASE_NUMBER;
use devsim::device::builtin::{
    ClockConfig, ClockInput, CpuClock, DataMemory, DataMemoryConfig, DmInput,
};
use devsim::{
    Device, DeviceHandle, DeviceRegistry, DevsimError, DevsimResult, Event, EventQueue, SimTime,
    Signal, Tracer,
};
use proptest::prelude::*;

/// A registered device to address events to; the recording dispatcher
/// below never reaches it.
fn sink() -> DeviceHandle<DataMemory> {
    let mut reg = DeviceRegistry::with_tracer(Tracer::silent());
    reg.add(DataMemory::new("sink", 1, DataMemoryConfig::default()).unwrap())
        .unwrap()
}

/// An input event carrying `tag` as its payload.
fn stimulus(at: f64, tag: usize) -> Event {
    Event::input(at, sink(), DmInput::Addr, tag as i64).unwrap()
}

/// Run the queue with a recording dispatcher and return payload tags in
/// dispatch order.
fn dispatch_order(queue: &mut EventQueue) -> Vec<usize> {
    let mut seen = Vec::new();
    let mut record = |_now: SimTime, event: &Event| -> DevsimResult<Vec<Event>> {
        if let Some(n) = event.payload().and_then(Signal::as_int) {
            seen.push(n as usize);
        }
        Ok(Vec::new())
    };
    queue.run(&mut record).unwrap();
    seen
}

proptest! {
    #[test]
    fn property_dispatch_is_time_ordered_with_fifo_ties(times in prop::collection::vec(0u8..20, 1..60)) {
        let mut queue = EventQueue::new();
        for (tag, &at) in times.iter().enumerate() {
            queue.add(stimulus(at as f64, tag)).unwrap();
        }

        // A stable sort by time is exactly "time order, FIFO within a time".
        let mut expected: Vec<usize> = (0..times.len()).collect();
        expected.sort_by_key(|&tag| times[tag]);

        prop_assert_eq!(dispatch_order(&mut queue), expected);
    }

    #[test]
    fn property_past_events_are_rejected(start in 1.0f64..1000.0, back in 0.001f64..1.0) {
        let mut queue = EventQueue::new();
        queue.add(stimulus(start, 0)).unwrap();
        dispatch_order(&mut queue);
        prop_assert_eq!(queue.now(), SimTime::new(start).unwrap());

        let err = queue.add(stimulus(start - back, 1)).unwrap_err();
        let is_scheduling = matches!(err, DevsimError::Scheduling { .. });
        prop_assert!(is_scheduling);
        prop_assert!(queue.is_empty());

        // Same-instant scheduling is still allowed.
        prop_assert!(queue.add(stimulus(start, 2)).is_ok());
    }

    #[test]
    fn property_until_never_rewinds(times in prop::collection::vec(0u8..50, 1..30), limit in 0u8..60) {
        let mut queue = EventQueue::new();
        for (tag, &at) in times.iter().enumerate() {
            queue.add(stimulus(at as f64, tag)).unwrap();
        }
        let mut noop = |_now: SimTime, _event: &Event| -> DevsimResult<Vec<Event>> { Ok(Vec::new()) };
        let before = queue.now();
        let dispatched = queue.until(limit as f64, &mut noop).unwrap();

        let due_count = times.iter().filter(|&&t| t <= limit).count();
        prop_assert_eq!(dispatched as usize, due_count);
        prop_assert!(queue.now() >= before);
        prop_assert!(queue.now().as_f64() <= limit as f64);
        prop_assert_eq!(queue.len(), times.len() - due_count);
    }

    #[test]
    fn property_clock_outputs_cycle_with_non_decreasing_timestamps(
        period in 1u32..50,
        phases in 1usize..8,
        steps in 1u64..80,
    ) {
        let config = ClockConfig {
            t_period: period as f64,
            phase_names: (0..phases).map(|i| format!("P{}", i)).collect(),
        };
        let mut reg = DeviceRegistry::with_tracer(Tracer::silent());
        let clock = reg.add(CpuClock::new("clk", config).unwrap()).unwrap();

        let mut queue = EventQueue::new();
        queue.add(Event::pulse(0.0, clock, ClockInput::Start).unwrap()).unwrap();
        queue.step(steps, &mut reg).unwrap();

        let device = reg.get(clock).unwrap();
        for output in device.core().outputs() {
            let history = output.history();
            prop_assert!(history.windows(2).all(|w| w[0].0 <= w[1].0));
        }

        let numbers: Vec<i64> = device
            .core()
            .output(OUT_PHASE_NUMBER)
            .unwrap()
            .history()
            .iter()
            .skip(1)
            .filter_map(|(_, v)| v.as_int())
            .collect();
        // The first step is the start input; each later step is one tick.
        prop_assert_eq!(numbers.len() as u64, steps - 1);
        for (i, n) in numbers.iter().enumerate() {
            prop_assert_eq!(*n as usize, i % phases);
        }
    }

    #[test]
    fn property_data_memory_reads_masked_slot(width in 0u32..6, address in any::<i64>()) {
        let slots = 1usize << width;
        let content = (0..slots).map(|i| Signal::int(i as i64 * 3)).collect();
        let dm = DataMemory::with_content("dm", width, content, DataMemoryConfig::default()).unwrap();

        let mut reg = DeviceRegistry::with_tracer(Tracer::silent());
        let dm = reg.add(dm).unwrap();
        let mut queue = EventQueue::new();
        queue
            .add_all(vec![
                Event::input(0.0, dm, DmInput::Addr, address).unwrap(),
                Event::pulse(5.0, dm, DmInput::Select).unwrap(),
            ])
            .unwrap();
        queue.run(&mut reg).unwrap();

        let expected = (address & (slots as i64 - 1)) * 3;
        let device = reg.get(dm).unwrap();
        prop_assert_eq!(device.core().value("output").unwrap(), &Signal::int(expected));
    }
}

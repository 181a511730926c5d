// tests/debounce_behaviour.rs

use hotserve::engine::{DebounceState, Debouncer, ReloadSignal};

/// Feed a change pattern and return the cycle indices at which a signal fired.
fn fired_at(pattern: &[bool]) -> Vec<(usize, ReloadSignal)> {
    let mut debouncer = Debouncer::new();
    pattern
        .iter()
        .enumerate()
        .filter_map(|(i, changed)| debouncer.observe(*changed).map(|s| (i, s)))
        .collect()
}

#[test]
fn burst_then_quiet_fires_once_at_the_quiet_cycle() {
    for n in 1..6 {
        let mut pattern = vec![true; n];
        pattern.push(false);
        pattern.extend([false, false]);
        assert_eq!(
            fired_at(&pattern),
            vec![(n, ReloadSignal { burst_cycles: n as u32 })],
            "burst of {n}"
        );
    }
}

#[test]
fn quiet_cycles_alone_never_fire() {
    assert!(fired_at(&[false; 10]).is_empty());
}

#[test]
fn separate_bursts_fire_separately() {
    let fired = fired_at(&[true, false, true, true, false, false, true]);
    assert_eq!(
        fired,
        vec![
            (1, ReloadSignal { burst_cycles: 1 }),
            (4, ReloadSignal { burst_cycles: 2 }),
        ]
    );
}

#[test]
fn unfinished_burst_stays_changing() {
    let mut debouncer = Debouncer::new();
    for _ in 0..3 {
        assert_eq!(debouncer.observe(true), None);
    }
    assert_eq!(debouncer.state(), DebounceState::Changing { cycles: 3 });
}

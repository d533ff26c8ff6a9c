//! Press/release sequences for the debounced button reader

use posefx::config::DebounceConfig;
use posefx::{DebouncedButtons, Error};
use std::time::{Duration, Instant};

/// Feed one line a sequence of raw samples taken `step` apart, starting at `t0`
fn run_sequence(samples: &[bool], step: Duration, interval: Duration) -> Vec<bool> {
    let t0 = Instant::now();
    let mut buttons = DebouncedButtons::new(1, interval, t0);
    samples
        .iter()
        .enumerate()
        .map(|(i, &raw)| buttons.poll(&[raw], t0 + step * i as u32).unwrap()[0])
        .collect()
}

#[test]
fn test_held_button_fires_exactly_once() {
    let out = run_sequence(
        &[false, true, true, true, true],
        Duration::from_millis(20),
        Duration::from_millis(50),
    );
    assert_eq!(out, vec![false, false, false, true, false]);
}

#[test]
fn test_long_hold_never_refires() {
    let mut samples = vec![false];
    samples.extend(std::iter::repeat(true).take(50));
    let out = run_sequence(&samples, Duration::from_millis(20), Duration::from_millis(50));
    assert_eq!(out.iter().filter(|&&v| v).count(), 1);
    assert!(out[3]);
}

#[test]
fn test_release_restarts_countdown() {
    // Released at 60 ms, so the press only fires 60 ms later at 120 ms
    let out = run_sequence(
        &[false, true, true, false, true, true, true],
        Duration::from_millis(20),
        Duration::from_millis(50),
    );
    assert_eq!(out, vec![false, false, false, false, false, false, true]);
}

#[test]
fn test_press_release_press_fires_twice() {
    let out = run_sequence(
        &[false, true, true, true, true, false, true, true, true, true],
        Duration::from_millis(20),
        Duration::from_millis(50),
    );
    assert_eq!(
        out,
        vec![false, false, false, true, false, false, false, false, true, false]
    );
}

#[test]
fn test_short_taps_are_ignored() {
    let out = run_sequence(
        &[false, true, false, true, false, true, false],
        Duration::from_millis(20),
        Duration::from_millis(50),
    );
    assert!(out.iter().all(|&v| !v));
}

#[test]
fn test_zero_lines() {
    let mut buttons = DebouncedButtons::new(0, Duration::from_millis(100), Instant::now());
    assert!(buttons.poll(&[], Instant::now()).unwrap().is_empty());
    assert!(matches!(
        buttons.poll(&[true], Instant::now()),
        Err(Error::LineCountMismatch { .. })
    ));
}

#[test]
fn test_default_config_matches_dev_board() {
    let buttons = DebouncedButtons::from_config(&DebounceConfig::default(), Instant::now());
    assert_eq!(buttons.line_count(), 5);
    assert_eq!(buttons.interval(), Duration::from_millis(100));
    assert_eq!(buttons.states(), &[false; 5]);
}

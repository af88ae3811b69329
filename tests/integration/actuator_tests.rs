//! Pump actuator under concurrency and real time.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use waterbot::app::ports::{CancellableDelay, DelayOutcome};
use waterbot::config::ActuationLimits;
use waterbot::drivers::pump::HardwareActuator;
use waterbot::error::ActuatorError;
use waterbot::shutdown::ShutdownSignal;

use super::mock_hw::MockPin;

/// Blocks inside `delay` until the test opens the gate.
struct GateDelay {
    entered: Mutex<Sender<()>>,
    gate: Mutex<Receiver<()>>,
}

fn gate() -> (GateDelay, Receiver<()>, Sender<()>) {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (open_tx, open_rx) = mpsc::channel();
    let delay = GateDelay {
        entered: Mutex::new(entered_tx),
        gate: Mutex::new(open_rx),
    };
    (delay, entered_rx, open_tx)
}

impl CancellableDelay for GateDelay {
    fn delay(&self, _duration: Duration) -> DelayOutcome {
        let _ = self.entered.lock().unwrap().send(());
        let _ = self.gate.lock().unwrap().recv();
        DelayOutcome::Elapsed
    }
}

#[test]
fn overlapping_actuation_is_refused_not_queued() {
    let (delay, entered, open) = gate();
    let pin = MockPin::default();
    let pump = Arc::new(
        HardwareActuator::new(14, pin.clone(), &ActuationLimits::default(), delay).unwrap(),
    );

    let first = {
        let pump = Arc::clone(&pump);
        thread::spawn(move || pump.actuate_for(10.0))
    };
    entered.recv_timeout(Duration::from_secs(5)).unwrap();

    assert!(pump.is_on());
    assert_eq!(pump.actuate_for(5.0), Err(ActuatorError::Busy));
    assert_eq!(pin.activations(), 1);

    open.send(()).unwrap();
    let report = first.join().unwrap().unwrap();
    assert_eq!(report.requested, Duration::from_secs(10));
    assert!(!pin.is_high());
    assert!(!pump.is_busy());
}

#[test]
fn shutdown_cuts_long_actuation_short() {
    let shutdown = ShutdownSignal::new();
    let pin = MockPin::default();
    let pump = Arc::new(
        HardwareActuator::new(14, pin.clone(), &ActuationLimits::default(), shutdown.clone())
            .unwrap(),
    );

    let worker = {
        let pump = Arc::clone(&pump);
        thread::spawn(move || pump.actuate_for(30.0))
    };
    thread::sleep(Duration::from_millis(50));
    shutdown.trigger();

    let report = worker.join().unwrap().unwrap();
    assert!(report.cancelled);
    assert!(report.elapsed < Duration::from_secs(5));
    assert!(!pin.is_high());
    assert!(!pump.is_on());
}

#[test]
fn real_delay_holds_pump_for_requested_time() {
    let pin = MockPin::default();
    let pump = HardwareActuator::new(
        14,
        pin.clone(),
        &ActuationLimits::default(),
        ShutdownSignal::new(),
    )
    .unwrap();

    let start = Instant::now();
    let report = pump.actuate_for(0.2).unwrap();
    assert!(!report.cancelled);
    assert!(start.elapsed() >= Duration::from_millis(200));
    assert!(report.elapsed >= Duration::from_millis(200));
    assert_eq!(*pin.levels.lock().unwrap(), vec![false, true, false]);
}

#[test]
fn forced_off_mid_actuation_from_another_thread() {
    let (delay, entered, open) = gate();
    let pin = MockPin::default();
    let pump = Arc::new(
        HardwareActuator::new(14, pin.clone(), &ActuationLimits::default(), delay).unwrap(),
    );

    let worker = {
        let pump = Arc::clone(&pump);
        thread::spawn(move || pump.actuate_for(20.0))
    };
    entered.recv_timeout(Duration::from_secs(5)).unwrap();

    pump.turn_off().unwrap();
    assert!(!pin.is_high());
    // Still in flight until the waiting call returns.
    assert!(pump.is_busy());

    open.send(()).unwrap();
    assert!(worker.join().unwrap().is_ok());
    assert!(!pump.is_busy());
    assert!(!pin.is_high());
}

use embassy_time::Duration;

use super::*;
use crate::sim::{MemVolume, SimCall, SimController, SimDelay, SimPin};

type TestSession<'a> = SdSession<'a, SimController, MemVolume, SimPin, SimDelay>;

const CMD_DONE: u32 = 1 << 2;

fn session(wait: &WaitEngine, volume: MemVolume) -> TestSession<'_> {
    SdSession::new(
        SimController::new(),
        volume,
        Some(SimPin::new()),
        SimDelay::new(),
        wait,
        RetryPolicy::default(),
    )
}

fn failing_mounts(errors: &[FsError]) -> MemVolume {
    let mut volume = MemVolume::new();
    for &err in errors {
        volume.script_mount(Err(err));
    }
    volume
}

#[test]
fn mount_succeeding_on_fifth_attempt_reports_four_retries() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, failing_mounts(&[FsError::NotReady; 4]));

    assert_eq!(sd.enable(), Ok(4));
    assert!(sd.is_enabled());
    assert_eq!(sd.last_retries(), Some(4));

    let (ctrl, volume, pin, delay) = sd.release();
    assert_eq!(volume.mount_calls(), 5);
    assert!(pin.unwrap().high);
    assert_eq!(ctrl.count(SimCall::Init), 1);
    assert_eq!(delay.delays_us(), &[10_000, 4_000, 4_000, 4_000, 4_000, 4_000]);
}

#[test]
fn card_never_ready_is_not_found() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, failing_mounts(&[FsError::NotReady; 5]));

    let err = sd.enable().unwrap_err();
    assert_eq!(err, SessionError::NotFound);
    assert_eq!(err.code(), -1);
    assert!(matches!(sd.phase(), SessionPhase::Failed));
    assert!(sd.volume().is_none());
    assert_eq!(sd.last_retries(), None);
}

#[test]
fn other_mount_failures_are_errors() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, failing_mounts(&[FsError::NoFilesystem; 5]));
    let err = sd.enable().unwrap_err();
    assert_eq!(err, SessionError::Error);
    assert_eq!(err.code(), -2);
}

#[test]
fn last_mount_error_decides_status() {
    let wait = WaitEngine::new();
    let mut errors = [FsError::NotReady; 5];
    errors[4] = FsError::Disk;
    let mut sd = session(&wait, failing_mounts(&errors));
    assert_eq!(sd.enable(), Err(SessionError::Error));

    let wait = WaitEngine::new();
    let mut errors = [FsError::Disk; 5];
    errors[4] = FsError::NotReady;
    let mut sd = session(&wait, failing_mounts(&errors));
    assert_eq!(sd.enable(), Err(SessionError::NotFound));
}

#[test]
fn failed_session_recovers_on_next_enable() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, failing_mounts(&[FsError::NotReady; 5]));
    assert!(sd.enable().is_err());
    assert_eq!(sd.enable(), Ok(0));
    assert!(matches!(sd.phase(), SessionPhase::Enabled));
}

#[test]
fn single_attempt_policy_mounts_once() {
    let wait = WaitEngine::new();
    let mut sd = SdSession::new(
        SimController::new(),
        failing_mounts(&[FsError::NotReady]),
        None::<SimPin>,
        SimDelay::new(),
        &wait,
        RetryPolicy::new(0, Duration::from_micros(250)),
    );
    assert_eq!(sd.enable(), Err(SessionError::NotFound));
    let (_, volume, _, delay) = sd.release();
    assert_eq!(volume.mount_calls(), 1);
    assert_eq!(delay.delays_us(), &[10_000, 250]);
}

#[test]
fn enable_programs_controller_before_mounting() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, MemVolume::new());
    sd.enable().unwrap();
    let ctrl = sd.controller();
    assert!(ctrl.initialized);
    assert!(ctrl.irq_enabled);
    assert_eq!(ctrl.journal(), &[SimCall::Init, SimCall::EnableIrq]);
}

#[test]
fn enable_forgets_abandoned_wait() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, MemVolume::new());
    wait.arm(sd.controller(), CMD_DONE).unwrap();
    sd.enable().unwrap();
    assert!(!wait.is_armed());
}

#[test]
fn disable_powers_down_and_reinitializes_controller() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, MemVolume::new());
    sd.enable().unwrap();
    sd.controller().status = 0x30;
    sd.controller().clear_journal();

    sd.disable();
    assert!(matches!(sd.phase(), SessionPhase::Disabled));
    assert!(sd.volume().is_none());

    let (ctrl, volume, pin, _) = sd.release();
    assert_eq!(
        &ctrl.journal()[..5],
        &[
            SimCall::UninitializeDisk,
            SimCall::DisableIrq,
            SimCall::ClearStatus(0x30),
            SimCall::SetMask(0),
            SimCall::Init,
        ]
    );
    assert!(!volume.is_mounted());
    let pin = pin.unwrap();
    assert!(!pin.high);
    assert_eq!(pin.transitions, 2);
}

#[test]
fn unmount_failure_does_not_stop_disable() {
    let wait = WaitEngine::new();
    let mut volume = MemVolume::new();
    volume.set_unmount_result(Err(FsError::Disk));
    let mut sd = session(&wait, volume);
    sd.enable().unwrap();
    sd.disable();

    assert!(matches!(sd.phase(), SessionPhase::Disabled));
    assert_eq!(sd.controller().count(SimCall::UninitializeDisk), 1);
    assert_eq!(sd.controller().count(SimCall::Init), 2);
}

#[test]
fn disable_when_never_enabled_is_harmless() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, MemVolume::new());
    sd.disable();
    assert!(matches!(sd.phase(), SessionPhase::Disabled));
}

#[test]
fn power_pin_failure_does_not_abort_enable() {
    let wait = WaitEngine::new();
    let mut sd = SdSession::new(
        SimController::new(),
        MemVolume::new(),
        Some(SimPin {
            fail: true,
            ..SimPin::default()
        }),
        SimDelay::new(),
        &wait,
        RetryPolicy::default(),
    );
    assert_eq!(sd.enable(), Ok(0));
}

#[test]
fn reset_cycles_power_with_settle_delays() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, MemVolume::new());
    sd.enable().unwrap();

    assert_eq!(sd.reset(), Ok(0));
    assert!(sd.is_enabled());

    let (ctrl, volume, pin, delay) = sd.release();
    assert_eq!(
        &delay.delays_us()[2..],
        &[100_000, 100_000, 10_000, 4_000]
    );
    assert_eq!(volume.mount_calls(), 2);
    assert_eq!(ctrl.count(SimCall::UninitializeDisk), 1);
    let pin = pin.unwrap();
    assert!(pin.high);
    assert_eq!(pin.transitions, 3);
}

#[test]
fn volume_is_available_only_while_enabled() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, MemVolume::new());
    assert!(sd.volume().is_none());
    sd.enable().unwrap();
    let volume = sd.volume().unwrap();
    volume.mkdir("LOGS").unwrap();
    assert!(volume.exists("LOGS"));
}

#[test]
fn card_detect_and_identity_come_from_controller() {
    let wait = WaitEngine::new();
    let mut cid = [0u8; 16];
    cid[15] = 0x1B;
    cid[1] = 0x35;
    cid[2] = 0x01;
    let mut ctrl = SimController::new().with_cid(cid);
    ctrl.present = false;
    let mut sd = SdSession::new(
        ctrl,
        MemVolume::new(),
        None::<SimPin>,
        SimDelay::new(),
        &wait,
        RetryPolicy::default(),
    );

    assert!(!sd.card_detected());
    let info = sd.card_info();
    assert!(info.valid);
    assert_eq!(info.manufacturer_id, 0x1B);
    assert_eq!((info.year, info.month), (2019, 5));
}

#[test]
fn wait_for_event_returns_status_raised_by_interrupt() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, MemVolume::new());
    sd.enable().unwrap();
    sd.controller().status = CMD_DONE;

    let status = std::thread::scope(|scope| {
        scope.spawn(|| {
            while !wait.is_armed() {
                std::thread::yield_now();
            }
            wait.on_interrupt(|| {});
        });
        sd.wait_for_event(CMD_DONE)
    });

    assert_eq!(status, Ok(CMD_DONE));
    assert!(!wait.is_armed());
    assert_eq!(sd.controller().status, 0);
    assert_eq!(sd.controller().mask, 0);
}

#[test]
fn release_deinitializes_controller() {
    let wait = WaitEngine::new();
    let mut sd = session(&wait, MemVolume::new());
    sd.enable().unwrap();
    sd.controller().clear_journal();

    let (ctrl, _, _, _) = sd.release();
    assert_eq!(
        ctrl.journal(),
        &[
            SimCall::DisableIrq,
            SimCall::ClearStatus(0),
            SimCall::SetMask(0),
            SimCall::Deinit,
        ]
    );
    assert!(!ctrl.initialized);
}

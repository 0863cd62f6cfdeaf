//! Card session lifecycle: power, controller bring-up, mount and teardown.

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::{
    card_info::{read_card_info, CardIdentity},
    config::{duration_us, RetryPolicy},
    fs::{FatFs, FsError},
    hal::SdController,
    wait::{WaitEngine, WaitError},
};

mod machine;
mod power;

use machine::{SessionApplyStatus, SessionEngine, SessionEvent};
use power::{apply_power, SdPowerAction};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Disabled,
    Enabling,
    Enabled,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// Every mount attempt reported the card as not ready.
    NotFound,
    Error,
}

impl SessionError {
    pub const fn code(self) -> i32 {
        match self {
            Self::NotFound => -1,
            Self::Error => -2,
        }
    }

    fn from_mount(err: FsError) -> Self {
        match err {
            FsError::NotReady => Self::NotFound,
            _ => Self::Error,
        }
    }
}

/// One SD card slot: host controller, filesystem, optional power switch and
/// the delay source used for card timing.
///
/// `enable`, `disable` and `reset` must be called from the same context
/// that runs the file operations; they are not reentrant.
pub struct SdSession<'a, C, F, P, D>
where
    C: SdController,
    F: FatFs,
    P: OutputPin,
    D: DelayNs,
{
    controller: C,
    volume: F,
    power: Option<P>,
    delay: D,
    wait: &'a WaitEngine,
    policy: RetryPolicy,
    engine: SessionEngine,
}

impl<'a, C, F, P, D> SdSession<'a, C, F, P, D>
where
    C: SdController,
    F: FatFs,
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(
        controller: C,
        volume: F,
        power: Option<P>,
        delay: D,
        wait: &'a WaitEngine,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            controller,
            volume,
            power,
            delay,
            wait,
            policy,
            engine: SessionEngine::new(),
        }
    }

    /// Powers the card, brings up the controller and mounts the volume.
    ///
    /// Returns the number of retries the successful mount needed. When every
    /// attempt fails the session is left `Failed` with power still applied;
    /// `disable` or another `enable` recovers from there.
    pub fn enable(&mut self) -> Result<u8, SessionError> {
        self.dispatch(SessionEvent::EnableRequested);
        self.delay.delay_us(duration_us(self.policy.reenable_delay));

        self.controller.init();
        apply_power(self.power.as_mut(), SdPowerAction::On);
        self.wait.reset();
        self.controller.enable_irq();

        let attempts = self.policy.attempts();
        let settle_us = duration_us(self.policy.settle);
        let mut last_err = FsError::NotReady;
        for attempt in 0..attempts {
            // The power switch needs this long to settle before the card answers.
            self.delay.delay_us(settle_us);
            match self.volume.mount() {
                Ok(()) => {
                    log::info!("sdcard: mounted retries={}", attempt);
                    self.dispatch(SessionEvent::Mounted { retries: attempt });
                    return Ok(attempt);
                }
                Err(err) => {
                    log::debug!(
                        "sdcard: mount_retry attempt={}/{} err={:?}",
                        attempt + 1,
                        attempts,
                        err
                    );
                    last_err = err;
                }
            }
        }

        log::warn!("sdcard: mount failed attempts={} err={:?}", attempts, last_err);
        self.dispatch(SessionEvent::MountFailed);
        Err(SessionError::from_mount(last_err))
    }

    /// Unmounts, powers the card down and leaves the controller quiet but
    /// initialized.
    pub fn disable(&mut self) {
        if let Err(err) = self.volume.unmount() {
            log::warn!("sdcard: unmount ignored err={:?}", err);
        }
        self.controller.uninitialize_disk();
        apply_power(self.power.as_mut(), SdPowerAction::Off);
        self.controller.quiesce_interrupts();
        // The next enable fails unless the host registers are set up again
        // after power-down.
        self.controller.init();
        self.dispatch(SessionEvent::Disabled);
    }

    /// Power-cycles a wedged card: delay, disable, delay, enable.
    pub fn reset(&mut self) -> Result<u8, SessionError> {
        let settle_us = duration_us(self.policy.reset_delay);
        log::info!("sdcard: reset");
        self.delay.delay_us(settle_us);
        self.disable();
        self.delay.delay_us(settle_us);
        self.enable()
    }

    pub fn phase(&self) -> SessionPhase {
        self.engine.phase()
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.engine.phase(), SessionPhase::Enabled)
    }

    /// Retries used by the most recent successful mount.
    pub fn last_retries(&self) -> Option<u8> {
        self.engine.retries()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn card_detected(&mut self) -> bool {
        self.controller.card_detected()
    }

    pub fn card_info(&mut self) -> CardIdentity {
        read_card_info(&mut self.controller)
    }

    /// The mounted volume, `None` unless the session is enabled.
    pub fn volume(&mut self) -> Option<&mut F> {
        if self.is_enabled() {
            Some(&mut self.volume)
        } else {
            None
        }
    }

    pub fn controller(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Arms the completion interrupt for `event_mask` and spins until the
    /// handler reports it, returning the controller status bits.
    pub fn wait_for_event(&mut self, event_mask: u32) -> Result<u32, WaitError> {
        self.wait.arm(&mut self.controller, event_mask)?;
        self.wait.block_until_signaled(&mut self.controller)
    }

    /// Shuts the controller down and hands the parts back.
    pub fn release(mut self) -> (C, F, Option<P>, D) {
        self.controller.quiesce_interrupts();
        self.controller.deinit();
        log::info!("sdcard: released phase={:?}", self.engine.phase());
        (self.controller, self.volume, self.power, self.delay)
    }

    fn dispatch(&mut self, event: SessionEvent) {
        if self.engine.apply(event) == SessionApplyStatus::InvalidTransition {
            log::warn!(
                "sdcard: session event rejected event={:?} phase={:?}",
                event,
                self.engine.phase()
            );
        }
    }
}

#[cfg(test)]
mod tests;

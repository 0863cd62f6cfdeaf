//! Interrupt-driven wait for SD/MMC command completion.
//!
//! The interrupt handler only masks its line and raises the signal; every
//! register read happens on the waiting side. Exactly one wait may be
//! outstanding: [`WaitEngine::arm`] refuses a second arm until the first one
//! has been consumed.
//!
//! Neither wait has a timeout. A controller that never raises the armed
//! interrupt hangs the caller, so a watchdog above this layer has to cover
//! that case.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::{
    blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex},
    signal::Signal,
};

use crate::hal::SdInterrupts;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitError {
    AlreadyArmed,
    NotArmed,
}

pub struct WaitEngine<M: RawMutex = CriticalSectionRawMutex> {
    signal: Signal<M, ()>,
    armed: AtomicBool,
    event_mask: AtomicU32,
}

impl<M: RawMutex> WaitEngine<M> {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
            armed: AtomicBool::new(false),
            event_mask: AtomicU32::new(0),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub fn event_mask(&self) -> u32 {
        self.event_mask.load(Ordering::Acquire)
    }

    /// Drops any stale signal and forgets an abandoned wait.
    pub fn reset(&self) {
        self.signal.reset();
        self.event_mask.store(0, Ordering::Release);
        self.armed.store(false, Ordering::Release);
    }

    pub fn arm<I: SdInterrupts>(&self, irq: &mut I, event_mask: u32) -> Result<(), WaitError> {
        if self.is_armed() {
            return Err(WaitError::AlreadyArmed);
        }
        irq.clear_pending_irq();
        self.signal.reset();
        self.event_mask.store(event_mask, Ordering::Release);
        self.armed.store(true, Ordering::Release);
        irq.set_interrupt_mask(event_mask);
        irq.enable_irq();
        Ok(())
    }

    /// Spins until the interrupt handler fires, then returns the captured
    /// controller status bits.
    pub fn block_until_signaled<I: SdInterrupts>(&self, irq: &mut I) -> Result<u32, WaitError> {
        if !self.is_armed() {
            return Err(WaitError::NotArmed);
        }
        while self.signal.try_take().is_none() {
            core::hint::spin_loop();
        }
        Ok(self.finish(irq))
    }

    /// Same contract as [`Self::block_until_signaled`] for callers running
    /// on an executor.
    pub async fn wait_signaled<I: SdInterrupts>(&self, irq: &mut I) -> Result<u32, WaitError> {
        if !self.is_armed() {
            return Err(WaitError::NotArmed);
        }
        self.signal.wait().await;
        Ok(self.finish(irq))
    }

    /// Body of the controller interrupt handler. `disable_line` masks the
    /// interrupt at the interrupt controller.
    pub fn on_interrupt<F>(&self, disable_line: F)
    where
        F: FnOnce(),
    {
        disable_line();
        self.signal.signal(());
    }

    fn finish<I: SdInterrupts>(&self, irq: &mut I) -> u32 {
        let status = irq.interrupt_status();
        irq.clear_interrupt_status(status);
        irq.set_interrupt_mask(0);
        self.armed.store(false, Ordering::Release);
        status
    }
}

impl<M: RawMutex> Default for WaitEngine<M> {
    fn default() -> Self {
        Self::new()
    }
}

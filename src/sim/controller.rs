use embedded_hal::{
    delay::DelayNs,
    digital::{Error as DigitalError, ErrorKind, ErrorType, OutputPin},
};
use heapless::Vec;

use crate::{
    config::SD_CID_LEN,
    hal::{SdController, SdInterrupts},
};

const SIM_JOURNAL_MAX: usize = 64;
const SIM_DELAY_LOG_MAX: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimCall {
    Init,
    Deinit,
    UninitializeDisk,
    EnableIrq,
    DisableIrq,
    ClearPendingIrq,
    SetMask(u32),
    ClearStatus(u32),
    ReadCid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimError {
    CidUnavailable,
}

pub struct SimController {
    pub status: u32,
    pub mask: u32,
    pub irq_enabled: bool,
    pub present: bool,
    pub cid: Option<[u8; SD_CID_LEN]>,
    pub initialized: bool,
    journal: Vec<SimCall, SIM_JOURNAL_MAX>,
}

impl SimController {
    pub fn new() -> Self {
        Self {
            status: 0,
            mask: 0,
            irq_enabled: false,
            present: true,
            cid: None,
            initialized: false,
            journal: Vec::new(),
        }
    }

    pub fn with_cid(mut self, cid: [u8; SD_CID_LEN]) -> Self {
        self.cid = Some(cid);
        self
    }

    pub fn journal(&self) -> &[SimCall] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn count(&self, call: SimCall) -> usize {
        self.journal.iter().filter(|&&c| c == call).count()
    }

    fn record(&mut self, call: SimCall) {
        // Keeps the most recent calls.
        if self.journal.is_full() {
            self.journal.remove(0);
        }
        let _ = self.journal.push(call);
    }
}

impl Default for SimController {
    fn default() -> Self {
        Self::new()
    }
}

impl SdInterrupts for SimController {
    fn interrupt_status(&mut self) -> u32 {
        self.status
    }

    fn clear_interrupt_status(&mut self, bits: u32) {
        self.status &= !bits;
        self.record(SimCall::ClearStatus(bits));
    }

    fn set_interrupt_mask(&mut self, mask: u32) {
        self.mask = mask;
        self.record(SimCall::SetMask(mask));
    }

    fn enable_irq(&mut self) {
        self.irq_enabled = true;
        self.record(SimCall::EnableIrq);
    }

    fn disable_irq(&mut self) {
        self.irq_enabled = false;
        self.record(SimCall::DisableIrq);
    }

    fn clear_pending_irq(&mut self) {
        self.record(SimCall::ClearPendingIrq);
    }
}

impl SdController for SimController {
    type Error = SimError;

    fn init(&mut self) {
        self.initialized = true;
        self.record(SimCall::Init);
    }

    fn deinit(&mut self) {
        self.initialized = false;
        self.record(SimCall::Deinit);
    }

    fn card_detected(&mut self) -> bool {
        self.present
    }

    fn uninitialize_disk(&mut self) {
        self.record(SimCall::UninitializeDisk);
    }

    fn read_cid(&mut self) -> Result<[u8; SD_CID_LEN], Self::Error> {
        self.record(SimCall::ReadCid);
        self.cid.ok_or(SimError::CidUnavailable)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimPinError;

impl DigitalError for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Default)]
pub struct SimPin {
    pub high: bool,
    pub fail: bool,
    pub transitions: u8,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    fn drive(&mut self, high: bool) -> Result<(), SimPinError> {
        if self.fail {
            return Err(SimPinError);
        }
        if self.high != high {
            self.transitions = self.transitions.saturating_add(1);
        }
        self.high = high;
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = SimPinError;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct SimDelay {
    log: Vec<u32, SIM_DELAY_LOG_MAX>,
    total_us: u64,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays_us(&self) -> &[u32] {
        &self.log
    }

    pub fn total_us(&self) -> u64 {
        self.total_us
    }

    fn record_us(&mut self, us: u32) {
        self.total_us = self.total_us.saturating_add(us as u64);
        let _ = self.log.push(us);
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.record_us(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.record_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record_us(ms.saturating_mul(1_000));
    }
}

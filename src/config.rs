use embassy_time::Duration;

pub const SD_MOUNT_MAX_ATTEMPTS: u8 = 5;
// Power switch rise time is 2.5 ms; the card needs the rest to boot.
pub const SD_MOUNT_SETTLE_US: u64 = 4_000;
pub const SD_REENABLE_DELAY_MS: u64 = 10;
pub const SD_RESET_DELAY_MS: u64 = 100;

pub const SD_SECTOR_SIZE: usize = 512;
pub const SD_CID_LEN: usize = 16;

/// Longest 8.3 name: 8 base characters, the dot and 3 extension characters.
pub const FILENAME_MAX_LEN: usize = 8 + 1 + 3;
/// Longest `folder/name` pair where both sides are 8.3 names.
pub const PATHNAME_MAX_LEN: usize = (FILENAME_MAX_LEN * 2) + 4;
pub const SD_PATH_MAX: usize = 64;

/// Timing and retry budget used by [`crate::SdSession::enable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u8,
    pub settle: Duration,
    pub reenable_delay: Duration,
    pub reset_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u8, settle: Duration) -> Self {
        Self {
            max_attempts,
            settle,
            reenable_delay: Duration::from_millis(SD_REENABLE_DELAY_MS),
            reset_delay: Duration::from_millis(SD_RESET_DELAY_MS),
        }
    }

    pub const fn with_reenable_delay(mut self, delay: Duration) -> Self {
        self.reenable_delay = delay;
        self
    }

    pub const fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub(crate) fn attempts(&self) -> u8 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            SD_MOUNT_MAX_ATTEMPTS,
            Duration::from_micros(SD_MOUNT_SETTLE_US),
        )
    }
}

pub(crate) fn duration_us(duration: Duration) -> u32 {
    duration.as_micros().min(u32::MAX as u64) as u32
}

use crate::config::SD_CID_LEN;

/// Interrupt plumbing of the SD/MMC host controller.
///
/// `*_irq` methods act on the interrupt line at the interrupt controller,
/// the remaining methods act on the host controller's own status and mask
/// registers.
pub trait SdInterrupts {
    fn interrupt_status(&mut self) -> u32;
    fn clear_interrupt_status(&mut self, bits: u32);
    fn set_interrupt_mask(&mut self, mask: u32);
    fn enable_irq(&mut self);
    fn disable_irq(&mut self);
    fn clear_pending_irq(&mut self);
}

/// SD/MMC host controller used by the session.
pub trait SdController: SdInterrupts {
    type Error: core::fmt::Debug;

    fn init(&mut self);
    fn deinit(&mut self);
    fn card_detected(&mut self) -> bool;
    /// Drops the block-device state kept for the card.
    fn uninitialize_disk(&mut self);
    fn read_cid(&mut self) -> Result<[u8; SD_CID_LEN], Self::Error>;

    /// Clears whatever is pending and leaves every controller interrupt masked.
    fn quiesce_interrupts(&mut self) {
        self.disable_irq();
        let status = self.interrupt_status();
        self.clear_interrupt_status(status);
        self.set_interrupt_mask(0);
    }
}

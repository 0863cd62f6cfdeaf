use embedded_hal::digital::{Error as _, OutputPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SdPowerAction {
    On,
    Off,
}

/// Drives the card power switch. Boards without a switch pass `None`.
///
/// A pin error is logged and otherwise ignored; neither enable nor disable
/// has a recovery path for it.
pub(super) fn apply_power<P: OutputPin>(pin: Option<&mut P>, action: SdPowerAction) {
    let Some(pin) = pin else {
        return;
    };
    let result = match action {
        SdPowerAction::On => pin.set_high(),
        SdPowerAction::Off => pin.set_low(),
    };
    if let Err(err) = result {
        log::warn!("sdcard: power action={:?} err={:?}", action, err.kind());
    }
}

//! Card identification (CID) register decode.

use crate::{config::SD_CID_LEN, hal::SdController};

/// Decoded CID register. `valid == false` means the register could not be
/// read and every other field is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardIdentity {
    pub serial: u32,
    pub year: u16,
    pub month: u8,
    pub version_major: u8,
    pub version_minor: u8,
    pub manufacturer_id: u8,
    pub oem_id: [u8; 2],
    pub product_name: [u8; 5],
    pub valid: bool,
}

impl CardIdentity {
    /// Decodes the register as returned by the controller, most significant
    /// byte last.
    pub fn from_cid(cid: &[u8; SD_CID_LEN]) -> Self {
        Self {
            serial: u32::from_be_bytes([cid[6], cid[5], cid[4], cid[3]]),
            year: 2000 + u16::from(((cid[2] & 0x0F) << 4) | (cid[1] >> 4)),
            month: cid[1] & 0x0F,
            version_major: cid[7] >> 4,
            version_minor: cid[7] & 0x0F,
            manufacturer_id: cid[15],
            oem_id: [cid[14], cid[13]],
            product_name: [cid[12], cid[11], cid[10], cid[9], cid[8]],
            valid: true,
        }
    }

    pub fn oem(&self) -> &str {
        ascii_field(&self.oem_id)
    }

    pub fn product(&self) -> &str {
        ascii_field(&self.product_name)
    }
}

fn ascii_field(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end]).unwrap_or("")
}

/// Reads and decodes the CID of the card behind `controller`.
pub fn read_card_info<C: SdController>(controller: &mut C) -> CardIdentity {
    match controller.read_cid() {
        Ok(cid) => {
            let info = CardIdentity::from_cid(&cid);
            log::info!(
                "sdcard: cid mid={:#04x} oem={} pnm={} rev={}.{} sn={:#010x} date={}-{:02}",
                info.manufacturer_id,
                info.oem(),
                info.product(),
                info.version_major,
                info.version_minor,
                info.serial,
                info.year,
                info.month
            );
            info
        }
        Err(err) => {
            log::warn!("sdcard: cid read failed err={:?}", err);
            CardIdentity::default()
        }
    }
}

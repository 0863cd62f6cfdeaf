//! Host-side stand-ins for the card hardware and the filesystem library.
//!
//! Everything here is fixed-capacity so host harnesses and tests can drive
//! the session and the file utilities without an allocator.

mod controller;
mod volume;

pub use controller::{SimCall, SimController, SimDelay, SimError, SimPin, SimPinError};
pub use volume::{MemDir, MemFile, MemVolume, SIM_FILE_MAX, SIM_MAX_NODES};

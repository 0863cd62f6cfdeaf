#![cfg_attr(not(test), no_std)]

pub mod card_info;
pub mod config;
pub mod dir;
pub mod files;
pub mod fs;
pub mod hal;
pub mod mover;
pub mod path;
pub mod session;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod wait;

pub use card_info::{read_card_info, CardIdentity};
pub use config::{RetryPolicy, FILENAME_MAX_LEN, PATHNAME_MAX_LEN, SD_PATH_MAX};
pub use dir::{iterate_dir, listing_names, scan_dir, DirError};
pub use fs::{DirEntry, FatFs, FsError, OpenMode, VolumeStats};
pub use hal::{SdController, SdInterrupts};
pub use mover::{folder_create_and_count, move_file, MoveError};
pub use path::{join, PathBuffer};
pub use session::{SdSession, SessionError, SessionPhase};
pub use wait::{WaitEngine, WaitError};

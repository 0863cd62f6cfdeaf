use heapless::{String, Vec};

use super::*;
use crate::{fs::VolumeStats, sim::MemVolume};

const CONFIG: &[u8] = b"ssid=meadow\npass=quiet\nchannel=6\nmode=ap\n";

fn config_volume() -> MemVolume {
    let mut volume = MemVolume::mounted();
    volume.insert_dir("CONFIG").unwrap();
    volume.insert_file("CONFIG/WIFI.CFG", CONFIG).unwrap();
    volume
}

#[test]
fn read_lines_visits_every_line_with_newline() {
    let mut volume = config_volume();
    let mut buf = [0u8; 32];
    let mut lines: Vec<String<32>, 8> = Vec::new();
    read_lines(&mut volume, "CONFIG/WIFI.CFG", &mut buf, |line| {
        let _ = lines.push(String::try_from(line).unwrap());
        true
    })
    .unwrap();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0].as_str(), "ssid=meadow\n");
    assert_eq!(lines[3].as_str(), "mode=ap\n");
    assert_eq!(volume.open_handles(), 0);
}

#[test]
fn read_lines_stops_when_handler_declines() {
    let mut volume = config_volume();
    let mut buf = [0u8; 32];
    let mut seen = 0usize;
    read_lines(&mut volume, "CONFIG/WIFI.CFG", &mut buf, |_| {
        seen += 1;
        seen < 3
    })
    .unwrap();

    assert_eq!(seen, 3);
    assert_eq!(volume.line_reads(), 3);
    assert_eq!(volume.open_handles(), 0);
}

#[test]
fn read_lines_splits_lines_longer_than_buffer() {
    let mut volume = config_volume();
    let mut buf = [0u8; 6];
    let mut first: String<8> = String::new();
    read_lines(&mut volume, "CONFIG/WIFI.CFG", &mut buf, |line| {
        first.push_str(line).unwrap();
        false
    })
    .unwrap();
    assert_eq!(first.as_str(), "ssid=");
}

#[test]
fn read_lines_on_missing_file_fails_without_handle() {
    let mut volume = config_volume();
    let mut buf = [0u8; 16];
    assert_eq!(
        read_lines(&mut volume, "CONFIG/NONE.CFG", &mut buf, |_| true),
        Err(FsError::NotFound)
    );
    assert_eq!(volume.open_handles(), 0);
}

#[test]
fn exists_and_size_report_files() {
    let mut volume = config_volume();
    assert!(file_exists(&mut volume, "CONFIG/WIFI.CFG"));
    assert!(!file_exists(&mut volume, "CONFIG/OTHER.CFG"));
    assert_eq!(file_size(&mut volume, "CONFIG/WIFI.CFG"), CONFIG.len() as u32);
    assert_eq!(file_size(&mut volume, "CONFIG/OTHER.CFG"), 0);
    assert_eq!(volume.open_handles(), 0);
}

#[test]
fn append_creates_then_extends() {
    let mut volume = config_volume();
    volume.insert_dir("LOGS").unwrap();
    append_to_file(&mut volume, "LOGS/EVENTS.LOG", b"boot\n").unwrap();
    append_to_file(&mut volume, "LOGS/EVENTS.LOG", b"tap\n").unwrap();
    assert_eq!(
        volume.contents("LOGS/EVENTS.LOG"),
        Some(b"boot\ntap\n".as_slice())
    );
    assert_eq!(volume.open_handles(), 0);
}

#[test]
fn write_at_offset_overwrites_in_place() {
    let mut volume = config_volume();
    volume.insert_file("STATE.BIN", b"0123456789").unwrap();
    write_at_offset(&mut volume, "STATE.BIN", b"AB", 4).unwrap();
    assert_eq!(volume.contents("STATE.BIN"), Some(b"0123AB6789".as_slice()));
}

#[test]
fn write_at_offset_past_end_zero_fills() {
    let mut volume = config_volume();
    write_at_offset(&mut volume, "NEW.BIN", b"Z", 3).unwrap();
    assert_eq!(volume.contents("NEW.BIN"), Some(b"\0\0\0Z".as_slice()));
}

#[test]
fn create_file_truncates_existing() {
    let mut volume = config_volume();
    create_file(&mut volume, "CONFIG/WIFI.CFG").unwrap();
    assert_eq!(file_size(&mut volume, "CONFIG/WIFI.CFG"), 0);
}

#[test]
fn read_at_offset_reads_from_open_file() {
    let mut volume = config_volume();
    let mut file = volume.open("CONFIG/WIFI.CFG", OpenMode::Read).unwrap();
    let mut out = [0u8; 6];
    let read = read_at_offset(&mut volume, &mut file, 5, &mut out).unwrap();
    assert_eq!(&out[..read], b"meadow");
    let read = read_binary(&mut volume, &mut file, &mut out).unwrap();
    assert_eq!(&out[..read], b"\npass=");
    volume.close(file).unwrap();
}

#[test]
fn delete_dir_removes_files_then_folder() {
    let mut volume = config_volume();
    volume.insert_file("CONFIG/OLD.CFG", b"x").unwrap();
    delete_dir(&mut volume, "CONFIG").unwrap();
    assert!(!volume.exists("CONFIG"));
    assert!(!volume.exists("CONFIG/OLD.CFG"));
}

#[test]
fn delete_dir_of_missing_folder_succeeds() {
    let mut volume = config_volume();
    assert_eq!(delete_dir(&mut volume, "GHOST"), Ok(()));
}

#[test]
fn delete_dir_fails_with_non_empty_subfolder() {
    let mut volume = config_volume();
    volume.insert_dir("CONFIG/NESTED").unwrap();
    volume.insert_file("CONFIG/NESTED/KEEP.TXT", b"k").unwrap();
    assert_eq!(delete_dir(&mut volume, "CONFIG"), Err(FsError::Denied));
    assert!(volume.exists("CONFIG/NESTED/KEEP.TXT"));
    assert!(!volume.exists("CONFIG/WIFI.CFG"));
}

#[test]
fn free_space_uses_512_byte_sectors() {
    let mut volume = MemVolume::mounted();
    volume.set_stats(VolumeStats {
        free_clusters: 1_000,
        fat_entries: 30_002,
        sectors_per_cluster: 64,
    });
    assert_eq!(
        free_space(&mut volume),
        Ok(FreeSpace {
            free_mib: 31,
            total_mib: 937,
        })
    );
}

#[test]
fn free_space_fails_when_unmounted() {
    let mut volume = MemVolume::new();
    assert_eq!(free_space(&mut volume), Err(FsError::NotReady));
}

#[test]
fn format_wipes_volume() {
    let mut volume = config_volume();
    format(&mut volume).unwrap();
    assert!(!volume.exists("CONFIG"));
}

#[test]
fn utf8_prefix_drops_invalid_tail() {
    assert_eq!(utf8_prefix(b"ok\xFFtail"), "ok");
    assert_eq!(utf8_prefix(b"plain"), "plain");
}

#[test]
fn open_handle_reads_line_by_line() {
    let mut volume = config_volume();
    let mut file = open_file(&mut volume, "CONFIG/WIFI.CFG").unwrap();
    let mut buf = [0u8; 32];
    assert_eq!(
        read_file_line(&mut volume, &mut file, &mut buf),
        Ok(Some("ssid=meadow\n"))
    );
    assert_eq!(
        read_file_line(&mut volume, &mut file, &mut buf),
        Ok(Some("pass=quiet\n"))
    );
    assert_eq!(volume.open_handles(), 1);
    close_file(&mut volume, file).unwrap();
    assert_eq!(volume.open_handles(), 0);
}

#[test]
fn read_file_line_reports_end_of_file() {
    let mut volume = config_volume();
    volume.insert_file("EMPTY.TXT", b"").unwrap();
    let mut file = open_file(&mut volume, "EMPTY.TXT").unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(read_file_line(&mut volume, &mut file, &mut buf), Ok(None));
    close_file(&mut volume, file).unwrap();
    assert!(matches!(
        open_file(&mut volume, "MISSING.TXT"),
        Err(FsError::NotFound)
    ));
}

#[test]
fn delete_dir_empties_deep_folder() {
    let mut volume = MemVolume::mounted();
    let mut dir: String<64> = String::new();
    for segment in ["FOLDER01", "FOLDER02", "FOLDER03", "FOLDER04", "FOLDER05", "FOLDER06"] {
        if !dir.is_empty() {
            dir.push('/').unwrap();
        }
        dir.push_str(segment).unwrap();
        volume.insert_dir(&dir).unwrap();
    }
    let mut file = dir.clone();
    file.push_str("/ABCDEF.TXT").unwrap();
    volume.insert_file(&file, b"x").unwrap();

    delete_dir(&mut volume, &dir).unwrap();
    assert!(!volume.exists(&file));
    assert!(!volume.exists(&dir));
}

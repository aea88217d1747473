//! Fake converters for tests.
//!
//! The scripts follow the converter calling convention:
//! `<converter> <config.ini> <input> <output>`.

use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script with the given body
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "{}", body).unwrap();
        file.sync_all().unwrap();
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// A converter that logs every conversion to `log` and copies input to output
#[cfg(unix)]
pub fn copying_converter(dir: &Path, log: &Path) -> PathBuf {
    let path = dir.join("mdf2mat");
    write_script(
        &path,
        &format!(
            "if [ \"$1\" = \"-h\" ]; then echo \"MDF2MAT V2.0 (2021-01-01)\"; exit 0; fi\n\
             echo \"$2\" >> \"{log}\"\n\
             cp \"$2\" \"$3\"",
            log = log.display()
        ),
    );
    path
}

/// A converter that reports the input as unreadable and writes nothing
#[cfg(unix)]
pub fn unreadable_converter(dir: &Path) -> PathBuf {
    let path = dir.join("mdf2mat");
    write_script(&path, "echo \"Error: cannot open input file $2\"\nexit 0");
    path
}

/// A converter that exits without producing output
#[cfg(unix)]
pub fn silent_converter(dir: &Path) -> PathBuf {
    let path = dir.join("mdf2mat");
    write_script(&path, "exit 0");
    path
}

/// A converter that never returns
#[cfg(unix)]
pub fn hanging_converter(dir: &Path) -> PathBuf {
    let path = dir.join("mdf2mat");
    write_script(&path, "sleep 30");
    path
}

/// Number of conversions recorded in a fake converter log
pub fn invocations(log: &Path) -> usize {
    std::fs::read_to_string(log)
        .map(|content| content.lines().count())
        .unwrap_or(0)
}

/// Write a file of exactly `size` bytes
pub fn write_sized(path: &Path, size: usize) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, vec![0u8; size]).unwrap();
}

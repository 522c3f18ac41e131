//! Small file helpers for dumping payloads to disk.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Write `data` to the file at `path`.
///
/// `append` adds to an existing file and wins over `overwrite` when both are
/// set. With neither flag, an existing file fails with
/// [`io::ErrorKind::AlreadyExists`].
pub fn write_to_file(path: &Path, data: &[u8], append: bool, overwrite: bool) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if append {
        options.append(true).create(true);
    } else if overwrite {
        options.truncate(true).create(true);
    } else {
        options.create_new(true);
    }

    let mut file = options.open(path)?;
    file.write_all(data)
}

/// Write `data` to an arbitrary stream.
pub fn write_to_stream<W: Write>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    writer.write_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("picoproj-util-{}-{name}", std::process::id()));
        path
    }

    #[test]
    fn test_existing_file_without_flags_fails() {
        let path = temp_path("exists");
        fs::write(&path, b"first").unwrap();

        let err = write_to_file(&path, b"second", false, false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path).unwrap(), b"first");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_overwrite_replaces_contents() {
        let path = temp_path("overwrite");
        fs::write(&path, b"old contents").unwrap();

        write_to_file(&path, b"new", false, true).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_wins_over_overwrite() {
        let path = temp_path("append");
        fs::write(&path, b"head-").unwrap();

        write_to_file(&path, b"tail", true, true).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"head-tail");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_creates_missing_file() {
        let path = temp_path("fresh");
        let _ = fs::remove_file(&path);

        write_to_file(&path, b"payload", false, false).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"payload");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_to_stream() {
        let mut sink = Vec::new();
        write_to_stream(&mut sink, &[0x02, 0x00, 0x17]).unwrap();
        assert_eq!(sink, vec![0x02, 0x00, 0x17]);
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Write-once persistence for the bootstrap token and token secrets files.

use crate::constants::COMMENT_MARKER;
use crate::error::{AclInitError, Result};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;
use tracing::{debug, instrument};

/// Check whether anything exists at `path`
pub fn exists(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}

/// Fail with a precondition error if `path` already exists
pub fn ensure_absent(path: &Path) -> Result<()> {
    if exists(path) {
        return Err(AclInitError::Precondition(format!(
            "file named [{}] already exists",
            path.display()
        )));
    }
    Ok(())
}

/// Create `path` with `mode` permissions and write `content` to it.
///
/// The file is opened with `create_new`, so an existing file is never
/// truncated; the call fails instead. Content is synced to disk before
/// returning.
#[instrument(skip(content))]
pub fn write_once(path: &Path, content: &[u8], mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path).map_err(|e| {
        if e.kind() == ErrorKind::AlreadyExists {
            AclInitError::Precondition(format!("file named [{}] already exists", path.display()))
        } else {
            AclInitError::io(path, e)
        }
    })?;

    file.write_all(content)
        .and_then(|_| file.sync_all())
        .map_err(|e| AclInitError::io(path, e))?;

    debug!("Wrote {} bytes", content.len());
    Ok(())
}

/// Return the first line that is neither blank nor a comment, trimmed.
/// Returns an empty string when no such line exists.
pub fn read_first_significant_line(path: &Path) -> Result<String> {
    let file = fs::File::open(path).map_err(|e| AclInitError::io(path, e))?;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| AclInitError::io(path, e))?;
        if line.starts_with(COMMENT_MARKER) || line.trim().is_empty() {
            continue;
        }
        return Ok(line.trim().to_string());
    }

    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_first_significant_line_skips_comments_and_blanks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "# comment\n\n  \nABCDEF\n").unwrap();

        assert_eq!(read_first_significant_line(&path).unwrap(), "ABCDEF");
    }

    #[test]
    fn test_read_first_significant_line_trims() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "\t  secret-value  \nsecond\n").unwrap();

        assert_eq!(read_first_significant_line(&path).unwrap(), "secret-value");
    }

    #[test]
    fn test_read_first_significant_line_indented_hash_is_not_comment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "  #not-a-comment\n").unwrap();

        assert_eq!(read_first_significant_line(&path).unwrap(), "#not-a-comment");
    }

    #[test]
    fn test_read_first_significant_line_only_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "# one\n#two\n\n").unwrap();

        assert_eq!(read_first_significant_line(&path).unwrap(), "");
    }

    #[test]
    fn test_read_first_significant_line_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_first_significant_line(&dir.path().join("missing")).unwrap_err();

        assert!(matches!(err, AclInitError::Io { .. }));
    }

    #[test]
    fn test_write_once_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");

        write_once(&path, b"{}\n", 0o600).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_once_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("bootstrap.token");

        write_once(&path, b"secret\n", 0o600).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_write_once_refuses_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        fs::write(&path, "original").unwrap();

        let err = write_once(&path, b"replacement", 0o600).unwrap_err();

        assert!(matches!(err, AclInitError::Precondition(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_ensure_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");

        assert!(ensure_absent(&path).is_ok());
        fs::write(&path, "x").unwrap();
        assert!(exists(&path));
        assert!(matches!(
            ensure_absent(&path),
            Err(AclInitError::Precondition(_))
        ));
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Whether an error means "nothing at this path" rather than a real failure.
///
/// Covers `ENOENT` and `ENOTDIR` (a path component is a regular file).
#[must_use]
pub fn is_missing(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }

    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::ENOTDIR)
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Check whether `path` names a regular file or a FIFO (symlinks are followed).
///
/// # Errors
/// Returns an error for stat failures other than a missing path.
pub fn is_file(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file() || is_fifo(&meta)),
        Err(err) if is_missing(&err) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Check whether `path` names a directory (symlinks are followed).
///
/// # Errors
/// Returns an error for stat failures other than a missing path.
pub fn is_dir(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_dir()),
        Err(err) if is_missing(&err) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Resolve symlinks in `path`. A path that does not exist is returned unchanged.
///
/// # Errors
/// Returns an error for failures other than a missing path.
pub fn realpath(path: &Path) -> io::Result<PathBuf> {
    match dunce::canonicalize(path) {
        Ok(real) => Ok(real),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn is_fifo(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    meta.file_type().is_fifo()
}

#[cfg(not(unix))]
fn is_fifo(_meta: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_read_to_string_lossy_valid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"name":"a"}"#).unwrap();
        file.flush().unwrap();

        let content = read_to_string_lossy(file.path()).unwrap();
        assert_eq!(content, r#"{"name":"a"}"#);
    }

    #[test]
    fn test_read_to_string_lossy_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x48, 0x65, 0x6c, 0x6c, 0x6f, 0x80, 0x81])
            .unwrap();
        file.flush().unwrap();

        let content = read_to_string_lossy(file.path()).unwrap();
        assert!(content.starts_with("Hello"));
        assert!(content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_is_file_and_is_dir() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("index.js");
        fs::write(&file, "").unwrap();

        assert!(is_file(&file).unwrap());
        assert!(!is_dir(&file).unwrap());
        assert!(is_dir(dir.path()).unwrap());
        assert!(!is_file(dir.path()).unwrap());
    }

    #[test]
    fn test_missing_paths_are_not_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.js");
        assert!(!is_file(&missing).unwrap());
        assert!(!is_dir(&missing).unwrap());

        // A regular file used as a directory component (ENOTDIR)
        let file = dir.path().join("file.js");
        fs::write(&file, "").unwrap();
        assert!(!is_file(&file.join("child.js")).unwrap());
        assert!(!is_dir(&file.join("child")).unwrap());
    }

    #[test]
    fn test_realpath_missing_returns_input() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert_eq!(realpath(&missing).unwrap(), missing);
    }

    #[cfg(unix)]
    #[test]
    fn test_realpath_follows_symlink() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(
            realpath(&link).unwrap(),
            dunce::canonicalize(&target).unwrap()
        );
    }
}

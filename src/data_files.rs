use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Where load-file requests find their encrypted audio.
pub trait FileStore: Send + Sync {
    fn read_file(&self, name: &[u8]) -> Option<Vec<u8>>;
}

pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Requested names must stay inside the data directory.
fn is_plain_name(name: &[u8]) -> bool {
    !name.is_empty()
        && !name.iter().any(|&b| b == b'/' || b == b'\\')
        && !name.windows(2).any(|w| w == b"..")
}

#[cfg(unix)]
fn file_name(name: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(name)))
}

#[cfg(not(unix))]
fn file_name(name: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(name).ok().map(PathBuf::from)
}

impl FileStore for DataDir {
    fn read_file(&self, name: &[u8]) -> Option<Vec<u8>> {
        let Some(file) = file_name(name).filter(|_| is_plain_name(name)) else {
            warn!(
                "Refusing to read {:?} outside {:?}",
                String::from_utf8_lossy(name),
                self.root
            );
            return None;
        };

        let path = self.root.join(file);
        match fs::read(&path) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Couldn't open {:?}: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names() {
        assert!(is_plain_name(b"JA10.DAT"));
        assert!(!is_plain_name(b""));
        assert!(!is_plain_name(b"../secret"));
        assert!(!is_plain_name(b"a/b.dat"));
        assert!(!is_plain_name(b"a\\b.dat"));
    }

    #[test]
    fn test_read_file() {
        let dir = std::env::temp_dir().join(format!("msuserver-data-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("VER001.DAT"), [1u8, 2, 3]).unwrap();

        let store = DataDir::new(&dir);
        assert_eq!(store.read_file(b"VER001.DAT"), Some(vec![1, 2, 3]));
        assert_eq!(store.read_file(b"MISSING.DAT"), None);
        assert_eq!(store.read_file(b"../VER001.DAT"), None);
    }
}

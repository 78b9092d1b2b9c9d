use itertools::Itertools;
use num_traits::Num;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use tracing::debug;

use crate::outcome::ResourceRange;
use crate::target::Target;

#[derive(Debug, ThisError)]
pub enum BackendError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unexpected content in {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl BackendError {
    fn io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => BackendError::NotFound(path.to_path_buf()),
            _ => BackendError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

pub trait Backend {
    fn list_dir(&self, target: &Target) -> Result<Vec<String>, BackendError>;

    fn write_file(&self, target: &Target, bytes: &[u8]) -> Result<(), BackendError>;

    /// Reads the leading `0x`-prefixed hexadecimal token of a file.
    fn read_token(&self, target: &Target) -> Result<i64, BackendError>;

    /// Reads up to `max_lines` lines of `start end flags` triples.
    fn read_resources(
        &self,
        target: &Target,
        max_lines: usize,
    ) -> Result<Vec<ResourceRange>, BackendError>;

    /// `None` if nothing exists at the target.
    fn canonicalize(&self, target: &Target) -> Result<Option<PathBuf>, BackendError>;
}

/// [`Backend`] over a sysfs tree, `/sys/bus/pci` in production.
#[derive(Debug, Clone)]
pub struct Sysfs {
    root: PathBuf,
}

impl Sysfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_to_string(&self, target: &Target) -> Result<(PathBuf, String), BackendError> {
        let path = target.resolve(&self.root);
        let text = fs::read_to_string(&path).map_err(|e| BackendError::io(&path, e))?;
        Ok((path, text))
    }
}

impl Backend for Sysfs {
    fn list_dir(&self, target: &Target) -> Result<Vec<String>, BackendError> {
        let path = target.resolve(&self.root);
        debug!(path = %path.display(), "listing directory");

        fs::read_dir(&path)
            .map_err(|e| BackendError::io(&path, e))?
            .map(|entry| {
                entry
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .map_err(|e| BackendError::io(&path, e))
            })
            .collect()
    }

    fn write_file(&self, target: &Target, bytes: &[u8]) -> Result<(), BackendError> {
        let path = target.resolve(&self.root);
        debug!(path = %path.display(), len = bytes.len(), "writing file");

        // sysfs attributes already exist; never create files.
        let mut file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| BackendError::io(&path, e))?;
        file.write_all(bytes).map_err(|e| BackendError::io(&path, e))
    }

    fn read_token(&self, target: &Target) -> Result<i64, BackendError> {
        let (path, text) = self.read_to_string(target)?;

        text.split_whitespace()
            .next()
            .and_then(parse_hex)
            .ok_or_else(|| BackendError::Malformed {
                path,
                reason: "expected a 0x-prefixed hexadecimal value".to_string(),
            })
    }

    fn read_resources(
        &self,
        target: &Target,
        max_lines: usize,
    ) -> Result<Vec<ResourceRange>, BackendError> {
        let (_, text) = self.read_to_string(target)?;
        Ok(parse_resources(&text, max_lines))
    }

    fn canonicalize(&self, target: &Target) -> Result<Option<PathBuf>, BackendError> {
        let path = target.resolve(&self.root);

        // A dangling symlink still counts as present; resolving it is then an error.
        match fs::symlink_metadata(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::io(&path, e)),
        }

        fs::canonicalize(&path)
            .map(Some)
            .map_err(|source| BackendError::Io { path, source })
    }
}

pub fn parse_hex<T: Num>(token: &str) -> Option<T> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))?;
    // from_str_radix would take a sign.
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    T::from_str_radix(digits, 16).ok()
}

pub fn parse_resources(text: &str, max_lines: usize) -> Vec<ResourceRange> {
    text.lines()
        .take(max_lines)
        .filter_map(|line| {
            let (start, end, flags) = line.split_whitespace().collect_tuple()?;
            Some(ResourceRange {
                start: parse_hex(start)?,
                end: parse_hex(end)?,
                flags: parse_hex(flags)?,
            })
        })
        .collect()
}

// ABOUTME: One-file-per-user store that saves and loads User records as CSV rows.
// ABOUTME: Resolves handles to paths, writes via temp file and rename, and maps errors.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use letterbox_core::{CodecError, Record, User, decode_user, encode_user};
use thiserror::Error;

use crate::config::StoreConfig;

/// Errors that can occur during user store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no user file for handle {0:?}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(csv::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("invalid handle {0:?}")]
    InvalidHandle(String),
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        let io_kind = match err.kind() {
            csv::ErrorKind::Io(inner) => Some(inner.kind()),
            _ => None,
        };
        match io_kind {
            Some(kind) => StoreError::Io(io::Error::new(kind, err)),
            None => StoreError::Csv(err),
        }
    }
}

/// Saves and loads users, one CSV file per handle under a single directory.
pub struct UserStore {
    config: StoreConfig,
}

impl UserStore {
    /// Create a store over an existing directory. Touches nothing on disk.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Create a store, creating the user directory if it does not exist.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.dir)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Return the directory holding user files.
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Path of the file backing `handle`: `<dir>/<handle><extension>`.
    pub fn path_for(&self, handle: &str) -> Result<PathBuf, StoreError> {
        self.validate_handle(handle)?;
        Ok(self
            .config
            .dir
            .join(format!("{}{}", handle, self.config.extension)))
    }

    /// A handle becomes a file name, so it must be non-empty, free of path
    /// separators, and must not contain the storage extension.
    pub(crate) fn validate_handle(&self, handle: &str) -> Result<(), StoreError> {
        if handle.is_empty()
            || handle.contains(&['/', '\\'][..])
            || handle.contains(self.config.extension.as_str())
        {
            return Err(StoreError::InvalidHandle(handle.to_string()));
        }
        Ok(())
    }

    /// Write `user` to its file, replacing any previous content. Rows are
    /// written to a sibling temp file, fsynced, then renamed into place.
    /// The caller's collections keep their order.
    pub fn save(&self, user: &User) -> Result<(), StoreError> {
        let path = self.path_for(&user.handle)?;
        let tmp_path = path.with_file_name(format!(
            "{}{}.tmp",
            user.handle, self.config.extension
        ));

        let records = encode_user(user);
        if let Err(e) = write_rows(&tmp_path, &records) {
            // The target file is untouched; drop the partial temp file.
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!(
            "saved user {} ({} rows) to {}",
            user.handle,
            records.len(),
            path.display()
        );
        Ok(())
    }

    /// Read and decode the user stored under `handle`. Fields are read as
    /// raw bytes; invalid UTF-8 is replaced with U+FFFD rather than failing.
    pub fn load(&self, handle: &str) -> Result<User, StoreError> {
        let path = self.path_for(handle)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(handle.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        let rows = reader
            .byte_records()
            .collect::<Result<Vec<csv::ByteRecord>, _>>()?;

        let user = decode_user(rows.iter().map(|row| {
            row.iter()
                .map(String::from_utf8_lossy)
                .collect::<Vec<_>>()
        }))?;

        tracing::debug!(
            "loaded user {} ({} rows) from {}",
            handle,
            rows.len(),
            path.display()
        );
        Ok(user)
    }

    /// Whether a file exists for `handle`.
    pub fn exists(&self, handle: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(handle)?.is_file())
    }

    /// Remove the file for `handle`.
    pub fn delete(&self, handle: &str) -> Result<(), StoreError> {
        let path = self.path_for(handle)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("deleted user {} at {}", handle, path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Write every record as one comma-separated line and fsync the file.
fn write_rows(path: &Path, records: &[Record]) -> Result<(), StoreError> {
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);

    for record in records {
        writer.write_record(record.to_fields())?;
    }

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

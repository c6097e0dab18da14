use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} does not hold a top-level JSON array")]
    NotAnArray(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes scraped records as pretty-printed JSON files in one directory.
#[derive(Debug, Clone)]
pub struct RecordSink {
    dir: PathBuf,
}

impl RecordSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Serializes `records` into `<dir>/<name>`, replacing any existing file.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        records: &T,
        name: &str,
    ) -> Result<PathBuf, SinkError> {
        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(records)?;
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        fs::write(&path, json).map_err(io_error(&path))?;
        Ok(path)
    }

    /// Like [`RecordSink::write`], but logs failures instead of returning them.
    pub fn flush<T: Serialize + ?Sized>(&self, records: &T, name: &str) -> bool {
        match self.write(records, name) {
            Ok(path) => {
                log::info!("Data saved to {}", path.display());
                true
            }
            Err(e) => {
                log::error!("Error saving to {}: {}", name, e);
                false
            }
        }
    }
}

pub fn read_json(path: &Path) -> Result<Value, SinkError> {
    let raw = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Whether two JSON files hold structurally equal documents.
pub fn documents_equal(a: &Path, b: &Path) -> Result<bool, SinkError> {
    Ok(read_json(a)? == read_json(b)?)
}

/// Adds `key: value` to every object of the top-level array in `path` and
/// rewrites the file. Returns the number of objects stamped.
pub fn stamp_field(path: &Path, key: &str, value: &str) -> Result<usize, SinkError> {
    let mut document = read_json(path)?;
    let Some(items) = document.as_array_mut() else {
        return Err(SinkError::NotAnArray(path.to_path_buf()));
    };

    let mut stamped = 0;
    for item in items.iter_mut() {
        if let Some(object) = item.as_object_mut() {
            object.insert(key.to_string(), Value::String(value.to_string()));
            stamped += 1;
        }
    }

    let json = serde_json::to_string_pretty(&document)?;
    fs::write(path, json).map_err(io_error(path))?;
    Ok(stamped)
}

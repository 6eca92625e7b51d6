use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use repodump_error::SinkError;
use tracing::{debug, info};

use crate::codec::Document;

pub const DEFAULT_RAW_EXTENSION: &str = "cbor";
pub const DEFAULT_AGGREGATE_EXTENSION: &str = "json";

/// File name of the aggregate for `record_type`: dots and path separators
/// become underscores.
pub fn aggregate_file_name(
    record_type: &str,
    extension: &str,
) -> String {
    let stem: String = record_type
        .chars()
        .map(|c| match c {
            '.' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    format!("{stem}.{extension}")
}

/// Writes raw blocks under the output root and aggregates under their own
/// directory.
#[derive(Debug, Clone)]
pub struct FsSink {
    output_root: PathBuf,
    aggregate_dir: PathBuf,
    raw_extension: String,
    aggregate_extension: String,
}

impl FsSink {
    pub fn new(
        output_root: impl Into<PathBuf>,
        aggregate_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            output_root: output_root.into(),
            aggregate_dir: aggregate_dir.into(),
            raw_extension: DEFAULT_RAW_EXTENSION.to_string(),
            aggregate_extension: DEFAULT_AGGREGATE_EXTENSION.to_string(),
        }
    }

    pub fn with_extensions(
        mut self,
        raw: impl Into<String>,
        aggregate: impl Into<String>,
    ) -> Self {
        self.raw_extension = raw.into();
        self.aggregate_extension = aggregate.into();
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn aggregate_dir(&self) -> &Path {
        &self.aggregate_dir
    }

    /// Creates the output root. Succeeds if it already exists.
    pub fn ensure_root(&self) -> Result<(), SinkError> {
        fs::create_dir_all(&self.output_root)
            .map_err(|e| SinkError::create_dir(&self.output_root, &e))
    }

    /// Path of the raw file for `key`.
    pub fn raw_path(
        &self,
        key: &str,
    ) -> Result<PathBuf, SinkError> {
        let safe = !key.is_empty()
            && !key.ends_with('/')
            && Path::new(key)
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(SinkError::UnsafeKey {
                key: key.to_string(),
            });
        }
        Ok(self
            .output_root
            .join(format!("{key}.{}", self.raw_extension)))
    }

    /// Writes `bytes` verbatim to the raw file of `key`, replacing any
    /// previous content.
    pub fn write_raw(
        &self,
        key: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, SinkError> {
        let path = self.raw_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SinkError::create_dir(parent, &e))?;
        }
        fs::write(&path, bytes).map_err(|e| SinkError::write(&path, &e))?;
        debug!(key, path = %path.display(), "Raw block saved");
        Ok(path)
    }

    pub fn aggregate_path(
        &self,
        record_type: &str,
    ) -> PathBuf {
        self.aggregate_dir
            .join(aggregate_file_name(record_type, &self.aggregate_extension))
    }

    /// Writes one type's records as an indented JSON array, in the order
    /// given.
    pub fn write_aggregate(
        &self,
        record_type: &str,
        records: &[(String, Document)],
    ) -> Result<PathBuf, SinkError> {
        let path = self.aggregate_path(record_type);
        let documents: Vec<&Document> = records.iter().map(|(_, doc)| doc).collect();
        let json = serde_json::to_vec_pretty(&documents).map_err(|e| SinkError::Serialize {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        fs::create_dir_all(&self.aggregate_dir)
            .map_err(|e| SinkError::create_dir(&self.aggregate_dir, &e))?;
        fs::write(&path, json).map_err(|e| SinkError::write(&path, &e))?;
        info!(
            record_type,
            records = records.len(),
            path = %path.display(),
            "Aggregate saved"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn sink(dir: &TempDir) -> FsSink {
        FsSink::new(dir.path().join("did:plc:abc"), dir.path().join("agg"))
    }

    #[test]
    fn test_aggregate_file_name() {
        assert_eq!(
            aggregate_file_name("app.example.post", "json"),
            "app_example_post.json"
        );
        assert_eq!(aggregate_file_name("unknown", "json"), "unknown.json");
        assert_eq!(aggregate_file_name("../etc/x", "json"), "___etc_x.json");
    }

    #[test]
    fn test_write_raw_creates_subdirectories() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir);
        sink.ensure_root().unwrap();

        let path = sink.write_raw("app.example.post/3k2a", b"\xa0").unwrap();
        assert_eq!(
            path,
            dir.path().join("did:plc:abc/app.example.post/3k2a.cbor")
        );
        assert_eq!(fs::read(&path).unwrap(), b"\xa0");

        // overwrite
        sink.write_raw("app.example.post/3k2a", b"\xf6").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"\xf6");
    }

    #[test]
    fn test_unsafe_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir);
        for key in ["", "../escape", "a/../../b", "/abs/path", "a/"] {
            assert_eq!(
                sink.raw_path(key).unwrap_err(),
                SinkError::UnsafeKey {
                    key: key.to_string()
                },
                "key {key:?}"
            );
        }
    }

    #[test]
    fn test_custom_extensions() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir).with_extensions("bin", "out");
        assert!(sink.raw_path("a/1").unwrap().ends_with("a/1.bin"));
        assert!(sink.aggregate_path("x.y").ends_with("x_y.out"));
    }

    #[test]
    fn test_write_aggregate_is_indented_array() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir);
        let records = vec![
            ("a/1".to_string(), Document::Integer(1)),
            ("a/2".to_string(), Document::Text("two".into())),
        ];

        let path = sink.write_aggregate("x", &records).unwrap();
        assert_eq!(path, dir.path().join("agg/x.json"));

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[\n  1,\n  \"two\"\n]");
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([1, "two"]));
    }

    #[test]
    fn test_write_error_names_path() {
        let dir = TempDir::new().unwrap();
        // a file where the output root directory should be
        let blocker = dir.path().join("root");
        fs::write(&blocker, b"").unwrap();
        let sink = FsSink::new(&blocker, dir.path());

        let err = sink.write_raw("a/1", b"x").unwrap_err();
        assert!(matches!(err, SinkError::CreateDir { .. }));
        assert!(err.to_string().contains("root"));
    }
}

//! JSON snapshot files.
//!
//! Snapshots are pretty-printed UTF-8 (two-space indent, non-ASCII kept as is)
//! and replaced atomically: the new content goes to a sibling `.tmp` file that
//! is then renamed over the target.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pulse_common::{PulseError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn save_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| PulseError::json(path, e))?;
    bytes.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PulseError::io(parent, e))?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, &bytes).map_err(|e| PulseError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        PulseError::io(path, e)
    })?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "snapshot.saved");
    Ok(())
}

/// Read a JSON array; a missing file is an empty snapshot.
pub fn load_json<T>(path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "snapshot.missing");
            return Ok(Vec::new());
        }
        Err(e) => return Err(PulseError::io(path, e)),
    };
    serde_json::from_slice(&bytes).map_err(|e| PulseError::json(path, e))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let got: Vec<Value> = load_json(&tmp.path().join("nope.json")).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn save_is_pretty_and_keeps_non_ascii() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/out.json");
        save_json(&path, &json!([{ "name": "Привет 🚀" }])).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[\n  {\n    \"name\": \"Привет 🚀\"\n  }\n]\n");
        assert!(!tmp.path().join("nested/dir/out.json.tmp").exists());

        let back: Vec<Value> = load_json(&path).unwrap();
        assert_eq!(back, vec![json!({ "name": "Привет 🚀" })]);
    }

    #[test]
    fn save_overwrites_previous_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.json");
        save_json(&path, &json!([1, 2, 3])).unwrap();
        save_json(&path, &json!([4])).unwrap();
        let back: Vec<u32> = load_json(&path).unwrap();
        assert_eq!(back, vec![4]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_json::<Value>(&path).unwrap_err();
        assert!(matches!(err, PulseError::Json { .. }));
    }
}

//! File I/O utilities with atomic writes
//!
//! JSON documents are replaced atomically (write temp, then rename). JSONL
//! logs are appended one record per line and flushed after each write.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AuditError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, AuditError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| AuditError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| AuditError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    replace_atomic(path, |writer| {
        serde_json::to_writer_pretty(writer, data)
            .map_err(|e| AuditError::Storage(format!("Failed to serialize data: {}", e)))
    })
}

/// Append one record as a JSON line
pub fn append_jsonl<T, P>(path: P, record: &T) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AuditError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let json = serde_json::to_string(record)
        .map_err(|e| AuditError::Json(format!("Failed to serialize record: {}", e)))?;

    writeln!(file, "{}", json)
        .map_err(|e| AuditError::Io(format!("Failed to write record: {}", e)))?;

    file.flush()
        .map_err(|e| AuditError::Io(format!("Failed to flush {}: {}", path.display(), e)))?;

    Ok(())
}

/// Read every record of a JSONL file in file order
///
/// A missing file reads as empty; blank lines are skipped.
pub fn read_jsonl<T, P>(path: P) -> Result<Vec<T>, AuditError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| AuditError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            AuditError::Io(format!(
                "Failed to read {} line {}: {}",
                path.display(),
                line_num + 1,
                e
            ))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line).map_err(|e| {
            AuditError::Json(format!(
                "Failed to parse {} line {}: {}",
                path.display(),
                line_num + 1,
                e
            ))
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Replace a JSONL file with the given records atomically
pub fn write_jsonl_atomic<T, P>(path: P, records: &[T]) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    replace_atomic(path, |writer| {
        for record in records {
            serde_json::to_writer(&mut *writer, record)
                .map_err(|e| AuditError::Storage(format!("Failed to serialize record: {}", e)))?;
            writeln!(writer)
                .map_err(|e| AuditError::Storage(format!("Failed to write record: {}", e)))?;
        }
        Ok(())
    })
}

fn ensure_parent(path: &Path) -> Result<(), AuditError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AuditError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

fn replace_atomic<F>(path: &Path, write: F) -> Result<(), AuditError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), AuditError>,
{
    ensure_parent(path)?;

    // Temp file in the same directory so the rename stays on one filesystem
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = std::path::PathBuf::from(temp_name);

    let file = File::create(&temp_path)
        .map_err(|e| AuditError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    write(&mut writer)?;

    writer
        .flush()
        .map_err(|e| AuditError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| AuditError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        AuditError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn sample(value: i32) -> TestData {
        TestData {
            name: format!("item {}", value),
            value,
        }
    }

    #[test]
    fn test_read_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: TestData = read_json(temp_dir.path().join("nonexistent.json")).unwrap();
        assert_eq!(data, TestData::default());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("test.json");

        write_json_atomic(&path, &sample(42)).unwrap();
        assert!(!temp_dir.path().join("nested").join("test.json.tmp").exists());

        let loaded: TestData = read_json(&path).unwrap();
        assert_eq!(loaded, sample(42));
    }

    #[test]
    fn test_append_and_read_jsonl() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.jsonl");

        for i in 0..3 {
            append_jsonl(&path, &sample(i)).unwrap();
        }

        let records: Vec<TestData> = read_jsonl(&path).unwrap();
        assert_eq!(records, vec![sample(0), sample(1), sample(2)]);
    }

    #[test]
    fn test_read_jsonl_skips_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.jsonl");
        fs::write(&path, "{\"name\":\"a\",\"value\":1}\n\n   \n").unwrap();

        let records: Vec<TestData> = read_jsonl(&path).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_read_jsonl_reports_bad_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.jsonl");
        fs::write(&path, "{\"name\":\"a\",\"value\":1}\nnot json\n").unwrap();

        let err = read_jsonl::<TestData, _>(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_write_jsonl_atomic_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.jsonl");

        append_jsonl(&path, &sample(1)).unwrap();
        write_jsonl_atomic(&path, &[sample(7), sample(8)]).unwrap();

        let records: Vec<TestData> = read_jsonl(&path).unwrap();
        assert_eq!(records, vec![sample(7), sample(8)]);
    }
}

use crate::form::record::Record;
use anyhow::{Context, Result};
use std::path::Path;

/// Reads a previously saved record. A missing file means a new record.
pub fn load_record(path: &Path) -> Result<Option<Record>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record {}", path.display()))?;
    let record = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse record {}", path.display()))?;
    Ok(Some(record))
}

pub fn save_record(path: &Path, record: &Record) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write record {}", path.display()))?;
    tracing::info!(path = %path.display(), fqdn = %record.fqdn, "record saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_a_new_record() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_record(&dir.path().join("record.json")).unwrap(), None);
    }

    #[test]
    fn saved_record_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record = Record {
            host: 2,
            fqdn: "nas.example.com".into(),
            ipv4_netmask: 24,
            ipv4_host_id: "0.0.0.5".parse().unwrap(),
            service: 1,
            username: "nas.example.com".into(),
            password: "pw".into(),
            created: Some(chrono::Utc::now()),
            ..Record::default()
        };

        save_record(&path, &record).unwrap();
        assert_eq!(load_record(&path).unwrap(), Some(record));
    }

    #[test]
    fn garbage_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, "not json").unwrap();

        let err = load_record(&path).unwrap_err();
        assert!(err.to_string().contains("record.json"));
    }
}

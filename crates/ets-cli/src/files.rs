//! File and runtime helpers shared by the subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use ets_verify::VerifierConfig;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Pretty JSON to `out`, or to stdout when `out` is `None`.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    match out {
        Some(path) => {
            std::fs::write(path, format!("{text}\n")).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "output written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// The file at `path`, or the defaults with environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<VerifierConfig> {
    match path {
        Some(path) => Ok(VerifierConfig::load(path)?),
        None => {
            let mut config = VerifierConfig::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }
}

/// A current-thread runtime for the async commands.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let value: BTreeMap<&str, u32> = [("a", 1), ("b", 2)].into();
        write_json(&value, Some(&path)).unwrap();
        let back: BTreeMap<String, u32> = read_json(&path).unwrap();
        assert_eq!(back.get("b"), Some(&2));
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_json::<serde_json::Value>(Path::new("/nonexistent/acl.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/acl.json"));
    }
}

use std::path::Path;

use crate::error::Error;

/// How the scheduler reads its earliest event.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeekMode {
    /// Splay the minimum to the root on every look. Cheapest when the loop keeps coming back to
    /// the front of the queue.
    #[default]
    Splay,
    /// Walk the left spine without restructuring the tree.
    ReadOnly,
}

#[derive(
    Debug, Clone, PartialEq, Eq, typed_builder::TypedBuilder, serde::Serialize, serde::Deserialize,
)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of events to reserve arena space for up front.
    #[builder(default)]
    pub capacity: usize,
    #[builder(default)]
    pub peek: PeekMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub fn read_config(path: impl AsRef<Path>) -> Result<SchedulerConfig, Error> {
    let s = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cfg = SchedulerConfig::builder().capacity(16).build();
        assert_eq!(cfg.capacity, 16);
        assert_eq!(cfg.peek, PeekMode::Splay);
    }

    #[test]
    fn partial_json() -> anyhow::Result<()> {
        let cfg: SchedulerConfig = serde_json::from_str(r#"{ "peek": "read_only" }"#)?;
        assert_eq!(cfg.capacity, 0);
        assert_eq!(cfg.peek, PeekMode::ReadOnly);
        Ok(())
    }

    #[test]
    fn read_from_file() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("splaysched-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "capacity": 64 }"#)?;
        let cfg = read_config(&path);
        std::fs::remove_file(&path)?;
        assert_eq!(cfg?.capacity, 64);
        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_config("/nonexistent/splaysched.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{PhotostripError, PhotostripResult, compose::caption::DEFAULT_CAPTION_FONTS};

pub const ENV_STORAGE_ROOT: &str = "PHOTOSTRIP_STORAGE_ROOT";
pub const ENV_CAPTION_FONT: &str = "PHOTOSTRIP_CAPTION_FONT";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// Directory holding uploads, strips and session documents.
    pub storage_root: PathBuf,
    /// Font files tried first for the caption, in order.
    pub caption_fonts: Vec<PathBuf>,
    pub load_system_fonts: bool,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("uploads"),
            caption_fonts: DEFAULT_CAPTION_FONTS.iter().map(PathBuf::from).collect(),
            load_system_fonts: true,
        }
    }
}

impl BoothConfig {
    /// Reads the JSON file if given (defaults otherwise), then applies environment overrides.
    pub fn load(path: Option<&Path>) -> PhotostripResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> PhotostripResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let config = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        Ok(config)
    }

    /// `lookup` maps an environment key to its value; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(ENV_STORAGE_ROOT).filter(|v| !v.trim().is_empty()) {
            self.storage_root = PathBuf::from(root);
        }
        if let Some(font) = lookup(ENV_CAPTION_FONT).filter(|v| !v.trim().is_empty()) {
            self.caption_fonts.insert(0, PathBuf::from(font));
        }
    }

    pub fn validate(&self) -> PhotostripResult<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(PhotostripError::validation("storage_root must be non-empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_point_at_liberation_serif() {
        let c = BoothConfig::default();
        assert_eq!(c.storage_root, PathBuf::from("uploads"));
        assert_eq!(c.caption_fonts.len(), 2);
        assert!(c.caption_fonts[0].ends_with("LiberationSerif-Italic.ttf"));
        assert!(c.load_system_fonts);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: BoothConfig = serde_json::from_str(r#"{"storage_root": "/srv/booth"}"#).unwrap();
        assert_eq!(c.storage_root, PathBuf::from("/srv/booth"));
        assert_eq!(c.caption_fonts, BoothConfig::default().caption_fonts);
    }

    #[test]
    fn env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            (ENV_STORAGE_ROOT, "/tmp/booth"),
            (ENV_CAPTION_FONT, "/opt/fonts/Serif.ttf"),
        ]
        .into_iter()
        .collect();

        let mut c = BoothConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.storage_root, PathBuf::from("/tmp/booth"));
        assert_eq!(c.caption_fonts[0], PathBuf::from("/opt/fonts/Serif.ttf"));
        assert_eq!(c.caption_fonts.len(), 3);
    }

    #[test]
    fn empty_overrides_are_ignored_and_empty_root_is_invalid() {
        let mut c = BoothConfig::default();
        c.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(c, BoothConfig::default());

        c.storage_root = PathBuf::new();
        assert!(matches!(
            c.validate().unwrap_err(),
            PhotostripError::Validation(_)
        ));
    }
}

//! Project configuration stored in `config.yml` at the project root.

use crate::error::ProjectError;
use anyhow::Result;
use chrono::{Datelike, Local};
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tokio::fs;

/// File name of the configuration document inside a project.
pub const CONFIG_FILE: &str = "config.yml";

/// Literal text replacements, applied in insertion order.
pub type Replacements = IndexMap<String, String>;

/// Book metadata and tool settings for one project.
///
/// Every key defaults on its own, so older `config.yml` files missing newer
/// keys keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub book_name: String,
    pub book_file: String,
    pub author_name: String,
    pub copy_right: String,
    pub language_code: String,
    pub publisher_name: String,
    pub pdf_font_size: String,
    pub cover_image: String,
    pub word_count_offset: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub replacements: Replacements,
    #[serde(alias = "nanoWriMoUsername")]
    pub remote_service_username: String,
    #[serde(alias = "nanoWriMoSecretKey")]
    pub remote_service_secret_key: String,
    pub pandoc_path: String,
    pub ebook_convert_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            book_name: "My Ebook".to_string(),
            book_file: "My Ebook".to_string(),
            author_name: "Author Name".to_string(),
            copy_right: format!("{} All rights reserved", Local::now().year()),
            language_code: "en-US".to_string(),
            publisher_name: "Self Published".to_string(),
            pdf_font_size: "12pt".to_string(),
            cover_image: String::new(),
            word_count_offset: 0,
            replacements: Replacements::new(),
            remote_service_username: String::new(),
            remote_service_secret_key: String::new(),
            pandoc_path: "pandoc".to_string(),
            ebook_convert_path: "ebook-convert".to_string(),
        }
    }
}

impl Config {
    /// Loads `path`, or writes the defaults there first when it does not exist.
    pub async fn load_or_init(path: &Path) -> Result<Self> {
        if !fs::try_exists(path)
            .await
            .map_err(|e| ProjectError::io(format!("checking {}", path.display()), e))?
        {
            let config = Self::default();
            config.save(path).await?;
            info!("Wrote default configuration: {}", path.display());
            return Ok(config);
        }

        let text = fs::read_to_string(path)
            .await
            .map_err(|e| ProjectError::io(format!("reading {}", path.display()), e))?;
        let config = Self::parse(&text, path)?;
        debug!("Loaded configuration for {:?}", config.book_name);
        Ok(config)
    }

    /// Parses a configuration document. An empty document yields the defaults.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ProjectError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ProjectError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).map_err(|source| ProjectError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, yaml)
            .await
            .map_err(|e| ProjectError::io(format!("writing {}", path.display()), e))?;
        Ok(())
    }

    /// Both remote-service credentials are present.
    pub fn has_remote_credentials(&self) -> bool {
        !self.remote_service_username.is_empty() && !self.remote_service_secret_key.is_empty()
    }
}

/// `replacements:` with no value reads as an empty table.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_keys_default_individually() {
        let config = Config::parse("bookName: Dune\nwordCountOffset: 12\n", Path::new("c.yml"))
            .unwrap();
        assert_eq!(config.book_name, "Dune");
        assert_eq!(config.word_count_offset, 12);
        assert_eq!(config.author_name, "Author Name");
        assert_eq!(config.pdf_font_size, "12pt");
        assert!(config.replacements.is_empty());
    }

    #[test]
    fn test_replacements_keep_document_order() {
        let yaml = "replacements:\n  zz: a\n  aa: b\n  mm: c\n";
        let config = Config::parse(yaml, Path::new("c.yml")).unwrap();
        let keys: Vec<_> = config.replacements.keys().cloned().collect();
        assert_eq!(keys, vec!["zz", "aa", "mm"]);
    }

    #[test]
    fn test_null_replacements() {
        let config = Config::parse("replacements:\n", Path::new("c.yml")).unwrap();
        assert!(config.replacements.is_empty());
    }

    #[test]
    fn test_legacy_credential_keys() {
        let yaml = "nanoWriMoUsername: writer\nnanoWriMoSecretKey: s3cret\n";
        let config = Config::parse(yaml, Path::new("c.yml")).unwrap();
        assert_eq!(config.remote_service_username, "writer");
        assert_eq!(config.remote_service_secret_key, "s3cret");
        assert!(config.has_remote_credentials());
    }

    #[test]
    fn test_malformed_yaml_is_reported() {
        let err = Config::parse("bookName: [unterminated", Path::new("c.yml")).unwrap_err();
        assert!(matches!(err, ProjectError::Yaml { .. }));
    }

    #[tokio::test]
    async fn test_load_or_init_writes_defaults_once() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);

        let created = Config::load_or_init(&path).await?;
        assert_eq!(created, Config::default());
        assert!(path.exists());

        std::fs::write(&path, "bookName: Edited\n")?;
        let loaded = Config::load_or_init(&path).await?;
        assert_eq!(loaded.book_name, "Edited");
        assert_eq!(std::fs::read_to_string(&path)?, "bookName: Edited\n");
        Ok(())
    }
}

use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::IndexError;
use crate::index::skiplist::{DEFAULT_BRANCHING, DEFAULT_MAX_HEIGHT};

/// On-disk overrides for [`ListConfig`], loaded via the `config` crate from
/// whichever of `config.yaml` / `config.json` / `config.ini` is present in
/// a given directory. Every field is optional so a file only needs to name
/// the settings it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListConfigFile {
    pub max_height: Option<usize>,
    pub branching_factor: Option<u32>,
}

/// Resolved construction parameters for a [`crate::index::SkipList`],
/// separate from the list's own constructor (which takes plain params, per
/// the public interface) so a demo binary or embedder can source them from
/// a config file without the library itself depending on `config`/`serde`
/// at the call site.
#[derive(Debug, Clone)]
pub struct ListConfig {
    pub max_height: usize,
    pub branching_factor: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            max_height: DEFAULT_MAX_HEIGHT,
            branching_factor: DEFAULT_BRANCHING,
        }
    }
}

impl ListConfigFile {
    pub fn into_config(self) -> ListConfig {
        let defaults = ListConfig::default();
        ListConfig {
            max_height: self.max_height.unwrap_or(defaults.max_height),
            branching_factor: self.branching_factor.unwrap_or(defaults.branching_factor),
        }
    }
}

/// Load `config.{yaml,json,ini}` from `dir`, if present, falling back to
/// defaults for anything the file doesn't set. Returns defaults untouched
/// when no config file exists.
pub fn load_list_config(dir: &Path) -> Result<ListConfig, IndexError> {
    let mut builder = Config::builder();

    let yaml = dir.join("config.yaml");
    let json = dir.join("config.json");
    let ini = dir.join("config.ini");
    if yaml.exists() {
        builder = builder.add_source(File::new(path_str(&yaml)?, FileFormat::Yaml));
    } else if json.exists() {
        builder = builder.add_source(File::new(path_str(&json)?, FileFormat::Json));
    } else if ini.exists() {
        builder = builder.add_source(File::new(path_str(&ini)?, FileFormat::Ini));
    } else {
        return Ok(ListConfig::default());
    }

    let built = builder
        .build()
        .map_err(|e| IndexError::Config(e.to_string()))?;
    let file: ListConfigFile = built
        .try_deserialize()
        .map_err(|e| IndexError::Config(e.to_string()))?;
    Ok(file.into_config())
}

fn path_str(path: &PathBuf) -> Result<&str, IndexError> {
    path.to_str()
        .ok_or_else(|| IndexError::Config(format!("non-UTF8 path: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_config_file_present() {
        let dir = std::env::temp_dir().join("skipindex_config_test_missing");
        let cfg = load_list_config(&dir).unwrap();
        assert_eq!(cfg.max_height, DEFAULT_MAX_HEIGHT);
        assert_eq!(cfg.branching_factor, DEFAULT_BRANCHING);
    }

    #[test]
    fn file_overrides_take_effect() {
        let dir = std::env::temp_dir().join("skipindex_config_test_present");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "max_height: 10\nbranching_factor: 8\n").unwrap();

        let cfg = load_list_config(&dir).unwrap();
        assert_eq!(cfg.max_height, 10);
        assert_eq!(cfg.branching_factor, 8);

        std::fs::remove_dir_all(&dir).ok();
    }
}

use super::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Yaml,
}

fn format_for(path: &Path) -> Format {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            Format::Yaml
        }
        _ => Format::Toml,
    }
}

/// Reads a TOML or YAML configuration file, chosen by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    parse_config(&content, format_for(path))
        .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))
}

fn parse_config(content: &str, format: Format) -> std::result::Result<Config, String> {
    match format {
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    }
}

/// Loads `path`, or the default configuration when the file does not exist.
/// A file that exists but cannot be read or parsed is still an error.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!(
            "Configuration file '{}' not found, using default configuration",
            path.display()
        );
        return Ok(Config::default());
    }

    let config = load_config(path)?;
    log::info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

pub(crate) fn write_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let path = path.as_ref();
    let content = match format_for(path) {
        Format::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
    }
    .map_err(|e| Error::Config(format!("Failed to serialize configuration: {e}")))?;

    fs::write(path, content)
        .map_err(|e| Error::Config(format!("Failed to write {}: {e}", path.display())))
}

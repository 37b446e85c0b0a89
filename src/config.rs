//! Optional config file and CLI precedence

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use podreport_export::DEFAULT_REPORT_PATH;
use podreport_k8s::KubeSettings;

/// Values read from `config.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub output: Option<PathBuf>,
    pub page_size: Option<u32>,
}

impl FileConfig {
    /// Default config location, `<config_dir>/podreport/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("podreport").join("config.toml"))
    }

    /// Load the config file.
    ///
    /// An explicitly given path must exist. The default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Fully resolved run settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub kube: KubeSettings,
    pub output: PathBuf,
}

impl Settings {
    /// Merge CLI flags over the config file over built-in defaults
    pub fn resolve(
        file: FileConfig,
        kubeconfig: Option<PathBuf>,
        context: Option<String>,
        output: Option<PathBuf>,
        page_size: Option<u32>,
    ) -> Self {
        Self {
            kube: KubeSettings {
                kubeconfig: kubeconfig.or(file.kubeconfig),
                context: context.or(file.context),
                page_size: page_size.or(file.page_size),
            },
            output: output
                .or(file.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH)),
        }
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::{RenderOptions, RunConfig, SourceSpec};

#[derive(Deserialize)]
struct StaticConfig {
    source: SourceSpec,
    #[serde(default)]
    output: OutputSection,
    #[serde(default)]
    render: RenderOptions,
    #[serde(default)]
    subpath: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
struct OutputSection {
    #[serde(default)]
    target: Option<PathBuf>,
}

/// Loads the YAML run-config file and returns a validated [`RunConfig`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {:?}", path_ref))?;

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let options = static_conf.render;
    options
        .validate()
        .context("Invalid render options in config")?;

    let output = static_conf.output.target.unwrap_or_else(|| {
        if options.one_pdf_per_file {
            PathBuf::from("./output")
        } else {
            PathBuf::from("output.pdf")
        }
    });

    info!(
        output = %output.display(),
        one_pdf_per_file = options.one_pdf_per_file,
        "Config loaded and validated successfully"
    );

    Ok(RunConfig {
        source: static_conf.source,
        output,
        options,
        subpath: static_conf.subpath,
    })
}

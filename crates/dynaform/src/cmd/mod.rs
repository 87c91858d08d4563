pub mod inspect;
pub mod render;
pub mod schema;
pub mod submit;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use dynaform_lib::{FormRunConfig, RuntimeBindings, TransformerSpec};
use dynaform_spec::FormConfig;
use serde_json::Value;

/// Options shared by the commands that open a form session.
#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    /// Form definition (.json or .toml)
    #[arg(long, short = 'c', value_name = "form.json")]
    pub config: PathBuf,
    /// Initial data as a JSON object
    #[arg(long, value_name = "data.json")]
    pub data: Option<PathBuf>,
    /// Edits to apply, as an inline JSON object of field key -> value
    #[arg(long, value_name = "JSON")]
    pub patch: Option<String>,
    /// Attach a transformer to a field: scale:<factor>, date-iso, date-epoch, fixed:<decimals>
    #[arg(
        long = "transform",
        value_name = "key=spec",
        value_parser = parse_transform
    )]
    pub transforms: Vec<(String, TransformerSpec)>,
}

impl FormArgs {
    pub fn run_config(&self) -> Result<FormRunConfig> {
        let config_json = load_config_json(&self.config)?;
        let initial_data_json = self
            .data
            .as_deref()
            .map(|path| {
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read data file {}", path.display()))
            })
            .transpose()?;

        let bindings = self
            .transforms
            .iter()
            .fold(RuntimeBindings::new(), |bindings, (key, spec)| {
                bindings.with_transformer(key.clone(), spec.build())
            });

        Ok(FormRunConfig {
            config_json,
            initial_data_json,
            bindings,
        })
    }
}

fn parse_transform(raw: &str) -> Result<(String, TransformerSpec), String> {
    let (key, spec) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=spec, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(format!("expected key=spec, got '{raw}'"));
    }
    let spec = spec.parse::<TransformerSpec>().map_err(|err| err.to_string())?;
    Ok((key.trim().to_string(), spec))
}

/// Reads a form definition and normalises it to a JSON string.
pub fn load_config_json(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read form definition {}", path.display()))?;
    let value: Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&raw)
            .with_context(|| format!("invalid TOML in {}", path.display()))?,
        Some("json") | None => serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
        Some(other) => {
            bail!("unsupported form definition format '.{other}' (expected .json or .toml)")
        }
    };
    tracing::debug!(path = %path.display(), "loaded form definition");
    Ok(value.to_string())
}

pub fn load_config(path: &Path) -> Result<FormConfig> {
    let json = load_config_json(path)?;
    serde_json::from_str(&json)
        .with_context(|| format!("{} is not a valid form definition", path.display()))
}

pub fn write_output(out: Option<&Path>, body: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, format!("{body}\n"))
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

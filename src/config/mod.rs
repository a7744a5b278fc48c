//! Configuration management for `suite_runner`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`SUITE_RUNNER_<KEY>`)
//! 3. Project config (`<root>/suite-runner.yaml`)
//! 4. Defaults
//!
//! The merged layer is resolved once into an immutable [`RunConfig`] that
//! every component receives by reference.

use crate::error::{Result, RunnerError};
use crate::output::Palette;
use crate::util::split_args;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Project config file name, looked up in the orchestration root.
pub const PROJECT_CONFIG_FILE: &str = "suite-runner.yaml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SUITE_RUNNER_";
/// Default report directory, relative to the root.
pub const DEFAULT_REPORT_DIR: &str = "test-reports";
/// Resume summary file name inside the report directory.
pub const RESUME_FILENAME: &str = "last-run.json";

/// One configuration source, keyed by normalized key (`backend-python`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        if !matches!(value, serde_yaml::Value::Mapping(_) | serde_yaml::Value::Null) {
            return Err(RunnerError::Config(format!(
                "{} must contain a mapping",
                path.display()
            )));
        }
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `SUITE_RUNNER_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                if stripped.is_empty() || stripped == "ROOT" {
                    continue;
                }
                layer.insert(stripped, value);
            }
        }
        layer
    }
}

/// CLI values that participate in layering. `None` leaves lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub report_dir: Option<String>,
    pub backend_markers: Option<String>,
    pub backend_args: Option<String>,
    pub unit_args: Option<String>,
    pub e2e_args: Option<String>,
    pub unit_workers: Option<String>,
    pub e2e_workers: Option<String>,
    pub skip_backend: Option<bool>,
    pub skip_unit: Option<bool>,
    pub skip_e2e: Option<bool>,
    pub parallel: Option<bool>,
    pub coverage: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        let strings = [
            ("report-dir", &self.report_dir),
            ("backend.markers", &self.backend_markers),
            ("backend.args", &self.backend_args),
            ("unit.args", &self.unit_args),
            ("e2e.args", &self.e2e_args),
            ("unit.workers", &self.unit_workers),
            ("e2e.workers", &self.e2e_workers),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                layer.insert(key, value.clone());
            }
        }
        let flags = [
            ("skip.backend", self.skip_backend),
            ("skip.unit", self.skip_unit),
            ("skip.e2e", self.skip_e2e),
            ("parallel", self.parallel),
            ("coverage", self.coverage),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                layer.insert(key, value.to_string());
            }
        }
        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert("report-dir", DEFAULT_REPORT_DIR);
    layer.insert("backend.python", "python3");
    layer.insert("backend.package", "base_feature_app");
    layer.insert("backend.root", "backend");
    layer.insert("frontend.root", "frontend");
    layer
}

/// Load project config (`<root>/suite-runner.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(root: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&root.join(PROJECT_CONFIG_FILE))
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if the project config cannot be read or parsed.
pub fn load_config(root: &Path, cli: &CliOverrides) -> Result<ConfigLayer> {
    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        load_project_config(root)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Flags that only exist on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub resume: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub no_color: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    pub python: String,
    pub package: String,
    pub markers: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrontendOptions {
    pub args: Vec<String>,
    pub workers: Option<String>,
}

/// Fully resolved, immutable run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub root: PathBuf,
    pub backend_root: PathBuf,
    pub frontend_root: PathBuf,
    pub report_dir: PathBuf,
    pub backend: BackendOptions,
    pub unit: FrontendOptions,
    pub e2e: FrontendOptions,
    pub skip_backend: bool,
    pub skip_unit: bool,
    pub skip_e2e: bool,
    pub parallel: bool,
    pub resume: bool,
    /// Suppress streamed suite output.
    pub quiet: bool,
    pub coverage: bool,
    pub palette: Palette,
}

impl RunConfig {
    /// Resolve the merged layer and CLI-only flags.
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable booleans or unbalanced argument quoting.
    pub fn resolve(root: &Path, layer: &ConfigLayer, flags: RunFlags) -> Result<Self> {
        let parallel = parse_bool(layer, "parallel")?;
        // Verbosity flags win; otherwise parallel runs are quiet by default.
        let quiet = if flags.verbose {
            false
        } else if flags.quiet {
            true
        } else {
            parallel
        };

        let report_dir = layer.get("report-dir").unwrap_or(DEFAULT_REPORT_DIR);
        let backend_root = layer.get("backend.root").unwrap_or("backend");
        let frontend_root = layer.get("frontend.root").unwrap_or("frontend");

        Ok(Self {
            root: root.to_path_buf(),
            backend_root: root.join(backend_root),
            frontend_root: root.join(frontend_root),
            report_dir: root.join(report_dir),
            backend: BackendOptions {
                python: layer.get("backend.python").unwrap_or("python3").to_string(),
                package: layer
                    .get("backend.package")
                    .unwrap_or("base_feature_app")
                    .to_string(),
                markers: layer.get("backend.markers").unwrap_or_default().to_string(),
                args: split_args("--backend-args", layer.get("backend.args"))?,
            },
            unit: FrontendOptions {
                args: split_args("--unit-args", layer.get("unit.args"))?,
                workers: non_empty(layer.get("unit.workers")),
            },
            e2e: FrontendOptions {
                args: split_args("--e2e-args", layer.get("e2e.args"))?,
                workers: non_empty(layer.get("e2e.workers")),
            },
            skip_backend: parse_bool(layer, "skip.backend")?,
            skip_unit: parse_bool(layer, "skip.unit")?,
            skip_e2e: parse_bool(layer, "skip.e2e")?,
            parallel,
            resume: flags.resume,
            quiet,
            coverage: parse_bool(layer, "coverage")?,
            palette: Palette::detect(flags.no_color),
        })
    }

    /// Path of the persisted resume summary.
    #[must_use]
    pub fn resume_path(&self) -> PathBuf {
        self.report_dir.join(RESUME_FILENAME)
    }
}

/// Resolve the orchestration root: explicit path or the current directory.
///
/// # Errors
///
/// Returns `RootNotFound` if the directory does not exist.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };
    if !candidate.is_dir() {
        return Err(RunnerError::RootNotFound { path: candidate });
    }
    Ok(fs::canonicalize(&candidate)?)
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '.'], "-")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn parse_bool(layer: &ConfigLayer, key: &str) -> Result<bool> {
    let Some(value) = layer.get(key) else {
        return Ok(false);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "n" | "off" => Ok(false),
        other => Err(RunnerError::invalid_argument(
            key,
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        // Argument lists are re-joined with shell quoting so they split back losslessly.
        serde_yaml::Value::Sequence(values) => {
            let items: Vec<String> = values.iter().filter_map(yaml_scalar_to_string).collect();
            if let Ok(joined) = shlex::try_join(items.iter().map(String::as_str)) {
                out.insert(prefix.to_string(), joined);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

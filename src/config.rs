use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::OutputPaths;

const DEFAULT_TEMPLATES_DIR: &str = "template";
const DEFAULT_MODELS_DIR: &str = "models";
const DEFAULT_CONTROLLERS_DIR: &str = "controllers";
const DEFAULT_DTOS_DIR: &str = "dtos";
const DEFAULT_SERVICES_DIR: &str = "services";
const DEFAULT_OUT_DIR: &str = "out";
const DEFAULT_MIGRATIONS_FILE: &str = "database/dbMigrations.go";
const DEFAULT_SERVER_FILE: &str = "server/server.go";
const DEFAULT_EXTENSION: &str = "go";

/// Where generated artifacts go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Everything into the scratch directory; existing files may be replaced.
    #[default]
    #[value(alias = "sandbox", alias = "testing")]
    #[serde(alias = "sandbox", alias = "testing")]
    Sandboxed,
    /// Into the real source tree; never overwrites, registers the model.
    Production,
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationMode::Sandboxed => write!(f, "sandboxed"),
            GenerationMode::Production => write!(f, "production"),
        }
    }
}

/// Resolved layout of the target codebase plus the generation mode.
///
/// All paths are absolute or relative to the process working directory;
/// relative inputs have already been joined onto `project_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldConfig {
    pub project_root: PathBuf,
    pub templates_dir: PathBuf,
    pub models_dir: PathBuf,
    pub controllers_dir: PathBuf,
    pub dtos_dir: PathBuf,
    pub services_dir: PathBuf,
    pub out_dir: PathBuf,
    pub migrations_file: PathBuf,
    pub server_file: PathBuf,
    pub source_extension: String,
    pub mode: GenerationMode,
}

impl ScaffoldConfig {
    /// Default layout rooted at `project_root`, sandboxed.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            templates_dir: project_root.join(DEFAULT_TEMPLATES_DIR),
            models_dir: project_root.join(DEFAULT_MODELS_DIR),
            controllers_dir: project_root.join(DEFAULT_CONTROLLERS_DIR),
            dtos_dir: project_root.join(DEFAULT_DTOS_DIR),
            services_dir: project_root.join(DEFAULT_SERVICES_DIR),
            out_dir: project_root.join(DEFAULT_OUT_DIR),
            migrations_file: project_root.join(DEFAULT_MIGRATIONS_FILE),
            server_file: project_root.join(DEFAULT_SERVER_FILE),
            source_extension: DEFAULT_EXTENSION.to_string(),
            mode: GenerationMode::default(),
            project_root,
        }
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn from_args(args: ConfigArgs) -> Result<Self> {
        let ConfigArgs {
            config,
            project_root: cli_project_root,
            templates_dir: cli_templates_dir,
            models_dir: cli_models_dir,
            controllers_dir: cli_controllers_dir,
            dtos_dir: cli_dtos_dir,
            services_dir: cli_services_dir,
            out_dir: cli_out_dir,
            migrations_file: cli_migrations_file,
            server_file: cli_server_file,
            extension: cli_extension,
            mode: cli_mode,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            project_root: file_project_root,
            templates_dir: file_templates_dir,
            models_dir: file_models_dir,
            controllers_dir: file_controllers_dir,
            dtos_dir: file_dtos_dir,
            services_dir: file_services_dir,
            out_dir: file_out_dir,
            migrations_file: file_migrations_file,
            server_file: file_server_file,
            extension: file_extension,
            mode: file_mode,
        } = file_config;

        let project_root = cli_project_root
            .or(file_project_root)
            .unwrap_or_else(|| PathBuf::from("."));
        let resolve = |cli: Option<PathBuf>, file: Option<PathBuf>, default: &str| {
            let path = cli.or(file).unwrap_or_else(|| PathBuf::from(default));
            if path.is_absolute() {
                path
            } else {
                project_root.join(path)
            }
        };

        let source_extension = cli_extension
            .or(file_extension)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
            .trim()
            .trim_start_matches('.')
            .to_string();
        anyhow::ensure!(
            !source_extension.is_empty(),
            "source file extension must not be empty"
        );

        Ok(Self {
            templates_dir: resolve(cli_templates_dir, file_templates_dir, DEFAULT_TEMPLATES_DIR),
            models_dir: resolve(cli_models_dir, file_models_dir, DEFAULT_MODELS_DIR),
            controllers_dir: resolve(
                cli_controllers_dir,
                file_controllers_dir,
                DEFAULT_CONTROLLERS_DIR,
            ),
            dtos_dir: resolve(cli_dtos_dir, file_dtos_dir, DEFAULT_DTOS_DIR),
            services_dir: resolve(cli_services_dir, file_services_dir, DEFAULT_SERVICES_DIR),
            out_dir: resolve(cli_out_dir, file_out_dir, DEFAULT_OUT_DIR),
            migrations_file: resolve(
                cli_migrations_file,
                file_migrations_file,
                DEFAULT_MIGRATIONS_FILE,
            ),
            server_file: resolve(cli_server_file, file_server_file, DEFAULT_SERVER_FILE),
            source_extension,
            mode: cli_mode.or(file_mode).unwrap_or_default(),
            project_root,
        })
    }

    /// Fails fast when the layout the current mode depends on is missing.
    pub fn validate(&self) -> Result<()> {
        ensure_dir(&self.templates_dir, "templates directory")?;
        ensure_dir(&self.models_dir, "models directory")?;
        if self.mode == GenerationMode::Production {
            ensure_dir(&self.controllers_dir, "controllers directory")?;
            ensure_dir(&self.dtos_dir, "dtos directory")?;
            ensure_dir(&self.services_dir, "services directory")?;
            ensure_file(&self.migrations_file, "migrations file")?;
            ensure_file(&self.server_file, "server file")?;
        }
        Ok(())
    }

    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths {
            models_dir: self.models_dir.clone(),
            controllers_dir: self.controllers_dir.clone(),
            dtos_dir: self.dtos_dir.clone(),
            services_dir: self.services_dir.clone(),
            out_dir: self.out_dir.clone(),
            extension: self.source_extension.clone(),
        }
    }
}

fn ensure_dir(path: &Path, what: &str) -> Result<()> {
    anyhow::ensure!(path.exists(), "{what} {:?} does not exist", path);
    anyhow::ensure!(path.is_dir(), "{what} {:?} is not a directory", path);
    Ok(())
}

fn ensure_file(path: &Path, what: &str) -> Result<()> {
    anyhow::ensure!(path.exists(), "{what} {:?} does not exist", path);
    anyhow::ensure!(path.is_file(), "{what} {:?} is not a file", path);
    Ok(())
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "model-scaffold",
    about = "Generate model, DTO, controller and service sources for a new model",
    version
)]
pub struct CliArgs {
    #[arg(long, short = 'm', value_name = "NAME", help = "Name of the model to generate")]
    pub model: String,

    #[arg(
        long = "field",
        short = 'f',
        value_name = "NAME:TYPE",
        value_parser = parse_field_spec,
        help = "Field to add, in order; repeat for each field"
    )]
    pub fields: Vec<(String, String)>,

    #[arg(long, help = "Print the generation report as JSON")]
    pub report: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML, JSON or TOML)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "SCAFFOLD_PROJECT_ROOT",
        value_name = "DIR",
        help = "Root of the target codebase"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(long, env = "SCAFFOLD_TEMPLATES_DIR", value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    #[arg(long, env = "SCAFFOLD_MODELS_DIR", value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    #[arg(long, env = "SCAFFOLD_CONTROLLERS_DIR", value_name = "DIR")]
    pub controllers_dir: Option<PathBuf>,

    #[arg(long, env = "SCAFFOLD_DTOS_DIR", value_name = "DIR")]
    pub dtos_dir: Option<PathBuf>,

    #[arg(long, env = "SCAFFOLD_SERVICES_DIR", value_name = "DIR")]
    pub services_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "SCAFFOLD_OUT_DIR",
        value_name = "DIR",
        help = "Scratch directory for sandboxed runs"
    )]
    pub out_dir: Option<PathBuf>,

    #[arg(long, env = "SCAFFOLD_MIGRATIONS_FILE", value_name = "FILE")]
    pub migrations_file: Option<PathBuf>,

    #[arg(long, env = "SCAFFOLD_SERVER_FILE", value_name = "FILE")]
    pub server_file: Option<PathBuf>,

    #[arg(
        long,
        env = "SCAFFOLD_EXTENSION",
        value_name = "EXT",
        help = "Extension of model source files"
    )]
    pub extension: Option<String>,

    #[arg(
        long,
        env = "SCAFFOLD_MODE",
        value_enum,
        value_name = "MODE",
        help = "sandboxed (write to the scratch directory) or production"
    )]
    pub mode: Option<GenerationMode>,
}

fn parse_field_spec(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, ty) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:TYPE, got '{raw}'"))?;
    let (name, ty) = (name.trim(), ty.trim());
    if name.is_empty() || ty.is_empty() {
        return Err(format!("expected NAME:TYPE, got '{raw}'"));
    }
    Ok((name.to_string(), ty.to_string()))
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    project_root: Option<PathBuf>,
    templates_dir: Option<PathBuf>,
    models_dir: Option<PathBuf>,
    controllers_dir: Option<PathBuf>,
    dtos_dir: Option<PathBuf>,
    services_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    migrations_file: Option<PathBuf>,
    server_file: Option<PathBuf>,
    extension: Option<String>,
    mode: Option<GenerationMode>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        "toml" => toml::from_str(&contents)
            .with_context(|| format!("failed to parse TOML config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_follow_codebase_layout() {
        let config = ScaffoldConfig::from_args(ConfigArgs {
            project_root: Some(PathBuf::from("/srv/api")),
            ..ConfigArgs::default()
        })
        .unwrap();
        assert_eq!(config, ScaffoldConfig::new("/srv/api"));
        assert_eq!(
            config.migrations_file,
            PathBuf::from("/srv/api/database/dbMigrations.go")
        );
        assert_eq!(config.mode, GenerationMode::Sandboxed);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scaffold.yaml");
        fs::write(
            &path,
            "project_root: /srv/api\nmode: production\nout_dir: tmp/out\nextension: .go\n",
        )
        .unwrap();

        let config = ScaffoldConfig::from_args(ConfigArgs {
            config: Some(path),
            out_dir: Some(PathBuf::from("/scratch")),
            ..ConfigArgs::default()
        })
        .unwrap();
        assert_eq!(config.mode, GenerationMode::Production);
        assert_eq!(config.out_dir, PathBuf::from("/scratch"));
        assert_eq!(config.models_dir, PathBuf::from("/srv/api/models"));
        assert_eq!(config.source_extension, "go");
    }

    #[test]
    fn test_toml_and_json_config_files() {
        let dir = TempDir::new().unwrap();
        let toml_path = dir.path().join("scaffold.toml");
        fs::write(&toml_path, "mode = \"sandbox\"\nmodels_dir = \"/m\"\n").unwrap();
        let config = ScaffoldConfig::from_args(ConfigArgs {
            config: Some(toml_path),
            ..ConfigArgs::default()
        })
        .unwrap();
        assert_eq!(config.mode, GenerationMode::Sandboxed);
        assert_eq!(config.models_dir, PathBuf::from("/m"));

        let json_path = dir.path().join("scaffold.json");
        fs::write(&json_path, r#"{"server_file": "/srv/server.go"}"#).unwrap();
        let config = ScaffoldConfig::from_args(ConfigArgs {
            config: Some(json_path),
            ..ConfigArgs::default()
        })
        .unwrap();
        assert_eq!(config.server_file, PathBuf::from("/srv/server.go"));
    }

    #[test]
    fn test_unsupported_config_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scaffold.ini");
        fs::write(&path, "mode=production").unwrap();
        let err = ScaffoldConfig::from_args(ConfigArgs {
            config: Some(path),
            ..ConfigArgs::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("unsupported config extension"));
    }

    #[test]
    fn test_validate_depends_on_mode() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("template")).unwrap();
        fs::create_dir_all(dir.path().join("models")).unwrap();

        let config = ScaffoldConfig::new(dir.path());
        config.validate().unwrap();

        let err = config
            .with_mode(GenerationMode::Production)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("controllers directory"));
    }

    #[test]
    fn test_field_spec_parsing() {
        assert_eq!(
            parse_field_spec("customer:Customer"),
            Ok(("customer".to_string(), "Customer".to_string()))
        );
        assert!(parse_field_spec("customer").is_err());
        assert!(parse_field_spec(":int").is_err());
    }

    #[test]
    fn test_cli_parses_repeated_fields() {
        let args = CliArgs::try_parse_from([
            "model-scaffold",
            "--model",
            "Order",
            "--field",
            "total:float32",
            "-f",
            "customer:Customer",
            "--mode",
            "production",
        ])
        .unwrap();
        assert_eq!(args.model, "Order");
        assert_eq!(args.fields.len(), 2);
        assert_eq!(args.fields[1].1, "Customer");
        assert_eq!(args.config.mode, Some(GenerationMode::Production));
    }
}

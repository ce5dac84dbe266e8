//! CLI command definitions for nsconfig.
//!
//! Global options declare the sources to load; subcommands query the result.

use crate::config::ConfigLoader;
use crate::format::OutputFormat;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load namespaced configuration and query it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source to load, as NAMESPACE=PATH (file or directory)
    #[arg(short, long = "source", value_name = "NS=PATH", value_parser = parse_source, global = true)]
    pub sources: Vec<(String, PathBuf)>,

    /// Directory whose files each become a namespace
    #[arg(short = 'D', long = "dir", value_name = "PATH", global = true)]
    pub dirs: Vec<PathBuf>,

    /// YAML or JSON file mapping namespaces to paths
    #[arg(short, long, env = "NSCONFIG_MANIFEST", global = true)]
    pub manifest: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value at a dotted path
    Get(GetArgs),

    /// Exit with status 0 if a non-null value exists at a dotted path, 1 otherwise
    Has(HasArgs),

    /// Print the loaded tree
    Dump(DumpArgs),

    /// List reader and resolver bindings
    Bindings,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted path, e.g. config.foo.bar
    pub path: String,

    /// Value printed when the path is absent (JSON, or a bare string)
    #[arg(short, long, value_name = "JSON")]
    pub default: Option<String>,
}

#[derive(Args, Debug)]
pub struct HasArgs {
    /// Dotted path, e.g. config.foo.bar
    pub path: String,
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Only dump the subtree at this dotted path
    pub path: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Parse `NAMESPACE=PATH`, splitting on the first `=`.
pub fn parse_source(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((namespace, path)) if !namespace.is_empty() && !path.is_empty() => {
            Ok((namespace.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("invalid source '{value}': expected NAMESPACE=PATH")),
    }
}

/// Parse a `--default` value: JSON when it parses, a plain string otherwise.
pub fn parse_default(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

/// Read a manifest of namespace to path declarations.
///
/// Relative string paths are taken relative to the manifest's directory.
/// Other values are passed through so the loader can reject them.
pub fn read_manifest(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let mut declarations: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse manifest {}", path.display()))?;

    let base = path.parent().unwrap_or(Path::new(""));
    let rebase = |value: &mut Value| {
        if let Value::String(source) = value
            && Path::new(source.as_str()).is_relative()
        {
            *source = base.join(source.as_str()).to_string_lossy().into_owned();
        }
    };
    match &mut declarations {
        Value::Object(map) => map.values_mut().for_each(rebase),
        Value::Array(list) => list.iter_mut().for_each(rebase),
        _ => {}
    }
    Ok(declarations)
}

/// Name checked against the tree before a `--dir` source is expanded.
fn dir_namespace(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

impl Cli {
    /// Load the manifest, then `--source` entries, then `--dir` entries.
    pub fn build_loader(&self) -> Result<ConfigLoader> {
        let mut loader = ConfigLoader::new();

        if let Some(manifest) = &self.manifest {
            let declarations = read_manifest(manifest)?;
            loader
                .load_declarations(&declarations)
                .with_context(|| format!("failed to load manifest {}", manifest.display()))?;
        }

        loader.load(self.sources.iter().map(|(ns, path)| (ns.as_str(), path.as_path())))?;
        loader.load(self.dirs.iter().map(|dir| (dir_namespace(dir), dir.as_path())))?;

        info!(namespaces = loader.items().len(), "configuration loaded");
        Ok(loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            parse_source("db=conf/db.yml").unwrap(),
            ("db".to_string(), PathBuf::from("conf/db.yml"))
        );
        assert_eq!(
            parse_source("url=a=b.json").unwrap(),
            ("url".to_string(), PathBuf::from("a=b.json"))
        );
        assert!(parse_source("conf/db.yml").is_err());
        assert!(parse_source("=db.yml").is_err());
    }

    #[test]
    fn test_parse_default() {
        assert_eq!(parse_default("42"), json!(42));
        assert_eq!(parse_default(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_default("fallback"), json!("fallback"));
    }

    #[test]
    fn test_cli_parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nsconfig", "get", "db.host", "--source", "db=db.yml", "-D", "conf", "--default", "x",
        ])
        .unwrap();

        assert_eq!(cli.sources, vec![("db".to_string(), PathBuf::from("db.yml"))]);
        assert_eq!(cli.dirs, vec![PathBuf::from("conf")]);
        let Command::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.path, "db.host");
        assert_eq!(args.default.as_deref(), Some("x"));
    }

    #[test]
    fn test_dump_format_flag() {
        let cli = Cli::try_parse_from(["nsconfig", "dump", "--format", "yaml"]).unwrap();
        let Command::Dump(args) = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(args.format, OutputFormat::Yaml);
        assert!(args.path.is_none());
    }

    #[test]
    fn test_read_manifest_rebases_relative_paths() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("manifest.yml");
        fs::write(&manifest, "app: app.json\nabs: /etc/abs.json\nbad: 3\n").unwrap();

        let declarations = read_manifest(&manifest).unwrap();
        let expected = temp.path().join("app.json");
        assert_eq!(declarations["app"], json!(expected.to_string_lossy()));
        assert_eq!(declarations["abs"], json!("/etc/abs.json"));
        assert_eq!(declarations["bad"], json!(3));
    }

    #[test]
    fn test_build_loader_from_all_source_kinds() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.json"), r#"{"name": "demo"}"#).unwrap();
        fs::write(temp.path().join("db.yml"), "host: localhost\n").unwrap();
        let conf = temp.path().join("conf");
        fs::create_dir(&conf).unwrap();
        fs::write(conf.join("cache.ini"), "driver = redis\n").unwrap();
        let manifest = temp.path().join("manifest.json");
        fs::write(&manifest, r#"{"app": "app.json"}"#).unwrap();

        let cli = Cli {
            sources: vec![("db".to_string(), temp.path().join("db.yml"))],
            dirs: vec![conf],
            manifest: Some(manifest),
            verbose: false,
            log: "0".to_string(),
            command: Command::Bindings,
        };
        let loader = cli.build_loader().unwrap();

        assert_eq!(loader.get("app.name"), Some(json!("demo")));
        assert_eq!(loader.get("db.host"), Some(json!("localhost")));
        assert_eq!(loader.get("cache.driver"), Some(json!("redis")));
    }
}

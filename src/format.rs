//! Output formatting for the CLI.

use clap::ValueEnum;
use serde_json::Value;

/// Output format for dumped trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Render a whole tree or subtree.
pub fn render(value: &Value, format: OutputFormat) -> anyhow::Result<String> {
    let mut out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Render one looked-up value. Strings are printed bare so the output can be
/// used directly in shell scripts.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Two-column listing of (name, implementation id) pairs.
pub fn render_bindings<'a>(heading: &str, pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let pairs: Vec<_> = pairs.collect();
    let width = pairs.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    let mut out = format!("{heading}:\n");
    for (name, id) in pairs {
        out.push_str(&format!("  {name:<width$}  {id}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_json_and_yaml() {
        let value = json!({"db": {"host": "localhost", "port": 5432}});

        let as_json = render(&value, OutputFormat::Json).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&as_json).unwrap(), value);
        assert!(as_json.ends_with('\n'));

        let as_yaml = render(&value, OutputFormat::Yaml).unwrap();
        assert!(as_yaml.contains("host: localhost"));
        assert_eq!(serde_yaml::from_str::<Value>(&as_yaml).unwrap(), value);
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("mysql")), "mysql");
        assert_eq!(render_value(&json!(3306)), "3306");
        assert_eq!(render_value(&json!({"a": [1]})), r#"{"a":[1]}"#);
    }

    #[test]
    fn test_render_bindings_aligns_names() {
        let out = render_bindings("resolvers", [("env", "EnvResolver"), ("secret", "Vault")].into_iter());
        assert_eq!(out, "resolvers:\n  env     EnvResolver\n  secret  Vault\n");
    }
}

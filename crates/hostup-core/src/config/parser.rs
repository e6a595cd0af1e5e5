//! Reading `hostup.toml`.

use super::schema::ProvisionConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse hostup.toml with detailed error messages
pub fn parse_config(path: &Path) -> Result<ProvisionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse hostup.toml content from string
pub fn parse_config_str(content: &str) -> Result<ProvisionConfig> {
    let config: ProvisionConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Render the effective configuration as TOML.
pub fn to_toml(config: &ProvisionConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config to TOML")
}

/// Point at the offending line of a malformed document.
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let Some(span) = error.span() else {
        return anyhow::anyhow!("invalid TOML: {}", error.message());
    };

    let line = content[..span.start.min(content.len())].matches('\n').count() + 1;
    anyhow::anyhow!(
        "invalid TOML at line {line}: {}\n{}",
        error.message(),
        excerpt(content, line)
    )
}

/// The failing line with one line of surrounding context, numbered.
fn excerpt(content: &str, line: usize) -> String {
    let first = line.saturating_sub(1).max(1);
    let mut out = String::new();
    for (num, text) in content.lines().enumerate().map(|(i, l)| (i + 1, l)) {
        if num < first || num > line + 1 {
            continue;
        }
        let gutter = if num == line { "->" } else { "  " };
        out.push_str(&format!("{gutter}{num:>4} | {text}\n"));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config_str("").expect("empty config should parse");
        assert_eq!(config.app.name, "app");
        assert_eq!(config.account_name(), "app");
    }

    #[test]
    fn invalid_value_reports_line() {
        let err = parse_config_str("[app]\nname = \"svc\"\nlisten_port = \"high\"\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 3"), "unexpected message: {message}");
        assert!(message.contains("->   3 | listen_port = \"high\""), "unexpected message: {message}");
    }

    #[test]
    fn rendered_config_parses_back() {
        let config = ProvisionConfig::default();
        let rendered = to_toml(&config).expect("render should succeed");
        let parsed = parse_config_str(&rendered).expect("rendered config should parse");
        assert_eq!(parsed.toolchain.version, config.toolchain.version);
    }
}

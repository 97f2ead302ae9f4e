// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with "did you mean" suggestions.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with enough context for miette to render source
/// spans, suggestions, and the list of accepted keys.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section of `OrdeskConfig` accepts.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(ordesk::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The key as written in the file or environment.
        key: String,
        /// Closest accepted key, when one is similar enough.
        suggestion: Option<String>,
        /// Accepted keys for the enclosing section, comma separated.
        valid_keys: String,
        /// Byte range of the key in its TOML file, when it came from one.
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        /// The TOML file the key was found in.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the field's type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(ordesk::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path of the offending key.
        key: String,
        /// The value figment actually found.
        detail: String,
        /// The type the field accepts.
        expected: String,
    },

    /// A field with no default that no source provided.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(ordesk::config::missing_key),
        help("add `{key} = <value>` to your ordesk.toml")
    )]
    MissingKey {
        /// Dotted path of the missing key.
        key: String,
    },

    /// A value deserialized but violates a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(ordesk::config::validation))]
    Validation {
        /// Which rule failed and for which key.
        message: String,
    },

    /// Any other figment failure, carried as its rendered message.
    #[error("configuration error: {0}")]
    #[diagnostic(code(ordesk::config::other))]
    Other(String),
}

/// Help line for `UnknownKey`: the suggestion first, then every accepted key.
fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error inside a `figment::Error` into a `ConfigError`.
///
/// `toml_sources` pairs file paths with their content so unknown keys can
/// be pointed at in the rendered report.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let (span, src) = find_source_span(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid_keys),
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error
                    .path
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(format!("{error}")),
        })
        .collect()
}

/// Locate an unknown key in the TOML file figment read it from.
fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let Some((path, content)) = source_path
        .as_ref()
        .and_then(|path| {
            toml_sources
                .iter()
                .find(|(p, _)| p == path || std::path::Path::new(path).ends_with(p))
        })
    else {
        return (None, None);
    };

    let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
    match find_key_offset(content, &section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside the `[path[0]]` table of `content`.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = match path.first() {
        None => 0,
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header).map(|pos| pos + header.len())?
        }
    };

    let mut byte_offset = 0;
    for line in content[search_start..].lines() {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && (after.starts_with(' ') || after.starts_with('=') || after.starts_with('\t'))
        {
            return Some(search_start + byte_offset + (line.len() - trimmed.len()));
        }
        byte_offset += line.len() + 1;
    }

    None
}

/// Best Jaro-Winkler match for `unknown` above the suggestion threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_webhook_url_for_typo() {
        let valid = &["enabled", "webhook_url", "timeout_secs"];
        assert_eq!(
            suggest_key("webhok_url", valid),
            Some("webhook_url".to_string())
        );
    }

    #[test]
    fn suggests_cursor_name() {
        let valid = &["cursor_name"];
        assert_eq!(suggest_key("cursr_name", valid), Some("cursor_name".to_string()));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["host", "port", "bearer_token"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[storage]\nwal_mode = true\n\n[chat]\nchanel_timeout_ms = 5\n";
        let path = vec!["chat".to_string()];
        let offset = find_key_offset(content, &path, "chanel_timeout_ms").unwrap();
        assert_eq!(&content[offset..offset + 17], "chanel_timeout_ms");
    }

    #[test]
    fn find_key_offset_missing_section() {
        let content = "[storage]\nwal_mode = true\n";
        let path = vec!["gateway".to_string()];
        assert_eq!(find_key_offset(content, &path, "port"), None);
    }

    #[test]
    fn help_text_names_suggestion_and_fix() {
        let unknown = ConfigError::UnknownKey {
            key: "prot".into(),
            suggestion: Some("port".into()),
            valid_keys: "host, port".into(),
            span: None,
            src: None,
        };
        assert_eq!(
            unknown.help().map(|h| h.to_string()).as_deref(),
            Some("did you mean `port`? Valid keys: host, port")
        );

        let missing = ConfigError::MissingKey { key: "db_path".into() };
        assert_eq!(
            missing.help().map(|h| h.to_string()).as_deref(),
            Some("add `db_path = <value>` to your ordesk.toml")
        );
        assert_eq!(missing.to_string(), "missing required key `db_path`");
    }
}

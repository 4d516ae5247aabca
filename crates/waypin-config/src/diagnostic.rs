// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment errors are turned into miette diagnostics that point at the
//! offending key in the TOML file it came from. Unknown keys get a
//! "did you mean" hint ranked by Jaro-Winkler similarity.

#![allow(unused_assignments)] // emitted by the miette Diagnostic derive

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Below this Jaro-Winkler score a key is not offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One problem found while loading or validating configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(waypin::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[section]` or "top level".
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a {section} key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(waypin::config::invalid_value), help("expected {expected}"))]
    InvalidValue {
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing key `{key}`")]
    #[diagnostic(
        code(waypin::config::missing_key),
        help("set `{key}` in waypin.toml or through its WAYPIN_ variable")
    )]
    MissingKey { key: String },

    /// A value that parsed but is out of range or unusable.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(waypin::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(waypin::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? expected one of: {valid_keys}"),
        None => format!("expected one of: {valid_keys}"),
    }
}

/// TOML sources that contributed to a figment, by display path.
struct Sources<'a>(&'a [(String, String)]);

impl Sources<'_> {
    /// The source an error came from. A single source is assumed to be it,
    /// which covers inline strings that carry no file metadata.
    fn origin(&self, error: &figment::Error) -> Option<&(String, String)> {
        let from_file = error
            .metadata
            .as_ref()
            .and_then(|m| m.source.as_ref())
            .and_then(|source| match source {
                figment::Source::File(path) => Some(path.display().to_string()),
                _ => None,
            });
        match from_file {
            Some(path) => self.0.iter().find(|(p, _)| *p == path),
            None if self.0.len() == 1 => self.0.first(),
            None => None,
        }
    }

    fn locate(
        &self,
        error: &figment::Error,
        section: Option<&str>,
        key: &str,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        let Some((path, content)) = self.origin(error) else {
            return (None, None);
        };
        match locate_key(content, section, key) {
            Some(offset) => (
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(path, content.clone())),
            ),
            None => (None, None),
        }
    }
}

/// Convert every error carried by a `figment::Error` into a diagnostic.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    let sources = Sources(toml_sources);

    err.into_iter()
        .map(|error| {
            let section = error.path.first().cloned();
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let (span, src) = sources.locate(&error, section.as_deref(), key);
                    ConfigError::UnknownKey {
                        key: key.clone(),
                        section: section
                            .as_deref()
                            .map_or_else(|| "top level".to_string(), |s| format!("[{s}]")),
                        suggestion: suggest_key(key, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: dotted(&error.path, key),
                },
                Kind::InvalidType(found, expected) => {
                    // The path ends with the key itself.
                    let key = error.path.last().cloned().unwrap_or_default();
                    let parent = (error.path.len() > 1).then(|| error.path[0].as_str());
                    let (span, src) = sources.locate(&error, parent, &key);
                    ConfigError::InvalidValue {
                        key: error.path.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted(path: &[String], key: &str) -> String {
    path.iter()
        .map(String::as_str)
        .chain(std::iter::once(key))
        .collect::<Vec<_>>()
        .join(".")
}

/// Byte offset of `key` inside `[section]` (or before any header when
/// `section` is `None`). Keys that only share a prefix do not match.
pub fn locate_key(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
        } else if current == section
            && let Some(rest) = trimmed.strip_prefix(key)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// The valid key closest to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print each error to stderr as a miette report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_limit_for_limt() {
        let valid = &["primary_url", "secondary_url", "user_agent", "language", "limit"];
        assert_eq!(suggest_key("limt", valid), Some("limit".to_string()));
    }

    #[test]
    fn suggests_user_agent_for_useragent() {
        let valid = &["primary_url", "user_agent", "timeout_secs"];
        assert_eq!(
            suggest_key("useragent", valid),
            Some("user_agent".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        assert_eq!(suggest_key("zzzzzz", &["host", "port"]), None);
    }

    #[test]
    fn locates_key_in_its_own_section() {
        let content = "[gateway]\nlimt = 1\n\n[geocode]\nlimt = 3\n";
        let o = locate_key(content, Some("geocode"), "limt").unwrap();
        assert_eq!(&content[o..o + 8], "limt = 3");
    }

    #[test]
    fn prefix_matches_are_not_keys() {
        let content = "[storage]\nwal_mode_x = true\n";
        assert_eq!(locate_key(content, Some("storage"), "wal_mode"), None);
    }

    #[test]
    fn top_level_keys_stop_at_first_header() {
        let content = "name = 1\n[app]\nname = 2\n";
        assert_eq!(locate_key(content, None, "name"), Some(0));
        assert_eq!(locate_key(content, Some("app"), "name"), Some(15));
    }
}

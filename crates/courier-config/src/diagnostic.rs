// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with "did you mean?" suggestions.

#![allow(unused_assignments)] // emitted by the miette derive

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One problem found while loading `courier.toml`.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// Key not present in the config model.
    #[error("`{key}` is not a courier setting")]
    #[diagnostic(
        code(courier::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("unrecognised")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type ({detail})")]
    #[diagnostic(code(courier::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("`{key}` must be set")]
    #[diagnostic(
        code(courier::config::missing_key),
        help("add `{key} = <value>` to your courier.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but is not usable.
    #[error("{message}")]
    #[diagnostic(code(courier::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no dedicated variant.
    #[error("{0}")]
    #[diagnostic(code(courier::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(close) => format!("perhaps `{close}`; this section accepts: {valid_keys}"),
        None => format!("this section accepts: {valid_keys}"),
    }
}

/// Splits a `figment::Error` chain into one diagnostic per failure.
///
/// `toml_sources` pairs each candidate file path with its contents so unknown
/// keys can be pointed at in the original text.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| diagnose(&error, toml_sources))
        .collect()
}

fn diagnose(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = find_source_span(error, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: qualified(error, field),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: dotted_path(error),
            detail: format!("found {actual}"),
            expected: expected.clone(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// `section.key` path figment recorded for the failing value.
fn dotted_path(error: &figment::Error) -> String {
    error.path.join(".")
}

fn qualified(error: &figment::Error, field: &str) -> String {
    if error.path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", dotted_path(error))
    }
}

fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = match error.metadata.as_ref().and_then(|meta| meta.source.as_ref()) {
        Some(figment::Source::File(file)) => Some(file.display().to_string()),
        _ => None,
    };

    // Inline strings carry no file metadata; fall back to the only source given.
    let source = match source_path {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    if let Some((path, content)) = source {
        if let Some(offset) = find_key_offset(content, &error.path, field) {
            let span = SourceSpan::new(offset.into(), field.len());
            return (Some(span), Some(NamedSource::new(path, content.clone())));
        }
    }

    (None, None)
}

/// Byte offset of `field` in TOML `content`, searching after the `[section]` header.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = match path.first() {
        None => 0,
        Some(section) => {
            let table = format!("[{section}]");
            content.find(&table)? + table.len()
        }
    };

    let mut byte_offset = 0;
    for line in content[search_start..].split_inclusive('\n') {
        let body = line.trim_start();
        if let Some(rest) = body.strip_prefix(field)
            && rest.starts_with([' ', '=', '\t'])
        {
            let indent = line.len() - body.len();
            return Some(search_start + byte_offset + indent);
        }
        byte_offset += line.len();
    }

    None
}

/// Best Jaro-Winkler match for `unknown` above the suggestion threshold.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, valid_keys: &[S]) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for key in valid_keys.iter().map(AsRef::as_ref) {
        let similarity = strsim::jaro_winkler(unknown, key);
        if similarity > SUGGESTION_THRESHOLD && best.is_none_or(|(top, _)| similarity > top) {
            best = Some((similarity, key));
        }
    }
    best.map(|(_, key)| key.to_string())
}

/// Prints every diagnostic to stderr, followed by a count.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("courier: {error}"),
        }
    }
    let noun = if errors.len() == 1 { "error" } else { "errors" };
    eprintln!("courier: configuration rejected ({} {noun})", errors.len());
}

use serde::Deserialize;
use std::fmt;

pub const DEFAULT_RUNTIME_IMPORT_PATH: &str = "encore.dev/runtime";
pub const DEFAULT_RUNTIME_ALIAS: &str = "__encore_runtime";
pub const DEFAULT_WRAPPER_PREFIX: &str = "__encore_";
pub const DEFAULT_WRAPPER_FILE: &str = "encore_rpc_wrappers.go";

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub wrappers: WrapperConfig,
}

/// The runtime support package rewritten code calls into.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    #[serde(default = "default_import_path")]
    pub import_path: String,
    /// Local package name used for the injected import
    #[serde(default = "default_alias")]
    pub alias: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            import_path: default_import_path(),
            alias: default_alias(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WrapperConfig {
    /// Wrapper name is `prefix + service + "_" + procedure`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            file_name: default_file_name(),
        }
    }
}

fn default_import_path() -> String {
    DEFAULT_RUNTIME_IMPORT_PATH.to_string()
}

fn default_alias() -> String {
    DEFAULT_RUNTIME_ALIAS.to_string()
}

fn default_prefix() -> String {
    DEFAULT_WRAPPER_PREFIX.to_string()
}

fn default_file_name() -> String {
    DEFAULT_WRAPPER_FILE.to_string()
}

impl RewriteConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.runtime.import_path.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "runtime.import_path",
            });
        }
        if !is_go_identifier(&self.runtime.alias) || self.runtime.alias == "_" {
            issues.push(ValidationIssue::NotAnIdentifier {
                field: "runtime.alias",
                value: self.runtime.alias.clone(),
            });
        }
        if !is_go_identifier(&self.wrappers.prefix) {
            issues.push(ValidationIssue::NotAnIdentifier {
                field: "wrappers.prefix",
                value: self.wrappers.prefix.clone(),
            });
        }

        let file_name = &self.wrappers.file_name;
        if !file_name.ends_with(".go") || file_name.len() <= 3 {
            issues.push(ValidationIssue::InvalidValue {
                field: "wrappers.file_name",
                message: format!("'{file_name}' is not a .go file name"),
            });
        } else if file_name.contains(['/', '\\']) {
            issues.push(ValidationIssue::InvalidValue {
                field: "wrappers.file_name",
                message: format!("'{file_name}' must not contain a directory"),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

/// ASCII subset of Go identifiers: a letter or `_`, then letters, digits, `_`.
pub fn is_go_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl ValidationError {
    /// Dotted keys with at least one issue, in first-reported order.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Vec::with_capacity(self.issues.len());
        for issue in &self.issues {
            if !fields.contains(&issue.field()) {
                fields.push(issue.field());
            }
        }
        fields
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    NotAnIdentifier {
        field: &'static str,
        value: String,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ValidationIssue {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationIssue::MissingField { field }
            | ValidationIssue::NotAnIdentifier { field, .. }
            | ValidationIssue::InvalidValue { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::NotAnIdentifier { field, value } => {
                write!(f, "'{field}' must be a Go identifier, got '{value}'")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid '{field}': {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RewriteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.runtime.import_path, "encore.dev/runtime");
        assert_eq!(config.wrappers.prefix, "__encore_");
    }

    #[test]
    fn identifiers() {
        assert!(is_go_identifier("__encore_runtime"));
        assert!(is_go_identifier("rt2"));
        assert!(!is_go_identifier("2rt"));
        assert!(!is_go_identifier("a-b"));
        assert!(!is_go_identifier(""));
    }

    #[test]
    fn collects_every_issue() {
        let config = RewriteConfig {
            runtime: RuntimeConfig {
                import_path: " ".to_string(),
                alias: "not-ok".to_string(),
            },
            wrappers: WrapperConfig {
                prefix: "9x".to_string(),
                file_name: "wrappers.txt".to_string(),
            },
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues.len(), 4);
        assert!(err.to_string().contains("runtime.alias"));
        assert_eq!(
            err.fields(),
            vec![
                "runtime.import_path",
                "runtime.alias",
                "wrappers.prefix",
                "wrappers.file_name"
            ]
        );
    }

    #[test]
    fn file_name_must_be_bare() {
        let mut config = RewriteConfig::default();
        config.wrappers.file_name = "gen/wrappers.go".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.issues[0],
            ValidationIssue::InvalidValue {
                field: "wrappers.file_name",
                ..
            }
        ));
    }
}

use crate::config::types::{Result, ScriptError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The scripting languages an executor can front
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// General-purpose expression language
    Eol,
    /// Comparison
    Ecl,
    /// Transformation
    Etl,
    /// Merging
    Eml,
    /// Validation
    Evl,
    /// Template generation
    Egl,
    /// Rule-driven generation
    Egx,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Eol,
        Language::Ecl,
        Language::Etl,
        Language::Eml,
        Language::Evl,
        Language::Egl,
        Language::Egx,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Eol => "eol",
            Language::Ecl => "ecl",
            Language::Etl => "etl",
            Language::Eml => "eml",
            Language::Evl => "evl",
            Language::Egl => "egl",
            Language::Egx => "egx",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.name()
    }

    /// Whether the language is rule based and may expose rule timings
    pub fn is_rule_based(&self) -> bool {
        !matches!(self, Language::Eol | Language::Egl)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ScriptError::Config(format!(
                    "cannot infer language of {}: no extension",
                    path.display()
                ))
            })?;
        language_for(&extension.to_ascii_lowercase())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn language_for(language: &str) -> Result<Language> {
    match language {
        "eol" | "expression" | "script" => Ok(Language::Eol),
        "ecl" | "comparison" => Ok(Language::Ecl),
        "etl" | "transformation" => Ok(Language::Etl),
        "eml" | "merging" => Ok(Language::Eml),
        "evl" | "validation" => Ok(Language::Evl),
        "egl" | "template" => Ok(Language::Egl),
        "egx" | "generation" => Ok(Language::Egx),
        _ => Err(ScriptError::Config(format!(
            "unsupported language: {language}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for language in Language::ALL {
            assert_eq!(language_for(language.name()).unwrap(), language);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(language_for("validation").unwrap(), Language::Evl);
        assert_eq!(language_for("script").unwrap(), Language::Eol);
    }

    #[test]
    fn test_unknown_language() {
        let err = language_for("cobol").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("unsupported language: cobol"));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path("rules/check.EVL").unwrap(), Language::Evl);
        assert!(Language::from_path("Makefile").is_err());
    }

    #[test]
    fn test_rule_based() {
        assert!(Language::Etl.is_rule_based());
        assert!(!Language::Eol.is_rule_based());
    }
}

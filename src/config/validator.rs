// Input validation, run before every execution so that controllers
// assembled lazily are checked at the point they are used.

use crate::config::types::{ExecutionSource, Result, ScriptError};
use crate::core::value::Parameters;

/// Validation result with detailed errors
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Errors become one `ScriptError::Config`; warnings are logged
    pub fn into_result(self) -> Result<Vec<String>> {
        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
        if self.valid {
            Ok(self.warnings)
        } else {
            Err(ScriptError::Config(self.errors.join("; ")))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate what a controller was given
pub fn validate_inputs(source: &ExecutionSource, parameters: &Parameters) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_source(source, &mut result);
    validate_parameters(parameters, &mut result);

    result
}

fn validate_source(source: &ExecutionSource, result: &mut ValidationResult) {
    match (&source.script, &source.code) {
        (None, None) => {
            result.add_error("No script or code to execute".to_string());
        }
        (Some(path), Some(_)) => {
            result.add_warning(format!(
                "Both script {} and inline code given; the script is used",
                path.display()
            ));
        }
        (Some(path), None) if path.as_os_str().is_empty() => {
            result.add_error("script path cannot be empty".to_string());
        }
        _ => {}
    }
}

fn validate_parameters(parameters: &Parameters, result: &mut ValidationResult) {
    let mut names: Vec<&String> = parameters.keys().collect();
    names.sort();
    for name in names {
        if name.trim().is_empty() {
            result.add_error("parameter name cannot be empty".to_string());
        } else if name.chars().any(char::is_whitespace) {
            result.add_warning(format!(
                "parameter name '{}' contains whitespace and cannot be referenced from scripts",
                name
            ));
        }
    }
}

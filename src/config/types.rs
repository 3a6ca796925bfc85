/// Shared types, closed enums and errors for the scriptbox system
use crate::core::module::ParseProblem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a program comes from. A script path wins over inline code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSource {
    pub script: Option<PathBuf>,
    pub code: Option<String>,
}

impl ExecutionSource {
    pub fn script<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            script: Some(path.into()),
            code: None,
        }
    }

    pub fn code<S: Into<String>>(code: S) -> Self {
        Self {
            script: None,
            code: Some(code.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.code.is_none()
    }

    /// Pick the form the parser should see, or `None` when nothing was given.
    pub fn resolve(&self) -> Option<SourceRef<'_>> {
        match (&self.script, &self.code) {
            (Some(path), _) => Some(SourceRef::Script(path.as_path())),
            (None, Some(code)) => Some(SourceRef::Code(code.as_str())),
            (None, None) => None,
        }
    }
}

/// Borrowed view of the resolved source form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceRef<'a> {
    Script(&'a Path),
    Code(&'a str),
}

impl SourceRef<'_> {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceRef::Script(_) => SourceKind::Script,
            SourceRef::Code(_) => SourceKind::Code,
        }
    }
}

/// Which source form a parse failure refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Script,
    Code,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Script => write!(f, "script"),
            SourceKind::Code => write!(f, "code"),
        }
    }
}

/// Profiled lifecycle stages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    PrepareExecution,
    PreProcess,
    Execute,
    PostProcess,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::PrepareExecution,
        Stage::PreProcess,
        Stage::Execute,
        Stage::PostProcess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PrepareExecution => "prepareExecution",
            Stage::PreProcess => "preProcess",
            Stage::Execute => "execute",
            Stage::PostProcess => "postProcess",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller lifecycle, strictly sequential
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Constructed,
    Parsed,
    Prepared,
    PreProcessed,
    Executed,
    PostProcessed,
    /// A run aborted; the remaining stages were skipped
    Failed,
    Disposed,
}

/// Faults raised by a wrapped engine module
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("could not read source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Runtime(String),

    #[error("Model error: {0}")]
    Model(String),
}

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse provided {culprit}: {summary}")]
    Parse {
        culprit: SourceKind,
        summary: String,
        problems: Vec<ParseProblem>,
        #[source]
        source: Option<EngineError>,
    },

    #[error("{message}: {source}")]
    Execution {
        message: String,
        #[source]
        source: EngineError,
    },

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: EngineError,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// Problems reported by the parser, empty for every other kind
    pub fn parse_problems(&self) -> &[ParseProblem] {
        match self {
            ScriptError::Parse { problems, .. } => problems,
            _ => &[],
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ScriptError::Config(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, ScriptError::Parse { .. })
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, ScriptError::Execution { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;

/// Result alias for engine-side operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

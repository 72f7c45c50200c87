use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Failures raised by the manuscript, ledger and export layers.
///
/// These are created at the point of failure and travel inside
/// `anyhow::Error`; callers that care about the kind can
/// `downcast_ref::<ProjectError>()`.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fragment is not a text file: {}", path.display())]
    Binary { path: PathBuf },

    #[error("malformed line {line} in {}: {content:?}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ExternalTool { program: String, status: ExitStatus },

    #[error("{0}")]
    Config(String),
}

impl ProjectError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

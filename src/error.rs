use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage in which a division by zero was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalize,
    Overhead,
    Throughput,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Normalize => "per-unit normalization",
            Stage::Overhead => "overhead extraction",
            Stage::Throughput => "throughput inversion",
        };
        f.write_str(name)
    }
}

/// Errors raised while loading, transforming or rendering benchmark data.
///
/// Every variant is fatal to the chart being generated.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("dataset `{0}` not found in catalog")]
    DatasetNotFound(String),

    #[error("malformed series `{dataset}`: {reason}")]
    MalformedSeries { dataset: String, reason: String },

    #[error("division by zero in `{dataset}` at sample {index} during {stage}")]
    DivisionByZero {
        dataset: String,
        index: usize,
        stage: Stage,
    },

    #[error("failed to render `{}`: {reason}", .path.display())]
    Render { path: PathBuf, reason: String },

    #[error("invalid chart `{chart}`: {reason}")]
    InvalidChart { chart: String, reason: String },
}

impl PlotError {
    pub(crate) fn malformed(dataset: &str, reason: impl Into<String>) -> Self {
        PlotError::MalformedSeries {
            dataset: dataset.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_chart(chart: &str, reason: impl Into<String>) -> Self {
        PlotError::InvalidChart {
            chart: chart.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = PlotError> = std::result::Result<T, E>;

use crate::error::{PlotError, Result};
use crate::transform::DEFAULT_POINTER_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Categorical color slot. The same variant keeps the same slot in every
/// chart so it stays recognizable across a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorToken {
    C0,
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
    C8,
    C9,
}

/// Where the legend box sits inside the plotting area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendLoc {
    #[default]
    UpperLeft,
    UpperCenter,
    UpperRight,
    CenterLeft,
    Center,
    CenterRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
    /// No legend; bar charts name their variants on the x axis instead.
    Hidden,
}

/// Scalar drawn as one bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BarSource {
    /// A constant measured elsewhere (e.g. empty-container overhead)
    Fixed { value: f64 },
    /// Per-operation latency in nanoseconds, drawn as operations per second
    Throughput { latency_ns: f64 },
    /// Bytes per element at the largest size of a memory run
    Overhead {
        dataset: String,
        #[serde(default = "default_pointer_width")]
        pointer_width: f64,
    },
}

/// Most decimals a bar value label may carry; beyond this `f64` has no digits left.
pub const MAX_LABEL_DECIMALS: usize = 15;

fn default_pointer_width() -> f64 {
    DEFAULT_POINTER_WIDTH
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarVariant {
    pub label: String,
    pub color: ColorToken,
    pub source: BarSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineVariant {
    pub label: String,
    pub color: ColorToken,
    pub dataset: String,
    /// Divide each measurement by its size before drawing
    #[serde(default)]
    pub per_unit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartKind {
    Bar {
        variants: Vec<BarVariant>,
        /// Embed the value in each bar label with this many decimals
        #[serde(default)]
        value_label: Option<usize>,
    },
    Line {
        variants: Vec<LineVariant>,
    },
}

/// Declarative description of one comparison chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub xlabel: Option<String>,
    pub ylabel: String,
    #[serde(default)]
    pub legend_loc: LegendLoc,
    pub output: PathBuf,
    #[serde(flatten)]
    pub kind: ChartKind,
}

impl ChartSpec {
    pub fn bar(
        name: &str,
        title: &str,
        ylabel: &str,
        output: impl Into<PathBuf>,
        variants: Vec<BarVariant>,
    ) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            xlabel: None,
            ylabel: ylabel.to_string(),
            legend_loc: LegendLoc::Hidden,
            output: output.into(),
            kind: ChartKind::Bar {
                variants,
                value_label: None,
            },
        }
    }

    pub fn line(
        name: &str,
        title: &str,
        ylabel: &str,
        output: impl Into<PathBuf>,
        variants: Vec<LineVariant>,
    ) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            xlabel: Some("Number of elements".to_string()),
            ylabel: ylabel.to_string(),
            legend_loc: LegendLoc::UpperLeft,
            output: output.into(),
            kind: ChartKind::Line { variants },
        }
    }

    pub fn with_xlabel(mut self, xlabel: &str) -> Self {
        self.xlabel = Some(xlabel.to_string());
        self
    }

    pub fn with_legend(mut self, legend_loc: LegendLoc) -> Self {
        self.legend_loc = legend_loc;
        self
    }

    /// Embed bar values in labels. No effect on line charts.
    pub fn with_value_label(mut self, decimals: usize) -> Self {
        if let ChartKind::Bar { value_label, .. } = &mut self.kind {
            *value_label = Some(decimals);
        }
        self
    }

    /// Resolve a relative output path against `dir`
    pub fn output_in(mut self, dir: &Path) -> Self {
        if self.output.is_relative() {
            self.output = dir.join(&self.output);
        }
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ChartKind::Bar { .. } => "bar",
            ChartKind::Line { .. } => "line",
        }
    }

    pub fn variant_count(&self) -> usize {
        match &self.kind {
            ChartKind::Bar { variants, .. } => variants.len(),
            ChartKind::Line { variants } => variants.len(),
        }
    }

    /// Dataset identifiers this chart reads, in variant order
    pub fn datasets(&self) -> Vec<&str> {
        match &self.kind {
            ChartKind::Bar { variants, .. } => variants
                .iter()
                .filter_map(|v| match &v.source {
                    BarSource::Overhead { dataset, .. } => Some(dataset.as_str()),
                    _ => None,
                })
                .collect(),
            ChartKind::Line { variants } => variants.iter().map(|v| v.dataset.as_str()).collect(),
        }
    }

    /// Structural checks that need no data
    pub fn validate(&self) -> Result<()> {
        if self.variant_count() == 0 {
            return Err(PlotError::invalid_chart(&self.name, "chart has no variants"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(PlotError::invalid_chart(&self.name, "output path is empty"));
        }
        if let ChartKind::Bar {
            variants,
            value_label,
        } = &self.kind
        {
            if let Some(decimals) = value_label {
                if *decimals > MAX_LABEL_DECIMALS {
                    return Err(PlotError::invalid_chart(
                        &self.name,
                        format!("value_label {decimals} exceeds {MAX_LABEL_DECIMALS} decimals"),
                    ));
                }
            }
            for v in variants {
                let ok = match v.source {
                    BarSource::Fixed { value } => value.is_finite(),
                    BarSource::Throughput { latency_ns } => latency_ns.is_finite() && latency_ns >= 0.0,
                    BarSource::Overhead { pointer_width, .. } => pointer_width.is_finite(),
                };
                if !ok {
                    return Err(PlotError::invalid_chart(
                        &self.name,
                        format!("variant `{}` has a non-finite constant", v.label),
                    ));
                }
            }
        }
        Ok(())
    }
}

use crate::catalog::Catalog;
use crate::chart::render;
use crate::error::{PlotError, Result};
use crate::spec::{BarSource, BarVariant, ChartSpec, ColorToken, LegendLoc, LineVariant};
use crate::transform::extract_overhead;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Per-operation append latencies in nanoseconds, measured on the RISC-V board
const BLIST_APPEND_NS: f64 = 8938.0;
const STD_DEQUE_PUSH_BACK_NS: f64 = 814.0;
const STD_VECTOR_PUSH_BACK_NS: f64 = 417.0;
const STD_LIST_PUSH_BACK_NS: f64 = 43965.0;
const STD_FORWARD_LIST_INSERT_AFTER_NS: f64 = 42727.0;

/// Heap bytes held by an empty container
const EMPTY_OVERHEADS: &[(&str, ColorToken, f64)] = &[
    ("blist<int>", ColorToken::C0, 8.0),
    ("std::list<int>", ColorToken::C2, 12.0),
    ("std::forward_list<int>", ColorToken::C1, 4.0),
    ("std::deque<int>", ColorToken::C4, 596.0),
];

/// Memory runs compared by the overhead chart, with their display labels
pub const MEMORY_DATASETS: &[(&str, &str, ColorToken)] = &[
    ("cc_set_insert_randomized_memory", "blist_set<int> // sparse", ColorToken::C0),
    ("cc_set_insert_ascending_memory", "blist_set<int> // dense", ColorToken::C2),
    ("std_set_insert_randomized_memory", "std::set<int>", ColorToken::C1),
    ("std_unordered_set_insert_randomized_memory", "std::unordered_set<int>", ColorToken::C4),
];

fn curve(label: &str, color: ColorToken, dataset: &str, per_unit: bool) -> LineVariant {
    LineVariant {
        label: label.to_string(),
        color,
        dataset: dataset.to_string(),
        per_unit,
    }
}

fn throughput(label: &str, color: ColorToken, latency_ns: f64) -> BarVariant {
    BarVariant {
        label: label.to_string(),
        color,
        source: BarSource::Throughput { latency_ns },
    }
}

fn svg(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.svg"))
}

/// The standard set of comparison charts, writing `<name>.svg` into `output_dir`
pub fn builtin_charts(output_dir: &Path) -> Vec<ChartSpec> {
    use ColorToken::*;

    let mut charts = Vec::new();

    charts.push(ChartSpec::bar(
        "list_append_plot",
        "Append performance of list-like data structures (RISC-V)",
        "Operations per second [Hz]",
        svg(output_dir, "list_append_plot"),
        vec![
            throughput("blist<int>::append()", C0, BLIST_APPEND_NS),
            throughput("std::list<int>::push_back()", C1, STD_LIST_PUSH_BACK_NS),
            throughput(
                "std::forward_list<int>::insert_after()",
                C4,
                STD_FORWARD_LIST_INSERT_AFTER_NS,
            ),
        ],
    ));

    charts.push(ChartSpec::bar(
        "list_append_2_plot",
        "Append performance of list-like data structures (RISC-V)",
        "Operations per second [Hz]",
        svg(output_dir, "list_append_2_plot"),
        vec![
            throughput("blist::append()", C0, BLIST_APPEND_NS),
            throughput("std::deque::push_back()", C6, STD_DEQUE_PUSH_BACK_NS),
            throughput("std::vector::push_back()", C7, STD_VECTOR_PUSH_BACK_NS),
            throughput("std::list::push_back()", C1, STD_LIST_PUSH_BACK_NS),
            throughput(
                "std::forward_list::insert_after()",
                C4,
                STD_FORWARD_LIST_INSERT_AFTER_NS,
            ),
        ],
    ));

    charts.push(
        ChartSpec::line(
            "list_insert_randomized_plot",
            "Runtime cost of randomized list insertions (RISC-V)",
            "Duration [us]",
            svg(output_dir, "list_insert_randomized_plot"),
            vec![
                curve("blist<int>", C0, "cc_list_insert_randomized_runtime", true),
                curve("std::deque<int>", C4, "std_deque_insert_randomized_runtime", true),
                curve("std::vector<int>", C1, "std_vector_insert_randomized_runtime", true),
            ],
        )
        .with_legend(LegendLoc::UpperLeft),
    );

    charts.push(
        ChartSpec::line(
            "list_insert_randomized_2_plot",
            "Runtime cost of randomized list insertions (RISC-V)",
            "Duration [us]",
            svg(output_dir, "list_insert_randomized_2_plot"),
            vec![
                curve("blist<int>", C0, "cc_list_insert_randomized_runtime", true),
                curve("std::deque<int>", C4, "std_deque_insert_randomized_runtime", true),
            ],
        )
        .with_legend(LegendLoc::CenterRight),
    );

    charts.push(
        ChartSpec::line(
            "set_insert_plot",
            "Runtime cost of set insertions (RISC-V)",
            "Duration [us]",
            svg(output_dir, "set_insert_plot"),
            vec![
                curve("blist_set<int>::insert() // randomized", C0, "cc_set_insert_randomized_runtime", true),
                curve("blist_set<int>::insert() // ascending", C2, "cc_set_insert_ascending_runtime", true),
                curve("std::set<int>::insert()", C1, "std_set_insert_randomized_runtime", true),
            ],
        )
        .with_legend(LegendLoc::CenterRight),
    );

    charts.push(ChartSpec::line(
        "set_insert_memory_plot",
        "Memory cost of set insertions (RISC-V)",
        "Heap usage [bytes]",
        svg(output_dir, "set_insert_memory_plot"),
        vec![
            curve("blist_set<int>::insert() // randomized", C0, "cc_set_insert_randomized_memory", false),
            curve("blist_set<int>::insert() // ascending", C2, "cc_set_insert_ascending_memory", false),
            curve("std::set<int>::insert()", C1, "std_set_insert_randomized_memory", false),
        ],
    ));

    charts.push(
        ChartSpec::bar(
            "set_insert_memory_overhead_plot",
            "Memory overhead per item at set size 10000 (RISC-V)",
            "Overhead per element [bytes]",
            svg(output_dir, "set_insert_memory_overhead_plot"),
            MEMORY_DATASETS
                .iter()
                .map(|(dataset, label, color)| BarVariant {
                    label: label.to_string(),
                    color: *color,
                    source: BarSource::Overhead {
                        dataset: dataset.to_string(),
                        pointer_width: crate::transform::DEFAULT_POINTER_WIDTH,
                    },
                })
                .collect(),
        )
        .with_value_label(2),
    );

    charts.push(
        ChartSpec::line(
            "set_lookup_randomized_plot",
            "Runtime cost of randomized set lookups (RISC-V)",
            "Duration [us]",
            svg(output_dir, "set_lookup_randomized_plot"),
            vec![
                curve("blist_set<int>::contains() // sparse", C0, "cc_set_lookup_sparse_randomized_runtime", true),
                curve("blist_set<int>::contains() // dense", C2, "cc_set_lookup_dense_randomized_runtime", true),
                curve("std::set<int>::contains()", C1, "std_set_lookup_randomized_runtime", true),
            ],
        )
        .with_legend(LegendLoc::CenterRight),
    );

    charts.push(ChartSpec::line(
        "set_destruction_plot",
        "Runtime cost of set destruction (RISC-V)",
        "Duration [us]",
        svg(output_dir, "set_destruction_plot"),
        vec![
            curve("blist_set<int>::deplete() // sparse", C0, "cc_set_destruction_sparse_runtime", false),
            curve("blist_set<int>::deplete() // dense", C2, "cc_set_destruction_dense_runtime", false),
            curve("std::set<int>::clear()", C1, "std_set_destruction_runtime", false),
        ],
    ));

    charts.push(
        ChartSpec::bar(
            "zero_size_overheads_plot",
            "Memory overhead of empty container (RISC-V)",
            "Overhead [bytes]",
            svg(output_dir, "zero_size_overheads_plot"),
            EMPTY_OVERHEADS
                .iter()
                .map(|(label, color, bytes)| BarVariant {
                    label: label.to_string(),
                    color: *color,
                    source: BarSource::Fixed { value: *bytes },
                })
                .collect(),
        )
        .with_value_label(0),
    );

    charts
}

/// A report definition read from JSON: `{ "charts": [ ... ] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub charts: Vec<ChartSpec>,
}

impl ReportConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report config {}", path.display()))?;
        let config: ReportConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse report config {}", path.display()))?;
        Ok(config)
    }

    /// Charts with relative output paths placed under `output_dir`.
    /// Chart names must be unique.
    pub fn into_charts(self, output_dir: &Path) -> Result<Vec<ChartSpec>> {
        let mut seen = HashSet::new();
        for chart in &self.charts {
            if !seen.insert(chart.name.as_str()) {
                return Err(PlotError::invalid_chart(&chart.name, "chart name defined twice"));
            }
        }
        Ok(self
            .charts
            .into_iter()
            .map(|c| c.output_in(output_dir))
            .collect())
    }
}

/// Keep only the charts named in `names`, in the order given.
pub fn select_charts(charts: Vec<ChartSpec>, names: &[String]) -> Result<Vec<ChartSpec>> {
    if names.is_empty() {
        return Ok(charts);
    }
    names
        .iter()
        .map(|name| {
            charts
                .iter()
                .find(|c| &c.name == name)
                .cloned()
                .ok_or_else(|| PlotError::invalid_chart(name, "no chart with this name"))
        })
        .collect()
}

/// Render each chart in order. Stops at the first chart that fails.
pub fn generate_report(charts: &[ChartSpec], catalog: &Catalog) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = render(chart, catalog)
            .with_context(|| format!("Failed to generate chart `{}`", chart.name))?;
        written.push(path);
    }
    info!(charts = written.len(), "report complete");
    Ok(written)
}

/// One row of the overhead table
#[derive(Debug, Clone, PartialEq)]
pub struct OverheadRow {
    pub dataset: String,
    pub size: f64,
    pub bytes_per_element: f64,
    pub overhead: f64,
}

/// Overhead of each dataset at its largest measured size
pub fn overhead_table(
    catalog: &Catalog,
    datasets: &[&str],
    pointer_width: f64,
) -> Result<Vec<OverheadRow>> {
    datasets
        .iter()
        .map(|id| {
            let series = catalog.load(id)?;
            let overhead = extract_overhead(series, pointer_width)?;
            let (size, _) = series.last();
            Ok(OverheadRow {
                dataset: id.to_string(),
                size,
                bytes_per_element: overhead + pointer_width,
                overhead,
            })
        })
        .collect()
}

/// Print the overhead table to stdout
pub fn print_overhead_table(rows: &[OverheadRow], pointer_width: f64) {
    println!("\n{:=<80}", "");
    println!("Memory overhead per element (pointer width {pointer_width} bytes)");
    println!("{:=<80}\n", "");
    println!(
        "  {:<44} {:>8} {:>12} {:>10}",
        "Dataset", "Size", "Bytes/elem", "Overhead"
    );
    println!("  {:-<78}", "");
    for row in rows {
        println!(
            "  {:<44} {:>8.0} {:>12.2} {:>10.2}",
            row.dataset, row.size, row.bytes_per_element, row.overhead
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::KNOWN_DATASETS;
    use crate::chart::{prepare, PreparedChart};
    use crate::series::Series;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_charts_are_valid() {
        let charts = builtin_charts(Path::new("plots"));
        assert_eq!(charts.len(), 10);

        let names: HashSet<&str> = charts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), charts.len());

        for chart in &charts {
            chart.validate().unwrap();
            assert_eq!(chart.output, Path::new("plots").join(format!("{}.svg", chart.name)));
            for dataset in chart.datasets() {
                assert!(KNOWN_DATASETS.contains(&dataset), "unknown dataset {dataset}");
            }
        }
    }

    #[test]
    fn test_builtin_constant_charts_render_without_data() {
        let dir = TempDir::new().unwrap();
        let charts = select_charts(
            builtin_charts(dir.path()),
            &["zero_size_overheads_plot".to_string(), "list_append_2_plot".to_string()],
        )
        .unwrap();
        let written = generate_report(&charts, &Catalog::new()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));

        let PreparedChart::Bar(bars) = prepare(&charts[0], &Catalog::new()).unwrap() else {
            panic!("expected bar chart");
        };
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "blist<int> (8)",
                "std::list<int> (12)",
                "std::forward_list<int> (4)",
                "std::deque<int> (596)"
            ]
        );
    }

    #[test]
    fn test_generate_report_names_failing_chart() {
        let dir = TempDir::new().unwrap();
        let charts = select_charts(builtin_charts(dir.path()), &["set_insert_plot".to_string()]).unwrap();
        let err = generate_report(&charts, &Catalog::new()).unwrap_err();
        assert!(format!("{err:#}").contains("set_insert_plot"));
        assert!(!dir.path().join("set_insert_plot.svg").exists());
    }

    #[test]
    fn test_select_unknown_chart() {
        let err = select_charts(builtin_charts(Path::new(".")), &["nope".to_string()]).unwrap_err();
        assert!(matches!(err, PlotError::InvalidChart { .. }));
    }

    #[test]
    fn test_overhead_table() {
        let catalog = Catalog::from_series([Series::new(
            "std_set_insert_randomized_memory",
            vec![100.0, 10000.0],
            vec![2400.0, 240000.0],
        )
        .unwrap()]);
        let rows = overhead_table(&catalog, &["std_set_insert_randomized_memory"], 4.0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size, 10000.0);
        assert_eq!(rows[0].bytes_per_element, 24.0);
        assert_eq!(rows[0].overhead, 20.0);

        assert!(overhead_table(&catalog, &["missing"], 4.0).is_err());
    }

    #[test]
    fn test_report_config_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let config = ReportConfig {
            charts: builtin_charts(Path::new("")).into_iter().take(2).collect(),
        };
        let path = dir.path().join("report.json");
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = ReportConfig::from_file(&path).unwrap();
        let charts = loaded.into_charts(dir.path()).unwrap();
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].output, dir.path().join("list_append_plot.svg"));
    }

    #[test]
    fn test_report_config_duplicate_names() {
        let chart = builtin_charts(Path::new("")).remove(0);
        let config = ReportConfig {
            charts: vec![chart.clone(), chart],
        };
        assert!(matches!(
            config.into_charts(Path::new("out")),
            Err(PlotError::InvalidChart { .. })
        ));
    }
}

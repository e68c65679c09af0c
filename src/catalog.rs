use crate::error::{PlotError, Result};
use crate::series::Series;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Benchmark runs the standard report draws from.
///
/// Each identifier names one harness test case; its dump is expected as
/// `<id>.py` (or `.txt` / `.json`) in the data directory.
pub const KNOWN_DATASETS: &[&str] = &[
    "cc_list_insert_randomized_runtime",
    "std_deque_insert_randomized_runtime",
    "std_vector_insert_randomized_runtime",
    "cc_set_insert_randomized_runtime",
    "cc_set_insert_ascending_runtime",
    "std_set_insert_randomized_runtime",
    "cc_set_insert_randomized_memory",
    "cc_set_insert_ascending_memory",
    "std_set_insert_randomized_memory",
    "std_unordered_set_insert_randomized_memory",
    "cc_set_lookup_sparse_randomized_runtime",
    "cc_set_lookup_dense_randomized_runtime",
    "std_set_lookup_randomized_runtime",
    "cc_set_destruction_sparse_runtime",
    "cc_set_destruction_dense_runtime",
    "std_set_destruction_runtime",
];

/// Named benchmark datasets, resolved by identifier.
///
/// The mapping is handed over explicitly at construction; lookups never
/// touch the file system.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    datasets: BTreeMap<String, Series>,
}

#[derive(Deserialize)]
struct JsonDump {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-validated series, keyed by their ids.
    pub fn from_series(series: impl IntoIterator<Item = Series>) -> Self {
        let mut catalog = Self::new();
        for s in series {
            catalog.insert(s);
        }
        catalog
    }

    /// Build a catalog from raw `(x, y)` pairs, validating each one.
    pub fn from_map(map: BTreeMap<String, (Vec<f64>, Vec<f64>)>) -> Result<Self> {
        let mut catalog = Self::new();
        for (id, (x, y)) in map {
            catalog.insert(Series::new(id, x, y)?);
        }
        Ok(catalog)
    }

    /// Add (or replace) a dataset
    pub fn insert(&mut self, series: Series) {
        self.datasets.insert(series.id().to_string(), series);
    }

    /// Resolve a dataset identifier.
    pub fn load(&self, id: &str) -> Result<&Series> {
        self.datasets
            .get(id)
            .ok_or_else(|| PlotError::DatasetNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.datasets.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Load every dataset file in `dir`. The file stem is the identifier.
    ///
    /// `.py` and `.txt` files are read as harness dumps, `.json` files as
    /// `{"x": [...], "y": [...]}`. Other files are skipped, as are Python
    /// package files (`__init__.py`) and modules with no `x`/`y` assignment.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let mut catalog = Self::new();

        let mut paths = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read data directory {}", dir.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            if !path.is_file() {
                continue;
            }
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            if stem.starts_with("__") {
                debug!(path = %path.display(), "skipping package file");
                continue;
            }

            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let series = match ext {
                "py" if !has_assignments(&text) => {
                    debug!(path = %path.display(), "skipping module without x/y arrays");
                    continue;
                }
                "py" | "txt" => parse_dump(stem, &text)?,
                "json" => parse_json(stem, &text)?,
                _ => {
                    debug!(path = %path.display(), "skipping non-dataset file");
                    continue;
                }
            };

            if catalog.contains(stem) {
                warn!(dataset = stem, path = %path.display(), "dataset defined twice, keeping last");
            }
            debug!(dataset = stem, samples = series.len(), "loaded dataset");
            catalog.insert(series);
        }

        Ok(catalog)
    }
}

/// Parse the text the benchmark harness prints for one run:
///
/// ```text
/// 100    random insertions into cc::List<int> cost    52us
/// x = [ 100, 500, 1000 ]
/// y = [ 52, 310, 700 ]
/// ```
///
/// Lines other than the `x`/`y` assignments are ignored. If either array
/// appears more than once the last assignment wins.
pub fn parse_dump(id: &str, text: &str) -> Result<Series> {
    let mut x = None;
    let mut y = None;

    for line in text.lines() {
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        let slot = match name.trim() {
            "x" => &mut x,
            "y" => &mut y,
            _ => continue,
        };
        *slot = Some(parse_list(id, name.trim(), value)?);
    }

    let x = x.ok_or_else(|| PlotError::malformed(id, "missing `x = [...]` line"))?;
    let y = y.ok_or_else(|| PlotError::malformed(id, "missing `y = [...]` line"))?;
    Series::new(id, x, y)
}

/// Whether `text` assigns `x` or `y` on any line
fn has_assignments(text: &str) -> bool {
    text.lines().any(|line| {
        line.split_once('=')
            .is_some_and(|(name, _)| matches!(name.trim(), "x" | "y"))
    })
}

fn parse_list(id: &str, name: &str, value: &str) -> Result<Vec<f64>> {
    let inner = value
        .trim()
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(|| PlotError::malformed(id, format!("`{name}` is not a bracketed list")))?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<f64>().map_err(|_| {
                PlotError::malformed(id, format!("`{name}` contains non-numeric value `{item}`"))
            })
        })
        .collect()
}

fn parse_json(id: &str, text: &str) -> Result<Series> {
    let dump: JsonDump = serde_json::from_str(text)
        .map_err(|e| PlotError::malformed(id, format!("invalid JSON dump: {e}")))?;
    Series::new(id, dump.x, dump.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HARNESS_OUTPUT: &str = "\
100\trandom insertions into cc::List<int> cost \t52us
500\trandom insertions into cc::List<int> cost \t310us
x = [ 100, 500 ]
y = [ 52, 310 ]
";

    #[test]
    fn test_parse_dump() {
        let s = parse_dump("cc_list_insert_randomized_runtime", HARNESS_OUTPUT).unwrap();
        assert_eq!(s.x(), &[100.0, 500.0]);
        assert_eq!(s.y(), &[52.0, 310.0]);
    }

    #[test]
    fn test_parse_dump_missing_y() {
        let err = parse_dump("half", "x = [ 1, 2 ]\n").unwrap_err();
        assert!(matches!(err, PlotError::MalformedSeries { ref dataset, .. } if dataset == "half"));
    }

    #[test]
    fn test_parse_dump_bad_number() {
        let err = parse_dump("bad", "x = [ 1, two ]\ny = [ 1, 2 ]\n").unwrap_err();
        assert!(err.to_string().contains("two"));
    }

    #[test]
    fn test_parse_dump_length_mismatch() {
        let err = parse_dump("skew", "x = [ 1, 2, 3 ]\ny = [ 1, 2 ]\n").unwrap_err();
        assert!(matches!(err, PlotError::MalformedSeries { .. }));
    }

    #[test]
    fn test_load_unknown_dataset() {
        let catalog = Catalog::new();
        match catalog.load("nope") {
            Err(PlotError::DatasetNotFound(id)) => assert_eq!(id, "nope"),
            other => panic!("expected DatasetNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_from_map() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), (vec![1.0, 2.0], vec![3.0, 4.0]));
        let catalog = Catalog::from_map(map).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.load("a").unwrap().y(), &[3.0, 4.0]);
    }

    #[test]
    fn test_from_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("std_set_insert_randomized_memory.py"), HARNESS_OUTPUT)
            .unwrap();
        std::fs::write(
            dir.path().join("cc_set_insert_ascending_memory.json"),
            r#"{"x": [100, 10000], "y": [1200, 90000]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "not data").unwrap();

        let catalog = Catalog::from_dir(dir.path()).unwrap();
        assert_eq!(
            catalog.ids().collect::<Vec<_>>(),
            vec!["cc_set_insert_ascending_memory", "std_set_insert_randomized_memory"]
        );
        assert_eq!(catalog.load("cc_set_insert_ascending_memory").unwrap().last(), (10000.0, 90000.0));
    }

    #[test]
    fn test_from_dir_skips_package_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("__init__.py"), "").unwrap();
        std::fs::write(dir.path().join("helpers.py"), "import numpy as np\n").unwrap();
        std::fs::write(dir.path().join("cc_set_insert_randomized_memory.py"), HARNESS_OUTPUT).unwrap();

        let catalog = Catalog::from_dir(dir.path()).unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["cc_set_insert_randomized_memory"]);
    }

    #[test]
    fn test_from_dir_rejects_half_dump() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("half.py"), "x = [ 1, 2 ]\n").unwrap();
        let err = Catalog::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("half"));
    }

    #[test]
    fn test_from_dir_reports_malformed_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.py"), "x = [ 3, 2 ]\ny = [ 1, 1 ]\n").unwrap();
        let err = Catalog::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}

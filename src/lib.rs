pub mod catalog;
pub mod chart;
pub mod error;
pub mod report;
pub mod series;
pub mod spec;
pub mod transform;

pub use catalog::Catalog;
pub use error::{PlotError, Result};
pub use series::Series;
pub use spec::ChartSpec;

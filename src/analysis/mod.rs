//! Analysis core: resolve names, extract callback ranges, correlate publications,
//! derive chart series.

pub mod correlator;
pub mod intervals;
pub mod pipeline;
pub mod resolver;
pub mod series;
pub mod stats;

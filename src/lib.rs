//! Financial independence projections: the capital target, years to reach it
//! under compounding contributions and inflation, a Monte Carlo interval
//! around that estimate, and Chilean AFP and fund cost comparisons.

pub mod api;
pub mod core;
pub mod report;

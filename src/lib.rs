pub mod config;
pub mod geo;
pub mod source;
pub mod analysis;

pub use analysis::*;
pub use config::*;
pub use geo::*;
pub use source::*;

/// Rounds to `decimals` places, ties to even.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

pub mod error;
pub mod period;
pub mod report;
pub mod traits;
pub mod types;

pub use error::*;
pub use period::*;
pub use report::*;
pub use traits::*;
pub use types::*;

/// Maps NaN and infinities to `None` so undefined values never leak as numbers.
pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

pub mod series;
pub mod indicators;
pub mod settings;
pub mod signals;
pub mod analyzer;


pub use indicators::*;
pub use settings::*;
pub use signals::*;
pub use analyzer::*;

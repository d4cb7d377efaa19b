pub mod config;
pub mod error;
pub mod field;
pub mod geom;
pub mod io;
pub mod logging;
pub mod sim;

// Prelude
pub use config::DatagenConfig;
pub use error::{DatagenError, Result};
pub use field::AmbientField;
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use sim::{BatchOrchestrator, ResultAggregator, Survey};

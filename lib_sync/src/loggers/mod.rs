/// Console plus daily rotating JSON file logging.
pub mod setup;

pub use setup::{setup_logging, LoggingError};

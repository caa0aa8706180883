// File I/O operations

pub mod error;
pub mod naming;
pub mod output;
pub mod runlog;

pub use error::IoError;
pub use naming::LogName;
pub use runlog::{load_run_log, parse_run_log};

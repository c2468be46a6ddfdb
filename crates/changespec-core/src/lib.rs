pub mod changespec;
pub mod config;
pub mod entry;
pub mod error;
pub mod hook;
pub mod io;
pub mod paths;
pub mod project;
pub mod query;
pub mod status;
pub mod suffix;

pub use error::{ChangeSpecError, Result};

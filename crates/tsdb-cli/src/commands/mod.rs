//! Command implementations

mod check_options;
mod hook;
mod status;

pub use check_options::run_check_options;
pub use hook::run_hook;
pub use status::run_status;

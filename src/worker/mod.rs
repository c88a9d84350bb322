//! Local check execution.
//!
//! - [`executor`]: runs a single script and captures its exit code and output
//! - [`local`]: the [`LocalScheduler`] that scans the script directory on a
//!   fixed period and publishes the full result set
//!
//! # Cycle semantics
//!
//! 1. List the script directory (sorted, executable regular files only)
//! 2. Run each script in turn via [`ScriptExecutor::run`]
//! 3. Wrap each [`CheckResult`](crate::check::CheckResult) with its start time
//! 4. Replace the stored local results in one step
//!
//! If any script cannot be executed the cycle stops and the previous
//! results are kept.
//!
//! # Security Note
//!
//! Scripts are executed as-is without sandboxing; anyone who can write to
//! the script directory can run code as this process.

pub mod executor;
pub mod local;

pub use executor::{ProcessExecutor, ScriptExecutor};
pub use local::LocalScheduler;

pub mod check;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod node;
pub mod remote;
pub mod shutdown;
pub mod status;
pub mod store;
pub mod worker;

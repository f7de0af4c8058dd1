//! CLI command implementations

pub mod action;
pub mod check;
pub mod remote;
pub mod status;

pub use remote::RemoteArgs;
pub use status::StatusArgs;

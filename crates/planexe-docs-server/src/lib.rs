//! Local preview server for the built PlanExe documentation.
//!
//! Binds the first free port of a small range and serves the site directory
//! until told to stop.

pub mod port;
pub mod server;

pub use port::{bind_first_free, PortRange};
pub use server::{BoundServer, ServeError, ServerConfig, StaticServer};

//! Error types for the Durapipe protocol layer.

mod activity;
mod context;
mod registry;
mod store;
mod transport;
mod workflow;

pub use activity::*;
pub use context::*;
pub use registry::*;
pub use store::*;
pub use transport::*;
pub use workflow::*;

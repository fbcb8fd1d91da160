//! The round coordinator: end-to-end orchestration of the federated
//! train→evaluate→package→upload→aggregate→download→reload cycle, plus the
//! host-bridge request surface.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod request;

pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use error::{BridgeError, CoordErr, Result};
pub use request::{Reply, Request};

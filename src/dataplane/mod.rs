//! HAProxy Data Plane API REST 게이트웨이

mod client;
mod error;
mod http;
pub mod paths;

pub use client::{DataPlaneClient, Transaction};
pub use error::{ApiError, ConflictKind};
pub use http::HttpDataPlaneClient;

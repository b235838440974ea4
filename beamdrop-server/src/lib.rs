//! beamdrop-server: renders BeamDrop windows as local web pages.
//!
//! The page loads embedded assets, listens on `/api/events` and calls backend
//! services through `POST /api/call`.

pub mod assets;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{create_router, WebHost};

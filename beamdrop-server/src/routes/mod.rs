//! Route handlers for the page-facing API

pub mod app;
pub mod call;
pub mod events;
pub mod health;

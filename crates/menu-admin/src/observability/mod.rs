//! Observability for the menu admin service.

pub mod metrics;

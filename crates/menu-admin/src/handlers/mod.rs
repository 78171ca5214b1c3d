//! HTTP request handlers for the menu admin service.

pub mod authorize;
pub mod health;
pub mod metrics;
pub mod session;

pub use authorize::authorize;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use session::get_session;

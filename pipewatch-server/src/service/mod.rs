//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between repositories and the health aggregator.

pub mod alert;
pub mod dashboard;
pub mod pipeline;
pub mod run;
pub mod trigger;

// Re-export for convenience
pub use alert as alert_service;
pub use dashboard as dashboard_service;
pub use pipeline as pipeline_service;
pub use run as run_service;

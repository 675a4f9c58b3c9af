//! Logging targets for Courier.
//!
//! Courier uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("courier_net=debug,courier_core::mapper=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Entity mapping.
    pub const MAPPER: &str = "courier_core::mapper";
    /// Error normalization.
    pub const NORMALIZE: &str = "courier_core::normalize";
    /// Request execution in the API manager.
    pub const MANAGER: &str = "courier_net::manager";
    /// Batch requests.
    pub const BATCH: &str = "courier_net::batch";
    /// Uploads and downloads.
    pub const TRANSFER: &str = "courier_net::transfer";
    /// Low-level HTTP request building.
    pub const HTTP: &str = "courier_net::http";
}

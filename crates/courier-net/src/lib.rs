//! Networking half of the Courier API layer.
//!
//! [`ApiManager`] is the façade applications talk to. It sends requests
//! through a configured `reqwest` client, attaches the login token, and
//! hands every failure to the error normalizer from [`courier_core`], so
//! each failed call yields exactly one [`NormalizedError`]:
//!
//! - **Requests**: `get`/`post`/`put`/`delete` returning raw payloads, and
//!   `fetch_entities` mapping them through an entity schema
//! - **Batches**: several sub-requests in one round trip
//! - **Transfers**: signed multipart uploads and streamed downloads with
//!   progress reporting
//! - **Notifications**: maintenance, expired version and failed relogin
//!
//! # Example
//!
//! ```ignore
//! use courier_net::{ApiManager, Notification, Parameters};
//!
//! let api = ApiManager::builder("https://api.example.com/v1")
//!     .error_domain("com.example.api")
//!     .build()?;
//!
//! api.notifications().subscribe(|notification| {
//!     if notification == Notification::Maintenance {
//!         show_maintenance_screen();
//!     }
//! });
//!
//! match api.get("/profile", &Parameters::new()).await {
//!     Ok(payload) => render(payload),
//!     Err(error) => eprintln!("{error}"),
//! }
//! ```
//!
//! # Uploads
//!
//! ```ignore
//! use courier_net::FileUpload;
//!
//! let upload = FileUpload::new("avatar", "me.png", png_bytes).mime_type("image/png");
//! api.upload_file("/profile/avatar", &Parameters::new(), upload, |progress| {
//!     println!("{:?}%", progress.percent());
//! })
//! .await?;
//! ```

mod batch;
mod error;
pub mod http;
mod manager;
mod notification;
pub mod signature;
mod transfer;

pub use batch::{BatchOutcome, BatchRequest};
pub use error::{ApiResult, NetworkError, Result};
pub use manager::{ApiConfig, ApiManager, ApiManagerBuilder, SessionRefresher};
pub use notification::{NotificationCenter, SubscriptionId};
pub use transfer::{FileUpload, SIGNATURE_FIELD};

// Re-export commonly used types at the crate root
pub use courier_core::{NormalizedError, Notification, RawMap, RawResponse};
pub use http::{HttpClient, HttpClientBuilder, HttpMethod, Parameters, TransferProgress};

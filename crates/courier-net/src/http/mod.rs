//! Thin layer over the `reqwest` HTTP client.
//!
//! Transport, TLS, connection pooling and multipart encoding all live in
//! `reqwest`; this module only configures it and adapts requests and
//! responses to the API manager's types.

mod client;
mod request;
mod response;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
pub use request::{
    HttpMethod, HttpRequest, MultipartForm, Parameters, RequestBody, param_pairs, param_to_string,
};
pub use response::{HttpResponse, TransferProgress};

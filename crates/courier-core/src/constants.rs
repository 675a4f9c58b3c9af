//! Stable string constants shared by the API layer.
//!
//! These are pass-through configuration values: request method names,
//! well-known keys in request and response bodies, and the names of the
//! notifications posted by the API manager.

/// HTTP method names.
pub mod methods {
    /// `GET`.
    pub const GET: &str = "GET";
    /// `POST`.
    pub const POST: &str = "POST";
    /// `PUT`.
    pub const PUT: &str = "PUT";
    /// `DELETE`.
    pub const DELETE: &str = "DELETE";
}

/// Well-known keys in API payloads.
pub mod keys {
    /// Envelope key holding the useful part of a response.
    pub const DATA: &str = "data";
    /// Server-declared error code.
    pub const ERROR_CODE: &str = "error_code";
    /// Server-declared error message.
    pub const ERROR_MESSAGE: &str = "error_message";
    /// Relative URL of a batched request.
    pub const URL: &str = "url";
    /// Body of a batched request or response entry.
    pub const BODY: &str = "body";
    /// Session token sent with every authenticated request.
    pub const LOGIN_TOKEN: &str = "loginToken";
}

/// Mime type used for multipart uploads.
pub const MULTIPART_MIME_TYPE: &str = "multipart/form-data";

/// Error domain used when the application does not configure its own.
pub const DEFAULT_ERROR_DOMAIN: &str = "com.courier.api";

/// Application-wide notifications posted by the API manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notification {
    /// The backend is in maintenance mode.
    Maintenance,
    /// The running application version is no longer accepted.
    VersionExpired,
    /// The session expired and could not be re-established.
    ReloginFailed,
}

impl Notification {
    /// All notifications, in declaration order.
    pub const ALL: [Notification; 3] = [
        Notification::Maintenance,
        Notification::VersionExpired,
        Notification::ReloginFailed,
    ];

    /// The stable name of this notification.
    pub fn name(self) -> &'static str {
        match self {
            Self::Maintenance => "CourierMaintenanceNotification",
            Self::VersionExpired => "CourierVersionExpiredNotification",
            Self::ReloginFailed => "CourierReloginFailedNotification",
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            Notification::ALL.iter().map(|n| n.name()).collect();
        assert_eq!(names.len(), Notification::ALL.len());
    }

    #[test]
    fn notification_display_uses_name() {
        assert_eq!(
            Notification::Maintenance.to_string(),
            "CourierMaintenanceNotification"
        );
    }
}

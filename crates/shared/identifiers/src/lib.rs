//! Typed string identifiers used across the PulseIQ pipeline.
//!
//! Every boundary that used to pass bare `String`s passes one of these
//! newtypes instead, so a tenant id can never be handed to an API that
//! expects a session id.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

macro_rules! generated_id {
    ($name:ident) => {
        impl $name {
            /// Mint a fresh random identifier (UUID v4).
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }
    };
}

string_id!(
    /// Client-generated identifier for one browser tab's event stream.
    SessionId
);

string_id!(
    /// Tenant (customer site) the telemetry belongs to.
    TenantId
);

string_id!(
    /// Resolved user identity; absent for anonymous sessions.
    UserId
);

string_id!(
    /// Correlates one event's trip through the pipeline in logs and acks.
    CorrelationId
);
generated_id!(CorrelationId);

string_id!(
    /// One live streaming connection (SSE or WebSocket).
    ConnectionId
);
generated_id!(ConnectionId);

//! DAP capabilities tracking.

use crate::protocol::Capabilities;

/// Resolved capabilities of the debug adapter, stored as plain booleans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DapCapabilities {
    /// Whether the adapter supports `configurationDone`.
    pub supports_configuration_done_request: bool,
    /// Whether the adapter supports conditional breakpoints.
    pub supports_conditional_breakpoints: bool,
    /// Whether the adapter supports hit-count breakpoints.
    pub supports_hit_conditional_breakpoints: bool,
    /// Whether the adapter supports log points.
    pub supports_log_points: bool,
    /// Whether the adapter supports setting variable values.
    pub supports_set_variable: bool,
    /// Whether the adapter supports the `terminate` request.
    pub supports_terminate_request: bool,
}

impl DapCapabilities {
    /// Build [`DapCapabilities`] from the protocol-level [`Capabilities`].
    pub fn from_initialize_response(caps: &Capabilities) -> Self {
        Self {
            supports_configuration_done_request: caps
                .supports_configuration_done_request
                .unwrap_or(false),
            supports_conditional_breakpoints: caps
                .supports_conditional_breakpoints
                .unwrap_or(false),
            supports_hit_conditional_breakpoints: caps
                .supports_hit_conditional_breakpoints
                .unwrap_or(false),
            supports_log_points: caps.supports_log_points.unwrap_or(false),
            supports_set_variable: caps.supports_set_variable.unwrap_or(false),
            supports_terminate_request: caps.supports_terminate_request.unwrap_or(false),
        }
    }

    /// Parse the body of an `initialize` response.
    ///
    /// A missing or malformed body yields no capabilities; adapters are not
    /// required to send one.
    pub fn from_response_body(body: Option<&serde_json::Value>) -> Self {
        body.and_then(|b| serde_json::from_value::<Capabilities>(b.clone()).ok())
            .map(|caps| Self::from_initialize_response(&caps))
            .unwrap_or_default()
    }
}

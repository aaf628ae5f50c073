//! Community issue reporting and administrator triage.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the validated types,
//! the issue lifecycle, the capability table and the use-case services;
//! [`inbound`] adapts HTTP requests onto the driving ports; [`outbound`]
//! implements the driven ports (PostgreSQL, in-memory, filesystem storage).

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;

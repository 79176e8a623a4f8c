//! FixTrack: shared-space consumption tracking.
//!
//! Members log strokes against items kept in rooms; administrators manage the
//! catalogue, accounts, invitation code and billing periods, and read
//! per-item analytics and per-user cost summaries.
//!
//! The crate is laid out hexagonally: [`domain`] holds entities, ports and
//! services, [`inbound`] exposes them over HTTP and [`outbound`] implements
//! the driven ports against PostgreSQL and the credential libraries.

pub mod bootstrap;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;

//! Port for first-run data: legacy import and default seeding.
//!
//! Both operations run inside one storage transaction each and are safe to
//! repeat on every start.

use async_trait::async_trait;

use crate::domain::{DefaultSeed, ImportOutcome, LegacyImport, SeedReport};

use super::define_port_error;

define_port_error! {
    /// Errors raised by bootstrap adapters.
    pub enum BootstrapRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "bootstrap repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "bootstrap repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BootstrapRepository: Send + Sync {
    /// Write every entity of `import`, preserving ids, unless accounts exist.
    async fn import_legacy(
        &self,
        import: &LegacyImport,
    ) -> Result<ImportOutcome, BootstrapRepositoryError>;

    /// Ensure the bootstrap admin, the default room and an invitation code
    /// exist.
    async fn seed_defaults(&self, seed: &DefaultSeed)
    -> Result<SeedReport, BootstrapRepositoryError>;
}

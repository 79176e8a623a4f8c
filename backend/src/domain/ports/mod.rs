//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports (`*Repository`, [`CredentialHasher`], [`SessionTokens`])
//! describe what the domain needs from infrastructure and expose strongly
//! typed errors so adapters map their failures into predictable variants.
//! Driving ports ([`Authentication`], [`Catalogue`], ...) are the use-cases
//! inbound adapters call; they speak the transport-agnostic domain
//! [`Error`](crate::domain::Error).

mod macros;
pub(crate) use macros::define_port_error;

mod access_control;
mod authentication;
mod billing_period_repository;
mod billing_periods;
mod bootstrap_repository;
mod catalogue;
mod credential_hasher;
mod item_repository;
mod registration;
mod room_repository;
mod session_tokens;
mod settings_repository;
mod stroke_ledger;
mod stroke_repository;
mod user_administration;
mod user_repository;

pub use access_control::AccessControl;
#[cfg(test)]
pub use access_control::MockAccessControl;
pub use authentication::{Authentication, LoginOutcome};
#[cfg(test)]
pub use authentication::MockAuthentication;
pub use billing_period_repository::{BillingPeriodRepository, BillingPeriodRepositoryError};
#[cfg(test)]
pub use billing_period_repository::MockBillingPeriodRepository;
pub use billing_periods::{BillingPeriodDraft, BillingPeriods};
#[cfg(test)]
pub use billing_periods::MockBillingPeriods;
pub use bootstrap_repository::{BootstrapRepository, BootstrapRepositoryError};
#[cfg(test)]
pub use bootstrap_repository::MockBootstrapRepository;
pub use catalogue::{Catalogue, ItemDraft};
#[cfg(test)]
pub use catalogue::MockCatalogue;
pub use credential_hasher::{CredentialHasher, CredentialHasherError};
#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use item_repository::{ItemRepository, ItemRepositoryError};
#[cfg(test)]
pub use item_repository::MockItemRepository;
#[cfg(test)]
pub use registration::MockRegistration;
pub use registration::{Registration, RegistrationRequest};
#[cfg(test)]
pub use room_repository::MockRoomRepository;
pub use room_repository::{RoomRepository, RoomRepositoryError};
#[cfg(test)]
pub use session_tokens::MockSessionTokens;
pub use session_tokens::{SessionTokenError, SessionTokens};
#[cfg(test)]
pub use settings_repository::MockSettingsRepository;
pub use settings_repository::{SettingsRepository, SettingsRepositoryError};
#[cfg(test)]
pub use stroke_ledger::MockStrokeLedger;
pub use stroke_ledger::StrokeLedger;
#[cfg(test)]
pub use stroke_repository::MockStrokeRepository;
pub use stroke_repository::{StrokeRepository, StrokeRepositoryError};
#[cfg(test)]
pub use user_administration::MockUserAdministration;
pub use user_administration::UserAdministration;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};

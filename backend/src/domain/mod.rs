//! Domain primitives, ports and services.
//!
//! Purpose: define the strongly typed entities of the shared-space tracker
//! and the services that enforce its rules. Adapters talk to the domain
//! exclusively through the traits in [`ports`].
//!
//! Public surface:
//! - Error and ErrorCode: transport-agnostic failure payload.
//! - Accounts: User, Username, Role, credentials and caller identity.
//! - Catalogue: rooms, items and prices.
//! - Ledger: strokes, analytics and cost summaries.
//! - Billing: periods, date windows and selectors.
//! - Services implementing the driving ports.

pub mod access_service;
pub mod auth;
pub mod billing;
pub mod billing_service;
pub mod bootstrap;
pub mod bootstrap_service;
pub mod catalogue;
pub mod catalogue_service;
pub mod credential_service;
pub mod error;
pub mod ids;
pub mod invitation;
pub mod ledger;
pub mod ledger_service;
pub mod ports;
pub mod registration_service;
mod repository_errors;
pub mod trace_id;
pub mod user;
pub mod user_admin_service;

pub use self::access_service::{AccessService, resolve_caller};
pub use self::auth::{
    Caller, Capability, LoginCredentials, LoginValidationError, NewPassword, PASSWORD_MIN,
    PasswordDigest, PasswordPolicyError, SessionClaims, SessionToken,
};
pub use self::billing::{
    BillingPeriod, BillingPeriodValidationError, DateRange, NewBillingPeriod, PeriodName,
    PeriodSelector, PeriodWindow, within,
};
pub use self::billing_service::BillingService;
pub use self::bootstrap::{
    DefaultSeed, ImportOutcome, LegacyImport, LegacySnapshotError, SeedReport, SeedStatus,
};
pub use self::bootstrap_service::{BootstrapService, SeedDefaults};
pub use self::catalogue::{
    CatalogueValidationError, DESCRIPTION_MAX, Description, Item, ItemChanges, ItemListing,
    ItemName, ItemStats, ItemWithStats, MemberItem, NAME_MAX, NewItem, NewRoom, Price, Room,
    RoomChanges, RoomName, RoomSummary,
};
pub use self::catalogue_service::{CatalogueRepositories, CatalogueService};
pub use self::credential_service::{CredentialService, DEFAULT_TOKEN_TTL_HOURS};
pub use self::error::{DomainError, Error, ErrorCode};
pub use self::ids::{
    BOOTSTRAP_ADMIN_ID, BillingPeriodId, DEFAULT_ROOM_ID, InvalidIdentifier, ItemId, RoomId,
    StrokeId, UserId,
};
pub use self::invitation::{INVITATION_CODE_MIN, InvitationCode, InvitationCodeError};
pub use self::ledger::{
    AnalyticsItem, CostLine, CostOverflow, ItemAnalytics, NewStroke, RECENT_STROKES_LIMIT,
    Stroke, StrokeReceipt, UserStrokeBreakdown, UserStrokeSummary,
};
pub use self::ledger_service::LedgerService;
pub use self::registration_service::RegistrationService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, NewUser, Role, USERNAME_MAX, User, UserAccount, UserValidationError, Username,
};
pub use self::user_admin_service::UserAdminService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use fixtrack::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

//! Services layer for the console backend.
//!
//! Workflow logic lives here as plain async methods returning explicit
//! result types; handlers only translate them to HTTP.

mod account;
mod approval;
mod database;
mod directory;
mod email_change;
pub mod error;
mod gate;
mod identity;
mod invitations;
mod registration;

pub use account::AccountService;
pub use approval::ApprovalService;
pub use database::{DocumentStore, MemoryStore, MongoStore};
pub use directory::{DirectoryCounts, DirectoryService};
pub use email_change::EmailChangeService;
pub use error::ServiceError;
pub use gate::AccessGate;
pub use identity::{
    IdentityClient, IdentityError, IdentityProvider, MockIdentityProvider, ProviderSession,
    ProviderUser, PASSWORD_PROVIDER,
};
pub use invitations::{InvitationService, IssuedInvite};
pub use registration::RegistrationService;

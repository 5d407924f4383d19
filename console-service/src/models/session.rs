//! Session mirror - local view of a provider session that passed the gate.

use serde::Serialize;

/// What the console knows about an admitted session.
///
/// The provider holds the session itself; this mirror exists only after a
/// successful gate pass and is re-derived on every restore.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    /// Opaque provider session token presented on subsequent requests.
    pub token: String,
    /// Set when this gate pass committed a verified email change.
    pub email_change_committed: bool,
}

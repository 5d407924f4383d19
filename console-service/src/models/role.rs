use serde::{Deserialize, Serialize};

/// Role codes stored on account documents.
///
/// Account documents carry the role as a plain string; anything that does
/// not parse to one of these codes is treated as unknown and the access
/// gate fails closed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Pending,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pending => "pending",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_codes_match_stored_strings() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Pending.as_str(), "pending");
    }
}

//! Role Model

use serde::{Deserialize, Serialize};

/// Closed set of actor roles. Authorization guards match on these
/// variants; there are no free-form role strings anywhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Seller,
    Admin,
}

impl Role {
    /// Fulfillment operations are for sellers and admins only.
    pub fn can_fulfill(self) -> bool {
        matches!(self, Role::Seller | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_roles() {
        assert!(Role::Seller.can_fulfill());
        assert!(Role::Admin.can_fulfill());
        assert!(!Role::Client.can_fulfill());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Client, Role::Seller, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}

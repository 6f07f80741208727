//! User roles and their compiled-in permission matrices.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::permission::{Capability, PermissionSet};

/// Application role carried on every user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full access to every resource.
    Admin,
    /// Day-to-day fleet management without destructive or admin rights.
    Manager,
    /// Read-only access to the operational pages.
    User,
}

impl Role {
    /// Get all roles.
    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Manager, Role::User]
    }

    /// The built-in matrix used when no role override is configured.
    pub fn default_permissions(&self) -> PermissionSet {
        match self {
            Role::Admin => PermissionSet::all(),
            Role::Manager => PermissionSet::from_iter([
                Capability::ViewDashboard,
                Capability::ViewTrucks,
                Capability::AddTrucks,
                Capability::EditTrucks,
                Capability::ViewMaintenance,
                Capability::AddMaintenance,
                Capability::EditMaintenance,
                Capability::ViewMechanics,
                Capability::AddMechanics,
                Capability::EditMechanics,
                Capability::ViewReports,
                Capability::ViewUsers,
                Capability::ViewSettings,
            ]),
            Role::User => PermissionSet::from_iter([
                Capability::ViewDashboard,
                Capability::ViewTrucks,
                Capability::ViewMaintenance,
                Capability::ViewMechanics,
            ]),
        }
    }

    /// Parses a stored role, treating anything unrecognised as the least
    /// privileged role.
    pub fn parse_or_user(s: &str) -> Self {
        s.parse().unwrap_or(Role::User)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "USER" => Ok(Role::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Manager => write!(f, "MANAGER"),
            Role::User => write!(f, "USER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(" User ".parse::<Role>().unwrap(), Role::User);
        assert!("MECHANIC".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display_roundtrip() {
        for role in Role::all() {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), *role);
        }
    }

    #[test]
    fn test_parse_or_user_falls_back() {
        assert_eq!(Role::parse_or_user("ADMIN"), Role::Admin);
        assert_eq!(Role::parse_or_user("SUPERVISOR"), Role::User);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"MANAGER\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_admin_default_grants_everything() {
        let admin = Role::Admin.default_permissions();
        assert_eq!(admin.len(), Capability::ALL.len());
    }

    #[test]
    fn test_manager_default_matrix() {
        let manager = Role::Manager.default_permissions();
        assert!(manager.contains(Capability::AddTrucks));
        assert!(manager.contains(Capability::EditMechanics));
        assert!(manager.contains(Capability::ViewSettings));
        assert!(!manager.contains(Capability::DeleteTrucks));
        assert!(!manager.contains(Capability::DeleteMaintenance));
        assert!(!manager.contains(Capability::ManageUsers));
        assert!(!manager.contains(Capability::ManageSettings));
        assert!(!manager.contains(Capability::ViewAdmin));
        assert_eq!(manager.len(), 13);
    }

    #[test]
    fn test_user_default_matrix() {
        let user = Role::User.default_permissions();
        assert_eq!(user.len(), 4);
        assert!(user.contains(Capability::ViewDashboard));
        assert!(user.contains(Capability::ViewTrucks));
        assert!(!user.contains(Capability::ViewReports));
        assert!(!user.contains(Capability::AddTrucks));
    }
}

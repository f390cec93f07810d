use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a console user.
///
/// The backend is not consistent about spelling (`superadmin` vs
/// `SUPER_ADMIN`), so parsing accepts both; the lowercase name is canonical
/// and is what the route guard propagates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "superadmin", alias = "SUPER_ADMIN", alias = "super_admin")]
    SuperAdmin,
    #[serde(rename = "admin", alias = "WORKSHOP_ADMIN", alias = "workshop_admin")]
    WorkshopAdmin,
    #[serde(rename = "mechanic", alias = "MECHANIC")]
    Mechanic,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::WorkshopAdmin, Role::Mechanic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::WorkshopAdmin => "admin",
            Role::Mechanic => "mechanic",
        }
    }

    /// Human-readable label shown in the sidebar.
    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::WorkshopAdmin => "Workshop Admin",
            Role::Mechanic => "Mechanic",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "superadmin" | "SUPER_ADMIN" | "super_admin" => Ok(Role::SuperAdmin),
            "admin" | "WORKSHOP_ADMIN" | "workshop_admin" => Ok(Role::WorkshopAdmin),
            "mechanic" | "MECHANIC" => Ok(Role::Mechanic),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

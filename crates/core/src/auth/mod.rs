//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - School roles and what each may do

mod password;

pub use password::{PasswordError, hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// User roles within a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Platform or school administrator.
    Admin,
    /// School owner.
    Proprietor,
    /// Head of school.
    Principal,
    /// Handles fees and transactions.
    Bursar,
    /// Teaches classes and grades exams.
    Teacher,
    /// Parent or guardian of students.
    Parent,
}

impl UserRole {
    /// All roles.
    pub const ALL: [Self; 6] = [
        Self::Admin,
        Self::Proprietor,
        Self::Principal,
        Self::Bursar,
        Self::Teacher,
        Self::Parent,
    ];

    /// Returns the storage string for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Proprietor => "proprietor",
            Self::Principal => "principal",
            Self::Bursar => "bursar",
            Self::Teacher => "teacher",
            Self::Parent => "parent",
        }
    }

    /// Returns true if this role can change school settings and staff.
    #[must_use]
    pub const fn can_manage_school(&self) -> bool {
        matches!(self, Self::Admin | Self::Proprietor | Self::Principal)
    }

    /// Returns true if this role can record fees and transactions.
    #[must_use]
    pub const fn can_manage_finance(&self) -> bool {
        matches!(
            self,
            Self::Admin | Self::Proprietor | Self::Principal | Self::Bursar
        )
    }

    /// Returns true if this role can record grades and attendance.
    #[must_use]
    pub const fn can_teach(&self) -> bool {
        matches!(
            self,
            Self::Admin | Self::Proprietor | Self::Principal | Self::Teacher
        )
    }

    /// Returns true for every role except parents.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::Parent)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Bursar.can_manage_finance());
        assert!(!UserRole::Teacher.can_manage_finance());
        assert!(UserRole::Teacher.can_teach());
        assert!(!UserRole::Bursar.can_teach());
        assert!(UserRole::Principal.can_manage_school());
        assert!(!UserRole::Bursar.can_manage_school());
        assert!(!UserRole::Parent.is_staff());
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("owner".parse::<UserRole>().is_err());
    }
}

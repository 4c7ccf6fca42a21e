//! Roles, capabilities, and the acting user.
//!
//! Every permission decision in the system goes through [`Role::can`].
//! Adding or renaming a role touches that one table.

use leavedesk_shared::error::ErrorKind;
use leavedesk_shared::types::{OrganizationId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Role of a user profile.
///
/// The wire form is the upper-snake string. `APPROVER` is accepted as a
/// legacy spelling of `TEAM_LEAD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular employee.
    User,
    /// Approves requests routed to their groups.
    #[serde(alias = "APPROVER")]
    TeamLead,
    /// Human resources.
    Hr,
    /// Organization administrator.
    Admin,
    /// Administrator across organizations.
    SuperAdmin,
    /// Chief executive; approves and sees everything, manages nothing.
    Ceo,
}

/// Something a role may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Approve or reject leave requests.
    Approve,
    /// See every leave request of the organization.
    ViewAllLeaves,
    /// Settings, bulk reset, groups, users, hard delete, admin edit.
    ManageOrg,
    /// Grant and revoke comp-offs.
    GrantCompOff,
    /// Maintain the public holiday calendar.
    ManageHolidays,
    /// Run year-end settlement.
    RunSettlement,
    /// Act on organizations other than one's own.
    CrossOrganizations,
}

impl Capability {
    /// Returns the string representation of the capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::ViewAllLeaves => "view_all_leaves",
            Self::ManageOrg => "manage_org",
            Self::GrantCompOff => "grant_comp_off",
            Self::ManageHolidays => "manage_holidays",
            Self::RunSettlement => "run_settlement",
            Self::CrossOrganizations => "cross_organizations",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pending requests a role may act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalScope {
    /// Every pending request in scope (organization or global).
    All,
    /// Only requests assigned to a group the actor belongs to.
    Groups,
    /// Nothing.
    None,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Self; 6] = [
        Self::User,
        Self::TeamLead,
        Self::Hr,
        Self::Admin,
        Self::SuperAdmin,
        Self::Ceo,
    ];

    /// Parse a role from its wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Some(Self::User),
            "TEAM_LEAD" | "APPROVER" => Some(Self::TeamLead),
            "HR" => Some(Self::Hr),
            "ADMIN" => Some(Self::Admin),
            "SUPER_ADMIN" => Some(Self::SuperAdmin),
            "CEO" => Some(Self::Ceo),
            _ => None,
        }
    }

    /// Returns the wire form of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::TeamLead => "TEAM_LEAD",
            Self::Hr => "HR",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Ceo => "CEO",
        }
    }

    /// The capability table.
    #[must_use]
    pub const fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::Approve => !matches!(self, Self::User),
            Capability::ViewAllLeaves => {
                matches!(self, Self::Hr | Self::Admin | Self::SuperAdmin | Self::Ceo)
            }
            Capability::ManageOrg | Capability::RunSettlement => {
                matches!(self, Self::Admin | Self::SuperAdmin)
            }
            Capability::GrantCompOff | Capability::ManageHolidays => {
                matches!(self, Self::Hr | Self::Admin | Self::SuperAdmin)
            }
            Capability::CrossOrganizations => matches!(self, Self::SuperAdmin),
        }
    }

    /// Requires a capability.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` if the role lacks it.
    pub const fn require(self, capability: Capability) -> Result<(), AccessDenied> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AccessDenied {
                role: self,
                capability,
            })
        }
    }

    /// Derives the approval queue scope.
    #[must_use]
    pub const fn approval_scope(self) -> ApprovalScope {
        if self.can(Capability::ViewAllLeaves) {
            ApprovalScope::All
        } else if self.can(Capability::Approve) {
            ApprovalScope::Groups
        } else {
            ApprovalScope::None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role was asked for a capability it does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("role {role} may not {capability}")]
pub struct AccessDenied {
    /// The acting role.
    pub role: Role,
    /// The missing capability.
    pub capability: Capability,
}

impl AccessDenied {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        403
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "FORBIDDEN"
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Access
    }
}

/// The authenticated user an operation runs on behalf of.
///
/// Built by [`crate::identity::Session::actor`] once both the identity and
/// the profile are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Profile id.
    pub user_id: UserId,
    /// Organization the profile belongs to.
    pub organization_id: OrganizationId,
    /// Profile role.
    pub role: Role,
}

impl Actor {
    /// Returns true if the actor's role has the capability.
    #[must_use]
    pub const fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Requires a capability.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` if the actor's role lacks it.
    pub const fn require(&self, capability: Capability) -> Result<(), AccessDenied> {
        self.role.require(capability)
    }

    /// Returns true if the actor may act on data of `organization_id`.
    #[must_use]
    pub fn can_access_organization(&self, organization_id: OrganizationId) -> bool {
        self.organization_id == organization_id || self.can(Capability::CrossOrganizations)
    }

    /// Requires a capability within a given organization.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` if the capability is missing or the organization
    /// is foreign to an actor who cannot cross organizations.
    pub fn require_in(
        &self,
        capability: Capability,
        organization_id: OrganizationId,
    ) -> Result<(), AccessDenied> {
        self.require(capability)?;
        if self.can_access_organization(organization_id) {
            Ok(())
        } else {
            Err(AccessDenied {
                role: self.role,
                capability: Capability::CrossOrganizations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_role_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_approver_is_team_lead() {
        assert_eq!(Role::parse("APPROVER"), Some(Role::TeamLead));
        assert_eq!(Role::parse(" team_lead "), Some(Role::TeamLead));
        let parsed: Role = serde_json::from_str("\"APPROVER\"").unwrap();
        assert_eq!(parsed, Role::TeamLead);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"TEAM_LEAD\"");
        assert_eq!(Role::parse("OWNER"), None);
    }

    #[rstest]
    #[case(Role::User, [false, false, false, false, false, false, false])]
    #[case(Role::TeamLead, [true, false, false, false, false, false, false])]
    #[case(Role::Hr, [true, true, false, true, true, false, false])]
    #[case(Role::Admin, [true, true, true, true, true, true, false])]
    #[case(Role::SuperAdmin, [true, true, true, true, true, true, true])]
    #[case(Role::Ceo, [true, true, false, false, false, false, false])]
    fn test_capability_table(#[case] role: Role, #[case] expected: [bool; 7]) {
        let capabilities = [
            Capability::Approve,
            Capability::ViewAllLeaves,
            Capability::ManageOrg,
            Capability::GrantCompOff,
            Capability::ManageHolidays,
            Capability::RunSettlement,
            Capability::CrossOrganizations,
        ];
        for (capability, allowed) in capabilities.into_iter().zip(expected) {
            assert_eq!(role.can(capability), allowed, "{role} / {capability}");
        }
    }

    #[test]
    fn test_approval_scope() {
        assert_eq!(Role::User.approval_scope(), ApprovalScope::None);
        assert_eq!(Role::TeamLead.approval_scope(), ApprovalScope::Groups);
        assert_eq!(Role::Hr.approval_scope(), ApprovalScope::All);
        assert_eq!(Role::Ceo.approval_scope(), ApprovalScope::All);
    }

    #[test]
    fn test_require_in_foreign_organization() {
        let home = OrganizationId::new();
        let admin = Actor {
            user_id: UserId::new(),
            organization_id: home,
            role: Role::Admin,
        };
        assert!(admin.require_in(Capability::ManageOrg, home).is_ok());

        let err = admin
            .require_in(Capability::ManageOrg, OrganizationId::new())
            .unwrap_err();
        assert_eq!(err.capability, Capability::CrossOrganizations);
        assert_eq!(err.status_code(), 403);

        let super_admin = Actor {
            role: Role::SuperAdmin,
            ..admin
        };
        assert!(
            super_admin
                .require_in(Capability::ManageOrg, OrganizationId::new())
                .is_ok()
        );
    }
}

//! Access control shared by the token and market contracts

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::Address;

/// Contract roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full control: roles, whitelist, minting, listings
    Admin,
    /// May whitelist accounts and mint/burn on the admin's behalf
    Issuer,
}

/// Role-based access control manager.
///
/// Maps caller addresses to their assigned role. There is always exactly
/// one primary admin.
#[derive(Debug, Clone)]
pub struct AccessControl {
    roles: HashMap<Address, Role>,
    admin: Address,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: Address) -> Self {
        let mut roles = HashMap::new();
        roles.insert(admin, Role::Admin);
        Self { roles, admin }
    }

    /// Check if a caller has the specified role.
    pub fn has_role(&self, caller: &Address, role: Role) -> bool {
        self.roles.get(caller).is_some_and(|r| *r == role)
    }

    /// Check if a caller is admin.
    pub fn is_admin(&self, caller: &Address) -> bool {
        self.has_role(caller, Role::Admin)
    }

    /// Admin or issuer.
    pub fn can_issue(&self, caller: &Address) -> bool {
        self.is_admin(caller) || self.has_role(caller, Role::Issuer)
    }

    /// Assign a role to a caller. Only admin can assign roles.
    pub fn grant_role(&mut self, admin_caller: &Address, target: Address, role: Role) -> bool {
        if !self.is_admin(admin_caller) {
            return false;
        }
        self.roles.insert(target, role);
        true
    }

    /// Remove a role from a caller. Only admin can revoke.
    pub fn revoke_role(&mut self, admin_caller: &Address, target: &Address) -> bool {
        if !self.is_admin(admin_caller) {
            return false;
        }
        // Cannot revoke the primary admin
        if *target == self.admin {
            return false;
        }
        self.roles.remove(target);
        true
    }

    /// Transfer admin to a new address.
    pub fn transfer_admin(&mut self, current_admin: &Address, new_admin: Address) -> bool {
        if *current_admin != self.admin {
            return false;
        }
        self.roles.remove(current_admin);
        self.roles.insert(new_admin, Role::Admin);
        self.admin = new_admin;
        true
    }

    /// Get the current admin.
    pub fn admin(&self) -> Address {
        self.admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_low_u64(1)
    }

    fn bob() -> Address {
        Address::from_low_u64(2)
    }

    fn charlie() -> Address {
        Address::from_low_u64(3)
    }

    #[test]
    fn test_access_control_admin() {
        let ac = AccessControl::new(alice());
        assert!(ac.is_admin(&alice()));
        assert!(!ac.is_admin(&bob()));
        assert!(ac.can_issue(&alice()));
    }

    #[test]
    fn test_access_control_grant_issuer() {
        let mut ac = AccessControl::new(alice());
        assert!(ac.grant_role(&alice(), bob(), Role::Issuer));
        assert!(ac.has_role(&bob(), Role::Issuer));
        assert!(ac.can_issue(&bob()));
        assert!(!ac.is_admin(&bob()));
    }

    #[test]
    fn test_access_control_non_admin_cannot_grant() {
        let mut ac = AccessControl::new(alice());
        ac.grant_role(&alice(), bob(), Role::Issuer);
        assert!(!ac.grant_role(&bob(), charlie(), Role::Issuer));
        assert!(!ac.can_issue(&charlie()));
    }

    #[test]
    fn test_access_control_revoke_role() {
        let mut ac = AccessControl::new(alice());
        ac.grant_role(&alice(), bob(), Role::Issuer);
        assert!(ac.revoke_role(&alice(), &bob()));
        assert!(!ac.can_issue(&bob()));
    }

    #[test]
    fn test_access_control_cannot_revoke_primary_admin() {
        let mut ac = AccessControl::new(alice());
        assert!(!ac.revoke_role(&alice(), &alice()));
    }

    #[test]
    fn test_access_control_transfer_admin() {
        let mut ac = AccessControl::new(alice());
        assert!(ac.transfer_admin(&alice(), bob()));
        assert!(ac.is_admin(&bob()));
        assert!(!ac.is_admin(&alice()));
        assert_eq!(ac.admin(), bob());
    }

    #[test]
    fn test_access_control_transfer_admin_unauthorized() {
        let mut ac = AccessControl::new(alice());
        assert!(!ac.transfer_admin(&bob(), charlie()));
        assert_eq!(ac.admin(), alice());
    }
}

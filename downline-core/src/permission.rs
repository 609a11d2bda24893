//! Permission evaluation
//!
//! One rank table and three named predicates replace per-operation role
//! checks. Ancestry is computed by the hierarchy resolver and passed in, so
//! every predicate here is a pure function over user records.

use crate::types::{Role, User};
use rust_decimal::Decimal;

/// May `actor` perform a managing operation on `subject`?
///
/// Self-operations are never "management" and return false here; they have
/// their own permitted paths (profile edit, self-recharge).
pub fn can_manage(actor: &User, subject: &User, actor_is_ancestor: bool) -> bool {
    if actor.id == subject.id {
        return false;
    }
    if actor.role == Role::SuperAdmin {
        return true;
    }
    // Outranking an own descendant is always enough
    if actor.role.rank() > subject.role.rank() && actor_is_ancestor {
        return true;
    }
    // Admins additionally manage non-privileged roles system-wide
    actor.role == Role::Admin && !subject.role.is_privileged()
}

/// May an actor with `actor_role` assign `desired` to a target whose current
/// role is `target_current`? `actor_role` is None for public
/// self-registration; `target_current` is None at creation.
pub fn can_assign_role(
    actor_role: Option<Role>,
    desired: Role,
    target_current: Option<Role>,
) -> bool {
    match actor_role {
        Some(Role::SuperAdmin) => true,
        Some(Role::Admin) => {
            let target_untouchable = matches!(target_current, Some(r) if r.is_privileged());
            desired != Role::SuperAdmin && !target_untouchable
        }
        // Users and moderators only ever create their own next level
        Some(Role::User) | Some(Role::Moderator) => desired == Role::User,
        None => desired == Role::User,
    }
}

/// May `actor` delete `subject`? Requires management rights, a drained
/// balance, and never self-deletion.
pub fn can_delete(actor: &User, subject: &User, actor_is_ancestor: bool) -> bool {
    actor.id != subject.id
        && subject.balance == Decimal::ZERO
        && can_manage(actor, subject, actor_is_ancestor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;
    use chrono::Utc;

    fn user_with_role(role: Role) -> User {
        let now = Utc::now();
        User {
            id: UserId::generate(),
            username: format!("u-{}", role.as_str()),
            email: format!("{}@example.com", role.as_str()),
            password_hash: "x".to_string(),
            role,
            balance: Decimal::ZERO,
            created_by: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_super_admin_manages_everyone_else() {
        let actor = user_with_role(Role::SuperAdmin);
        for role in [Role::User, Role::Moderator, Role::Admin, Role::SuperAdmin] {
            let subject = user_with_role(role);
            assert!(can_manage(&actor, &subject, false));
        }
    }

    #[test]
    fn test_nobody_manages_themselves() {
        for role in [Role::User, Role::Moderator, Role::Admin, Role::SuperAdmin] {
            let actor = user_with_role(role);
            assert!(!can_manage(&actor, &actor, true));
        }
    }

    #[test]
    fn test_rank_plus_ancestry() {
        let moderator = user_with_role(Role::Moderator);
        let user = user_with_role(Role::User);

        assert!(can_manage(&moderator, &user, true));
        // Not an ancestor, not an admin: no authority
        assert!(!can_manage(&moderator, &user, false));
        // Equal rank never manages, ancestor or not
        let other_moderator = user_with_role(Role::Moderator);
        assert!(!can_manage(&moderator, &other_moderator, true));
    }

    #[test]
    fn test_admin_manages_non_privileged_system_wide() {
        let admin = user_with_role(Role::Admin);
        assert!(can_manage(&admin, &user_with_role(Role::User), false));
        assert!(can_manage(&admin, &user_with_role(Role::Moderator), false));
        assert!(!can_manage(&admin, &user_with_role(Role::Admin), false));
        assert!(!can_manage(&admin, &user_with_role(Role::SuperAdmin), true));
    }

    #[test]
    fn test_user_cannot_manage_admin() {
        let user = user_with_role(Role::User);
        let admin = user_with_role(Role::Admin);
        assert!(!can_manage(&user, &admin, false));
        assert!(!can_manage(&user, &admin, true));
    }

    #[test]
    fn test_role_assignment_super_admin() {
        for desired in [Role::User, Role::Moderator, Role::Admin, Role::SuperAdmin] {
            assert!(can_assign_role(Some(Role::SuperAdmin), desired, None));
            assert!(can_assign_role(
                Some(Role::SuperAdmin),
                desired,
                Some(Role::Admin)
            ));
        }
    }

    #[test]
    fn test_role_assignment_admin() {
        assert!(can_assign_role(Some(Role::Admin), Role::User, None));
        assert!(can_assign_role(Some(Role::Admin), Role::Moderator, None));
        assert!(can_assign_role(Some(Role::Admin), Role::Admin, None));
        assert!(!can_assign_role(Some(Role::Admin), Role::SuperAdmin, None));
        // Admin cannot touch a target that is already privileged
        assert!(!can_assign_role(
            Some(Role::Admin),
            Role::User,
            Some(Role::Admin)
        ));
        assert!(!can_assign_role(
            Some(Role::Admin),
            Role::User,
            Some(Role::SuperAdmin)
        ));
        assert!(can_assign_role(
            Some(Role::Admin),
            Role::Moderator,
            Some(Role::User)
        ));
    }

    #[test]
    fn test_role_assignment_low_ranks_and_public() {
        for actor in [Some(Role::User), Some(Role::Moderator), None] {
            assert!(can_assign_role(actor, Role::User, None));
            assert!(!can_assign_role(actor, Role::Moderator, None));
            assert!(!can_assign_role(actor, Role::Admin, None));
        }
    }

    #[test]
    fn test_deletion_rules() {
        let admin = user_with_role(Role::Admin);
        let mut subject = user_with_role(Role::User);

        assert!(can_delete(&admin, &subject, false));

        subject.balance = Decimal::new(1, 2);
        assert!(!can_delete(&admin, &subject, false));

        subject.balance = Decimal::ZERO;
        assert!(!can_delete(&subject.clone(), &subject, false));
    }
}

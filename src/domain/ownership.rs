use super::Entity;

/// True iff both logins are present and equal (exact, case-sensitive)
pub fn owns(principal_login: Option<&str>, record_owner: Option<&str>) -> bool {
    match (principal_login, record_owner) {
        (Some(login), Some(owner)) => login == owner,
        _ => false,
    }
}

/// Whether `principal_login` may see `record`. Resources without an owner
/// field are visible to everyone.
pub fn visible_to<E: Entity>(principal_login: Option<&str>, record: &E) -> bool {
    !E::OWNED || owns(principal_login, record.owner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Flight, Invoice};

    #[test]
    fn matching_logins_own() {
        assert!(owns(Some("alice"), Some("alice")));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        assert!(!owns(Some("alice"), Some("Alice")));
    }

    #[test]
    fn absent_principal_never_owns() {
        assert!(!owns(None, Some("alice")));
        assert!(!owns(None, None));
    }

    #[test]
    fn absent_owner_is_owned_by_nobody() {
        assert!(!owns(Some("alice"), None));
    }

    #[test]
    fn unowned_resources_are_always_visible() {
        let flight = Flight::default();
        assert!(visible_to(None, &flight));
        assert!(visible_to(Some("bob"), &flight));
    }

    #[test]
    fn owned_resources_follow_the_owner_field() {
        let invoice = Invoice {
            passenger_id: Some("alice".to_string()),
            ..Invoice::default()
        };
        assert!(visible_to(Some("alice"), &invoice));
        assert!(!visible_to(Some("bob"), &invoice));
        assert!(!visible_to(None, &invoice));
    }
}

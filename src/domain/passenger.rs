use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Entity;
use crate::database::repository::{PgEntity, PgQueryAs};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub id: Option<i64>,
    pub login: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Body sent by the gateway when a new user account signs up
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerRegistration {
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<PassengerRegistration> for Passenger {
    fn from(registration: PassengerRegistration) -> Self {
        Self {
            id: None,
            login: Some(registration.login),
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
        }
    }
}

impl Entity for Passenger {
    const NAME: &'static str = "passenger";
    const RESOURCE: &'static str = "passengers";
    const ENTITY_NAME: &'static str = "passengersPassenger";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl PgEntity for Passenger {
    const TABLE: &'static str = "passenger";
    const COLUMNS: &'static [&'static str] = &["login", "first_name", "last_name", "email"];

    fn bind_columns<'q>(&self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.login.clone())
            .bind(self.first_name.clone())
            .bind(self.last_name.clone())
            .bind(self.email.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_becomes_new_passenger() {
        let registration: PassengerRegistration =
            serde_json::from_str(r#"{"login":"alice","firstName":"Alice","email":"alice@example.com"}"#).unwrap();
        let passenger = Passenger::from(registration);
        assert_eq!(passenger.id, None);
        assert_eq!(passenger.login.as_deref(), Some("alice"));
        assert_eq!(passenger.first_name.as_deref(), Some("Alice"));
        assert_eq!(passenger.last_name, None);
    }

    #[test]
    fn registration_requires_login() {
        assert!(serde_json::from_str::<PassengerRegistration>(r#"{"firstName":"Alice"}"#).is_err());
    }
}

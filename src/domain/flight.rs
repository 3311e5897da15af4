use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Entity, ProjectionError};
use crate::database::repository::{PgEntity, PgQueryAs};
use crate::types::Operation;

pub const TOPIC_FLIGHT_SET: &str = "flight_set";
pub const TOPIC_FLIGHT_UPDATED: &str = "flight_updated";
pub const TOPIC_FLIGHT_CANCELLED: &str = "flight_cancelled";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: Option<i64>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlightEvent<'a> {
    id: i64,
    flight_number: Option<&'a str>,
    departure_time: Option<DateTime<Utc>>,
    arrival_time: Option<DateTime<Utc>>,
    event_type: &'static str,
}

impl Entity for Flight {
    const NAME: &'static str = "flight";
    const RESOURCE: &'static str = "flights";
    const ENTITY_NAME: &'static str = "flightsFlight";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn topic(operation: Operation) -> Option<&'static str> {
        Some(match operation {
            Operation::Create => TOPIC_FLIGHT_SET,
            Operation::Update => TOPIC_FLIGHT_UPDATED,
            Operation::Delete => TOPIC_FLIGHT_CANCELLED,
        })
    }

    fn event_payload(&self, operation: Operation) -> Result<String, ProjectionError> {
        let id = self.id.ok_or(ProjectionError::MissingField {
            entity: Self::ENTITY_NAME,
            field: "id",
        })?;
        let event = FlightEvent {
            id,
            flight_number: self.flight_number.as_deref(),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            event_type: operation.event_type(),
        };
        Ok(serde_json::to_string(&event)?)
    }
}

impl PgEntity for Flight {
    const TABLE: &'static str = "flight";
    const COLUMNS: &'static [&'static str] = &[
        "flight_number",
        "departure_airport",
        "arrival_airport",
        "departure_time",
        "arrival_time",
        "price",
    ];

    fn bind_columns<'q>(&self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.flight_number.clone())
            .bind(self.departure_airport.clone())
            .bind(self.arrival_airport.clone())
            .bind(self.departure_time)
            .bind(self.arrival_time)
            .bind(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mutation_has_a_topic() {
        assert_eq!(Flight::topic(Operation::Create), Some(TOPIC_FLIGHT_SET));
        assert_eq!(Flight::topic(Operation::Update), Some(TOPIC_FLIGHT_UPDATED));
        assert_eq!(Flight::topic(Operation::Delete), Some(TOPIC_FLIGHT_CANCELLED));
    }

    #[test]
    fn cancelled_event_carries_event_type() {
        let flight = Flight {
            id: Some(9),
            flight_number: Some("LH123".to_string()),
            ..Flight::default()
        };
        let payload = flight.event_payload(Operation::Delete).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["id"], 9);
        assert_eq!(value["flightNumber"], "LH123");
        assert_eq!(value["eventType"], "CANCELLED");
    }

    #[test]
    fn unsaved_flight_has_no_projection() {
        assert!(Flight::default().event_payload(Operation::Create).is_err());
    }
}

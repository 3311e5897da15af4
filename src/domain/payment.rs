use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

use super::{Entity, ProjectionError, ValidationIssue, ValidationOutcome};
use crate::database::repository::{PgEntity, PgQueryAs};
use crate::types::Operation;

pub const TOPIC_PAYMENT_SET: &str = "payment_set";
pub const TOPIC_PAYMENT_UPDATED: &str = "payment_updated";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Option<i64>,
    pub booking_number: Option<i64>,
    pub to_pay: Option<f64>,
    pub passenger_id: Option<String>,
    pub credit_card: Option<CreditCard>,
}

/// Card details embedded in a payment row (`credit_card_*` columns)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub card_number: Option<i64>,
    pub validity_date: Option<NaiveDate>,
    pub cvc: Option<i32>,
}

impl CreditCard {
    /// Present, non-negative, not expired on `today`
    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        let number_ok = self.card_number.is_some_and(|n| n >= 0);
        let cvc_ok = self.cvc.is_some_and(|c| c >= 0);
        let date_ok = self.validity_date.is_some_and(|d| d >= today);
        number_ok && cvc_ok && date_ok
    }
}

/// Message body of the payment topics; every field is a string
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentEvent {
    id: String,
    booking_number: String,
    to_pay: String,
}

impl Entity for Payment {
    const NAME: &'static str = "payment";
    const RESOURCE: &'static str = "payments";
    const ENTITY_NAME: &'static str = "paymentsPayment";
    const OWNED: bool = true;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn owner(&self) -> Option<&str> {
        self.passenger_id.as_deref()
    }

    fn validate(&self, today: NaiveDate) -> ValidationOutcome {
        let mut issues = Vec::new();

        match self.to_pay {
            Some(amount) if amount >= 0.0 => {}
            _ => issues.push(ValidationIssue::new("toPay", "Invalid amount to pay")),
        }

        match &self.credit_card {
            Some(card) if card.is_valid_on(today) => {}
            Some(_) => issues.push(ValidationIssue::new("creditCard", "Credit Card Data is not correct")),
            None => issues.push(ValidationIssue::new("creditCard", "Credit Card Data is missing")),
        }

        ValidationOutcome::from_issues(issues)
    }

    fn topic(operation: Operation) -> Option<&'static str> {
        match operation {
            Operation::Create => Some(TOPIC_PAYMENT_SET),
            Operation::Update => Some(TOPIC_PAYMENT_UPDATED),
            Operation::Delete => None,
        }
    }

    fn event_payload(&self, _operation: Operation) -> Result<String, ProjectionError> {
        let missing = |field| ProjectionError::MissingField {
            entity: Self::ENTITY_NAME,
            field,
        };
        let event = PaymentEvent {
            id: self.id.ok_or_else(|| missing("id"))?.to_string(),
            booking_number: self.booking_number.ok_or_else(|| missing("bookingNumber"))?.to_string(),
            // Whole amounts keep their fraction digit, 10.0 stays "10.0"
            to_pay: format!("{:?}", self.to_pay.ok_or_else(|| missing("toPay"))?),
        };
        Ok(serde_json::to_string(&event)?)
    }
}

impl<'r> FromRow<'r, PgRow> for Payment {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let card_number: Option<i64> = row.try_get("credit_card_number")?;
        let validity_date: Option<NaiveDate> = row.try_get("credit_card_validity_date")?;
        let cvc: Option<i32> = row.try_get("credit_card_cvc")?;

        let credit_card = if card_number.is_none() && validity_date.is_none() && cvc.is_none() {
            None
        } else {
            Some(CreditCard {
                card_number,
                validity_date,
                cvc,
            })
        };

        Ok(Self {
            id: row.try_get("id")?,
            booking_number: row.try_get("booking_number")?,
            to_pay: row.try_get("to_pay")?,
            passenger_id: row.try_get("passenger_id")?,
            credit_card,
        })
    }
}

impl PgEntity for Payment {
    const TABLE: &'static str = "payment";
    const COLUMNS: &'static [&'static str] = &[
        "booking_number",
        "to_pay",
        "passenger_id",
        "credit_card_number",
        "credit_card_validity_date",
        "credit_card_cvc",
    ];

    fn bind_columns<'q>(&self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        let card = self.credit_card.clone().unwrap_or_default();
        query
            .bind(self.booking_number)
            .bind(self.to_pay)
            .bind(self.passenger_id.clone())
            .bind(card.card_number)
            .bind(card.validity_date)
            .bind(card.cvc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn card(validity: NaiveDate) -> CreditCard {
        CreditCard {
            card_number: Some(4111_1111_1111_1111),
            validity_date: Some(validity),
            cvc: Some(123),
        }
    }

    fn payment(to_pay: f64, credit_card: Option<CreditCard>) -> Payment {
        Payment {
            id: Some(3),
            booking_number: Some(42),
            to_pay: Some(to_pay),
            passenger_id: Some("alice".to_string()),
            credit_card,
        }
    }

    #[test]
    fn valid_payment_passes() {
        let p = payment(120.0, Some(card(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())));
        assert!(p.validate(today()).is_valid());
    }

    #[test]
    fn negative_amount_is_reported() {
        let p = payment(-5.0, Some(card(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())));
        let outcome = p.validate(today());
        assert_eq!(outcome.issues().len(), 1);
        assert_eq!(outcome.issues()[0].field, "toPay");
    }

    #[test]
    fn expired_card_is_reported() {
        let p = payment(10.0, Some(card(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap())));
        let outcome = p.validate(today());
        assert_eq!(outcome.issues()[0].field, "creditCard");
    }

    #[test]
    fn card_expiring_today_is_still_valid() {
        assert!(card(today()).is_valid_on(today()));
    }

    #[test]
    fn missing_card_and_amount_report_both() {
        let p = Payment::default();
        assert_eq!(p.validate(today()).issues().len(), 2);
    }

    #[test]
    fn negative_cvc_is_invalid() {
        let mut c = card(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        c.cvc = Some(-1);
        assert!(!c.is_valid_on(today()));
    }

    #[test]
    fn event_payload_is_string_projection() {
        let p = payment(99.5, None);
        let payload = p.event_payload(Operation::Create).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["id"], "3");
        assert_eq!(value["bookingNumber"], "42");
        assert_eq!(value["toPay"], "99.5");
        assert!(value.get("creditCard").is_none());

        let whole = payment(10.0, None).event_payload(Operation::Update).unwrap();
        let value: serde_json::Value = serde_json::from_str(&whole).unwrap();
        assert_eq!(value["toPay"], "10.0");
    }

    #[test]
    fn event_payload_requires_booking_number() {
        let mut p = payment(1.0, None);
        p.booking_number = None;
        assert!(matches!(
            p.event_payload(Operation::Create),
            Err(ProjectionError::MissingField { field: "bookingNumber", .. })
        ));
    }

    #[test]
    fn deletes_are_not_published() {
        assert_eq!(Payment::topic(Operation::Create), Some(TOPIC_PAYMENT_SET));
        assert_eq!(Payment::topic(Operation::Delete), None);
    }
}

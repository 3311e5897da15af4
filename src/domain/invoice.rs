use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Entity;
use crate::database::repository::{PgEntity, PgQueryAs};

/// Name of the list filter returning invoices that have not been paid yet
pub const PAYMENT_IS_NULL: &str = "payment-is-null";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Option<i64>,
    pub invoice_number: Option<i64>,
    pub amount: Option<f64>,
    pub passenger_id: Option<String>,
    pub booking_number: Option<i64>,
    /// Associated payment, if the invoice has been settled
    pub payment_id: Option<i64>,
}

impl Entity for Invoice {
    const NAME: &'static str = "invoice";
    const RESOURCE: &'static str = "invoices";
    const ENTITY_NAME: &'static str = "paymentsInvoice";
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

    fn named_filter(name: &str) -> Option<fn(&Self) -> bool> {
        match name {
            PAYMENT_IS_NULL => Some(unpaid as fn(&Invoice) -> bool),
            _ => None,
        }
    }
}

fn unpaid(invoice: &Invoice) -> bool {
    invoice.payment_id.is_none()
}

impl PgEntity for Invoice {
    const TABLE: &'static str = "invoice";
    const COLUMNS: &'static [&'static str] = &[
        "invoice_number",
        "amount",
        "passenger_id",
        "booking_number",
        "payment_id",
    ];

    fn bind_columns<'q>(&self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.invoice_number)
            .bind(self.amount)
            .bind(self.passenger_id.clone())
            .bind(self.booking_number)
            .bind(self.payment_id)
    }
}

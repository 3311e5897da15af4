use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Entity;
use crate::database::repository::{PgEntity, PgQueryAs};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Option<i64>,
    pub passenger_id: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Notification {
    const NAME: &'static str = "notification";
    const RESOURCE: &'static str = "notifications";
    const ENTITY_NAME: &'static str = "notificationsNotification";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl PgEntity for Notification {
    const TABLE: &'static str = "notification";
    const COLUMNS: &'static [&'static str] = &["passenger_id", "title", "message", "created_at"];

    fn bind_columns<'q>(&self, query: PgQueryAs<'q, Self>) -> PgQueryAs<'q, Self> {
        query
            .bind(self.passenger_id.clone())
            .bind(self.title.clone())
            .bind(self.message.clone())
            .bind(self.created_at)
    }
}

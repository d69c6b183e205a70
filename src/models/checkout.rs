use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tokio_postgres::Row;

/// One pickup event in the append-only checkout log.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckoutRecord {
    /// The identifier assigned by the database.
    pub id: i64,
    /// The name of the student who left.
    pub student_name: String,
    /// The name of the guardian who picked the student up.
    pub guardian_name: String,
    /// Wall-clock time of the pickup, as entered at the desk.
    pub checkout_at: NaiveDateTime,
    /// The staff member who recorded the event.
    pub attendant_name: String,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the row was written.
    pub recorded_at: DateTime<Utc>,
}

impl From<&Row> for CheckoutRecord {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            student_name: row.get("student_name"),
            guardian_name: row.get("guardian_name"),
            checkout_at: row.get("checkout_at"),
            attendant_name: row.get("attendant_name"),
            notes: row.get("notes"),
            recorded_at: row.get("recorded_at"),
        }
    }
}

/// A validated checkout, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckout {
    pub student_name: String,
    pub guardian_name: String,
    pub checkout_at: NaiveDateTime,
    pub attendant_name: String,
    pub notes: Option<String>,
}

/// Filters for the checkout history. Both are optional and AND-composed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Case-insensitive substring of the student name.
    pub student_name: Option<String>,
    /// Calendar date of the checkout.
    pub date: Option<chrono::NaiveDate>,
}

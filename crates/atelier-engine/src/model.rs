//! Records held by the persistent store.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::offset;
use crate::shift::Shift;

pub type ItemId = u64;
pub type ReservationId = u64;
pub type OrderId = u64;
pub type CustomerId = u64;

/// A rentable or sellable piece of clothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Dress or suit.
    pub model: String,
    /// Rental or sale.
    pub kind: String,
    /// Bridal, graduation, debutante...
    pub category: String,
    pub description: Option<String>,
    /// Manually toggled by staff; independent of any booking.
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub model: String,
    pub kind: String,
    pub category: String,
    pub description: Option<String>,
    pub available: bool,
}

/// Listing filter over booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    /// Every booking that has not been cancelled.
    Active,
}

impl StatusFilter {
    pub fn matches(&self, confirmed: bool, cancelled: bool) -> bool {
        match self {
            StatusFilter::Pending => !confirmed && !cancelled,
            StatusFilter::Confirmed => confirmed && !cancelled,
            StatusFilter::Cancelled => cancelled,
            StatusFilter::Active => !cancelled,
        }
    }
}

/// A trial/fitting appointment for one shift on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub item_id: ItemId,
    pub customer_name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub shift: Shift,
    pub confirmed: bool,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Whether this reservation counts against its shift's capacity.
    pub fn occupies(&self, item_id: ItemId, date: NaiveDate, shift: Shift) -> bool {
        !self.cancelled && self.item_id == item_id && self.date == date && self.shift == shift
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub item_id: ItemId,
    pub customer_name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub shift: Shift,
}

/// A confirmed rental booking of one item for one event date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub item_id: ItemId,
    pub event_date: NaiveDate,
    pub trial_date: Option<NaiveDate>,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub notes: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order still protects dates around its event.
    pub fn is_active(&self) -> bool {
        !self.cancelled
    }

    /// Re-derive pickup and return from the current event date.
    pub fn rederive_logistics(&mut self) {
        let (pickup, ret) = logistics_dates(self.event_date);
        self.pickup_date = pickup;
        self.return_date = ret;
    }
}

/// Pickup is the day before the event, return the day after.
pub fn logistics_dates(event_date: NaiveDate) -> (NaiveDate, NaiveDate) {
    (offset(event_date, -1), offset(event_date, 1))
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub item_id: ItemId,
    pub event_date: NaiveDate,
    pub trial_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A registered customer, unique by tax ID (CPF/CNPJ) and by phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub tax_id: String,
    pub address: Option<String>,
    pub city: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub tax_id: String,
    pub address: Option<String>,
    pub city: String,
}

/// Audit action recorded against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Created,
    Edited,
    Confirmed,
    Cancelled,
}

/// Append-only audit entry keyed by order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub order_id: OrderId,
    pub actor: String,
    pub action: LogAction,
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// An audit entry for an order write, attached to the order id by the store
/// in the same write.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLog {
    pub actor: String,
    pub action: LogAction,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl OrderLog {
    pub fn entry(self, order_id: OrderId) -> LogEntry {
        LogEntry {
            order_id,
            actor: self.actor,
            action: self.action,
            detail: self.detail,
            at: self.at,
        }
    }
}

/// Whether a date falls in the given calendar month (1-12).
pub(crate) fn in_month(date: NaiveDate, month: u32) -> bool {
    date.month() == month
}

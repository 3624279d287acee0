//! Parameters accepted by availability-facing endpoints.
//!
//! Raw values arrive as strings from a form or query string; [`AvailabilityQuery::resolve`]
//! validates them and fills in defaults.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::parse_iso_date;
use crate::config::PolicyConfig;
use crate::error::Result;
use crate::model::{ItemId, OrderId};

/// Which availability view the query is for; decides the default horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Reservation,
    Order,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub item_id: ItemId,
    /// ISO date; defaults to today.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub excluding_order_id: Option<OrderId>,
    #[serde(default)]
    pub horizon_days: Option<u32>,
}

/// A validated [`AvailabilityQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub item_id: ItemId,
    pub date: NaiveDate,
    pub excluding_order_id: Option<OrderId>,
    pub horizon_days: u32,
}

impl AvailabilityQuery {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            ..Self::default()
        }
    }

    /// # Errors
    /// Returns `BookingError::Validation` if `date` is present but not ISO.
    pub fn resolve(&self, view: View, today: NaiveDate, config: &PolicyConfig) -> Result<ResolvedQuery> {
        let date = match self.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_iso_date(raw)?,
            _ => today,
        };
        let horizon_days = self.horizon_days.unwrap_or(match view {
            View::Reservation => config.reservation_horizon_days,
            View::Order => config.order_horizon_days,
        });
        Ok(ResolvedQuery {
            item_id: self.item_id,
            date,
            excluding_order_id: self.excluding_order_id,
            horizon_days,
        })
    }
}

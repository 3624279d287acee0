//! # atelier-engine
//!
//! Date-availability and booking-conflict engine for a formal-wear rental shop.
//!
//! The shop books two kinds of things against an item. Trial reservations take
//! one of two daily shifts, with a fixed number of places per shift. Rental
//! orders take a whole event date and protect a buffer of days on either side.
//! This crate decides which dates are open under each policy and refuses any
//! booking that would break them.
//!
//! ## Modules
//!
//! - [`trial`] — shift occupancy and free trial dates
//! - [`conflict`] — order-window conflict detection
//! - [`blocked`] — blocked/free order dates and return-date filtering
//! - [`catalog`] — item filters and the category showcase
//! - [`service`] — the booking service tying policies to the store
//! - [`store`] — persistent-store boundary and in-memory implementation
//! - [`notify`] — customer notifications as chat deep links
//! - [`calendar`] — ISO dates, horizons, date windows, clocks
//! - [`config`] — shop policy configuration
//! - [`error`] — Error types

pub mod blocked;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod conflict;
pub mod error;
pub mod locks;
pub mod model;
pub mod notify;
pub mod query;
pub mod service;
pub mod shift;
pub mod store;
pub mod trial;

pub use blocked::{free_return_dates, BlockedDateStrategy, BlockedDates, BruteForce, IntervalMerge};
pub use calendar::{parse_iso_date, Clock, FixedClock, SystemClock};
pub use catalog::{CategorySummary, ItemFilter};
pub use config::PolicyConfig;
pub use conflict::order_conflict;
pub use error::BookingError;
pub use model::{Customer, Item, NewCustomer, NewItem, Order, OrderLog, Reservation, StatusFilter};
pub use query::AvailabilityQuery;
pub use service::{BookingService, CancelOutcome, OrderEdit, OrderRequest, ReservationRequest, Transition};
pub use shift::Shift;
pub use store::{MemoryStore, Store};
pub use trial::{free_dates, shift_occupancy};

//! The booking service: every read and write the shop performs against the
//! store, with the availability policies applied in front of each write.
//!
//! Validation always runs before the first write. Capacity and conflict checks
//! run under a per-key lock together with the insert they guard, so two
//! requests for the same slot cannot both pass the check.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::blocked::{self, BlockedDateStrategy, BlockedDates, IntervalMerge, OrderScope};
use crate::catalog::{self, CategorySummary, ItemFilter};
use crate::calendar::{display_date, offset, parse_iso_date, Clock, SystemClock};
use crate::config::PolicyConfig;
use crate::conflict::{find_order_conflict, protected_window};
use crate::error::{BookingError, Result};
use crate::locks::KeyedLocks;
use crate::model::{
    Customer, CustomerId, Item, ItemId, LogAction, LogEntry, NewCustomer, NewItem,
    NewOrder, NewReservation, Order, OrderId, OrderLog, Reservation, ReservationId, StatusFilter,
};
use crate::notify::{Messenger, Notification};
use crate::query::{AvailabilityQuery, View};
use crate::shift::Shift;
use crate::store::Store;
use crate::trial::{self, DayOccupancy};

/// A trial reservation as submitted from the booking form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub customer_name: String,
    pub phone: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `morning`/`afternoon` (or `manhã`/`tarde`).
    pub shift: String,
}

/// A rental order as submitted by staff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: CustomerId,
    pub item_id: ItemId,
    pub event_date: String,
    #[serde(default)]
    pub trial_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Changes to an existing order. `None` leaves a field as is; for
/// `trial_date` and `notes` an empty string clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEdit {
    pub customer_id: Option<CustomerId>,
    pub item_id: Option<ItemId>,
    pub event_date: Option<String>,
    pub trial_date: Option<String>,
    pub notes: Option<String>,
}

/// Result of a flag flip that may already have happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "record", rename_all = "lowercase")]
pub enum Transition<T> {
    Applied(T),
    Unchanged(T),
}

impl<T> Transition<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Transition::Applied(t) | Transition::Unchanged(t) => t,
        }
    }
}

/// Result of cancelling a trial reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// Nothing changed; the reservation was cancelled earlier.
    AlreadyCancelled { reservation: Reservation },
    /// The reservation is now cancelled and the customer should be told.
    Cancelled {
        reservation: Reservation,
        notification: Notification,
    },
}

/// What the item page shows for trial bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationView {
    pub item_id: ItemId,
    pub occupancy: DayOccupancy,
    pub free_dates: Vec<NaiveDate>,
}

/// What the order form shows for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub item_id: ItemId,
    pub blocked: Vec<NaiveDate>,
    pub free: Vec<NaiveDate>,
    pub free_return: Vec<NaiveDate>,
}

/// Customer fields replaced wholesale by an edit.
pub type CustomerUpdate = NewCustomer;

pub struct BookingService<S: Store> {
    store: S,
    config: PolicyConfig,
    clock: Box<dyn Clock>,
    messenger: Messenger,
    strategy: Box<dyn BlockedDateStrategy>,
    shift_locks: KeyedLocks<(ItemId, NaiveDate, Shift)>,
    item_locks: KeyedLocks<ItemId>,
    customer_lock: KeyedLocks<()>,
}

impl<S: Store> BookingService<S> {
    /// # Errors
    /// Returns `BookingError::InvalidConfig` if `config` does not validate.
    pub fn new(store: S, config: PolicyConfig) -> Result<Self> {
        config.validate()?;
        let clock = SystemClock::new(config.tz()?);
        let messenger = Messenger::new(&config.messaging_base_url, &config.country_code);
        Ok(Self {
            store,
            config,
            clock: Box::new(clock),
            messenger,
            strategy: Box::new(IntervalMerge),
            shift_locks: KeyedLocks::new(),
            item_locks: KeyedLocks::new(),
            customer_lock: KeyedLocks::new(),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_strategy(mut self, strategy: impl BlockedDateStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ── Items ───────────────────────────────────────────────────────────────

    pub fn item(&self, id: ItemId) -> Result<Item> {
        self.store
            .item(id)?
            .ok_or_else(|| BookingError::not_found("item", id))
    }

    #[tracing::instrument(skip(self, new), fields(name = %new.name), err)]
    pub fn add_item(&self, new: NewItem) -> Result<Item> {
        let new = normalize_item(new)?;
        let item = self.store.insert_item(new, Utc::now())?;
        info!(item_id = item.id, "item added");
        Ok(item)
    }

    /// Replace an item's catalog details, including its availability flag.
    #[tracing::instrument(skip(self, update), err)]
    pub fn edit_item(&self, id: ItemId, update: NewItem) -> Result<Item> {
        let update = normalize_item(update)?;
        self.item_locks.with(&id, || {
            let mut item = self.item(id)?;
            item.name = update.name;
            item.model = update.model;
            item.kind = update.kind;
            item.category = update.category;
            item.description = update.description;
            item.available = update.available;
            self.store.update_item(&item)?;
            info!(item_id = id, "item updated");
            Ok(item)
        })
    }

    #[tracing::instrument(skip(self), err)]
    pub fn set_item_available(&self, id: ItemId, available: bool) -> Result<Item> {
        self.item_locks.with(&id, || {
            let mut item = self.item(id)?;
            item.available = available;
            self.store.update_item(&item)?;
            info!(item_id = id, available, "item availability changed");
            Ok(item)
        })
    }

    /// Items matching `filter`, by name.
    ///
    /// # Errors
    /// Returns `BookingError::Validation` if the filter names an unknown category.
    pub fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let filter = filter.normalized()?;
        Ok(catalog::filter_items(self.store.items()?, &filter))
    }

    /// Item count and cover item for every catalog category.
    pub fn catalog(&self) -> Result<Vec<CategorySummary>> {
        Ok(catalog::showcase(&self.store.items()?))
    }

    // ── Trial reservations ──────────────────────────────────────────────────

    pub fn shift_occupancy(&self, item_id: ItemId, date: NaiveDate, shift: Shift) -> Result<usize> {
        self.store.count_reservations(item_id, date, shift)
    }

    #[tracing::instrument(skip(self, request), fields(date = %request.date, shift = %request.shift), err)]
    pub fn register_reservation(
        &self,
        item_id: ItemId,
        request: &ReservationRequest,
    ) -> Result<Reservation> {
        let item = self.item(item_id)?;
        require(&[
            ("customer_name", request.customer_name.as_str()),
            ("phone", request.phone.as_str()),
            ("date", request.date.as_str()),
            ("shift", request.shift.as_str()),
        ])?;
        let date = parse_iso_date(&request.date)?;
        let shift: Shift = request.shift.parse()?;

        let capacity = self.config.shift_capacity;
        self.shift_locks.with(&(item.id, date, shift), || {
            let taken = self.store.count_reservations(item.id, date, shift)?;
            if taken >= capacity {
                warn!(item_id, %date, %shift, taken, "shift full");
                return Err(BookingError::CapacityExceeded {
                    window: format!("{} shift on {} is full", shift.label(), display_date(date)),
                });
            }
            let reservation = self.store.insert_reservation(
                NewReservation {
                    item_id: item.id,
                    customer_name: request.customer_name.trim().to_string(),
                    phone: request.phone.trim().to_string(),
                    date,
                    shift,
                },
                Utc::now(),
            )?;
            info!(reservation_id = reservation.id, item_id, %date, %shift, "reservation registered");
            Ok(reservation)
        })
    }

    pub fn reservation(&self, id: ReservationId) -> Result<Reservation> {
        self.store
            .reservation(id)?
            .ok_or_else(|| BookingError::not_found("reservation", id))
    }

    #[tracing::instrument(skip(self), err)]
    pub fn confirm_reservation(&self, id: ReservationId) -> Result<Transition<Reservation>> {
        let current = self.reservation(id)?;
        let key = (current.item_id, current.date, current.shift);

        self.shift_locks.with(&key, || {
            // Re-read under the lock so a concurrent cancel is seen.
            let mut reservation = self.reservation(id)?;
            if reservation.cancelled {
                return Err(BookingError::validation(format!(
                    "reservation {id} is cancelled and cannot be confirmed"
                )));
            }
            if reservation.confirmed {
                return Ok(Transition::Unchanged(reservation));
            }
            reservation.confirmed = true;
            self.store.update_reservation(&reservation)?;
            info!(reservation_id = id, "reservation confirmed");
            Ok(Transition::Applied(reservation))
        })
    }

    /// Cancel a reservation and compose the message telling the customer.
    ///
    /// Cancelling twice is a no-op that reports [`CancelOutcome::AlreadyCancelled`].
    #[tracing::instrument(skip(self), err)]
    pub fn cancel_reservation(&self, id: ReservationId) -> Result<CancelOutcome> {
        let current = self.reservation(id)?;
        let item = self.item(current.item_id)?;
        let key = (current.item_id, current.date, current.shift);

        self.shift_locks.with(&key, || {
            // Re-read under the lock so a concurrent cancel is seen.
            let mut reservation = self.reservation(id)?;
            if reservation.cancelled {
                info!(reservation_id = id, "reservation already cancelled");
                return Ok(CancelOutcome::AlreadyCancelled { reservation });
            }
            reservation.cancelled = true;
            self.store.update_reservation(&reservation)?;
            info!(reservation_id = id, "reservation cancelled");

            let notification = self.messenger.reservation_cancelled(
                &reservation.customer_name,
                &reservation.phone,
                &item.name,
                reservation.date,
            );
            Ok(CancelOutcome::Cancelled {
                reservation,
                notification,
            })
        })
    }

    /// Reservations matching `filter`, latest date first.
    pub fn list_reservations(&self, filter: StatusFilter) -> Result<Vec<Reservation>> {
        let mut reservations: Vec<Reservation> = self
            .store
            .reservations()?
            .into_iter()
            .filter(|r| filter.matches(r.confirmed, r.cancelled))
            .collect();
        reservations.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        Ok(reservations)
    }

    /// Dates from today on that can still take a trial for `item_id`.
    pub fn free_dates(&self, item_id: ItemId, horizon_days: Option<u32>) -> Result<Vec<NaiveDate>> {
        self.item(item_id)?;
        let horizon_days = horizon_days.unwrap_or(self.config.reservation_horizon_days);
        let today = self.today();
        let reservations = self.reservations_in_horizon(item_id, today, horizon_days)?;
        let free = trial::free_dates(
            &reservations,
            item_id,
            today,
            horizon_days,
            self.config.shift_capacity,
        );
        debug!(item_id, horizon_days, free = free.len(), "trial dates computed");
        Ok(free)
    }

    /// Occupancy for the requested date plus the free trial dates.
    pub fn reservation_view(&self, query: &AvailabilityQuery) -> Result<ReservationView> {
        let resolved = query.resolve(View::Reservation, self.today(), &self.config)?;
        self.item(resolved.item_id)?;
        let day = self
            .store
            .reservations_between(resolved.item_id, resolved.date, resolved.date)?;
        Ok(ReservationView {
            item_id: resolved.item_id,
            occupancy: trial::day_occupancy(&day, resolved.item_id, resolved.date),
            free_dates: self.free_dates(resolved.item_id, Some(resolved.horizon_days))?,
        })
    }

    fn reservations_in_horizon(
        &self,
        item_id: ItemId,
        start: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<Reservation>> {
        if horizon_days == 0 {
            return Ok(Vec::new());
        }
        let end = offset(start, i64::from(horizon_days) - 1);
        self.store.reservations_between(item_id, start, end)
    }

    // ── Customers ───────────────────────────────────────────────────────────

    pub fn customer(&self, id: CustomerId) -> Result<Customer> {
        self.store
            .customer(id)?
            .ok_or_else(|| BookingError::not_found("customer", id))
    }

    #[tracing::instrument(skip(self, new), fields(name = %new.name), err)]
    pub fn register_customer(&self, new: NewCustomer) -> Result<Customer> {
        let new = normalize_customer(new)?;
        self.customer_lock.with(&(), || {
            if let Some(existing) = self.store.find_customer(&new.tax_id, &new.phone)? {
                warn!(existing_id = existing.id, "duplicate customer rejected");
                return Err(duplicate_field(&existing, &new));
            }
            let customer = self.store.insert_customer(new, Utc::now())?;
            info!(customer_id = customer.id, "customer registered");
            Ok(customer)
        })
    }

    #[tracing::instrument(skip(self, update), err)]
    pub fn edit_customer(&self, id: CustomerId, update: CustomerUpdate) -> Result<Customer> {
        let update = normalize_customer(update)?;
        self.customer_lock.with(&(), || {
            let mut customer = self.customer(id)?;
            let clash = self
                .store
                .customers()?
                .into_iter()
                .find(|c| c.id != id && (c.tax_id == update.tax_id || c.phone == update.phone));
            if let Some(existing) = clash {
                return Err(duplicate_field(&existing, &update));
            }
            customer.name = update.name;
            customer.phone = update.phone;
            customer.tax_id = update.tax_id;
            customer.address = update.address;
            customer.city = update.city;
            self.store.update_customer(&customer)?;
            info!(customer_id = id, "customer updated");
            Ok(customer)
        })
    }

    /// Customers whose name or phone contains `term` (case-insensitive), by name.
    pub fn search_customers(&self, term: &str) -> Result<Vec<Customer>> {
        let needle = term.trim().to_lowercase();
        let mut found: Vec<Customer> = self
            .store
            .customers()?
            .into_iter()
            .filter(|c| {
                needle.is_empty()
                    || c.name.to_lowercase().contains(&needle)
                    || c.phone.to_lowercase().contains(&needle)
            })
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    // ── Orders ──────────────────────────────────────────────────────────────

    pub fn order(&self, id: OrderId) -> Result<Order> {
        self.store
            .order(id)?
            .ok_or_else(|| BookingError::not_found("order", id))
    }

    /// Whether `candidate` falls inside the protected window of another active
    /// order for `item_id`.
    pub fn order_conflict(
        &self,
        item_id: ItemId,
        candidate: NaiveDate,
        excluding: Option<OrderId>,
    ) -> Result<bool> {
        let orders = self.store.orders_for_item(item_id)?;
        Ok(find_order_conflict(
            &orders,
            item_id,
            candidate,
            self.config.order_buffer_days,
            excluding,
        )
        .is_some())
    }

    #[tracing::instrument(skip(self, request), fields(item_id = request.item_id, event_date = %request.event_date), err)]
    pub fn create_order(&self, actor: &str, request: &OrderRequest) -> Result<Order> {
        require(&[("actor", actor), ("event_date", request.event_date.as_str())])?;
        let event_date = parse_iso_date(&request.event_date)?;
        let trial_date = optional_date(request.trial_date.as_deref())?;
        self.customer(request.customer_id)?;
        let item_id = self.item(request.item_id)?.id;

        self.item_locks.with(&item_id, || {
            // Availability is toggled under the same lock.
            let item = self.item(item_id)?;
            if !item.available {
                return Err(BookingError::validation(format!(
                    "item \"{}\" is not available for orders",
                    item.name
                )));
            }
            self.ensure_no_conflict(&item, event_date, None)?;
            let order = self.store.insert_order(
                NewOrder {
                    customer_id: request.customer_id,
                    item_id: item.id,
                    event_date,
                    trial_date,
                    notes: optional_text(request.notes.as_deref()),
                },
                audit(
                    actor,
                    LogAction::Created,
                    format!(
                        "Order created for item {} on {}",
                        item.id,
                        display_date(event_date)
                    ),
                ),
            )?;
            info!(order_id = order.id, item_id = item.id, %event_date, "order created");
            Ok(order)
        })
    }

    /// Apply `edit` to an order, re-checking conflicts against every other order.
    ///
    /// Pickup and return dates are re-derived only when the event date changes.
    #[tracing::instrument(skip(self, edit), err)]
    pub fn edit_order(&self, actor: &str, id: OrderId, edit: &OrderEdit) -> Result<Order> {
        require(&[("actor", actor)])?;
        let current = self.order(id)?;
        if current.cancelled {
            return Err(BookingError::validation(format!(
                "order {id} is cancelled and cannot be edited"
            )));
        }
        let event_date = match edit.event_date.as_deref() {
            Some(raw) => parse_iso_date(raw)?,
            None => current.event_date,
        };
        let trial_date = match edit.trial_date.as_deref() {
            Some(raw) => optional_date(Some(raw))?,
            None => current.trial_date,
        };
        let customer_id = edit.customer_id.unwrap_or(current.customer_id);
        self.customer(customer_id)?;
        let item = self.item(edit.item_id.unwrap_or(current.item_id))?;

        // Moving to another item must hold both items so a concurrent cancel
        // on the old one cannot be overwritten.
        self.item_locks.with_pair(&current.item_id, &item.id, || {
            let mut order = self.order(id)?;
            if order.cancelled {
                return Err(BookingError::validation(format!(
                    "order {id} is cancelled and cannot be edited"
                )));
            }
            if order.item_id != current.item_id {
                return Err(BookingError::validation(format!(
                    "order {id} was moved to another item meanwhile; reload and retry"
                )));
            }
            self.ensure_no_conflict(&item, event_date, Some(id))?;

            let moved = order.event_date != event_date;
            order.customer_id = customer_id;
            order.item_id = item.id;
            order.event_date = event_date;
            order.trial_date = trial_date;
            if let Some(notes) = edit.notes.as_deref() {
                order.notes = optional_text(Some(notes));
            }
            if moved {
                order.rederive_logistics();
            }
            self.store.update_order(
                &order,
                audit(
                    actor,
                    LogAction::Edited,
                    format!(
                        "Order updated: item {} on {}",
                        item.id,
                        display_date(event_date)
                    ),
                ),
            )?;
            info!(order_id = id, moved, "order edited");
            Ok(order)
        })
    }

    #[tracing::instrument(skip(self), err)]
    pub fn confirm_order(&self, actor: &str, id: OrderId) -> Result<Transition<Order>> {
        require(&[("actor", actor)])?;
        let current = self.order(id)?;
        self.item_locks.with(&current.item_id, || {
            let mut order = self.order(id)?;
            if order.cancelled {
                return Err(BookingError::validation(format!(
                    "order {id} is cancelled and cannot be confirmed"
                )));
            }
            if order.confirmed {
                return Ok(Transition::Unchanged(order));
            }
            order.confirmed = true;
            self.store.update_order(
                &order,
                audit(actor, LogAction::Confirmed, "Order confirmed".to_string()),
            )?;
            info!(order_id = id, "order confirmed");
            Ok(Transition::Applied(order))
        })
    }

    /// Cancel an order, releasing its protected dates. Idempotent.
    #[tracing::instrument(skip(self), err)]
    pub fn cancel_order(&self, actor: &str, id: OrderId) -> Result<Transition<Order>> {
        require(&[("actor", actor)])?;
        let current = self.order(id)?;
        self.item_locks.with(&current.item_id, || {
            let mut order = self.order(id)?;
            if order.cancelled {
                return Ok(Transition::Unchanged(order));
            }
            order.cancelled = true;
            self.store.update_order(
                &order,
                audit(actor, LogAction::Cancelled, "Order cancelled".to_string()),
            )?;
            info!(order_id = id, "order cancelled");
            Ok(Transition::Applied(order))
        })
    }

    /// Orders by event date, optionally narrowed to one month (1-12) and status.
    pub fn list_orders(&self, month: Option<u32>, status: Option<StatusFilter>) -> Result<Vec<Order>> {
        if let Some(m) = month {
            if !(1..=12).contains(&m) {
                return Err(BookingError::validation(format!("invalid month: {m}")));
            }
        }
        let mut orders: Vec<Order> = self
            .store
            .orders()?
            .into_iter()
            .filter(|o| month.map_or(true, |m| crate::model::in_month(o.event_date, m)))
            .filter(|o| status.map_or(true, |s| s.matches(o.confirmed, o.cancelled)))
            .collect();
        sort_by_event(&mut orders);
        Ok(orders)
    }

    pub fn orders_for_customer(
        &self,
        customer_id: CustomerId,
        status: Option<StatusFilter>,
    ) -> Result<Vec<Order>> {
        self.customer(customer_id)?;
        let mut orders: Vec<Order> = self
            .store
            .orders()?
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .filter(|o| status.map_or(true, |s| s.matches(o.confirmed, o.cancelled)))
            .collect();
        sort_by_event(&mut orders);
        Ok(orders)
    }

    pub fn order_log(&self, id: OrderId) -> Result<Vec<LogEntry>> {
        self.order(id)?;
        self.store.log_for_order(id)
    }

    /// Event dates of the item's active orders, ascending.
    pub fn unavailable_event_dates(&self, item_id: ItemId) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .store
            .orders_for_item(item_id)?
            .into_iter()
            .filter(Order::is_active)
            .map(|o| o.event_date)
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    /// Blocked and free order dates for `[today, today + horizon)`.
    pub fn blocked_dates_for_item(
        &self,
        item_id: ItemId,
        horizon_days: Option<u32>,
        excluding: Option<OrderId>,
    ) -> Result<BlockedDates> {
        let start = self.today();
        self.blocked_dates_from(item_id, start, horizon_days, excluding)
    }

    /// Free dates that also leave the turnaround buffer before the next event.
    pub fn free_return_dates(
        &self,
        item_id: ItemId,
        horizon_days: Option<u32>,
        excluding: Option<OrderId>,
    ) -> Result<Vec<NaiveDate>> {
        let dates = self.blocked_dates_for_item(item_id, horizon_days, excluding)?;
        self.return_dates_within(item_id, &dates.free, excluding)
    }

    /// Blocked, free, and return dates for the order form.
    pub fn order_view(&self, query: &AvailabilityQuery) -> Result<OrderView> {
        let resolved = query.resolve(View::Order, self.today(), &self.config)?;
        let dates = self.blocked_dates_from(
            resolved.item_id,
            resolved.date,
            Some(resolved.horizon_days),
            resolved.excluding_order_id,
        )?;
        let free_return =
            self.return_dates_within(resolved.item_id, &dates.free, resolved.excluding_order_id)?;
        Ok(OrderView {
            item_id: resolved.item_id,
            blocked: dates.blocked,
            free: dates.free,
            free_return,
        })
    }

    fn blocked_dates_from(
        &self,
        item_id: ItemId,
        start: NaiveDate,
        horizon_days: Option<u32>,
        excluding: Option<OrderId>,
    ) -> Result<BlockedDates> {
        self.item(item_id)?;
        let horizon_days = horizon_days.unwrap_or(self.config.order_horizon_days);
        let orders = self.store.orders_for_item(item_id)?;
        let dates = self.strategy.compute(
            &orders,
            OrderScope { item_id, excluding },
            start,
            horizon_days,
            self.config.order_buffer_days,
        );
        debug!(
            item_id,
            horizon_days,
            blocked = dates.blocked.len(),
            "order dates computed"
        );
        Ok(dates)
    }

    fn return_dates_within(
        &self,
        item_id: ItemId,
        free: &[NaiveDate],
        excluding: Option<OrderId>,
    ) -> Result<Vec<NaiveDate>> {
        let scope = OrderScope { item_id, excluding };
        let orders = self.store.orders_for_item(item_id)?;
        Ok(blocked::free_return_dates(
            free,
            orders.iter().filter(|o| scope.qualifies(o)),
            self.config.return_buffer_days,
        ))
    }

    fn ensure_no_conflict(
        &self,
        item: &Item,
        event_date: NaiveDate,
        excluding: Option<OrderId>,
    ) -> Result<()> {
        let orders = self.store.orders_for_item(item.id)?;
        let buffer = self.config.order_buffer_days;
        if let Some(existing) = find_order_conflict(&orders, item.id, event_date, buffer, excluding) {
            warn!(
                item_id = item.id,
                %event_date,
                conflicting_order = existing.id,
                "order window taken"
            );
            return Err(BookingError::CapacityExceeded {
                window: format!(
                    "item \"{}\" is unavailable from {}",
                    item.name,
                    protected_window(event_date, buffer)
                ),
            });
        }
        Ok(())
    }
}

fn audit(actor: &str, action: LogAction, detail: String) -> OrderLog {
    OrderLog {
        actor: actor.trim().to_string(),
        action,
        detail,
        at: Utc::now(),
    }
}

/// Reject the first field that is empty after trimming.
fn require(fields: &[(&str, &str)]) -> Result<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(BookingError::validation(format!("{name} is required"))),
        None => Ok(()),
    }
}

fn optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => parse_iso_date(value).map(Some),
        _ => Ok(None),
    }
}

fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn normalize_item(new: NewItem) -> Result<NewItem> {
    require(&[
        ("name", new.name.as_str()),
        ("model", new.model.as_str()),
        ("kind", new.kind.as_str()),
        ("category", new.category.as_str()),
    ])?;
    Ok(NewItem {
        name: new.name.trim().to_string(),
        model: new.model.trim().to_string(),
        kind: new.kind.trim().to_string(),
        category: catalog::category(&new.category)?.to_string(),
        description: optional_text(new.description.as_deref()),
        available: new.available,
    })
}

fn normalize_customer(new: NewCustomer) -> Result<NewCustomer> {
    require(&[
        ("name", new.name.as_str()),
        ("phone", new.phone.as_str()),
        ("tax_id", new.tax_id.as_str()),
        ("city", new.city.as_str()),
    ])?;
    Ok(NewCustomer {
        name: new.name.trim().to_string(),
        phone: new.phone.trim().to_string(),
        tax_id: new.tax_id.trim().to_string(),
        address: optional_text(new.address.as_deref()),
        city: new.city.trim().to_string(),
    })
}

fn duplicate_field(existing: &Customer, new: &NewCustomer) -> BookingError {
    let field = if existing.tax_id == new.tax_id {
        "tax ID"
    } else {
        "phone"
    };
    BookingError::DuplicateCustomer { field }
}

fn sort_by_event(orders: &mut [Order]) {
    orders.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));
}


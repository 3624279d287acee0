//! Persistent-store boundary and an in-memory implementation.
//!
//! [`Store`] is the narrow set of queries the booking service needs. Records
//! are never deleted: reservations and orders change state by flag only.
//! Every order write carries its audit entry, and the two land together or
//! not at all.
//! [`MemoryStore`] keeps everything behind one mutex and can be saved to and
//! loaded from a JSON snapshot.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::model::{
    Customer, CustomerId, Item, ItemId, LogEntry, NewCustomer, NewItem, NewOrder, NewReservation,
    Order, OrderId, OrderLog, Reservation, ReservationId,
};
use crate::shift::Shift;

pub trait Store: Send + Sync {
    fn item(&self, id: ItemId) -> Result<Option<Item>>;
    fn items(&self) -> Result<Vec<Item>>;
    fn insert_item(&self, new: NewItem, now: DateTime<Utc>) -> Result<Item>;
    fn update_item(&self, item: &Item) -> Result<()>;

    /// Non-cancelled reservations for the (item, date, shift) triple.
    fn count_reservations(&self, item_id: ItemId, date: NaiveDate, shift: Shift) -> Result<usize>;
    /// Every reservation for `item_id` dated within `[from, to]`.
    fn reservations_between(
        &self,
        item_id: ItemId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>>;
    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>>;
    fn reservations(&self) -> Result<Vec<Reservation>>;
    fn insert_reservation(&self, new: NewReservation, now: DateTime<Utc>) -> Result<Reservation>;
    fn update_reservation(&self, reservation: &Reservation) -> Result<()>;

    fn order(&self, id: OrderId) -> Result<Option<Order>>;
    fn orders(&self) -> Result<Vec<Order>>;
    fn orders_for_item(&self, item_id: ItemId) -> Result<Vec<Order>>;
    /// Insert an order and its `log` entry in one write.
    fn insert_order(&self, new: NewOrder, log: OrderLog) -> Result<Order>;
    /// Replace an order and append its `log` entry in one write.
    fn update_order(&self, order: &Order, log: OrderLog) -> Result<()>;

    fn customer(&self, id: CustomerId) -> Result<Option<Customer>>;
    fn customers(&self) -> Result<Vec<Customer>>;
    /// First customer whose tax ID or phone matches either argument.
    fn find_customer(&self, tax_id: &str, phone: &str) -> Result<Option<Customer>>;
    fn insert_customer(&self, new: NewCustomer, now: DateTime<Utc>) -> Result<Customer>;
    fn update_customer(&self, customer: &Customer) -> Result<()>;

    fn log_for_order(&self, order_id: OrderId) -> Result<Vec<LogEntry>>;
}

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub items: BTreeMap<ItemId, Item>,
    pub reservations: BTreeMap<ReservationId, Reservation>,
    pub orders: BTreeMap<OrderId, Order>,
    pub customers: BTreeMap<CustomerId, Customer>,
    pub log: Vec<LogEntry>,
}

fn next_id<T>(table: &BTreeMap<u64, T>) -> u64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            tables: Mutex::new(snapshot),
        }
    }

    /// Load a JSON snapshot, or start empty when `path` does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_snapshot(serde_json::from_str(&raw)?))
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.lock()?.clone())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.lock()?)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>> {
        self.tables
            .lock()
            .map_err(|_| BookingError::Store("store lock poisoned".to_string()))
    }
}

fn replace<T>(table: &mut BTreeMap<u64, T>, kind: &'static str, id: u64, value: T) -> Result<()> {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(BookingError::not_found(kind, id)),
    }
}

impl Store for MemoryStore {
    fn item(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.lock()?.items.get(&id).cloned())
    }

    fn items(&self) -> Result<Vec<Item>> {
        Ok(self.lock()?.items.values().cloned().collect())
    }

    fn insert_item(&self, new: NewItem, now: DateTime<Utc>) -> Result<Item> {
        let mut tables = self.lock()?;
        let item = Item {
            id: next_id(&tables.items),
            name: new.name,
            model: new.model,
            kind: new.kind,
            category: new.category,
            description: new.description,
            available: new.available,
            created_at: now,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    fn update_item(&self, item: &Item) -> Result<()> {
        replace(&mut self.lock()?.items, "item", item.id, item.clone())
    }

    fn count_reservations(&self, item_id: ItemId, date: NaiveDate, shift: Shift) -> Result<usize> {
        Ok(self
            .lock()?
            .reservations
            .values()
            .filter(|r| r.occupies(item_id, date, shift))
            .count())
    }

    fn reservations_between(
        &self,
        item_id: ItemId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>> {
        Ok(self
            .lock()?
            .reservations
            .values()
            .filter(|r| r.item_id == item_id && from <= r.date && r.date <= to)
            .cloned()
            .collect())
    }

    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.lock()?.reservations.get(&id).cloned())
    }

    fn reservations(&self) -> Result<Vec<Reservation>> {
        Ok(self.lock()?.reservations.values().cloned().collect())
    }

    fn insert_reservation(&self, new: NewReservation, now: DateTime<Utc>) -> Result<Reservation> {
        let mut tables = self.lock()?;
        let reservation = Reservation {
            id: next_id(&tables.reservations),
            item_id: new.item_id,
            customer_name: new.customer_name,
            phone: new.phone,
            date: new.date,
            shift: new.shift,
            confirmed: false,
            cancelled: false,
            created_at: now,
        };
        tables.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    fn update_reservation(&self, reservation: &Reservation) -> Result<()> {
        replace(
            &mut self.lock()?.reservations,
            "reservation",
            reservation.id,
            reservation.clone(),
        )
    }

    fn order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.lock()?.orders.get(&id).cloned())
    }

    fn orders(&self) -> Result<Vec<Order>> {
        Ok(self.lock()?.orders.values().cloned().collect())
    }

    fn orders_for_item(&self, item_id: ItemId) -> Result<Vec<Order>> {
        Ok(self
            .lock()?
            .orders
            .values()
            .filter(|o| o.item_id == item_id)
            .cloned()
            .collect())
    }

    fn insert_order(&self, new: NewOrder, log: OrderLog) -> Result<Order> {
        let mut tables = self.lock()?;
        let mut order = Order {
            id: next_id(&tables.orders),
            customer_id: new.customer_id,
            item_id: new.item_id,
            event_date: new.event_date,
            trial_date: new.trial_date,
            pickup_date: new.event_date,
            return_date: new.event_date,
            notes: new.notes,
            confirmed: false,
            cancelled: false,
            created_at: log.at,
        };
        order.rederive_logistics();
        tables.log.push(log.entry(order.id));
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    fn update_order(&self, order: &Order, log: OrderLog) -> Result<()> {
        let mut tables = self.lock()?;
        replace(&mut tables.orders, "order", order.id, order.clone())?;
        tables.log.push(log.entry(order.id));
        Ok(())
    }

    fn customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.lock()?.customers.get(&id).cloned())
    }

    fn customers(&self) -> Result<Vec<Customer>> {
        Ok(self.lock()?.customers.values().cloned().collect())
    }

    fn find_customer(&self, tax_id: &str, phone: &str) -> Result<Option<Customer>> {
        Ok(self
            .lock()?
            .customers
            .values()
            .find(|c| c.tax_id == tax_id || c.phone == phone)
            .cloned())
    }

    fn insert_customer(&self, new: NewCustomer, now: DateTime<Utc>) -> Result<Customer> {
        let mut tables = self.lock()?;
        let customer = Customer {
            id: next_id(&tables.customers),
            name: new.name,
            phone: new.phone,
            tax_id: new.tax_id,
            address: new.address,
            city: new.city,
            created_at: now,
        };
        tables.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    fn update_customer(&self, customer: &Customer) -> Result<()> {
        replace(
            &mut self.lock()?.customers,
            "customer",
            customer.id,
            customer.clone(),
        )
    }

    fn log_for_order(&self, order_id: OrderId) -> Result<Vec<LogEntry>> {
        Ok(self
            .lock()?
            .log
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }
}

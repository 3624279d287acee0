//! `atelier` CLI: the shop's booking desk from the command line.
//!
//! All state lives in a JSON snapshot file (`--store`, default `atelier.json`).
//! Every command prints its result as pretty JSON on stdout.
//!
//! ## Usage
//!
//! ```sh
//! # Register an item and a customer
//! atelier item add --name "Sereia" --model vestido --kind aluguel --category noiva
//! atelier item list --kind aluguel --available true
//! atelier customer add --name Bia --phone "(11) 98765-4321" --tax-id 123 --city Campinas
//!
//! # Trial reservations
//! atelier free-dates --item 1
//! atelier reserve --item 1 --name Bia --phone "(11) 98765-4321" --date 2024-06-10 --shift morning
//! atelier cancel-reservation 1
//!
//! # Rental orders
//! atelier order create --customer 1 --item 1 --event-date 2024-06-10
//! atelier order check --item 1 --date 2024-06-12
//! atelier blocked-dates --item 1 --horizon 30
//! atelier return-dates --item 1 --excluding-order 1
//! ```

use anyhow::{Context, Result};
use atelier_engine::{
    parse_iso_date, AvailabilityQuery, BookingService, CancelOutcome, FixedClock, ItemFilter,
    MemoryStore, NewCustomer, NewItem, OrderEdit, OrderRequest, PolicyConfig, ReservationRequest,
    StatusFilter,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "atelier",
    version,
    about = "Booking desk for a formal-wear rental shop"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON snapshot holding all shop records (created on first write)
    #[arg(long, global = true, default_value = "atelier.json")]
    store: String,

    /// JSON policy configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override today's date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<String>,

    /// Staff member recorded in the order audit log
    #[arg(long, global = true, default_value = "staff")]
    actor: String,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage catalog items
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Manage customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Shift occupancy for one date plus the free trial dates
    Occupancy {
        #[arg(long)]
        item: u64,
        /// Date to inspect (defaults to today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        horizon: Option<u32>,
    },
    /// Dates that can still take a trial reservation
    FreeDates {
        #[arg(long)]
        item: u64,
        #[arg(long)]
        horizon: Option<u32>,
    },
    /// Register a trial reservation
    Reserve {
        #[arg(long)]
        item: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        date: String,
        /// morning or afternoon (manhã/tarde also accepted)
        #[arg(long)]
        shift: String,
    },
    /// Mark a trial reservation as confirmed
    ConfirmReservation { id: u64 },
    /// Cancel a trial reservation and print the customer notification
    CancelReservation { id: u64 },
    /// List trial reservations
    Reservations {
        #[arg(long, value_enum, default_value = "pending")]
        status: StatusArg,
    },
    /// Manage rental orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Blocked, free, and return dates for the order form
    BlockedDates {
        #[arg(long)]
        item: u64,
        /// First date of the horizon (defaults to today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        horizon: Option<u32>,
        /// Order being edited, which must not block its own dates
        #[arg(long)]
        excluding_order: Option<u64>,
    },
    /// Dates acceptable as a return date
    ReturnDates {
        #[arg(long)]
        item: u64,
        #[arg(long)]
        horizon: Option<u32>,
        #[arg(long)]
        excluding_order: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ItemAction {
    /// Add an item to the catalog
    Add {
        #[arg(long)]
        name: String,
        /// Dress or suit
        #[arg(long)]
        model: String,
        /// Rental or sale
        #[arg(long)]
        kind: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: Option<String>,
        /// Add the item flagged as unavailable
        #[arg(long)]
        unavailable: bool,
    },
    /// Replace an item's details
    Edit {
        id: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        kind: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: Option<String>,
        /// Flag the item as unavailable
        #[arg(long)]
        unavailable: bool,
    },
    /// Set the manual availability flag
    Available {
        id: u64,
        #[arg(action = clap::ArgAction::Set)]
        available: bool,
    },
    /// List items by name
    List {
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Only items whose availability flag matches
        #[arg(long)]
        available: Option<bool>,
    },
    /// Item count and cover item per category
    Catalog,
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Register a new customer
    Add {
        #[command(flatten)]
        fields: CustomerFields,
    },
    /// Replace a customer's details
    Edit {
        id: u64,
        #[command(flatten)]
        fields: CustomerFields,
    },
    /// Search by name or phone
    Search {
        #[arg(default_value = "")]
        term: String,
    },
    /// Orders placed by a customer
    Orders {
        id: u64,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
}

#[derive(clap::Args)]
struct CustomerFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    /// CPF or CNPJ
    #[arg(long)]
    tax_id: String,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    city: String,
}

impl From<CustomerFields> for NewCustomer {
    fn from(f: CustomerFields) -> Self {
        NewCustomer {
            name: f.name,
            phone: f.phone,
            tax_id: f.tax_id,
            address: f.address,
            city: f.city,
        }
    }
}

#[derive(Subcommand)]
enum OrderAction {
    /// Create a rental order
    Create {
        #[arg(long)]
        customer: u64,
        #[arg(long)]
        item: u64,
        #[arg(long)]
        event_date: String,
        #[arg(long)]
        trial_date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Edit an order (empty --trial-date/--notes clear the field)
    Edit {
        id: u64,
        #[arg(long)]
        customer: Option<u64>,
        #[arg(long)]
        item: Option<u64>,
        #[arg(long)]
        event_date: Option<String>,
        #[arg(long)]
        trial_date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Confirm an order
    Confirm { id: u64 },
    /// Cancel an order, releasing its dates
    Cancel { id: u64 },
    /// Check whether a date conflicts with existing orders
    Check {
        #[arg(long)]
        item: u64,
        #[arg(long)]
        date: String,
        #[arg(long)]
        excluding_order: Option<u64>,
    },
    /// List orders by event date
    List {
        /// Month number (1-12)
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Show an order's audit log
    Log { id: u64 },
    /// Event dates already taken for an item
    Taken {
        #[arg(long)]
        item: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Confirmed,
    Cancelled,
    Active,
}

impl From<StatusArg> for StatusFilter {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Pending => StatusFilter::Pending,
            StatusArg::Confirmed => StatusFilter::Confirmed,
            StatusArg::Cancelled => StatusFilter::Cancelled,
            StatusArg::Active => StatusFilter::Active,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.config.as_deref() {
        Some(path) => PolicyConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => PolicyConfig::default(),
    };
    let store = MemoryStore::open(&cli.store)
        .with_context(|| format!("Failed to open store: {}", cli.store))?;
    let mut service = BookingService::new(store, config).context("Invalid configuration")?;
    if let Some(raw) = cli.today.as_deref() {
        let today = parse_iso_date(raw).context("Invalid --today")?;
        service = service.with_clock(FixedClock(today));
    }

    let (output, changed) = run(&service, &cli.actor, cli.command)?;

    if changed {
        service
            .store()
            .save(&cli.store)
            .with_context(|| format!("Failed to write store: {}", cli.store))?;
        tracing::debug!(store = %cli.store, "store saved");
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second initialization (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute one command, returning its JSON output and whether the store changed.
fn run(
    service: &BookingService<MemoryStore>,
    actor: &str,
    command: Commands,
) -> Result<(Value, bool)> {
    let result = match command {
        Commands::Item { action } => match action {
            ItemAction::Add {
                name,
                model,
                kind,
                category,
                description,
                unavailable,
            } => {
                let item = service.add_item(NewItem {
                    name,
                    model,
                    kind,
                    category,
                    description,
                    available: !unavailable,
                })?;
                (serde_json::to_value(item)?, true)
            }
            ItemAction::Edit {
                id,
                name,
                model,
                kind,
                category,
                description,
                unavailable,
            } => {
                let item = service
                    .edit_item(
                        id,
                        NewItem {
                            name,
                            model,
                            kind,
                            category,
                            description,
                            available: !unavailable,
                        },
                    )
                    .context("Failed to edit item")?;
                (serde_json::to_value(item)?, true)
            }
            ItemAction::Available { id, available } => {
                (serde_json::to_value(service.set_item_available(id, available)?)?, true)
            }
            ItemAction::List {
                kind,
                model,
                category,
                available,
            } => {
                let filter = ItemFilter {
                    kind,
                    model,
                    available,
                    category,
                };
                (serde_json::to_value(service.list_items(&filter)?)?, false)
            }
            ItemAction::Catalog => (serde_json::to_value(service.catalog()?)?, false),
        },
        Commands::Customer { action } => match action {
            CustomerAction::Add { fields } => {
                let customer = service
                    .register_customer(fields.into())
                    .context("Failed to register customer")?;
                (serde_json::to_value(customer)?, true)
            }
            CustomerAction::Edit { id, fields } => {
                let customer = service
                    .edit_customer(id, fields.into())
                    .context("Failed to edit customer")?;
                (serde_json::to_value(customer)?, true)
            }
            CustomerAction::Search { term } => {
                (serde_json::to_value(service.search_customers(&term)?)?, false)
            }
            CustomerAction::Orders { id, status } => {
                let orders = service.orders_for_customer(id, status.map(Into::into))?;
                (serde_json::to_value(orders)?, false)
            }
        },
        Commands::Occupancy {
            item,
            date,
            horizon,
        } => {
            let query = AvailabilityQuery {
                date,
                horizon_days: horizon,
                ..AvailabilityQuery::new(item)
            };
            (serde_json::to_value(service.reservation_view(&query)?)?, false)
        }
        Commands::FreeDates { item, horizon } => {
            (serde_json::to_value(service.free_dates(item, horizon)?)?, false)
        }
        Commands::Reserve {
            item,
            name,
            phone,
            date,
            shift,
        } => {
            let request = ReservationRequest {
                customer_name: name,
                phone,
                date,
                shift,
            };
            let reservation = service
                .register_reservation(item, &request)
                .context("Reservation rejected")?;
            (serde_json::to_value(reservation)?, true)
        }
        Commands::ConfirmReservation { id } => {
            let transition = service.confirm_reservation(id)?;
            let changed = transition.is_applied();
            (serde_json::to_value(transition)?, changed)
        }
        Commands::CancelReservation { id } => {
            let outcome = service.cancel_reservation(id)?;
            let changed = matches!(outcome, CancelOutcome::Cancelled { .. });
            (serde_json::to_value(outcome)?, changed)
        }
        Commands::Reservations { status } => {
            (serde_json::to_value(service.list_reservations(status.into())?)?, false)
        }
        Commands::Order { action } => run_order(service, actor, action)?,
        Commands::BlockedDates {
            item,
            date,
            horizon,
            excluding_order,
        } => {
            let query = AvailabilityQuery {
                item_id: item,
                date,
                excluding_order_id: excluding_order,
                horizon_days: horizon,
            };
            (serde_json::to_value(service.order_view(&query)?)?, false)
        }
        Commands::ReturnDates {
            item,
            horizon,
            excluding_order,
        } => {
            let dates = service.free_return_dates(item, horizon, excluding_order)?;
            (serde_json::to_value(dates)?, false)
        }
    };
    Ok(result)
}

fn run_order(
    service: &BookingService<MemoryStore>,
    actor: &str,
    action: OrderAction,
) -> Result<(Value, bool)> {
    let result = match action {
        OrderAction::Create {
            customer,
            item,
            event_date,
            trial_date,
            notes,
        } => {
            let request = OrderRequest {
                customer_id: customer,
                item_id: item,
                event_date,
                trial_date,
                notes,
            };
            let order = service
                .create_order(actor, &request)
                .context("Order rejected")?;
            (serde_json::to_value(order)?, true)
        }
        OrderAction::Edit {
            id,
            customer,
            item,
            event_date,
            trial_date,
            notes,
        } => {
            let edit = OrderEdit {
                customer_id: customer,
                item_id: item,
                event_date,
                trial_date,
                notes,
            };
            let order = service
                .edit_order(actor, id, &edit)
                .context("Order edit rejected")?;
            (serde_json::to_value(order)?, true)
        }
        OrderAction::Confirm { id } => {
            let transition = service.confirm_order(actor, id)?;
            let changed = transition.is_applied();
            (serde_json::to_value(transition)?, changed)
        }
        OrderAction::Cancel { id } => {
            let transition = service.cancel_order(actor, id)?;
            let changed = transition.is_applied();
            (serde_json::to_value(transition)?, changed)
        }
        OrderAction::Check {
            item,
            date,
            excluding_order,
        } => {
            let candidate = parse_iso_date(&date)?;
            let conflict = service.order_conflict(item, candidate, excluding_order)?;
            (json!({ "item_id": item, "date": candidate, "conflict": conflict }), false)
        }
        OrderAction::List { month, status } => {
            let orders = service.list_orders(month, status.map(Into::into))?;
            (serde_json::to_value(orders)?, false)
        }
        OrderAction::Log { id } => (serde_json::to_value(service.order_log(id)?)?, false),
        OrderAction::Taken { item } => {
            (serde_json::to_value(service.unavailable_event_dates(item)?)?, false)
        }
    };
    Ok(result)
}

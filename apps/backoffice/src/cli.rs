//! Command line definitions.
//!
//! ```text
//! grocerdesk [--config FILE] [--db FILE] [--compact] <COMMAND>
//!
//!   status                       database health and migrations
//!   category  list|create|rename|delete|stats
//!   product   list|get|create|update|delete|search
//!   inventory overview|low-stock|alerts|adjust|bulk
//!   customer  list|get|create|update|delete|search|sales
//!   staff     list|get|create|update|delete|passwd|login
//!   sale      checkout|refund|show
//!   report    summary|daily|hourly|top|analytics|sales|recent|movements
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use grocer_core::{LineRequest, Money, StaffRole};

#[derive(Parser, Debug)]
#[command(name = "grocerdesk", about = "GrocerDesk grocery back-office", version)]
pub struct Cli {
    /// Config file (default: grocerdesk.toml in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overrides config and GROCER_DB_PATH
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Database health and applied migrations
    Status,

    /// Product categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Product catalog
    #[command(subcommand)]
    Product(ProductCommand),

    /// Stock levels and adjustments
    #[command(subcommand)]
    Inventory(InventoryCommand),

    /// Customer directory
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Staff accounts
    #[command(subcommand)]
    Staff(StaffCommand),

    /// Checkout, refund and sale lookup
    #[command(subcommand)]
    Sale(SaleCommand),

    /// Sales reports
    #[command(subcommand)]
    Report(ReportCommand),
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// List categories by name
    List,
    /// Create a category
    Create { name: String },
    /// Rename a category
    Rename { id: String, name: String },
    /// Delete a category with no products
    Delete { id: String },
    /// Product count and stock value per category
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// List products with their category names
    List,
    /// Show one product
    Get { id: String },
    /// Create a product
    Create(ProductCreateArgs),
    /// Change some fields of a product
    Update(ProductUpdateArgs),
    /// Delete a product that was never sold
    Delete { id: String },
    /// Search by name substring
    Search {
        query: String,
        #[arg(long, help = "Only products in this category")]
        category: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ProductCreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, value_parser = parse_money, help = "Unit price, e.g. 3.49")]
    pub price: Money,

    #[arg(long, help = "Initial stock (default 0)")]
    pub stock: Option<i64>,

    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProductUpdateArgs {
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_parser = parse_money)]
    pub price: Option<Money>,

    #[arg(long)]
    pub stock: Option<i64>,

    #[arg(long, conflicts_with = "clear_category")]
    pub category: Option<String>,

    #[arg(long, help = "Detach the product from its category")]
    pub clear_category: bool,
}

#[derive(Subcommand, Debug)]
pub enum InventoryCommand {
    /// Stock totals and inventory value
    Overview(ThresholdArgs),
    /// Products at or below the threshold
    LowStock(ThresholdArgs),
    /// Low and out-of-stock products
    Alerts(ThresholdArgs),
    /// Add, subtract or set stock of one product
    Adjust {
        id: String,
        #[arg(long, default_value = "set", help = "add, subtract or set")]
        op: String,
        #[arg(long)]
        quantity: i64,
    },
    /// Apply a JSON array of {product_id, quantity, operation} atomically
    Bulk {
        #[arg(help = "JSON file, or - for stdin")]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ThresholdArgs {
    #[arg(long, help = "Low-stock threshold (default from config)")]
    pub threshold: Option<i64>,
}

// =============================================================================
// People
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum CustomerCommand {
    List,
    Get { id: String },
    Create(CustomerCreateArgs),
    Update(CustomerUpdateArgs),
    /// Delete a customer; their sales become walk-in sales
    Delete { id: String },
    /// Search name, email and phone
    Search { query: String },
    /// Sales of one customer, newest first
    Sales { id: String },
}

#[derive(Args, Debug)]
pub struct CustomerCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Args, Debug)]
pub struct CustomerUpdateArgs {
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, conflicts_with = "clear_email")]
    pub email: Option<String>,
    #[arg(long)]
    pub clear_email: bool,

    #[arg(long, conflicts_with = "clear_phone")]
    pub phone: Option<String>,
    #[arg(long)]
    pub clear_phone: bool,

    #[arg(long, conflicts_with = "clear_address")]
    pub address: Option<String>,
    #[arg(long)]
    pub clear_address: bool,
}

#[derive(Subcommand, Debug)]
pub enum StaffCommand {
    List,
    Get { id: String },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_parser = parse_role, help = "admin, manager or cashier (default cashier)")]
        role: Option<StaffRole>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_parser = parse_role)]
        role: Option<StaffRole>,
    },
    Delete { id: String },
    /// Change a password; the current one must match
    Passwd {
        id: String,
        #[arg(long)]
        current: String,
        #[arg(long = "new")]
        new_password: String,
    },
    /// Check an email and password pair
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

// =============================================================================
// Sales and Reports
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum SaleCommand {
    /// Sell one or more lines atomically
    Checkout {
        #[arg(long, help = "Customer id; omit for a walk-in sale")]
        customer: Option<String>,
        #[arg(long = "line", required = true, value_parser = parse_line, help = "PRODUCT_ID:QTY, repeatable")]
        lines: Vec<LineRequest>,
    },
    /// Reverse a sale and restore its stock
    Refund { id: String },
    /// Sale with customer name and priced lines
    Show { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Count, revenue and average sale
    Summary(WindowArgs),
    /// Revenue per calendar day
    Daily(WindowArgs),
    /// Revenue per hour of day
    Hourly(WindowArgs),
    /// Best sellers by quantity
    Top {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value_t = grocer_core::report::DEFAULT_TOP_PRODUCTS)]
        limit: u32,
    },
    /// Summary, daily, hourly and top products in one view
    Analytics(WindowArgs),
    /// Paginated sale listing, newest first
    Sales {
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Latest sales
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Stock leaving through sales, newest first
    Movements {
        #[command(flatten)]
        page: PageArgs,
    },
}

/// Either a trailing number of days or an inclusive date range.
#[derive(Args, Debug, Default)]
pub struct WindowArgs {
    #[arg(long, conflicts_with_all = ["from", "to"], help = "Trailing days (default from config)")]
    pub days: Option<u32>,

    #[arg(long, requires = "to", value_parser = parse_date, help = "First day, YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    #[arg(long, requires = "from", value_parser = parse_date, help = "Last day, YYYY-MM-DD")]
    pub to: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, help = "Rows per page (default from config)")]
    pub page_size: Option<u32>,
}

// =============================================================================
// Value Parsers
// =============================================================================

fn parse_money(s: &str) -> Result<Money, String> {
    Money::parse_decimal(s).map_err(|e| e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

fn parse_role(s: &str) -> Result<StaffRole, String> {
    s.parse::<StaffRole>().map_err(|e| e.to_string())
}

/// `PRODUCT_ID:QTY`. Quantity bounds are checked by the engine.
fn parse_line(s: &str) -> Result<LineRequest, String> {
    let (product_id, quantity) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("Invalid line '{}', expected PRODUCT_ID:QTY", s))?;

    if product_id.is_empty() {
        return Err(format!("Invalid line '{}', missing product id", s));
    }

    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("Invalid quantity in '{}'", s))?;

    Ok(LineRequest::new(product_id, quantity))
}

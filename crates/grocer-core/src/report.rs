//! # Report Model
//!
//! Time windows, result rows and pagination math for the sales reports.
//!
//! ## Windows
//! ```text
//! TrailingDays(30)          [now - 30d, ∞)
//! DateRange(from, to)       [from 00:00, to + 1d 00:00)   both days inclusive
//! ```
//!
//! All bucketing (day, hour) is in UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

/// Default trailing window of the analytics view.
pub const DEFAULT_REPORT_DAYS: u32 = 30;

/// Longest trailing window accepted.
pub const MAX_REPORT_DAYS: u32 = 3650;

/// Default number of products in the top-N report.
pub const DEFAULT_TOP_PRODUCTS: u32 = 10;

/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Report Window
// =============================================================================

/// The period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum ReportWindow {
    /// The last `days` days up to now.
    TrailingDays { days: u32 },
    /// Calendar days `from..=to`.
    DateRange {
        #[ts(as = "String")]
        from: NaiveDate,
        #[ts(as = "String")]
        to: NaiveDate,
    },
}

impl Default for ReportWindow {
    fn default() -> Self {
        ReportWindow::TrailingDays {
            days: DEFAULT_REPORT_DAYS,
        }
    }
}

impl ReportWindow {
    pub fn trailing_days(days: u32) -> Self {
        ReportWindow::TrailingDays { days }
    }

    pub fn date_range(from: NaiveDate, to: NaiveDate) -> Self {
        ReportWindow::DateRange { from, to }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        match *self {
            ReportWindow::TrailingDays { days } => {
                if days == 0 || days > MAX_REPORT_DAYS {
                    return Err(ValidationError::OutOfRange {
                        field: "days".to_string(),
                        min: 1,
                        max: MAX_REPORT_DAYS as i64,
                    });
                }
            }
            ReportWindow::DateRange { from, to } => {
                if from > to {
                    return Err(ValidationError::InvalidFormat {
                        field: "date_range".to_string(),
                        reason: format!("start {} is after end {}", from, to),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns `[start, end)` as instants. `end` is `None` for an open window.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        match *self {
            ReportWindow::TrailingDays { days } => (now - Duration::days(days as i64), None),
            ReportWindow::DateRange { from, to } => (
                start_of_day(from),
                Some(start_of_day(to + Duration::days(1))),
            ),
        }
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Report Rows
// =============================================================================

/// Count, revenue and average sale within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub sales_count: i64,
    pub revenue: Money,
    pub average_sale: Money,
}

impl SalesSummary {
    pub fn from_totals(sales_count: i64, revenue: Money) -> Self {
        SalesSummary {
            sales_count,
            revenue,
            average_sale: Money::average(revenue, sales_count),
        }
    }
}

/// One calendar day of sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sales_count: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "revenue_cents"))]
    pub revenue: Money,
}

/// One hour-of-day bucket (0-23, UTC) across every day of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct HourlySales {
    pub hour: i64,
    pub sales_count: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "revenue_cents"))]
    pub revenue: Money,
}

/// A product ranked by units sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub total_sold: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "revenue_cents"))]
    pub total_revenue: Money,
}

/// The full analytics view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesAnalytics {
    pub window: ReportWindow,
    pub summary: SalesSummary,
    pub daily_sales: Vec<DailySales>,
    pub top_products: Vec<TopProduct>,
    pub hourly_sales: Vec<HourlySales>,
}

/// A sale in a listing, with customer display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleListing {
    pub sale_id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
    pub item_count: i64,
}

/// A line item seen as a stock movement out of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    pub movement_id: String,
    /// Always `"sale"`; refunds delete their movements.
    pub movement_type: String,
    pub product_id: String,
    pub product_name: String,
    pub category_name: Option<String>,
    pub quantity: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "unit_price_cents"))]
    pub price: Money,
    #[ts(as = "String")]
    pub movement_date: DateTime<Utc>,
    pub sale_id: String,
}

// =============================================================================
// Pagination
// =============================================================================

/// Inclusive calendar-day filter of the sale listing. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl SaleFilter {
    pub fn validate(&self) -> ValidationResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            ReportWindow::date_range(from, to).validate()?;
        }
        Ok(())
    }

    /// `[start, end)` instants, each side optional.
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.from.map(start_of_day),
            self.to.map(|to| start_of_day(to + Duration::days(1))),
        )
    }
}

/// Page position plus totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    /// Checks a requested page before any query runs.
    pub fn validate_request(page: u32, page_size: u32) -> ValidationResult<()> {
        if page == 0 {
            return Err(ValidationError::MustBePositive {
                field: "page".to_string(),
            });
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::OutOfRange {
                field: "page_size".to_string(),
                min: 1,
                max: MAX_PAGE_SIZE as i64,
            });
        }
        Ok(())
    }

    pub fn new(page: u32, page_size: u32, total: i64) -> Self {
        let size = i64::from(page_size.max(1));
        Pagination {
            page,
            page_size,
            total,
            pages: (total + size - 1) / size,
        }
    }

    /// Row offset of a 1-based page.
    pub fn offset(page: u32, page_size: u32) -> i64 {
        i64::from(page.saturating_sub(1)) * i64::from(page_size)
    }
}

/// One page of the sale listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalePage {
    pub sales: Vec<SaleListing>,
    pub pagination: Pagination,
}

// =============================================================================
// Unit Tests
// =============================================================================

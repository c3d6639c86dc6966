//! # Sales Reporting Aggregator
//!
//! Read-only queries over the ledger. Every query runs as a single
//! statement; there are no partial results.
//!
//! ## Windows
//! ```text
//! ReportWindow::bounds(now) → [start, end)
//!
//!   WHERE julianday(s.created_at) >= julianday(:start)
//!     AND (:end IS NULL OR julianday(s.created_at) < julianday(:end))
//! ```
//!
//! Timestamps are compared through `julianday()` because the stored RFC 3339
//! text does not have a fixed number of fractional digits.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use grocer_core::report::{DEFAULT_TOP_PRODUCTS, MAX_PAGE_SIZE};
use grocer_core::{
    CoreError, CoreResult, DailySales, HourlySales, InventoryMovement, Money, Pagination, ReportWindow,
    SaleFilter, SaleListing, SalePage, SalesAnalytics, SalesSummary, TopProduct, ValidationError,
};

const WINDOW_FILTER: &str = r#"
    julianday(s.created_at) >= julianday(?1)
    AND (?2 IS NULL OR julianday(s.created_at) < julianday(?2))
"#;

const OPEN_FILTER: &str = r#"
    (?1 IS NULL OR julianday(s.created_at) >= julianday(?1))
    AND (?2 IS NULL OR julianday(s.created_at) < julianday(?2))
"#;

const LISTING_SELECT: &str = r#"
    SELECT
        s.id AS sale_id,
        s.customer_id,
        c.name AS customer_name,
        c.email AS customer_email,
        s.created_at,
        s.total_cents,
        (SELECT COUNT(*) FROM sale_items si WHERE si.sale_id = s.id) AS item_count
    FROM sales s
    LEFT JOIN customers c ON c.id = s.customer_id
"#;

type Bounds = (DateTime<Utc>, Option<DateTime<Utc>>);

/// Sales analytics and listings.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Count, revenue and average sale.
    pub async fn summary(&self, window: ReportWindow) -> CoreResult<SalesSummary> {
        let bounds = window_bounds(&window)?;
        self.summary_within(bounds).await
    }

    /// One row per day that has sales, oldest first.
    pub async fn daily(&self, window: ReportWindow) -> CoreResult<Vec<DailySales>> {
        let bounds = window_bounds(&window)?;
        self.daily_within(bounds).await
    }

    /// Best sellers by units sold. Ties go to the name, then the id.
    pub async fn top_products(&self, window: ReportWindow, limit: u32) -> CoreResult<Vec<TopProduct>> {
        check_limit("limit", limit)?;
        let bounds = window_bounds(&window)?;
        self.top_products_within(bounds, limit).await
    }

    /// One row per UTC hour of day that has sales.
    pub async fn hourly(&self, window: ReportWindow) -> CoreResult<Vec<HourlySales>> {
        let bounds = window_bounds(&window)?;
        self.hourly_within(bounds).await
    }

    /// Summary, daily, top products and hourly for one window, all measured
    /// from the same instant.
    pub async fn analytics(&self, window: ReportWindow) -> CoreResult<SalesAnalytics> {
        let bounds = window_bounds(&window)?;

        let summary = self.summary_within(bounds).await?;
        let daily_sales = self.daily_within(bounds).await?;
        let top_products = self.top_products_within(bounds, DEFAULT_TOP_PRODUCTS).await?;
        let hourly_sales = self.hourly_within(bounds).await?;

        debug!(?window, sales = summary.sales_count, "Analytics computed");
        Ok(SalesAnalytics {
            window,
            summary,
            daily_sales,
            top_products,
            hourly_sales,
        })
    }

    /// Newest sales first, optionally limited to a date range.
    pub async fn list_sales(&self, filter: SaleFilter, page: u32, page_size: u32) -> CoreResult<SalePage> {
        filter.validate()?;
        Pagination::validate_request(page, page_size)?;
        let (start, end) = filter.bounds();

        let count_sql = format!("SELECT COUNT(*) FROM sales s WHERE {}", OPEN_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await
            .map_err(retrieval_failed)?;

        let sql = format!(
            "{} WHERE {} ORDER BY julianday(s.created_at) DESC, s.id LIMIT ?3 OFFSET ?4",
            LISTING_SELECT, OPEN_FILTER
        );
        let sales = sqlx::query_as::<_, SaleListing>(&sql)
            .bind(start)
            .bind(end)
            .bind(i64::from(page_size))
            .bind(Pagination::offset(page, page_size))
            .fetch_all(&self.pool)
            .await
            .map_err(retrieval_failed)?;

        debug!(page, page_size, total, "Sale page listed");
        Ok(SalePage {
            sales,
            pagination: Pagination::new(page, page_size, total),
        })
    }

    /// The latest `limit` sales.
    pub async fn recent_sales(&self, limit: u32) -> CoreResult<Vec<SaleListing>> {
        check_limit("limit", limit)?;

        let sql = format!(
            "{} ORDER BY julianday(s.created_at) DESC, s.id LIMIT ?1",
            LISTING_SELECT
        );
        sqlx::query_as::<_, SaleListing>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(retrieval_failed)
    }

    /// Sold line items as outgoing stock movements, newest first.
    pub async fn inventory_movements(&self, page: u32, page_size: u32) -> CoreResult<Vec<InventoryMovement>> {
        Pagination::validate_request(page, page_size)?;

        sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT
                si.id AS movement_id,
                'sale' AS movement_type,
                si.product_id,
                p.name AS product_name,
                c.name AS category_name,
                si.quantity,
                si.unit_price_cents,
                s.created_at AS movement_date,
                s.id AS sale_id
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY julianday(s.created_at) DESC, s.id, si.line_no
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(i64::from(page_size))
        .bind(Pagination::offset(page, page_size))
        .fetch_all(&self.pool)
        .await
        .map_err(retrieval_failed)
    }

    // =========================================================================
    // Window queries
    // =========================================================================

    async fn summary_within(&self, (start, end): Bounds) -> CoreResult<SalesSummary> {
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(s.total_cents), 0) FROM sales s WHERE {}",
            WINDOW_FILTER
        );
        let (count, revenue): (i64, i64) = sqlx::query_as(&sql)
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await
            .map_err(retrieval_failed)?;

        Ok(SalesSummary::from_totals(count, Money::from_cents(revenue)))
    }

    async fn daily_within(&self, (start, end): Bounds) -> CoreResult<Vec<DailySales>> {
        let sql = format!(
            r#"
            SELECT
                date(s.created_at) AS date,
                COUNT(*) AS sales_count,
                SUM(s.total_cents) AS revenue_cents
            FROM sales s
            WHERE {}
            GROUP BY date(s.created_at)
            ORDER BY date(s.created_at)
            "#,
            WINDOW_FILTER
        );
        sqlx::query_as::<_, DailySales>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(retrieval_failed)
    }

    async fn top_products_within(&self, (start, end): Bounds, limit: u32) -> CoreResult<Vec<TopProduct>> {
        let sql = format!(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS name,
                SUM(si.quantity) AS total_sold,
                SUM(si.subtotal_cents) AS revenue_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE {}
            GROUP BY p.id, p.name
            ORDER BY total_sold DESC, p.name ASC, p.id ASC
            LIMIT ?3
            "#,
            WINDOW_FILTER
        );
        sqlx::query_as::<_, TopProduct>(&sql)
            .bind(start)
            .bind(end)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(retrieval_failed)
    }

    async fn hourly_within(&self, (start, end): Bounds) -> CoreResult<Vec<HourlySales>> {
        let sql = format!(
            r#"
            SELECT
                CAST(strftime('%H', s.created_at) AS INTEGER) AS hour,
                COUNT(*) AS sales_count,
                SUM(s.total_cents) AS revenue_cents
            FROM sales s
            WHERE {}
            GROUP BY hour
            ORDER BY hour
            "#,
            WINDOW_FILTER
        );
        sqlx::query_as::<_, HourlySales>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(retrieval_failed)
    }
}

fn window_bounds(window: &ReportWindow) -> CoreResult<Bounds> {
    window.validate()?;
    Ok(window.bounds(Utc::now()))
}

fn check_limit(field: &str, limit: u32) -> CoreResult<()> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        }
        .into());
    }
    Ok(())
}

fn retrieval_failed(err: sqlx::Error) -> CoreError {
    CoreError::Persistence(format!("report query failed: {}", err))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_customer, add_product, test_db};
    use crate::Database;
    use chrono::{Duration, NaiveDate, TimeZone};
    use grocer_core::{CheckoutRequest, ErrorKind, LineRequest};

    async fn sell(db: &Database, lines: Vec<LineRequest>) -> String {
        db.engine()
            .checkout(CheckoutRequest::walk_in(lines))
            .await
            .unwrap()
            .sale_id
    }

    async fn backdate(db: &Database, sale_id: &str, at: DateTime<Utc>) {
        sqlx::query("UPDATE sales SET created_at = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(at)
            .execute(db.pool())
            .await
            .unwrap();
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_summary_empty_and_filled() {
        let db = test_db().await;
        let reports = db.reports();

        let empty = reports.summary(ReportWindow::default()).await.unwrap();
        assert_eq!(empty, SalesSummary::default());

        let p = add_product(&db, "Pears", 200, 50).await;
        sell(&db, vec![LineRequest::new(&p.id, 1)]).await;
        sell(&db, vec![LineRequest::new(&p.id, 2)]).await;

        let summary = reports.summary(ReportWindow::trailing_days(1)).await.unwrap();
        assert_eq!(summary.sales_count, 2);
        assert_eq!(summary.revenue.cents(), 600);
        assert_eq!(summary.average_sale.cents(), 300);
    }

    #[tokio::test]
    async fn test_windows_exclude_old_sales() {
        let db = test_db().await;
        let p = add_product(&db, "Pears", 200, 50).await;
        let old = sell(&db, vec![LineRequest::new(&p.id, 1)]).await;
        sell(&db, vec![LineRequest::new(&p.id, 1)]).await;
        backdate(&db, &old, Utc::now() - Duration::days(40)).await;

        let recent = db.reports().summary(ReportWindow::trailing_days(30)).await.unwrap();
        assert_eq!(recent.sales_count, 1);

        let all = db.reports().summary(ReportWindow::trailing_days(365)).await.unwrap();
        assert_eq!(all.sales_count, 2);
    }

    #[tokio::test]
    async fn test_daily_and_hourly_buckets() {
        let db = test_db().await;
        let p = add_product(&db, "Pears", 200, 50).await;

        let a = sell(&db, vec![LineRequest::new(&p.id, 1)]).await;
        let b = sell(&db, vec![LineRequest::new(&p.id, 2)]).await;
        let c = sell(&db, vec![LineRequest::new(&p.id, 3)]).await;
        backdate(&db, &a, Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap()).await;
        backdate(&db, &b, Utc.with_ymd_and_hms(2024, 3, 1, 17, 5, 0).unwrap()).await;
        backdate(&db, &c, Utc.with_ymd_and_hms(2024, 3, 3, 9, 45, 0).unwrap()).await;

        let window = ReportWindow::date_range(day(2024, 3, 1), day(2024, 3, 3));

        let daily = db.reports().daily(window).await.unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, day(2024, 3, 1));
        assert_eq!(daily[0].sales_count, 2);
        assert_eq!(daily[0].revenue.cents(), 600);
        assert_eq!(daily[1].date, day(2024, 3, 3));

        let hourly = db.reports().hourly(window).await.unwrap();
        let hours: Vec<(i64, i64)> = hourly.iter().map(|h| (h.hour, h.sales_count)).collect();
        assert_eq!(hours, vec![(9, 2), (17, 1)]);

        // The end day is inclusive, the day after is not.
        let first_day = ReportWindow::date_range(day(2024, 3, 1), day(2024, 3, 1));
        assert_eq!(db.reports().summary(first_day).await.unwrap().sales_count, 2);
    }

    #[tokio::test]
    async fn test_top_products_order_and_ties() {
        let db = test_db().await;
        let apples = add_product(&db, "Apples", 100, 50).await;
        let bread = add_product(&db, "Bread", 300, 50).await;
        let cheese = add_product(&db, "Cheese", 500, 50).await;

        sell(&db, vec![LineRequest::new(&cheese.id, 5)]).await;
        sell(&db, vec![LineRequest::new(&bread.id, 2), LineRequest::new(&apples.id, 1)]).await;
        sell(&db, vec![LineRequest::new(&apples.id, 1)]).await;

        let top = db.reports().top_products(ReportWindow::default(), 10).await.unwrap();
        let names: Vec<&str> = top.iter().map(|t| t.name.as_str()).collect();
        // Apples and Bread tie on 2 units; name decides.
        assert_eq!(names, vec!["Cheese", "Apples", "Bread"]);
        assert_eq!(top[0].total_revenue.cents(), 2500);

        let top1 = db.reports().top_products(ReportWindow::default(), 1).await.unwrap();
        assert_eq!(top1.len(), 1);

        let err = db.reports().top_products(ReportWindow::default(), 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }

    #[tokio::test]
    async fn test_analytics_bundle() {
        let db = test_db().await;
        let p = add_product(&db, "Pears", 250, 50).await;
        sell(&db, vec![LineRequest::new(&p.id, 4)]).await;

        let analytics = db.reports().analytics(ReportWindow::trailing_days(7)).await.unwrap();
        assert_eq!(analytics.summary.sales_count, 1);
        assert_eq!(analytics.daily_sales.len(), 1);
        assert_eq!(analytics.top_products[0].total_sold, 4);
        assert_eq!(analytics.hourly_sales.len(), 1);

        let err = db.reports().analytics(ReportWindow::trailing_days(0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }

    #[tokio::test]
    async fn test_list_sales_pages_and_filters() {
        let db = test_db().await;
        let ana = add_customer(&db, "Ana").await;
        let p = add_product(&db, "Pears", 100, 50).await;

        let mut ids = Vec::new();
        for i in 0..5u32 {
            let receipt = db
                .engine()
                .checkout(CheckoutRequest::for_customer(&ana.id, vec![LineRequest::new(&p.id, 1)]))
                .await
                .unwrap();
            backdate(&db, &receipt.sale_id, Utc.with_ymd_and_hms(2024, 5, 1 + i, 12, 0, 0).unwrap()).await;
            ids.push(receipt.sale_id);
        }

        let page = db.reports().list_sales(SaleFilter::default(), 1, 2).await.unwrap();
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.pages, 3);
        assert_eq!(page.sales.len(), 2);
        // Newest first
        assert_eq!(page.sales[0].sale_id, ids[4]);
        assert_eq!(page.sales[0].customer_name.as_deref(), Some("Ana"));
        assert_eq!(page.sales[0].item_count, 1);

        let last = db.reports().list_sales(SaleFilter::default(), 3, 2).await.unwrap();
        assert_eq!(last.sales.len(), 1);
        assert_eq!(last.sales[0].sale_id, ids[0]);

        let filter = SaleFilter {
            from: Some(day(2024, 5, 2)),
            to: Some(day(2024, 5, 3)),
        };
        let filtered = db.reports().list_sales(filter, 1, 10).await.unwrap();
        assert_eq!(filtered.pagination.total, 2);
        assert_eq!(filtered.pagination.pages, 1);

        let bad = SaleFilter {
            from: Some(day(2024, 5, 3)),
            to: Some(day(2024, 5, 2)),
        };
        assert!(db.reports().list_sales(bad, 1, 10).await.is_err());
        assert!(db.reports().list_sales(SaleFilter::default(), 0, 10).await.is_err());
    }

    #[tokio::test]
    async fn test_recent_sales_and_movements() {
        let db = test_db().await;
        let dairy = db.categories().create("Dairy").await.unwrap();
        let milk = db
            .products()
            .create(grocer_core::NewProduct {
                name: "Milk".to_string(),
                price: Money::from_cents(129),
                stock: Some(10),
                category_id: Some(dairy.id.clone()),
            })
            .await
            .unwrap();
        let eggs = add_product(&db, "Eggs", 300, 10).await;

        let sale_id = sell(&db, vec![LineRequest::new(&milk.id, 2), LineRequest::new(&eggs.id, 1)]).await;

        let recent = db.reports().recent_sales(5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].item_count, 2);
        assert_eq!(recent[0].customer_name, None);

        let moves = db.reports().inventory_movements(1, 10).await.unwrap();
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].product_name, "Milk");
        assert_eq!(moves[0].category_name.as_deref(), Some("Dairy"));
        assert_eq!(moves[0].movement_type, "sale");
        assert_eq!(moves[1].category_name, None);
        assert!(moves.iter().all(|m| m.sale_id == sale_id));

        db.engine().refund(&sale_id).await.unwrap();
        assert!(db.reports().inventory_movements(1, 10).await.unwrap().is_empty());
    }
}

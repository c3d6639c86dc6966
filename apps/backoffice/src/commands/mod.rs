//! Command handlers.
//!
//! Each handler runs one operation against the [`Database`] and returns its
//! result as a JSON value; `main` does the printing.

mod catalog;
mod people;
mod sales;

use serde::Serialize;
use serde_json::{json, Value};

use grocer_core::ReportWindow;
use grocer_db::migrations::migration_status;
use grocer_db::Database;

use crate::cli::{Commands, PageArgs, WindowArgs};
use crate::config::BackofficeConfig;
use crate::error::AppResult;

/// What every handler needs: the open database and the loaded config.
pub struct Context {
    pub db: Database,
    pub config: BackofficeConfig,
}

impl Context {
    pub fn new(db: Database, config: BackofficeConfig) -> Self {
        Context { db, config }
    }

    fn threshold(&self, arg: Option<i64>) -> i64 {
        arg.unwrap_or(self.config.inventory.low_stock_threshold)
    }

    fn window(&self, args: &WindowArgs) -> ReportWindow {
        match (args.days, args.from, args.to) {
            (_, Some(from), Some(to)) => ReportWindow::date_range(from, to),
            (Some(days), _, _) => ReportWindow::trailing_days(days),
            _ => ReportWindow::trailing_days(self.config.reports.default_days),
        }
    }

    fn page(&self, args: &PageArgs) -> (u32, u32) {
        (args.page, args.page_size.unwrap_or(self.config.reports.page_size))
    }
}

pub async fn execute(ctx: &Context, command: Commands) -> AppResult<Value> {
    match command {
        Commands::Status => status(ctx).await,
        Commands::Category(cmd) => catalog::category(ctx, cmd).await,
        Commands::Product(cmd) => catalog::product(ctx, cmd).await,
        Commands::Inventory(cmd) => catalog::inventory(ctx, cmd).await,
        Commands::Customer(cmd) => people::customer(ctx, cmd).await,
        Commands::Staff(cmd) => people::staff(ctx, cmd).await,
        Commands::Sale(cmd) => sales::sale(ctx, cmd).await,
        Commands::Report(cmd) => sales::report(ctx, cmd).await,
    }
}

async fn status(ctx: &Context) -> AppResult<Value> {
    let healthy = ctx.db.health_check().await;
    let (embedded, applied) = migration_status(ctx.db.pool()).await?;
    let sales = ctx.db.sales().count().await?;

    Ok(json!({
        "healthy": healthy,
        "database": ctx.config.database_path(),
        "migrations": { "embedded": embedded, "applied": applied },
        "sales": sales,
    }))
}

fn to_json<T: Serialize>(value: T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn deleted(id: &str) -> Value {
    json!({ "deleted": id })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use grocer_db::DbConfig;

    pub async fn context() -> Context {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Context::new(db, BackofficeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_status() {
        let ctx = testing::context().await;
        let value = execute(&ctx, Commands::Status).await.unwrap();

        assert_eq!(value["healthy"], true);
        assert_eq!(value["migrations"]["embedded"], value["migrations"]["applied"]);
        assert_eq!(value["sales"], 0);
    }

    #[tokio::test]
    async fn test_window_resolution() {
        let mut ctx = testing::context().await;
        ctx.config.reports.default_days = 7;

        assert_eq!(ctx.window(&WindowArgs::default()), ReportWindow::trailing_days(7));

        let days = WindowArgs { days: Some(3), ..Default::default() };
        assert_eq!(ctx.window(&days), ReportWindow::trailing_days(3));

        let from = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let range = WindowArgs { days: None, from: Some(from), to: Some(to) };
        assert_eq!(ctx.window(&range), ReportWindow::date_range(from, to));
    }

    #[tokio::test]
    async fn test_defaults_from_config() {
        let mut ctx = testing::context().await;
        ctx.config.inventory.low_stock_threshold = 4;
        ctx.config.reports.page_size = 15;

        assert_eq!(ctx.threshold(None), 4);
        assert_eq!(ctx.threshold(Some(0)), 0);
        assert_eq!(ctx.page(&PageArgs { page: 2, page_size: None }), (2, 15));
    }
}

//! Sale engine and reports.

use serde_json::Value;

use grocer_core::{CheckoutRequest, SaleFilter};

use super::{to_json, Context};
use crate::cli::{ReportCommand, SaleCommand};
use crate::error::AppResult;

pub async fn sale(ctx: &Context, cmd: SaleCommand) -> AppResult<Value> {
    let engine = ctx.db.engine();

    match cmd {
        SaleCommand::Checkout { customer, lines } => {
            let request = match customer {
                Some(customer_id) => CheckoutRequest::for_customer(customer_id, lines),
                None => CheckoutRequest::walk_in(lines),
            };
            to_json(engine.checkout(request).await?)
        }
        SaleCommand::Refund { id } => to_json(engine.refund(&id).await?),
        SaleCommand::Show { id } => to_json(engine.get_sale(&id).await?),
    }
}

pub async fn report(ctx: &Context, cmd: ReportCommand) -> AppResult<Value> {
    let reports = ctx.db.reports();

    match cmd {
        ReportCommand::Summary(window) => to_json(reports.summary(ctx.window(&window)).await?),
        ReportCommand::Daily(window) => to_json(reports.daily(ctx.window(&window)).await?),
        ReportCommand::Hourly(window) => to_json(reports.hourly(ctx.window(&window)).await?),
        ReportCommand::Top { window, limit } => {
            to_json(reports.top_products(ctx.window(&window), limit).await?)
        }
        ReportCommand::Analytics(window) => to_json(reports.analytics(ctx.window(&window)).await?),
        ReportCommand::Sales { from, to, page } => {
            let (page, page_size) = ctx.page(&page);
            to_json(reports.list_sales(SaleFilter { from, to }, page, page_size).await?)
        }
        ReportCommand::Recent { limit } => to_json(reports.recent_sales(limit).await?),
        ReportCommand::Movements { page } => {
            let (page, page_size) = ctx.page(&page);
            to_json(reports.inventory_movements(page, page_size).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{PageArgs, WindowArgs};
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use grocer_core::{LineRequest, Money, NewProduct};

    async fn stocked(ctx: &Context, name: &str, cents: i64, stock: i64) -> String {
        ctx.db
            .products()
            .create(NewProduct {
                name: name.to_string(),
                price: Money::from_cents(cents),
                stock: Some(stock),
                category_id: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn stock_of(ctx: &Context, id: &str) -> i64 {
        ctx.db.products().get(id).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_checkout_show_refund() {
        let ctx = testing::context().await;
        let milk = stocked(&ctx, "Whole Milk", 429, 10).await;
        let eggs = stocked(&ctx, "Eggs 12ct", 389, 4).await;

        let receipt = sale(
            &ctx,
            SaleCommand::Checkout {
                customer: None,
                lines: vec![LineRequest::new(&milk, 2), LineRequest::new(&eggs, 1)],
            },
        )
        .await
        .unwrap();
        assert_eq!(receipt["total"], 2 * 429 + 389);
        let sale_id = receipt["sale_id"].as_str().unwrap().to_string();

        let shown = sale(&ctx, SaleCommand::Show { id: sale_id.clone() }).await.unwrap();
        assert_eq!(shown["items"].as_array().unwrap().len(), 2);
        assert_eq!(stock_of(&ctx, &milk).await, 8);

        let refund = sale(&ctx, SaleCommand::Refund { id: sale_id.clone() }).await.unwrap();
        assert_eq!(refund["units_restored"], 3);
        assert_eq!(stock_of(&ctx, &milk).await, 10);
        assert_eq!(stock_of(&ctx, &eggs).await, 4);

        let err = sale(&ctx, SaleCommand::Show { id: sale_id }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReferenceNotFound);
    }

    #[tokio::test]
    async fn test_checkout_insufficient_stock() {
        let ctx = testing::context().await;
        let oil = stocked(&ctx, "Olive Oil", 899, 1).await;

        let err = sale(
            &ctx,
            SaleCommand::Checkout {
                customer: None,
                lines: vec![LineRequest::new(&oil, 2)],
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.exit_code(), 2);
        assert_eq!(stock_of(&ctx, &oil).await, 1);
    }

    #[tokio::test]
    async fn test_reports_after_sales() {
        let ctx = testing::context().await;
        let rice = stocked(&ctx, "Rice", 279, 50).await;

        for qty in [1, 2, 3] {
            sale(
                &ctx,
                SaleCommand::Checkout {
                    customer: None,
                    lines: vec![LineRequest::new(&rice, qty)],
                },
            )
            .await
            .unwrap();
        }

        let summary = report(&ctx, ReportCommand::Summary(WindowArgs::default())).await.unwrap();
        assert_eq!(summary["sales_count"], 3);
        assert_eq!(summary["revenue"], 6 * 279);

        let page = report(
            &ctx,
            ReportCommand::Sales {
                from: None,
                to: None,
                page: PageArgs { page: 1, page_size: Some(2) },
            },
        )
        .await
        .unwrap();
        assert_eq!(page["sales"].as_array().unwrap().len(), 2);
        assert_eq!(page["pagination"]["total"], 3);

        let top = report(&ctx, ReportCommand::Top { window: WindowArgs::default(), limit: 5 })
            .await
            .unwrap();
        assert_eq!(top[0]["total_sold"], 6);

        let moves = report(&ctx, ReportCommand::Movements { page: PageArgs { page: 1, page_size: None } })
            .await
            .unwrap();
        assert_eq!(moves.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_report_rejects_bad_limit() {
        let ctx = testing::context().await;
        let err = report(&ctx, ReportCommand::Recent { limit: 0 }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailure);
    }
}

//! Categories, products and stock.

use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use grocer_core::{BulkStockEntry, FieldUpdate, NewProduct, ProductUpdate, StockOperation};

use super::{deleted, to_json, Context};
use crate::cli::{CategoryCommand, InventoryCommand, ProductCommand, ProductUpdateArgs};
use crate::error::{AppError, AppResult};

pub async fn category(ctx: &Context, cmd: CategoryCommand) -> AppResult<Value> {
    let categories = ctx.db.categories();

    match cmd {
        CategoryCommand::List => to_json(categories.list().await?),
        CategoryCommand::Create { name } => to_json(categories.create(&name).await?),
        CategoryCommand::Rename { id, name } => to_json(categories.rename(&id, &name).await?),
        CategoryCommand::Delete { id } => {
            categories.delete(&id).await?;
            Ok(deleted(&id))
        }
        CategoryCommand::Stats => to_json(categories.stats().await?),
    }
}

pub async fn product(ctx: &Context, cmd: ProductCommand) -> AppResult<Value> {
    let products = ctx.db.products();

    match cmd {
        ProductCommand::List => to_json(products.list().await?),
        ProductCommand::Get { id } => to_json(products.get(&id).await?),
        ProductCommand::Create(args) => {
            let product = products
                .create(NewProduct {
                    name: args.name,
                    price: args.price,
                    stock: args.stock,
                    category_id: args.category,
                })
                .await?;
            to_json(product)
        }
        ProductCommand::Update(args) => {
            let id = args.id.clone();
            to_json(products.update(&id, product_update(args)).await?)
        }
        ProductCommand::Delete { id } => {
            products.delete(&id).await?;
            Ok(deleted(&id))
        }
        ProductCommand::Search { query, category } => {
            to_json(products.search(&query, category.as_deref()).await?)
        }
    }
}

fn product_update(args: ProductUpdateArgs) -> ProductUpdate {
    ProductUpdate {
        name: FieldUpdate::from_flags(args.name, false),
        price: FieldUpdate::from_flags(args.price, false),
        stock: FieldUpdate::from_flags(args.stock, false),
        category_id: FieldUpdate::from_flags(args.category, args.clear_category),
    }
}

pub async fn inventory(ctx: &Context, cmd: InventoryCommand) -> AppResult<Value> {
    let products = ctx.db.products();

    match cmd {
        InventoryCommand::Overview(args) => to_json(products.overview(ctx.threshold(args.threshold)).await?),
        InventoryCommand::LowStock(args) => to_json(products.low_stock(ctx.threshold(args.threshold)).await?),
        InventoryCommand::Alerts(args) => to_json(products.alerts(ctx.threshold(args.threshold)).await?),
        InventoryCommand::Adjust { id, op, quantity } => {
            let operation = StockOperation::parse(&op, quantity)?;
            to_json(products.adjust_stock(&id, operation).await?)
        }
        InventoryCommand::Bulk { file } => {
            let entries = read_bulk_entries(&file)?;
            info!(entries = entries.len(), "Applying bulk stock update");
            to_json(products.bulk_adjust(&entries).await?)
        }
    }
}

/// Reads a JSON array of stock entries from a file, or stdin for `-`.
fn read_bulk_entries(path: &Path) -> AppResult<Vec<BulkStockEntry>> {
    let contents = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| AppError::invalid_input(format!("Cannot read {}: {}", path.display(), e)))?
    };

    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ProductCreateArgs, ThresholdArgs};
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use grocer_core::Money;
    use std::io::Write;

    async fn create_product(ctx: &Context, name: &str, cents: i64, stock: i64) -> String {
        let value = product(
            ctx,
            ProductCommand::Create(ProductCreateArgs {
                name: name.to_string(),
                price: Money::from_cents(cents),
                stock: Some(stock),
                category: None,
            }),
        )
        .await
        .unwrap();
        value["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let ctx = testing::context().await;

        let created = category(&ctx, CategoryCommand::Create { name: "Dairy".into() })
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let renamed = category(&ctx, CategoryCommand::Rename { id: id.clone(), name: "Chilled".into() })
            .await
            .unwrap();
        assert_eq!(renamed["name"], "Chilled");

        let err = category(&ctx, CategoryCommand::Create { name: "Chilled".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);

        let value = category(&ctx, CategoryCommand::Delete { id: id.clone() }).await.unwrap();
        assert_eq!(value["deleted"], id.as_str());

        let list = category(&ctx, CategoryCommand::List).await.unwrap();
        assert_eq!(list.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_product_update_and_clear_category() {
        let ctx = testing::context().await;
        let cat = category(&ctx, CategoryCommand::Create { name: "Bakery".into() })
            .await
            .unwrap();
        let cat_id = cat["id"].as_str().unwrap().to_string();
        let id = create_product(&ctx, "Bagels", 399, 5).await;

        let updated = product(
            &ctx,
            ProductCommand::Update(ProductUpdateArgs {
                id: id.clone(),
                name: None,
                price: Some(Money::from_cents(449)),
                stock: None,
                category: Some(cat_id.clone()),
                clear_category: false,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated["price"], 449);
        assert_eq!(updated["category_id"], cat_id.as_str());
        assert_eq!(updated["stock"], 5);

        let cleared = product(
            &ctx,
            ProductCommand::Update(ProductUpdateArgs {
                id: id.clone(),
                name: None,
                price: None,
                stock: None,
                category: None,
                clear_category: true,
            }),
        )
        .await
        .unwrap();
        assert!(cleared["category_id"].is_null());
        assert_eq!(cleared["price"], 449);
    }

    #[tokio::test]
    async fn test_missing_product_is_reference_not_found() {
        let ctx = testing::context().await;
        let err = product(&ctx, ProductCommand::Get { id: "nope".into() }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReferenceNotFound);
    }

    #[tokio::test]
    async fn test_adjust_and_low_stock() {
        let ctx = testing::context().await;
        let id = create_product(&ctx, "Avocado", 125, 12).await;

        let adjusted = inventory(
            &ctx,
            InventoryCommand::Adjust { id: id.clone(), op: "subtract".into(), quantity: 4 },
        )
        .await
        .unwrap();
        assert_eq!(adjusted["old_stock"], 12);
        assert_eq!(adjusted["new_stock"], 8);

        let low = inventory(&ctx, InventoryCommand::LowStock(ThresholdArgs { threshold: None }))
            .await
            .unwrap();
        assert_eq!(low.as_array().unwrap().len(), 1);

        let err = inventory(
            &ctx,
            InventoryCommand::Adjust { id, op: "multiply".into(), quantity: 2 },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailure);
    }

    #[tokio::test]
    async fn test_bulk_from_file() {
        let ctx = testing::context().await;
        let a = create_product(&ctx, "Rice 2lb", 279, 10).await;
        let b = create_product(&ctx, "Spaghetti", 169, 10).await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"product_id":"{}","quantity":5,"operation":"add"}},{{"product_id":"{}","quantity":2}}]"#,
            a, b
        )
        .unwrap();

        let value = inventory(&ctx, InventoryCommand::Bulk { file: file.path().to_path_buf() })
            .await
            .unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["new_stock"], 15);
        assert_eq!(rows[1]["new_stock"], 2);
    }

    #[tokio::test]
    async fn test_bulk_rejects_malformed_file() {
        let ctx = testing::context().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = inventory(&ctx, InventoryCommand::Bulk { file: file.path().to_path_buf() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}

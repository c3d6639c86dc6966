//! Customers and staff.

use serde_json::{json, Value};

use grocer_core::{CustomerUpdate, FieldUpdate, NewCustomer, NewStaff, StaffUpdate};

use super::{deleted, to_json, Context};
use crate::cli::{CustomerCommand, CustomerUpdateArgs, StaffCommand};
use crate::error::AppResult;

pub async fn customer(ctx: &Context, cmd: CustomerCommand) -> AppResult<Value> {
    let customers = ctx.db.customers();

    match cmd {
        CustomerCommand::List => to_json(customers.list().await?),
        CustomerCommand::Get { id } => to_json(customers.get(&id).await?),
        CustomerCommand::Create(args) => {
            let customer = customers
                .create(NewCustomer {
                    name: args.name,
                    email: args.email,
                    phone: args.phone,
                    address: args.address,
                })
                .await?;
            to_json(customer)
        }
        CustomerCommand::Update(args) => {
            let id = args.id.clone();
            to_json(customers.update(&id, customer_update(args)).await?)
        }
        CustomerCommand::Delete { id } => {
            customers.delete(&id).await?;
            Ok(deleted(&id))
        }
        CustomerCommand::Search { query } => to_json(customers.search(&query).await?),
        CustomerCommand::Sales { id } => {
            // Distinguish an unknown customer from one with no sales.
            customers.get(&id).await?;
            to_json(ctx.db.sales().for_customer(&id).await?)
        }
    }
}

fn customer_update(args: CustomerUpdateArgs) -> CustomerUpdate {
    CustomerUpdate {
        name: FieldUpdate::from_flags(args.name, false),
        email: FieldUpdate::from_flags(args.email, args.clear_email),
        phone: FieldUpdate::from_flags(args.phone, args.clear_phone),
        address: FieldUpdate::from_flags(args.address, args.clear_address),
    }
}

pub async fn staff(ctx: &Context, cmd: StaffCommand) -> AppResult<Value> {
    let staff = ctx.db.staff();

    match cmd {
        StaffCommand::List => to_json(staff.list().await?),
        StaffCommand::Get { id } => to_json(staff.get(&id).await?),
        StaffCommand::Create {
            name,
            email,
            password,
            role,
        } => to_json(
            staff
                .create(NewStaff {
                    name,
                    email,
                    password,
                    role,
                })
                .await?,
        ),
        StaffCommand::Update {
            id,
            name,
            email,
            role,
        } => {
            let update = StaffUpdate {
                name: FieldUpdate::from_flags(name, false),
                email: FieldUpdate::from_flags(email, false),
                role: FieldUpdate::from_flags(role, false),
            };
            to_json(staff.update(&id, update).await?)
        }
        StaffCommand::Delete { id } => {
            staff.delete(&id).await?;
            Ok(deleted(&id))
        }
        StaffCommand::Passwd {
            id,
            current,
            new_password,
        } => {
            staff.change_password(&id, &current, &new_password).await?;
            Ok(json!({ "id": id, "password_changed": true }))
        }
        StaffCommand::Login { email, password } => {
            to_json(staff.verify_credentials(&email, &password).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CustomerCreateArgs;
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use grocer_core::StaffRole;

    #[tokio::test]
    async fn test_customer_clear_contact_fields() {
        let ctx = testing::context().await;
        let created = customer(
            &ctx,
            CustomerCommand::Create(CustomerCreateArgs {
                name: "Maria Lopez".into(),
                email: Some("maria@example.com".into()),
                phone: Some("555-201-3344".into()),
                address: None,
            }),
        )
        .await
        .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let updated = customer(
            &ctx,
            CustomerCommand::Update(CustomerUpdateArgs {
                id: id.clone(),
                name: None,
                email: None,
                clear_email: true,
                phone: None,
                clear_phone: false,
                address: Some("12 Elm St".into()),
                clear_address: false,
            }),
        )
        .await
        .unwrap();

        assert!(updated["email"].is_null());
        assert_eq!(updated["phone"], "555-201-3344");
        assert_eq!(updated["address"], "12 Elm St");
    }

    #[tokio::test]
    async fn test_customer_sales_for_unknown_customer() {
        let ctx = testing::context().await;
        let err = customer(&ctx, CustomerCommand::Sales { id: "ghost".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ReferenceNotFound);
    }

    #[tokio::test]
    async fn test_staff_login_and_passwd() {
        let ctx = testing::context().await;
        let created = staff(
            &ctx,
            StaffCommand::Create {
                name: "Floor Manager".into(),
                email: "manager@example.com".into(),
                password: "changeme1".into(),
                role: Some(StaffRole::Manager),
            },
        )
        .await
        .unwrap();
        assert_eq!(created["role"], "manager");
        assert!(created.get("password_hash").is_none());
        let id = created["id"].as_str().unwrap().to_string();

        let err = staff(
            &ctx,
            StaffCommand::Passwd {
                id: id.clone(),
                current: "wrong-one".into(),
                new_password: "another1".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailure);

        staff(
            &ctx,
            StaffCommand::Passwd {
                id: id.clone(),
                current: "changeme1".into(),
                new_password: "another1".into(),
            },
        )
        .await
        .unwrap();

        let who = staff(
            &ctx,
            StaffCommand::Login {
                email: "manager@example.com".into(),
                password: "another1".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(who["id"], id.as_str());

        let err = staff(
            &ctx,
            StaffCommand::Login {
                email: "manager@example.com".into(),
                password: "changeme1".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailure);
    }
}

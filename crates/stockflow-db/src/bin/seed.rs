//! # Seed Data Generator
//!
//! Populates a database with a demo tenant for local development.
//!
//! ## Usage
//! ```bash
//! cargo run -p stockflow-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockflow-db --bin seed -- --db ./data/stockflow.db
//! ```
//!
//! ## Generated Data
//! - Company `demo-company` owned by user `demo-user`
//! - A handful of products with starting stock
//! - One `ordered` purchase order from "Distribuidora Norte" (ready to receive)
//! - Promo codes `SUMMER10` (10%), `WELCOME5` (€5 off), `TRIAL30` (free trial)

use chrono::{Duration, Utc};
use std::env;
use stockflow_core::purchasing::{generate_order_number, order_total};
use stockflow_core::{
    Company, Money, Product, PromoCode, PromoDuration, PromoType, PurchaseOrder, PurchaseOrderItem,
    PurchaseOrderStatus, SubscriptionStatus, User,
};
use stockflow_db::{Database, DbConfig};
use uuid::Uuid;

const COMPANY_ID: &str = "demo-company";
const USER_ID: &str = "demo-user";

/// (id, name, sku, stock, unit price in cents)
const PRODUCTS: &[(&str, &str, &str, i64, i64)] = &[
    ("prod-cafe", "Café moído 1kg", "CAF-1KG", 12, 890),
    ("prod-acucar", "Açúcar 1kg", "ACU-1KG", 30, 115),
    ("prod-leite", "Leite UHT 1L", "LEI-1L", 48, 79),
    ("prod-copos", "Copos de papel (50)", "COP-50", 10, 245),
];

/// (code, type, value, max uses, duration)
const PROMOS: &[(&str, PromoType, i64, Option<i64>, PromoDuration)] = &[
    ("SUMMER10", PromoType::Percentage, 1000, Some(100), PromoDuration::Once),
    ("WELCOME5", PromoType::FixedAmount, 500, None, PromoDuration::Once),
    ("TRIAL30", PromoType::FreeTrial, 30, Some(50), PromoDuration::Once),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./stockflow_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockflow Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockflow_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockflow Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.companies().get(COMPANY_ID).await?.is_some() {
        println!("⚠ Demo company already exists");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    db.users()
        .insert(&User {
            id: USER_ID.to_string(),
            email: "demo@stockflow.pt".to_string(),
            display_name: Some("Demo".to_string()),
            company_id: Some(COMPANY_ID.to_string()),
            created_at: now,
        })
        .await?;

    db.companies()
        .insert(&Company {
            id: COMPANY_ID.to_string(),
            name: "Café Central, Lda".to_string(),
            owner_id: USER_ID.to_string(),
            plan_id: None,
            subscription_status: SubscriptionStatus::Trialing,
            last_payment_date: None,
            last_payment_amount: None,
            created_at: now,
            updated_at: now,
        })
        .await?;
    println!("✓ Company and user");

    let mut items = Vec::new();
    for (id, name, sku, stock, price) in PRODUCTS {
        db.products()
            .insert(&Product {
                id: id.to_string(),
                company_id: COMPANY_ID.to_string(),
                name: name.to_string(),
                sku: Some(sku.to_string()),
                stock: *stock,
                created_at: now,
                updated_at: now,
            })
            .await?;

        items.push(PurchaseOrderItem {
            product_id: Some(id.to_string()),
            product_name: name.to_string(),
            quantity: 24,
            unit_price: Some(Money::from_cents(*price)),
        });
    }
    println!("✓ {} products", PRODUCTS.len());

    let order = PurchaseOrder {
        id: Uuid::new_v4().to_string(),
        company_id: COMPANY_ID.to_string(),
        order_number: generate_order_number(now),
        supplier_id: "sup-norte".to_string(),
        supplier_name: "Distribuidora Norte".to_string(),
        order_date: now,
        expected_date: Some(now + Duration::days(3)),
        total: order_total(&items)?,
        items,
        status: PurchaseOrderStatus::Ordered,
        received_date: None,
        receiving_started_at: None,
        update_prices: None,
        received_lines: vec![],
        notes: Some("Seeded order".to_string()),
        created_at: now,
        updated_at: now,
    };
    db.purchase_orders().insert(&order).await?;
    println!("✓ Purchase order {} ({})", order.order_number, order.total);

    for (code, promo_type, value, max_uses, duration) in PROMOS {
        db.promo_codes()
            .insert(&PromoCode {
                id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                promo_type: *promo_type,
                value: *value,
                description: None,
                active: true,
                valid_from: None,
                valid_until: Some(now + Duration::days(90)),
                max_uses: *max_uses,
                used_count: 0,
                duration: *duration,
                duration_months: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("✓ {} promo codes", PROMOS.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

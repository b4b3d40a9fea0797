//! # Seed Data Generator
//!
//! Populates the database with stores, catalog and inventory for development.
//!
//! ## Usage
//! ```bash
//! # 60 products (default) across three stores
//! cargo run -p vitrine-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p vitrine-db --bin seed -- --count 200 --db ./data/vitrine.db
//! ```
//!
//! ## Generated Data
//! - Categories: Vestuário, Casa, Papelaria (plus the default "Geral")
//! - Stores: Centro, Shopping Norte, Online
//! - Products: `{name} {variant}`, prices R$ 9,90 - R$ 89,90
//! - Inventory: every product in every store, stock 0 - 40; the Online
//!   store sells 10% below catalog price

use std::env;

use vitrine_core::{InventoryUpsert, NewProduct, NewStore};
use vitrine_db::{Database, DbConfig};

/// Product families per category.
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Vestuário",
        &["Camiseta", "Moletom", "Boné", "Meia", "Jaqueta", "Bermuda"],
    ),
    (
        "Casa",
        &["Caneca", "Almofada", "Vela", "Toalha", "Porta-retrato", "Vaso"],
    ),
    (
        "Papelaria",
        &["Caderno", "Agenda", "Caneta", "Estojo", "Marca-texto", "Bloco"],
    ),
];

/// Variants with their price addon in centavos.
const VARIANTS: &[(&str, i64)] = &[
    ("P", 0),
    ("M", 500),
    ("G", 1000),
    ("Azul", 0),
    ("Preto", 300),
];

const STORES: &[(&str, &str)] = &[
    ("Centro", "Rua XV de Novembro, 100"),
    ("Shopping Norte", "Av. Norte, 2500 - Loja 12"),
    ("Online", "https://loja.example"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./data/vitrine.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vitrine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./data/vitrine.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Vitrine Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Stores
    let mut store_ids = Vec::with_capacity(STORES.len());
    for (name, address) in STORES {
        let store = db
            .stores()
            .insert(&NewStore {
                name: (*name).to_string(),
                description: Some(format!("Loja {}", name)),
                address: Some((*address).to_string()),
                contact: Some("contato@vitrine.example".to_string()),
            })
            .await?;
        store_ids.push(store.id);
    }
    println!("✓ Created {} stores", store_ids.len());

    // Categories and products
    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut linked = 0;

    'catalog: for (category, families) in CATALOG {
        sqlx::query("INSERT OR IGNORE INTO categorias (nome) VALUES (?1)")
            .bind(*category)
            .execute(db.pool())
            .await?;
        let category_id: i64 = sqlx::query_scalar("SELECT id FROM categorias WHERE nome = ?1")
            .bind(*category)
            .fetch_one(db.pool())
            .await?;

        for family in families.iter() {
            for (variant, addon) in VARIANTS {
                if generated >= count {
                    break 'catalog;
                }

                let seed = generated;
                let base_price = 990 + ((seed as i64 * 1_300) % 7_000);
                let product = db
                    .products()
                    .insert(&NewProduct {
                        name: format!("{} {}", family, variant),
                        description: Some(format!("{} - {}", family, category)),
                        price_cents: base_price + addon,
                        category_id,
                    })
                    .await?;
                generated += 1;

                for (store_idx, store_id) in store_ids.iter().enumerate() {
                    let stock = ((seed * 7 + store_idx * 13) % 41) as i64;
                    let online = STORES[store_idx].0 == "Online";
                    let store_price = online.then(|| product.price_cents * 9 / 10);

                    db.stores()
                        .upsert_inventory(&InventoryUpsert {
                            store_id: *store_id,
                            product_id: product.id,
                            stock_quantity: stock,
                            store_price_cents: store_price,
                        })
                        .await?;
                    linked += 1;
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);
    println!("✓ Linked {} store inventory rows", linked);

    let first_store = store_ids.first().copied().unwrap_or_default();
    let stock = db.stores().store_inventory(first_store).await?;
    println!(
        "  Store {} carries {} products, {} units in stock",
        first_store,
        stock.len(),
        stock.iter().map(|s| s.stock_quantity).sum::<i64>()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

//! # Seed Data Generator
//!
//! Fills a database with a small kiosk catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./kiosco.db
//! cargo run -p kiosco-db --bin seed
//!
//! # Specify database path and initial stock per product
//! cargo run -p kiosco-db --bin seed -- --db ./data/kiosco.db --stock 50
//! ```
//!
//! Products are inserted with zero stock; the initial stock is then credited
//! through the ledger, so every unit on hand has an `ingreso` movement.

use std::env;
use std::process::ExitCode;

use kiosco_core::{Money, NewProduct};
use kiosco_db::{Database, DbConfig, ServiceError, StockChange};

/// (category, name, barcode, price in cents)
const CATALOG: &[(&str, &str, &str, i64)] = &[
    ("Bebidas", "Coca-Cola 500ml", "7790895000997", 150_000),
    ("Bebidas", "Agua mineral 500ml", "7798062540017", 90_000),
    ("Bebidas", "Cerveza Quilmes 473ml", "7792798007387", 180_000),
    ("Golosinas", "Alfajor Jorgito", "7790040613201", 80_000),
    ("Golosinas", "Alfajor Guaymallén", "7790580120313", 50_000),
    ("Golosinas", "Chicle Beldent", "7622300742843", 60_000),
    ("Golosinas", "Caramelos Sugus", "7790580660000", 40_000),
    ("Snacks", "Papas Lays 85g", "7790310983003", 210_000),
    ("Snacks", "Maní salado 100g", "7791234000011", 120_000),
    ("Almacén", "Yerba Playadito 500g", "7790387013016", 320_000),
    ("Almacén", "Galletitas Oreo", "7622300843410", 170_000),
    ("Cigarrillos", "Encendedor", "7790000000019", 70_000),
];

struct Args {
    db_path: String,
    stock: i64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        db_path: "./kiosco.db".to_string(),
        stock: 24,
    };

    let mut iter = env::args().skip(1);
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--db" => {
                args.db_path = iter.next().ok_or("--db needs a path")?;
            }
            "--stock" => {
                let value = iter.next().ok_or("--stock needs a number")?;
                args.stock = value
                    .parse()
                    .map_err(|_| format!("invalid --stock value: {value}"))?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(args)
}

async fn seed(args: &Args) -> Result<usize, ServiceError> {
    let db = Database::new(DbConfig::new(&args.db_path)).await?;
    let products = db.products();
    let ledger = db.stock_ledger();

    let mut created = 0;
    for (category, name, barcode, cents) in CATALOG {
        if products.get_by_barcode(barcode).await?.is_some() {
            println!("  skip  {name} (already present)");
            continue;
        }

        let product = products
            .insert(&NewProduct {
                name: name.to_string(),
                barcode: Some(barcode.to_string()),
                price: Money::from_cents(*cents),
                category: Some(category.to_string()),
                image_url: None,
            })
            .await?;

        if args.stock > 0 {
            ledger
                .restock(StockChange::new(&product.id, args.stock).with_note("Stock inicial"))
                .await?;
        }

        println!("  added {name} ({}) x{}", product.price, args.stock);
        created += 1;
    }

    db.close().await;
    Ok(created)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("usage: seed [--db PATH] [--stock N]");
            return ExitCode::FAILURE;
        }
    };

    println!("Seeding {}", args.db_path);
    match seed(&args).await {
        Ok(created) => {
            println!("Done: {created} products created");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

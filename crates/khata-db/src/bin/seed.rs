//! # Seed Data Generator
//!
//! Populates the database with a sample catalog and a few parties for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 catalog items (default)
//! cargo run -p khata-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p khata-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p khata-db --bin seed -- --db ./data/khata.db
//! ```
//!
//! ## Generated Items
//! Hardware and electrical stock grouped by HSN heading. Each item has:
//! - Name: `{product} {variant}`
//! - Barcode: `890{index}`
//! - Selling price ₹20 - ₹2,000, MRP a little above, wholesale a little below
//! - GST slab: 5%, 12%, 18% or 28%

use chrono::Utc;
use khata_core::validation::validate_catalog_item;
use khata_core::{Address, CatalogItem, Money, Party, PartyKind, Rate};
use khata_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// (HSN code, unit, product names)
const GROUPS: &[(&str, &str, &[&str])] = &[
    (
        "8536",
        "pcs",
        &[
            "Modular Switch",
            "Socket 6A",
            "Socket 16A",
            "MCB Single Pole",
            "MCB Double Pole",
            "Fuse Carrier",
            "Plug Top",
            "Bell Push",
        ],
    ),
    (
        "7408",
        "mtr",
        &[
            "Copper Wire 1mm",
            "Copper Wire 1.5mm",
            "Copper Wire 2.5mm",
            "Earthing Wire",
            "Flexible Cable",
        ],
    ),
    (
        "3917",
        "pcs",
        &[
            "PVC Pipe",
            "PVC Elbow",
            "PVC Tee",
            "Conduit Bend",
            "Junction Box",
        ],
    ),
    (
        "8539",
        "pcs",
        &[
            "LED Bulb",
            "LED Tube Light",
            "LED Panel",
            "Flood Light",
            "Street Light",
        ],
    ),
    (
        "7318",
        "box",
        &[
            "Wood Screw",
            "Machine Screw",
            "Anchor Fastener",
            "Hex Bolt",
            "Washer",
        ],
    ),
];

/// Variant name and price addon in rupees
const VARIANTS: &[(&str, i64)] = &[
    ("Standard", 0),
    ("Premium", 40),
    ("Heavy Duty", 90),
    ("Pack of 10", 150),
    ("Pack of 50", 600),
];

/// GST slabs in basis points
const TAX_RATES: &[u32] = &[500, 1200, 1800, 2800];

const PARTIES: &[(&str, Option<&str>, &str, &str)] = &[
    ("Ravi Kumar", Some("Kumar Hardware"), "Pune", "Maharashtra"),
    ("Meera Iyer", None, "Chennai", "Tamil Nadu"),
    ("Arjun Shah", Some("Shah Electricals"), "Ahmedabad", "Gujarat"),
    ("Fatima Sheikh", Some("Sheikh Builders"), "Hyderabad", "Telangana"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./khata_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Khata Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of catalog items to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./khata_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Khata Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!("Items:    {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} catalog items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (group_idx, (hsn, unit, names)) in GROUPS.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (variant_idx, (variant, addon)) in VARIANTS.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let item = generate_item(
                    hsn,
                    unit,
                    name,
                    variant,
                    *addon,
                    group_idx * 1000 + name_idx * 20 + variant_idx,
                );

                if let Err(e) = validate_catalog_item(&item) {
                    eprintln!("Skipping invalid item {}: {}", item.name, e);
                    continue;
                }
                if let Err(e) = db.catalog().insert(&item).await {
                    eprintln!("Failed to insert {}: {}", item.name, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    println!("✓ Generated {} items in {:?}", generated, start.elapsed());

    println!();
    println!("Adding parties...");
    for party in PARTIES.iter().map(generate_party) {
        db.parties().insert(&party).await?;
        println!("  {}  {}", party.id, party.display_name());
    }

    println!();
    println!("Verifying search...");
    let results = db.catalog().search("wire").await?;
    println!("  Search 'wire': {} results", results.len());
    let results = db.catalog().search("8539").await?;
    println!("  Search '8539': {} results", results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single catalog item with plausible prices.
fn generate_item(
    hsn: &str,
    unit: &str,
    name: &str,
    variant: &str,
    addon: i64,
    seed: usize,
) -> CatalogItem {
    let now = Utc::now();

    let base = 20 + ((seed * 37) % 400) as i64;
    let selling = Money::from_units(base + addon);
    let mrp = Money::from_minor(selling.minor() * 115 / 100);
    let wholesale = Money::from_minor(selling.minor() * 90 / 100);

    CatalogItem {
        id: Uuid::new_v4().to_string(),
        name: format!("{} {}", name, variant),
        hsn_code: Some(hsn.to_string()),
        barcode: Some(format!("890{:010}", seed)),
        unit: unit.to_string(),
        tax_rate: Rate::from_bps(TAX_RATES[seed % TAX_RATES.len()]),
        selling_price: selling,
        mrp: Some(mrp),
        // Every third item has no wholesale price
        wholesale_price: (seed % 3 != 0).then_some(wholesale),
        on_hand_qty: (seed % 101) as i64,
        sold_qty: 0,
        image_ref: None,
        created_at: now,
        updated_at: now,
    }
}

fn generate_party(
    (name, business, city, state): &(&str, Option<&str>, &str, &str),
) -> Party {
    let now = Utc::now();

    Party {
        id: Uuid::new_v4().to_string(),
        kind: PartyKind::Customer,
        name: name.to_string(),
        business_name: business.map(str::to_string),
        phone: None,
        email: None,
        billing_address: Address {
            line: None,
            city: Some(city.to_string()),
            state: Some(state.to_string()),
            postal_code: None,
            country: Some("India".to_string()),
        },
        shipping_address: None,
        gstin: None,
        opening_balance: Money::zero(),
        created_at: now,
        updated_at: now,
    }
}

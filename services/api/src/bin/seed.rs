//! Seed the catalog with sample categories and products.
//!
//! # Usage
//!
//! ```bash
//! # Add the sample catalog, reusing categories that already exist
//! cargo run -p shopdeploy-api --bin seed
//!
//! # Delete every product and category first
//! cargo run -p shopdeploy-api --bin seed -- --reset
//! ```

use anyhow::{Context as _, Result};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{Database, EntityTrait, PaginatorTrait};
use tracing::info;

use shopdeploy_api::domain::repository::CategoryRepository;
use shopdeploy_api::domain::types::Category;
use shopdeploy_api::infra::db::{DbCategoryRepository, DbProductRepository};
use shopdeploy_api::usecase::category::{CreateCategoryInput, CreateCategoryUseCase};
use shopdeploy_api::usecase::product::{CreateProductInput, CreateProductUseCase};
use shopdeploy_api_schema::{categories, products};
use shopdeploy_core::tracing::init_tracing;
use shopdeploy_domain::category::slugify;
use shopdeploy_domain::product::ProductImage;

#[derive(Parser)]
#[command(about = "Seed the catalog with sample categories and products")]
struct Args {
    /// Delete all existing products and categories before seeding
    #[arg(long)]
    reset: bool,

    /// PostgreSQL URL; defaults to the DATABASE_URL environment variable
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

struct SeedProduct {
    title: &'static str,
    description: &'static str,
    price: Decimal,
    stock: u32,
    brand: &'static str,
    featured: bool,
    image: &'static str,
    public_id: &'static str,
}

const CATEGORIES: [(&str, &str); 5] = [
    ("Electronics", "Electronic devices and gadgets"),
    ("Clothing", "Fashion and apparel"),
    ("Books", "Books and literature"),
    ("Home & Garden", "Home and garden products"),
    ("Sports", "Sports equipment and gear"),
];

const PRODUCTS: [SeedProduct; 12] = [
    SeedProduct {
        title: "Wireless Bluetooth Headphones",
        description: "Wireless headphones with noise cancellation and 30-hour battery life.",
        price: dec!(79.99),
        stock: 50,
        brand: "AudioTech",
        featured: true,
        image: "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=500",
        public_id: "headphones-1",
    },
    SeedProduct {
        title: "Men's Cotton T-Shirt",
        description: "Cotton t-shirt available in multiple colors.",
        price: dec!(24.99),
        stock: 200,
        brand: "FashionWear",
        featured: false,
        image: "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=500",
        public_id: "tshirt-1",
    },
    SeedProduct {
        title: "The Complete JavaScript Guide",
        description: "Guide to modern JavaScript programming for beginners and experts.",
        price: dec!(44.99),
        stock: 90,
        brand: "TechBooks",
        featured: false,
        image: "https://images.unsplash.com/photo-1532012197267-da84d127e765?w=500",
        public_id: "book-1",
    },
    SeedProduct {
        title: "Indoor Plant Collection",
        description: "Set of 3 easy-care indoor plants for home or office.",
        price: dec!(49.99),
        stock: 55,
        brand: "GreenLife",
        featured: false,
        image: "https://images.unsplash.com/photo-1485955900006-10f4d324d411?w=500",
        public_id: "plant-1",
    },
    SeedProduct {
        title: "Running Shoes",
        description: "Lightweight running shoes with cushioning and support.",
        price: dec!(119.99),
        stock: 75,
        brand: "SportsPro",
        featured: true,
        image: "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=500",
        public_id: "shoes-1",
    },
    SeedProduct {
        title: "Smart Watch Pro",
        description: "Smartwatch with fitness tracking, heart rate monitor and GPS.",
        price: dec!(299.99),
        stock: 30,
        brand: "TechGear",
        featured: true,
        image: "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=500",
        public_id: "watch-1",
    },
    SeedProduct {
        title: "Women's Denim Jacket",
        description: "Denim jacket with a modern fit.",
        price: dec!(89.99),
        stock: 60,
        brand: "UrbanStyle",
        featured: true,
        image: "https://images.unsplash.com/photo-1551028719-00167b16eac5?w=500",
        public_id: "jacket-1",
    },
    SeedProduct {
        title: "Cooking Masterclass Cookbook",
        description: "Cookbook with 200+ recipes from well-known chefs.",
        price: dec!(39.99),
        stock: 70,
        brand: "CulinaryPress",
        featured: true,
        image: "https://images.unsplash.com/photo-1490645935967-10de6ba17061?w=500",
        public_id: "book-3",
    },
    SeedProduct {
        title: "LED Desk Lamp",
        description: "LED desk lamp with adjustable brightness and color temperature.",
        price: dec!(54.99),
        stock: 85,
        brand: "BrightHome",
        featured: false,
        image: "https://images.unsplash.com/photo-1507473885765-e6ed057f782c?w=500",
        public_id: "lamp-1",
    },
    SeedProduct {
        title: "Yoga Mat Premium",
        description: "Extra thick yoga mat with non-slip surface and carrying strap.",
        price: dec!(34.99),
        stock: 150,
        brand: "FitLife",
        featured: false,
        image: "https://images.unsplash.com/photo-1601925260368-ae2f83cf8b7f?w=500",
        public_id: "yoga-1",
    },
    SeedProduct {
        title: "Portable Bluetooth Speaker",
        description: "Waterproof Bluetooth speaker with 12-hour battery.",
        price: dec!(59.99),
        stock: 88,
        brand: "SoundWave",
        featured: true,
        image: "https://images.unsplash.com/photo-1608043152269-423dbba4e7e1?w=500",
        public_id: "speaker-1",
    },
    SeedProduct {
        title: "Ceramic Coffee Mug Set",
        description: "Set of 4 handcrafted ceramic coffee mugs.",
        price: dec!(34.99),
        stock: 95,
        brand: "HomeStyle",
        featured: false,
        image: "https://images.unsplash.com/photo-1514228742587-6b1558fcca3d?w=500",
        public_id: "mug-1",
    },
];

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    let db = Database::connect(&args.database_url)
        .await
        .context("connect to database")?;

    if args.reset {
        // cart lines referencing products go with them via ON DELETE CASCADE
        let removed = products::Entity::delete_many().exec(&db).await?;
        info!(rows = removed.rows_affected, "deleted products");
        let removed = categories::Entity::delete_many().exec(&db).await?;
        info!(rows = removed.rows_affected, "deleted categories");
    }

    let category_repo = DbCategoryRepository { db: db.clone() };
    let mut seeded: Vec<Category> = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        let existing = category_repo
            .find_by_name_or_slug(name, &slugify(name))
            .await?;
        let category = match existing {
            Some(category) => category,
            None => {
                let usecase = CreateCategoryUseCase {
                    categories: category_repo.clone(),
                };
                usecase
                    .execute(CreateCategoryInput {
                        name: name.to_owned(),
                        description: Some(description.to_owned()),
                        image: None,
                        is_active: true,
                    })
                    .await?
            }
        };
        seeded.push(category);
    }
    info!(count = seeded.len(), "categories ready");

    let existing_products = products::Entity::find().count(&db).await?;
    if existing_products > 0 {
        info!(count = existing_products, "catalog already has products, skipping");
        return Ok(());
    }

    let usecase = CreateProductUseCase {
        products: DbProductRepository { db: db.clone() },
        categories: category_repo,
    };
    for (index, p) in PRODUCTS.iter().enumerate() {
        let category = &seeded[index % seeded.len()];
        usecase
            .execute(CreateProductInput {
                title: p.title.to_owned(),
                description: p.description.to_owned(),
                price: p.price,
                category_id: category.id,
                images: vec![ProductImage {
                    url: p.image.to_owned(),
                    public_id: Some(p.public_id.to_owned()),
                }],
                stock: p.stock,
                brand: Some(p.brand.to_owned()),
                featured: p.featured,
                is_active: true,
            })
            .await?;
    }
    info!(count = PRODUCTS.len(), "products created");

    Ok(())
}

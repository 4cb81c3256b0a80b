use axum::extract::State;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopdeploy_auth_types::identity::Identity;
use shopdeploy_core::envelope::Envelope;
use shopdeploy_domain::id::{CategoryId, ProductId};
use shopdeploy_domain::pagination::{PageRequest, Pagination};
use shopdeploy_domain::product::{ProductImage, ProductSortBy};

use crate::domain::types::{CategorySummary, Product, ProductFilter, ProductListing};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::require_admin;
use crate::state::AppState;
use crate::usecase::product::{
    CreateProductInput, CreateProductUseCase, DeleteProductUseCase, GetProductUseCase,
    ListProductsUseCase, PRODUCTS_DEFAULT_LIMIT, UpdateProductInput, UpdateProductUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
    pub images: Vec<ProductImage>,
    pub stock: u32,
    pub rating_avg: Decimal,
    pub rating_count: u32,
    pub brand: Option<String>,
    pub featured: bool,
    pub is_active: bool,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl ProductResponse {
    fn new(p: Product, category: Option<CategorySummary>) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            price: p.price,
            category_id: p.category_id,
            category,
            images: p.images,
            stock: p.stock,
            rating_avg: p.rating_avg,
            rating_count: p.rating_count,
            brand: p.brand,
            featured: p.featured,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<ProductListing> for ProductResponse {
    fn from(listing: ProductListing) -> Self {
        Self::new(listing.product, listing.category)
    }
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self::new(product, None)
    }
}

#[derive(Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub pagination: Pagination,
}

// ── GET /products ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<ProductSortBy>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> Result<Envelope<ProductListResponse>, ApiError> {
    let usecase = ListProductsUseCase {
        products: state.product_repo(),
    };
    let filter = ProductFilter {
        search: query.search,
        category_id: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
    };
    let page = PageRequest::new(query.page, query.limit, PRODUCTS_DEFAULT_LIMIT);
    let (listings, pagination) = usecase
        .execute(filter, query.sort.unwrap_or_default(), page)
        .await?;
    Ok(Envelope::ok(
        "Products fetched",
        ProductListResponse {
            products: listings.into_iter().map(Into::into).collect(),
            pagination,
        },
    ))
}

// ── GET /products/{id} ───────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Envelope<ProductResponse>, ApiError> {
    let usecase = GetProductUseCase {
        products: state.product_repo(),
        categories: state.category_repo(),
    };
    let listing = usecase.execute(id).await?;
    Ok(Envelope::ok("Product fetched", listing.into()))
}

// ── POST /products ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    #[serde(alias = "categoryId")]
    pub category: CategoryId,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub stock: u32,
    pub brand: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub is_active: Option<bool>,
}

pub async fn create_product(
    identity: Identity,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<Envelope<ProductResponse>, ApiError> {
    require_admin(&identity)?;
    let usecase = CreateProductUseCase {
        products: state.product_repo(),
        categories: state.category_repo(),
    };
    let product = usecase
        .execute(CreateProductInput {
            title: body.title,
            description: body.description,
            price: body.price,
            category_id: body.category,
            images: body.images,
            stock: body.stock,
            brand: body.brand,
            featured: body.featured,
            is_active: body.is_active.unwrap_or(true),
        })
        .await?;
    Ok(Envelope::created("Product created", product.into()))
}

// ── PUT /products/{id} ───────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(alias = "categoryId")]
    pub category: Option<CategoryId>,
    pub images: Option<Vec<ProductImage>>,
    pub stock: Option<u32>,
    pub brand: Option<String>,
    pub featured: Option<bool>,
    pub is_active: Option<bool>,
}

pub async fn update_product(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<UpdateProductRequest>,
) -> Result<Envelope<ProductResponse>, ApiError> {
    require_admin(&identity)?;
    let usecase = UpdateProductUseCase {
        products: state.product_repo(),
        categories: state.category_repo(),
    };
    let product = usecase
        .execute(
            id,
            UpdateProductInput {
                title: body.title,
                description: body.description,
                price: body.price,
                category_id: body.category,
                images: body.images,
                stock: body.stock,
                brand: body.brand,
                featured: body.featured,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(Envelope::ok("Product updated", product.into()))
}

// ── DELETE /products/{id} ────────────────────────────────────────────────────

pub async fn delete_product(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Envelope<()>, ApiError> {
    require_admin(&identity)?;
    let usecase = DeleteProductUseCase {
        products: state.product_repo(),
    };
    usecase.execute(id).await?;
    Ok(Envelope::message("Product deleted"))
}

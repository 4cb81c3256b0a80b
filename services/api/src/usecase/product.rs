use chrono::Utc;
use rust_decimal::Decimal;

use shopdeploy_domain::id::{CategoryId, ProductId};
use shopdeploy_domain::pagination::{PageRequest, Pagination};
use shopdeploy_domain::product::{ProductImage, ProductSortBy};

use crate::domain::repository::{CategoryRepository, ProductRepository};
use crate::domain::types::{
    CategorySummary, Product, ProductChanges, ProductFilter, ProductListing,
};
use crate::error::ApiError;

pub const PRODUCTS_DEFAULT_LIMIT: u64 = 12;

fn validate_product(product: &Product) -> Result<(), ApiError> {
    if product.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    if product.description.trim().is_empty() {
        return Err(ApiError::validation("description is required"));
    }
    if product.price.is_sign_negative() {
        return Err(ApiError::validation("price must not be negative"));
    }
    Ok(())
}

async fn ensure_category<C: CategoryRepository>(
    categories: &C,
    id: CategoryId,
) -> Result<(), ApiError> {
    categories
        .find_by_id(id)
        .await?
        .map(|_| ())
        .ok_or(ApiError::CategoryNotFound)
}

// ── ListProducts ─────────────────────────────────────────────────────────────

pub struct ListProductsUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> ListProductsUseCase<P> {
    pub async fn execute(
        &self,
        mut filter: ProductFilter,
        sort_by: ProductSortBy,
        page: PageRequest,
    ) -> Result<(Vec<ProductListing>, Pagination), ApiError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(ApiError::validation("minPrice must not exceed maxPrice"));
            }
        }
        filter.search = filter
            .search
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        let (listings, total) = self.products.search(&filter, sort_by, page).await?;
        Ok((listings, Pagination::new(page, total)))
    }
}

// ── GetProduct ───────────────────────────────────────────────────────────────

pub struct GetProductUseCase<P: ProductRepository, C: CategoryRepository> {
    pub products: P,
    pub categories: C,
}

impl<P: ProductRepository, C: CategoryRepository> GetProductUseCase<P, C> {
    pub async fn execute(&self, id: ProductId) -> Result<ProductListing, ApiError> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;
        let category = self
            .categories
            .find_by_id(product.category_id)
            .await?
            .map(|c| CategorySummary {
                id: c.id,
                name: c.name,
                slug: c.slug,
            });
        Ok(ProductListing { product, category })
    }
}

// ── CreateProduct (admin) ────────────────────────────────────────────────────

pub struct CreateProductInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub images: Vec<ProductImage>,
    pub stock: u32,
    pub brand: Option<String>,
    pub featured: bool,
    pub is_active: bool,
}

pub struct CreateProductUseCase<P: ProductRepository, C: CategoryRepository> {
    pub products: P,
    pub categories: C,
}

impl<P: ProductRepository, C: CategoryRepository> CreateProductUseCase<P, C> {
    pub async fn execute(&self, input: CreateProductInput) -> Result<Product, ApiError> {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            title: input.title.trim().to_owned(),
            description: input.description.trim().to_owned(),
            price: input.price,
            category_id: input.category_id,
            images: input.images,
            stock: input.stock,
            rating_avg: Decimal::ZERO,
            rating_count: 0,
            brand: input.brand.filter(|b| !b.trim().is_empty()),
            featured: input.featured,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        validate_product(&product)?;
        ensure_category(&self.categories, product.category_id).await?;
        self.products.create(&product).await?;
        tracing::info!(product_id = %product.id, title = %product.title, "product created");
        Ok(product)
    }
}

// ── UpdateProduct (admin) ────────────────────────────────────────────────────

/// Partial update; `None` leaves the field unchanged.
#[derive(Default)]
pub struct UpdateProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub images: Option<Vec<ProductImage>>,
    pub stock: Option<u32>,
    pub brand: Option<String>,
    pub featured: Option<bool>,
    pub is_active: Option<bool>,
}

pub struct UpdateProductUseCase<P: ProductRepository, C: CategoryRepository> {
    pub products: P,
    pub categories: C,
}

impl<P: ProductRepository, C: CategoryRepository> UpdateProductUseCase<P, C> {
    pub async fn execute(
        &self,
        id: ProductId,
        input: UpdateProductInput,
    ) -> Result<Product, ApiError> {
        let mut product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;

        let changes = ProductChanges {
            title: input.title.map(|t| t.trim().to_owned()),
            description: input.description.map(|d| d.trim().to_owned()),
            price: input.price,
            category_id: input.category_id,
            images: input.images,
            stock: input.stock,
            brand: input.brand.map(|b| Some(b).filter(|b| !b.trim().is_empty())),
            featured: input.featured,
            is_active: input.is_active,
            updated_at: Utc::now(),
        };
        if let Some(category_id) = changes.category_id {
            if category_id != product.category_id {
                ensure_category(&self.categories, category_id).await?;
            }
        }
        // Validate the merged result; only the changed columns are written.
        changes.apply_to(&mut product);
        validate_product(&product)?;

        self.products
            .update(id, &changes)
            .await?
            .ok_or(ApiError::ProductNotFound)
    }
}

// ── DeleteProduct (admin) ────────────────────────────────────────────────────

pub struct DeleteProductUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> DeleteProductUseCase<P> {
    pub async fn execute(&self, id: ProductId) -> Result<(), ApiError> {
        if !self.products.delete(id).await? {
            return Err(ApiError::ProductNotFound);
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

use chrono::Utc;

use shopdeploy_domain::category::slugify;
use shopdeploy_domain::id::CategoryId;

use crate::domain::repository::{CategoryRepository, ProductRepository};
use crate::domain::types::Category;
use crate::error::ApiError;

/// Trimmed name and its slug, or a validation error if either comes out empty.
fn name_and_slug(name: &str) -> Result<(String, String), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ApiError::validation(
            "name must contain at least one letter or digit",
        ));
    }
    Ok((name.to_owned(), slug))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// ── ListCategories ───────────────────────────────────────────────────────────

pub struct ListCategoriesUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> ListCategoriesUseCase<C> {
    pub async fn execute(&self) -> Result<Vec<Category>, ApiError> {
        self.categories.list_active().await
    }
}

// ── GetCategory ──────────────────────────────────────────────────────────────

pub struct GetCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> GetCategoryUseCase<C> {
    pub async fn execute(&self, id: CategoryId) -> Result<Category, ApiError> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CategoryNotFound)
    }
}

// ── CreateCategory (admin) ───────────────────────────────────────────────────

pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
}

pub struct CreateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> CreateCategoryUseCase<C> {
    pub async fn execute(&self, input: CreateCategoryInput) -> Result<Category, ApiError> {
        let (name, slug) = name_and_slug(&input.name)?;
        if self
            .categories
            .find_by_name_or_slug(&name, &slug)
            .await?
            .is_some()
        {
            return Err(ApiError::CategoryAlreadyExists);
        }
        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(),
            name,
            slug,
            description: non_blank(input.description),
            image: non_blank(input.image),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.categories.create(&category).await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }
}

// ── UpdateCategory (admin) ───────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

pub struct UpdateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> UpdateCategoryUseCase<C> {
    /// Renaming regenerates the slug.
    pub async fn execute(
        &self,
        id: CategoryId,
        input: UpdateCategoryInput,
    ) -> Result<Category, ApiError> {
        let mut category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CategoryNotFound)?;

        if let Some(name) = input.name {
            let (name, slug) = name_and_slug(&name)?;
            let taken = self.categories.find_by_name_or_slug(&name, &slug).await?;
            if taken.is_some_and(|other| other.id != category.id) {
                return Err(ApiError::CategoryAlreadyExists);
            }
            category.name = name;
            category.slug = slug;
        }
        if input.description.is_some() {
            category.description = non_blank(input.description);
        }
        if input.image.is_some() {
            category.image = non_blank(input.image);
        }
        if let Some(is_active) = input.is_active {
            category.is_active = is_active;
        }
        category.updated_at = Utc::now();

        self.categories.update(&category).await?;
        Ok(category)
    }
}

// ── DeleteCategory (admin) ───────────────────────────────────────────────────

pub struct DeleteCategoryUseCase<C: CategoryRepository, P: ProductRepository> {
    pub categories: C,
    pub products: P,
}

impl<C: CategoryRepository, P: ProductRepository> DeleteCategoryUseCase<C, P> {
    /// Refuses while any product still references the category.
    pub async fn execute(&self, id: CategoryId) -> Result<(), ApiError> {
        let in_use = self.products.count_by_category(id).await?;
        if in_use > 0 {
            return Err(ApiError::validation(format!(
                "category still has {in_use} product(s)"
            )));
        }
        if !self.categories.delete(id).await? {
            return Err(ApiError::CategoryNotFound);
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}

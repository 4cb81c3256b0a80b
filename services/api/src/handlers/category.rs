use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopdeploy_auth_types::identity::Identity;
use shopdeploy_core::envelope::Envelope;
use shopdeploy_domain::id::CategoryId;

use crate::domain::types::Category;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::handlers::require_admin;
use crate::state::AppState;
use crate::usecase::category::{
    CreateCategoryInput, CreateCategoryUseCase, DeleteCategoryUseCase, GetCategoryUseCase,
    ListCategoriesUseCase, UpdateCategoryInput, UpdateCategoryUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            image: c.image,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

// ── GET /categories ──────────────────────────────────────────────────────────

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Envelope<Vec<CategoryResponse>>, ApiError> {
    let usecase = ListCategoriesUseCase {
        categories: state.category_repo(),
    };
    let categories = usecase.execute().await?;
    Ok(Envelope::ok(
        "Categories fetched",
        categories.into_iter().map(Into::into).collect(),
    ))
}

// ── GET /categories/{id} ─────────────────────────────────────────────────────

pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Envelope<CategoryResponse>, ApiError> {
    let usecase = GetCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase.execute(id).await?;
    Ok(Envelope::ok("Category fetched", category.into()))
}

// ── POST /categories ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn create_category(
    identity: Identity,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCategoryRequest>,
) -> Result<Envelope<CategoryResponse>, ApiError> {
    require_admin(&identity)?;
    let usecase = CreateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase
        .execute(CreateCategoryInput {
            name: body.name,
            description: body.description,
            image: body.image,
            is_active: body.is_active.unwrap_or(true),
        })
        .await?;
    Ok(Envelope::created("Category created", category.into()))
}

// ── PUT /categories/{id} ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_category(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(body): ApiJson<UpdateCategoryRequest>,
) -> Result<Envelope<CategoryResponse>, ApiError> {
    require_admin(&identity)?;
    let usecase = UpdateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase
        .execute(
            id,
            UpdateCategoryInput {
                name: body.name,
                description: body.description,
                image: body.image,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(Envelope::ok("Category updated", category.into()))
}

// ── DELETE /categories/{id} ──────────────────────────────────────────────────

pub async fn delete_category(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Envelope<()>, ApiError> {
    require_admin(&identity)?;
    let usecase = DeleteCategoryUseCase {
        categories: state.category_repo(),
        products: state.product_repo(),
    };
    usecase.execute(id).await?;
    Ok(Envelope::message("Category deleted"))
}

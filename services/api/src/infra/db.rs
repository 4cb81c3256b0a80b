use std::collections::HashMap;

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr, TransactionTrait,
    sea_query::{Expr, Func, LikeExpr, OnConflict},
};
use uuid::Uuid;

use shopdeploy_api_schema::{
    cart_items, carts, categories, order_items, order_status_history, orders, products, users,
};
use shopdeploy_domain::id::{CartId, CartItemId, CategoryId, OrderId, ProductId, UserId};
use shopdeploy_domain::order::{OrderStatus, PaymentStatus};
use shopdeploy_domain::pagination::{PageRequest, Sort};
use shopdeploy_domain::pricing::PriceBreakdown;
use shopdeploy_domain::product::ProductSortBy;

use crate::domain::repository::{
    CartRepository, CategoryRepository, OrderRepository, ProductRepository, StockRepository,
    UserRepository,
};
use crate::domain::types::{
    Cart, CartItem, Category, CategorySummary, Order, OrderItem, OrderOwner, OrderStatusChange,
    OrderWithOwner, Product, ProductChanges, ProductFilter, ProductListing, SavedAddress,
    StatusEntry, User,
};
use crate::error::ApiError;

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// `LIKE` pattern matching `needle` anywhere, with wildcards in `needle` escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        let addresses = serde_json::to_value(&user.addresses).context("encode addresses")?;
        users::ActiveModel {
            id: Set(user.id.into()),
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            role: Set(user.role.as_str().to_owned()),
            addresses: Set(addresses),
            refresh_token: Set(user.refresh_token.clone()),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::UserAlreadyExists
            } else {
                anyhow::Error::new(e).context("create user").into()
            }
        })?;
        Ok(())
    }

    async fn set_refresh_token(&self, id: UserId, token: Option<&str>) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id.into()),
            refresh_token: Set(token.map(str::to_owned)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set refresh token")?;
        Ok(())
    }

    async fn replace_addresses(
        &self,
        id: UserId,
        addresses: &[SavedAddress],
    ) -> Result<(), ApiError> {
        let addresses = serde_json::to_value(addresses).context("encode addresses")?;
        users::ActiveModel {
            id: Set(id.into()),
            addresses: Set(addresses),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("replace addresses")?;
        Ok(())
    }
}

fn user_from_model(model: users::Model) -> Result<User, ApiError> {
    Ok(User {
        id: model.id.into(),
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        role: model.role.parse().context("decode user role")?,
        addresses: serde_json::from_value(model.addresses).context("decode addresses")?,
        refresh_token: model.refresh_token,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Category repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCategoryRepository {
    pub db: DatabaseConnection,
}

impl CategoryRepository for DbCategoryRepository {
    async fn list_active(&self) -> Result<Vec<Category>, ApiError> {
        let models = categories::Entity::find()
            .filter(categories::Column::IsActive.eq(true))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
            .context("list active categories")?;
        Ok(models.into_iter().map(category_from_model).collect())
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, ApiError> {
        let model = categories::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .context("find category by id")?;
        Ok(model.map(category_from_model))
    }

    async fn find_by_name_or_slug(
        &self,
        name: &str,
        slug: &str,
    ) -> Result<Option<Category>, ApiError> {
        let model = categories::Entity::find()
            .filter(
                Condition::any()
                    .add(categories::Column::Name.eq(name))
                    .add(categories::Column::Slug.eq(slug)),
            )
            .one(&self.db)
            .await
            .context("find category by name or slug")?;
        Ok(model.map(category_from_model))
    }

    async fn create(&self, category: &Category) -> Result<(), ApiError> {
        category_active_model(category)
            .insert(&self.db)
            .await
            .map_err(|e| category_write_error(e, "create category"))?;
        Ok(())
    }

    async fn update(&self, category: &Category) -> Result<(), ApiError> {
        category_active_model(category)
            .update(&self.db)
            .await
            .map_err(|e| category_write_error(e, "update category"))?;
        Ok(())
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, ApiError> {
        let result = categories::Entity::delete_by_id(Uuid::from(id))
            .exec(&self.db)
            .await
            .context("delete category")?;
        Ok(result.rows_affected > 0)
    }
}

fn category_write_error(e: DbErr, what: &'static str) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::CategoryAlreadyExists
    } else {
        anyhow::Error::new(e).context(what).into()
    }
}

fn category_active_model(category: &Category) -> categories::ActiveModel {
    categories::ActiveModel {
        id: Set(category.id.into()),
        name: Set(category.name.clone()),
        slug: Set(category.slug.clone()),
        description: Set(category.description.clone()),
        image: Set(category.image.clone()),
        is_active: Set(category.is_active),
        created_at: Set(category.created_at),
        updated_at: Set(category.updated_at),
    }
}

fn category_from_model(model: categories::Model) -> Category {
    Category {
        id: model.id.into(),
        name: model.name,
        slug: model.slug,
        description: model.description,
        image: model.image,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Product repository ───────────────────────────────────────────────────────

/// Products and their stock counter.
#[derive(Clone)]
pub struct DbProductRepository {
    pub db: DatabaseConnection,
}

impl ProductRepository for DbProductRepository {
    async fn search(
        &self,
        filter: &ProductFilter,
        sort_by: ProductSortBy,
        page: PageRequest,
    ) -> Result<(Vec<ProductListing>, u64), ApiError> {
        let page = page.clamped();
        let mut query = products::Entity::find().filter(products::Column::IsActive.eq(true));
        if let Some(category_id) = filter.category_id {
            query = query.filter(products::Column::CategoryId.eq(Uuid::from(category_id)));
        }
        if let Some(min) = filter.min_price {
            query = query.filter(products::Column::Price.gte(min));
        }
        if let Some(max) = filter.max_price {
            query = query.filter(products::Column::Price.lte(max));
        }
        if let Some(search) = &filter.search {
            let pattern = contains_pattern(&search.to_lowercase());
            let matches = |col: products::Column| {
                Expr::expr(Func::lower(Expr::col((products::Entity, col))))
                    .like(LikeExpr::new(pattern.clone()).escape('\\'))
            };
            query = query.filter(
                Condition::any()
                    .add(matches(products::Column::Title))
                    .add(matches(products::Column::Description)),
            );
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count products")?;

        query = match sort_by {
            ProductSortBy::CreatedAt(Sort::Desc) => query.order_by_desc(products::Column::CreatedAt),
            ProductSortBy::CreatedAt(Sort::Asc) => query.order_by_asc(products::Column::CreatedAt),
            ProductSortBy::Price(Sort::Asc) => query.order_by_asc(products::Column::Price),
            ProductSortBy::Price(Sort::Desc) => query.order_by_desc(products::Column::Price),
            ProductSortBy::Title(Sort::Asc) => query.order_by_asc(products::Column::Title),
            ProductSortBy::Title(Sort::Desc) => query.order_by_desc(products::Column::Title),
            ProductSortBy::RatingDesc => query
                .order_by_desc(products::Column::RatingAvg)
                .order_by_desc(products::Column::RatingCount),
        };

        let rows = query
            .order_by_asc(products::Column::Id)
            .find_also_related(categories::Entity)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("search products")?;

        let listings = rows
            .into_iter()
            .map(|(product, category)| {
                Ok(ProductListing {
                    product: product_from_model(product)?,
                    category: category.map(|c| CategorySummary {
                        id: c.id.into(),
                        name: c.name,
                        slug: c.slug,
                    }),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        Ok((listings, total))
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        let model = products::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .context("find product by id")?;
        model.map(product_from_model).transpose()
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().copied().map(Uuid::from)))
            .all(&self.db)
            .await
            .context("find products by ids")?;
        models.into_iter().map(product_from_model).collect()
    }

    async fn create(&self, product: &Product) -> Result<(), ApiError> {
        product_active_model(product)?
            .insert(&self.db)
            .await
            .context("create product")?;
        Ok(())
    }

    async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, ApiError> {
        let mut row = products::ActiveModel {
            id: Set(id.into()),
            updated_at: Set(changes.updated_at),
            ..Default::default()
        };
        if let Some(title) = &changes.title {
            row.title = Set(title.clone());
        }
        if let Some(description) = &changes.description {
            row.description = Set(description.clone());
        }
        if let Some(price) = changes.price {
            row.price = Set(price);
        }
        if let Some(category_id) = changes.category_id {
            row.category_id = Set(category_id.into());
        }
        if let Some(images) = &changes.images {
            row.images = Set(serde_json::to_value(images).context("encode product images")?);
        }
        // Left unset unless given, so a concurrent decrement is not overwritten.
        if let Some(stock) = changes.stock {
            row.stock = Set(i32::try_from(stock).context("product stock out of range")?);
        }
        if let Some(brand) = &changes.brand {
            row.brand = Set(brand.clone());
        }
        if let Some(featured) = changes.featured {
            row.featured = Set(featured);
        }
        if let Some(is_active) = changes.is_active {
            row.is_active = Set(is_active);
        }

        match row.update(&self.db).await {
            Ok(model) => product_from_model(model).map(Some),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("update product").into()),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, ApiError> {
        let result = products::Entity::delete_by_id(Uuid::from(id))
            .exec(&self.db)
            .await
            .context("delete product")?;
        Ok(result.rows_affected > 0)
    }

    async fn count_by_category(&self, category_id: CategoryId) -> Result<u64, ApiError> {
        let count = products::Entity::find()
            .filter(products::Column::CategoryId.eq(Uuid::from(category_id)))
            .count(&self.db)
            .await
            .context("count products by category")?;
        Ok(count)
    }
}

impl StockRepository for DbProductRepository {
    async fn try_decrement(&self, id: ProductId, qty: u32) -> Result<bool, ApiError> {
        let Ok(qty) = i32::try_from(qty) else {
            return Ok(false);
        };
        // Single conditional UPDATE: concurrent checkouts cannot push stock below zero.
        let result = products::Entity::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).sub(qty),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(products::Column::Id.eq(Uuid::from(id)))
            .filter(products::Column::Stock.gte(qty))
            .exec(&self.db)
            .await
            .context("decrement stock")?;
        Ok(result.rows_affected == 1)
    }

    async fn increment(&self, id: ProductId, qty: u32) -> Result<(), ApiError> {
        let qty = i32::try_from(qty).context("stock increment out of range")?;
        products::Entity::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).add(qty),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(products::Column::Id.eq(Uuid::from(id)))
            .exec(&self.db)
            .await
            .context("increment stock")?;
        Ok(())
    }
}

fn product_active_model(product: &Product) -> Result<products::ActiveModel, ApiError> {
    Ok(products::ActiveModel {
        id: Set(product.id.into()),
        title: Set(product.title.clone()),
        description: Set(product.description.clone()),
        price: Set(product.price),
        category_id: Set(product.category_id.into()),
        images: Set(serde_json::to_value(&product.images).context("encode product images")?),
        stock: Set(i32::try_from(product.stock).context("product stock out of range")?),
        rating_avg: Set(product.rating_avg),
        rating_count: Set(i32::try_from(product.rating_count).context("rating count out of range")?),
        brand: Set(product.brand.clone()),
        featured: Set(product.featured),
        is_active: Set(product.is_active),
        created_at: Set(product.created_at),
        updated_at: Set(product.updated_at),
    })
}

fn product_from_model(model: products::Model) -> Result<Product, ApiError> {
    Ok(Product {
        id: model.id.into(),
        title: model.title,
        description: model.description,
        price: model.price,
        category_id: model.category_id.into(),
        images: serde_json::from_value(model.images).context("decode product images")?,
        stock: u32::try_from(model.stock).context("negative product stock")?,
        rating_avg: model.rating_avg,
        rating_count: u32::try_from(model.rating_count).context("negative rating count")?,
        brand: model.brand,
        featured: model.featured,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Cart repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCartRepository {
    pub db: DatabaseConnection,
}

async fn touch_cart<C: ConnectionTrait>(conn: &C, cart_id: CartId) -> Result<(), DbErr> {
    carts::Entity::update_many()
        .col_expr(carts::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(carts::Column::Id.eq(Uuid::from(cart_id)))
        .exec(conn)
        .await?;
    Ok(())
}

impl CartRepository for DbCartRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, ApiError> {
        let Some(cart) = carts::Entity::find()
            .filter(carts::Column::UserId.eq(Uuid::from(user_id)))
            .one(&self.db)
            .await
            .context("find cart by user")?
        else {
            return Ok(None);
        };
        let items = cart_items::Entity::find()
            .filter(cart_items::Column::CartId.eq(cart.id))
            .order_by_asc(cart_items::Column::CreatedAt)
            .order_by_asc(cart_items::Column::Id)
            .all(&self.db)
            .await
            .context("list cart items")?;
        Ok(Some(Cart {
            id: cart.id.into(),
            user_id: cart.user_id.into(),
            items: items
                .into_iter()
                .map(cart_item_from_model)
                .collect::<Result<_, _>>()?,
            updated_at: cart.updated_at,
        }))
    }

    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, ApiError> {
        if let Some(cart) = self.find_by_user(user_id).await? {
            return Ok(cart);
        }
        let now = Utc::now();
        let cart = carts::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id.into()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // Two first requests may race; the loser's insert is a no-op.
        carts::Entity::insert(cart)
            .on_conflict(
                OnConflict::column(carts::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("create cart")?;
        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("cart for user {user_id} missing after insert").into())
    }

    async fn add_item(&self, cart_id: CartId, item: &CartItem) -> Result<(), ApiError> {
        let qty = i32::try_from(item.qty).context("cart quantity out of range")?;
        let item = cart_items::ActiveModel {
            id: Set(item.id.into()),
            cart_id: Set(cart_id.into()),
            product_id: Set(item.product_id.into()),
            qty: Set(qty),
            price_at_add: Set(item.price_at_add),
            created_at: Set(Utc::now()),
        };
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    item.insert(txn).await?;
                    touch_cart(txn, cart_id).await
                })
            })
            .await
            .context("add cart item")?;
        Ok(())
    }

    async fn set_item_qty(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        qty: u32,
    ) -> Result<bool, ApiError> {
        let qty = i32::try_from(qty).context("cart quantity out of range")?;
        let updated = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                Box::pin(async move {
                    let result = cart_items::Entity::update_many()
                        .col_expr(cart_items::Column::Qty, Expr::value(qty))
                        .filter(cart_items::Column::Id.eq(Uuid::from(item_id)))
                        .filter(cart_items::Column::CartId.eq(Uuid::from(cart_id)))
                        .exec(txn)
                        .await?;
                    touch_cart(txn, cart_id).await?;
                    Ok(result.rows_affected > 0)
                })
            })
            .await
            .context("set cart item quantity")?;
        Ok(updated)
    }

    async fn remove_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<bool, ApiError> {
        let result = cart_items::Entity::delete_many()
            .filter(cart_items::Column::Id.eq(Uuid::from(item_id)))
            .filter(cart_items::Column::CartId.eq(Uuid::from(cart_id)))
            .exec(&self.db)
            .await
            .context("remove cart item")?;
        touch_cart(&self.db, cart_id)
            .await
            .context("touch cart")?;
        Ok(result.rows_affected > 0)
    }

    async fn clear(&self, cart_id: CartId) -> Result<(), ApiError> {
        cart_items::Entity::delete_many()
            .filter(cart_items::Column::CartId.eq(Uuid::from(cart_id)))
            .exec(&self.db)
            .await
            .context("clear cart")?;
        touch_cart(&self.db, cart_id)
            .await
            .context("touch cart")?;
        Ok(())
    }
}

fn cart_item_from_model(model: cart_items::Model) -> Result<CartItem, ApiError> {
    Ok(CartItem {
        id: model.id.into(),
        product_id: model.product_id.into(),
        qty: u32::try_from(model.qty).context("negative cart quantity")?,
        price_at_add: model.price_at_add,
    })
}

// ── Order repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl DbOrderRepository {
    /// Attach items and history to a page of order rows, preserving row order.
    async fn hydrate(&self, models: Vec<orders::Model>) -> Result<Vec<Order>, ApiError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();

        let mut items: HashMap<Uuid, Vec<order_items::Model>> = HashMap::new();
        for item in order_items::Entity::find()
            .filter(order_items::Column::OrderId.is_in(ids.clone()))
            .order_by_asc(order_items::Column::Position)
            .all(&self.db)
            .await
            .context("load order items")?
        {
            items.entry(item.order_id).or_default().push(item);
        }

        let mut history: HashMap<Uuid, Vec<order_status_history::Model>> = HashMap::new();
        for entry in order_status_history::Entity::find()
            .filter(order_status_history::Column::OrderId.is_in(ids))
            .order_by_asc(order_status_history::Column::CreatedAt)
            .order_by_asc(order_status_history::Column::Id)
            .all(&self.db)
            .await
            .context("load order status history")?
        {
            history.entry(entry.order_id).or_default().push(entry);
        }

        models
            .into_iter()
            .map(|model| {
                let order_items = items.remove(&model.id).unwrap_or_default();
                let entries = history.remove(&model.id).unwrap_or_default();
                order_from_models(model, order_items, entries)
            })
            .collect()
    }
}

impl OrderRepository for DbOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), ApiError> {
        let row = orders::ActiveModel {
            id: Set(order.id.into()),
            user_id: Set(order.user_id.into()),
            shipping_address: Set(
                serde_json::to_value(&order.shipping_address).context("encode shipping address")?
            ),
            payment_method: Set(order.payment_method.as_str().to_owned()),
            payment_status: Set(order.payment_status.as_str().to_owned()),
            payment_id: Set(order.payment_id.clone()),
            items_price: Set(order.price.items_price),
            shipping_price: Set(order.price.shipping_price),
            tax_price: Set(order.price.tax_price),
            total_amount: Set(order.price.total_amount),
            current_status: Set(order.status.as_str().to_owned()),
            delivered_at: Set(order.delivered_at),
            cancelled_at: Set(order.cancelled_at),
            created_at: Set(order.created_at),
            updated_at: Set(order.updated_at),
        };
        let mut item_rows = Vec::with_capacity(order.items.len());
        for (position, item) in order.items.iter().enumerate() {
            item_rows.push(order_items::ActiveModel {
                id: Set(Uuid::now_v7()),
                order_id: Set(order.id.into()),
                position: Set(i32::try_from(position).context("too many order items")?),
                product_id: Set(item.product_id.into()),
                title: Set(item.title.clone()),
                price: Set(item.price),
                qty: Set(i32::try_from(item.qty).context("order quantity out of range")?),
                image: Set(item.image.clone()),
            });
        }
        let history_rows: Vec<_> = order
            .status_history
            .iter()
            .map(|entry| history_active_model(order.id, entry))
            .collect();

        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    row.insert(txn).await?;
                    order_items::Entity::insert_many(item_rows)
                        .exec_without_returning(txn)
                        .await?;
                    order_status_history::Entity::insert_many(history_rows)
                        .exec_without_returning(txn)
                        .await?;
                    Ok(())
                })
            })
            .await
            .context("create order")?;
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, ApiError> {
        let Some(model) = orders::Entity::find_by_id(Uuid::from(id))
            .one(&self.db)
            .await
            .context("find order by id")?
        else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![model]).await?.pop())
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), ApiError> {
        let page = page.clamped();
        let query = orders::Entity::find().filter(orders::Column::UserId.eq(Uuid::from(user_id)));
        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count user orders")?;
        let models = query
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list user orders")?;
        Ok((self.hydrate(models).await?, total))
    }

    async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<OrderWithOwner>, u64), ApiError> {
        let page = page.clamped();
        let mut query = orders::Entity::find();
        if let Some(status) = status {
            query = query.filter(orders::Column::CurrentStatus.eq(status.as_str()));
        }
        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count orders")?;
        let models = query
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list orders")?;

        let user_ids: Vec<Uuid> = models.iter().map(|m| m.user_id).collect();
        let owners: HashMap<Uuid, OrderOwner> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(user_ids))
                .all(&self.db)
                .await
                .context("load order owners")?
                .into_iter()
                .map(|u| {
                    (
                        u.id,
                        OrderOwner {
                            name: u.name,
                            email: u.email,
                        },
                    )
                })
                .collect()
        };

        let orders = self
            .hydrate(models)
            .await?
            .into_iter()
            .map(|order| {
                let owner = owners.get(&Uuid::from(order.user_id)).cloned();
                OrderWithOwner { order, owner }
            })
            .collect();
        Ok((orders, total))
    }

    async fn apply_status_change(
        &self,
        id: OrderId,
        change: &OrderStatusChange,
    ) -> Result<bool, ApiError> {
        // Guarded on the status the change was computed from, so only one of
        // two racing transitions lands.
        let mut update = orders::Entity::update_many()
            .col_expr(
                orders::Column::CurrentStatus,
                Expr::value(change.entry.status.as_str().to_owned()),
            )
            .col_expr(
                orders::Column::PaymentStatus,
                Expr::value(change.payment_status.as_str().to_owned()),
            )
            .col_expr(orders::Column::UpdatedAt, Expr::value(change.entry.timestamp));
        if let Some(at) = change.delivered_at {
            update = update.col_expr(orders::Column::DeliveredAt, Expr::value(at));
        }
        if let Some(at) = change.cancelled_at {
            update = update.col_expr(orders::Column::CancelledAt, Expr::value(at));
        }
        let update = update
            .filter(orders::Column::Id.eq(Uuid::from(id)))
            .filter(orders::Column::CurrentStatus.eq(change.from.as_str()));
        let entry = history_active_model(id, &change.entry);

        let applied = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                Box::pin(async move {
                    if update.exec(txn).await?.rows_affected == 0 {
                        return Ok(false);
                    }
                    entry.insert(txn).await?;
                    Ok(true)
                })
            })
            .await
            .context("apply order status change")?;
        Ok(applied)
    }

    async fn set_payment_id(&self, id: OrderId, payment_id: &str) -> Result<(), ApiError> {
        orders::ActiveModel {
            id: Set(id.into()),
            payment_id: Set(Some(payment_id.to_owned())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set order payment id")?;
        Ok(())
    }

    async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<(), ApiError> {
        orders::ActiveModel {
            id: Set(id.into()),
            payment_status: Set(status.as_str().to_owned()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set order payment status")?;
        Ok(())
    }
}

fn history_active_model(order_id: OrderId, entry: &StatusEntry) -> order_status_history::ActiveModel {
    order_status_history::ActiveModel {
        id: Set(Uuid::now_v7()),
        order_id: Set(order_id.into()),
        status: Set(entry.status.as_str().to_owned()),
        note: Set(entry.note.clone()),
        created_at: Set(entry.timestamp),
    }
}

fn order_from_models(
    model: orders::Model,
    items: Vec<order_items::Model>,
    history: Vec<order_status_history::Model>,
) -> Result<Order, ApiError> {
    let items = items
        .into_iter()
        .map(|item| {
            Ok(OrderItem {
                product_id: item.product_id.into(),
                title: item.title,
                price: item.price,
                qty: u32::try_from(item.qty).context("negative order quantity")?,
                image: item.image,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    let status_history = history
        .into_iter()
        .map(|entry| {
            Ok(StatusEntry {
                status: entry.status.parse().context("decode history status")?,
                note: entry.note,
                timestamp: entry.created_at,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Order {
        id: model.id.into(),
        user_id: model.user_id.into(),
        items,
        shipping_address: serde_json::from_value(model.shipping_address)
            .context("decode shipping address")?,
        payment_method: model.payment_method.parse().context("decode payment method")?,
        payment_status: model.payment_status.parse().context("decode payment status")?,
        payment_id: model.payment_id,
        price: PriceBreakdown {
            items_price: model.items_price,
            shipping_price: model.shipping_price,
            tax_price: model.tax_price,
            total_amount: model.total_amount,
        },
        status: model.current_status.parse().context("decode order status")?,
        status_history,
        delivered_at: model.delivered_at,
        cancelled_at: model.cancelled_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

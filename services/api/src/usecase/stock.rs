//! Stock reconciliation shared by checkout, cancellation and admin status changes.

use shopdeploy_domain::id::ProductId;

use crate::domain::repository::StockRepository;
use crate::domain::types::OrderItem;
use crate::error::ApiError;

/// Decrement stock for every item, all or nothing.
///
/// Each decrement is conditional on sufficient stock. On the first failure
/// every decrement already applied is given back before the error is returned.
pub async fn reserve_stock<S: StockRepository>(
    stock: &S,
    items: &[OrderItem],
) -> Result<(), ApiError> {
    let mut applied: Vec<(ProductId, u32)> = Vec::with_capacity(items.len());
    for item in items {
        let result = match stock.try_decrement(item.product_id, item.qty).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ApiError::InsufficientStock {
                product: item.title.clone(),
            }),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            compensate(stock, &applied).await;
            return Err(e);
        }
        applied.push((item.product_id, item.qty));
    }
    Ok(())
}

/// Give stock back for every line. Attempts all lines and returns the first error.
pub async fn restore_stock<S: StockRepository>(
    stock: &S,
    lines: &[(ProductId, u32)],
) -> Result<(), ApiError> {
    let mut first_error = None;
    for &(product_id, qty) in lines {
        if let Err(e) = stock.increment(product_id, qty).await {
            tracing::error!(product_id = %product_id, qty, error = %e, "stock restore failed");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Best-effort rollback of a partial reservation. Failures are logged; the
/// caller is already returning the error that triggered the rollback.
pub async fn compensate<S: StockRepository>(stock: &S, lines: &[(ProductId, u32)]) {
    if lines.is_empty() {
        return;
    }
    if restore_stock(stock, lines).await.is_err() {
        tracing::error!(lines = lines.len(), "stock compensation incomplete");
    }
}

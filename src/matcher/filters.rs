use crate::model::{ParsedQuery, Product};

/// Why a candidate request was passed over for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Request is already fulfilled.
    Closed,
    AboveMaxPrice,
    BelowMinPrice,
    PlatformMismatch,
}

/// Checks a product against a request's criteria. `None` means it passes.
#[inline]
pub fn rejection(criteria: &ParsedQuery, product: &Product, price: f64) -> Option<SkipReason> {
    if let Some(max) = criteria.max_price {
        if price > max as f64 {
            return Some(SkipReason::AboveMaxPrice);
        }
    }

    if criteria.min_price > 0 && price < criteria.min_price as f64 {
        return Some(SkipReason::BelowMinPrice);
    }

    if !criteria.platforms.is_empty() {
        let listed = product
            .platform
            .as_deref()
            .is_some_and(|platform| criteria.platforms.iter().any(|p| p == platform));
        if !listed {
            return Some(SkipReason::PlatformMismatch);
        }
    }

    None
}

/// Candidate pre-filter: the request's category must contain the product's
/// category, ignoring case. Not symmetric.
pub fn category_compatible(request_category: Option<&str>, product_category: &str) -> bool {
    match request_category {
        Some(category) => category
            .to_lowercase()
            .contains(&product_category.to_lowercase()),
        None => false,
    }
}

//! # Validation Module
//!
//! Input validation for Kiosco POS. Everything here runs before any storage
//! interaction.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (apps/api)                                    │
//! │  ├── JSON shape, decimal amounts with ≤ 2 fraction digits              │
//! │  └── Rejected with 400 before reaching the coordinator                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Line set not empty, quantities in range, prices ≥ 0               │
//! │  └── Dates, identifiers, free-text lengths                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity > 0)                          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kiosco_core::validation::{validate_quantity, parse_sale_date};
//!
//! validate_quantity(5).unwrap();
//! assert!(parse_sale_date("2024-13-01").is_err());
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::NewSale;
use crate::MAX_SALE_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_PAYMENT_METHOD_LEN: usize = 50;
const MAX_URL_LEN: usize = 2048;
const MAX_NOTES_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_NAME_LEN)
}

/// Validates a payment method ("efectivo", "tarjeta", ...).
///
/// The set of methods is open; only presence and length are checked.
pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    validate_required_text("payment_method", method, MAX_PAYMENT_METHOD_LEN)
}

/// Validates an optional receipt reference.
pub fn validate_ticket_url(url: Option<&str>) -> ValidationResult<()> {
    match url {
        Some(url) if url.len() > MAX_URL_LEN => Err(ValidationError::TooLong {
            field: "ticket_url".to_string(),
            max: MAX_URL_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates the free-text note of a stock movement.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(notes) if notes.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        }),
        _ => Ok(()),
    }
}

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity of a sale line.
///
/// Must be positive. The upper bound is the stock on hand, checked by the
/// ledger.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates the quantity of a stock-in.
///
/// Deliveries can be large, so only positivity is checked.
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a price (catalog price or line unit price).
///
/// Zero is allowed (free items, promotions).
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a `YYYY-MM-DD` date.
///
/// ```rust
/// use kiosco_core::validation::parse_sale_date;
///
/// let date = parse_sale_date("2024-03-15").unwrap();
/// assert_eq!(date.to_string(), "2024-03-15");
/// assert!(parse_sale_date("15/03/2024").is_err());
/// ```
pub fn parse_sale_date(input: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: "date".to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

// =============================================================================
// Sale Validators
// =============================================================================

/// Validates a sale request before it reaches storage.
///
/// ## Checks (in order)
/// 1. At least one line, at most MAX_SALE_LINES
/// 2. Payment method and ticket URL
/// 3. Every line: product id present, quantity > 0, price ≥ 0
/// 4. The total fits in i64 cents
///
/// Stock availability is NOT checked here; that needs the database.
pub fn validate_new_sale(sale: &NewSale) -> CoreResult<()> {
    if sale.lines.is_empty() {
        return Err(CoreError::EmptyLineSet);
    }
    if sale.lines.len() > MAX_SALE_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_SALE_LINES,
        });
    }

    validate_payment_method(&sale.payment_method)?;
    validate_ticket_url(sale.ticket_url.as_deref())?;

    for line in &sale.lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            }
            .into());
        }
        if validate_quantity(line.quantity).is_err() {
            return Err(CoreError::InvalidQuantity {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            });
        }
        validate_price("unit_price", line.unit_price)?;
    }

    if sale.total().is_none() {
        return Err(ValidationError::OutOfRange {
            field: "total_amount".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    Ok(())
}

/// Sums the requested quantity per product, keeping first-appearance order.
///
/// A sale may list the same product on several lines; stock must cover the
/// sum, not each line on its own.
pub fn requested_quantities(sale: &NewSale) -> Vec<(&str, i64)> {
    let mut totals: Vec<(&str, i64)> = Vec::new();
    for line in &sale.lines {
        match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => *qty += line.quantity,
            None => totals.push((line.product_id.as_str(), line.quantity)),
        }
    }
    totals
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewSaleLine;

    fn valid_sale() -> NewSale {
        NewSale::new("efectivo")
            .with_line(NewSaleLine::new("p1", 2, Money::from_cents(1000)))
            .with_line(NewSaleLine::new("p2", 1, Money::from_cents(500)))
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(5000).is_ok());
        assert!(validate_stock_quantity(0).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("price", Money::zero()).is_ok());
        assert!(validate_price("price", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_parse_sale_date() {
        assert!(parse_sale_date("2024-02-29").is_ok());
        assert!(parse_sale_date("2023-02-29").is_err());
        assert!(parse_sale_date("2024-1-5x").is_err());
        assert!(parse_sale_date("").is_err());
    }

    #[test]
    fn test_validate_payment_method() {
        assert!(validate_payment_method("tarjeta").is_ok());
        assert!(validate_payment_method("  ").is_err());
        assert!(validate_payment_method(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_valid_sale_passes() {
        assert!(validate_new_sale(&valid_sale()).is_ok());
    }

    #[test]
    fn test_empty_sale_rejected() {
        let err = validate_new_sale(&NewSale::new("efectivo")).unwrap_err();
        assert!(matches!(err, CoreError::EmptyLineSet));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let sale = valid_sale().with_line(NewSaleLine::new("p3", 0, Money::from_cents(100)));
        let err = validate_new_sale(&sale).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidQuantity { ref product_id, quantity: 0 } if product_id == "p3"
        ));
    }

    #[test]
    fn test_large_quantity_accepted() {
        let sale = NewSale::new("efectivo").with_line(NewSaleLine::new(
            "p1",
            1000,
            Money::from_cents(10),
        ));
        assert!(validate_new_sale(&sale).is_ok());
    }

    #[test]
    fn test_negative_price_rejected() {
        let sale = valid_sale().with_line(NewSaleLine::new("p3", 1, Money::from_cents(-100)));
        assert!(matches!(
            validate_new_sale(&sale).unwrap_err(),
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_too_many_lines_rejected() {
        let sale = (0..=MAX_SALE_LINES).fold(NewSale::new("efectivo"), |sale, i| {
            sale.with_line(NewSaleLine::new(format!("p{i}"), 1, Money::from_cents(100)))
        });
        assert!(matches!(
            validate_new_sale(&sale).unwrap_err(),
            CoreError::TooManyLines { max: MAX_SALE_LINES }
        ));
    }

    #[test]
    fn test_requested_quantities_merges_duplicates() {
        let sale = valid_sale().with_line(NewSaleLine::new("p1", 3, Money::from_cents(900)));
        assert_eq!(requested_quantities(&sale), vec![("p1", 5), ("p2", 1)]);
    }
}

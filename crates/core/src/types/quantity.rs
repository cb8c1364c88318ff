//! Purchase quantity rules.

use rust_decimal::Decimal;

/// Unit symbols that denote whole items.
const PIECE_UNIT_SYMBOLS: [&str; 3] = ["pc", "piece", "unit"];

/// Decimal places a quantity may carry.
pub const QUANTITY_SCALE: u32 = 3;

/// Largest quantity a single order line can hold.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 3);

/// Reasons a purchase quantity is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity must be greater than zero")]
    NotPositive,
    /// More decimal places than a line can store.
    #[error("quantity can have at most 3 decimal places")]
    TooPrecise,
    /// Above [`MAX_QUANTITY`].
    #[error("quantity must be less than 10000000")]
    TooLarge,
    /// Fractional quantity of a piece-priced product.
    #[error("Item '{product_name}' is sold per piece. You cannot buy fractional amounts.")]
    Fractional {
        /// Product display name.
        product_name: String,
    },
}

/// Whether a pricing unit symbol is counted in whole pieces.
///
/// ```
/// use sabzi_core::is_piece_unit;
///
/// assert!(is_piece_unit("pc"));
/// assert!(is_piece_unit("Piece"));
/// assert!(!is_piece_unit("kg"));
/// ```
#[must_use]
pub fn is_piece_unit(symbol: &str) -> bool {
    let symbol = symbol.trim();
    PIECE_UNIT_SYMBOLS
        .iter()
        .any(|piece| piece.eq_ignore_ascii_case(symbol))
}

/// Validate a purchase quantity against the product's pricing unit.
///
/// Products without a pricing unit skip the whole-piece rule.
///
/// # Errors
///
/// Returns [`QuantityError::NotPositive`] for quantities `<= 0`,
/// [`QuantityError::TooPrecise`] past [`QUANTITY_SCALE`] decimal places,
/// [`QuantityError::TooLarge`] above [`MAX_QUANTITY`] and
/// [`QuantityError::Fractional`] for non-integer quantities of a
/// piece-priced product.
pub fn validate_quantity(
    quantity: Decimal,
    unit_symbol: Option<&str>,
    product_name: &str,
) -> Result<(), QuantityError> {
    if quantity <= Decimal::ZERO {
        return Err(QuantityError::NotPositive);
    }

    // Trailing zeros are not precision: 1.5000 is fine.
    if quantity.normalize().scale() > QUANTITY_SCALE {
        return Err(QuantityError::TooPrecise);
    }

    if quantity > MAX_QUANTITY {
        return Err(QuantityError::TooLarge);
    }

    if unit_symbol.is_some_and(is_piece_unit) && !quantity.fract().is_zero() {
        return Err(QuantityError::Fractional {
            product_name: product_name.to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_rejects_fraction() {
        let err = validate_quantity(Decimal::new(15, 1), Some("pc"), "Organic Lemon").unwrap_err();
        assert_eq!(
            err,
            QuantityError::Fractional {
                product_name: "Organic Lemon".to_owned()
            }
        );
        assert!(err.to_string().contains("fractional"));
    }

    #[test]
    fn test_piece_accepts_whole_number_with_scale() {
        // 2.000 has a non-zero scale but no fractional part
        assert!(validate_quantity(Decimal::new(2000, 3), Some("unit"), "Egg").is_ok());
    }

    #[test]
    fn test_weight_unit_accepts_fraction() {
        assert!(validate_quantity(Decimal::new(25, 2), Some("kg"), "Onion").is_ok());
    }

    #[test]
    fn test_missing_unit_accepts_fraction() {
        assert!(validate_quantity(Decimal::new(5, 1), None, "Mystery").is_ok());
    }

    #[test]
    fn test_non_positive_rejected() {
        assert_eq!(
            validate_quantity(Decimal::ZERO, Some("kg"), "Onion"),
            Err(QuantityError::NotPositive)
        );
        assert_eq!(
            validate_quantity(Decimal::NEGATIVE_ONE, Some("pc"), "Lemon"),
            Err(QuantityError::NotPositive)
        );
    }

    #[test]
    fn test_max_quantity_fits_line_column() {
        assert_eq!(MAX_QUANTITY, Decimal::new(9_999_999_999, 3));
        assert!(validate_quantity(MAX_QUANTITY, Some("kg"), "Onion").is_ok());
    }

    #[test]
    fn test_oversized_quantity_rejected() {
        assert_eq!(
            validate_quantity(Decimal::new(10_000_000, 0), Some("kg"), "Onion"),
            Err(QuantityError::TooLarge)
        );
        assert_eq!(
            validate_quantity(Decimal::MAX, Some("pc"), "Lemon"),
            Err(QuantityError::TooLarge)
        );
    }

    #[test]
    fn test_excess_precision_rejected() {
        // would round to 0.000 in storage
        assert_eq!(
            validate_quantity(Decimal::new(4, 4), Some("kg"), "Onion"),
            Err(QuantityError::TooPrecise)
        );
        assert_eq!(
            validate_quantity(Decimal::new(12_345, 4), None, "Mystery"),
            Err(QuantityError::TooPrecise)
        );
        assert!(validate_quantity(Decimal::new(15_000, 4), Some("kg"), "Onion").is_ok());
        assert!(validate_quantity(Decimal::new(125, 3), Some("kg"), "Onion").is_ok());
    }
}

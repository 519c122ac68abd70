//! 數量運算（溢位時回傳錯誤）

use rust_decimal::Decimal;

use crate::{BomError, Result};

fn overflow(item_code: &str) -> BomError {
    BomError::QuantityOverflow {
        item_code: item_code.to_string(),
    }
}

/// 相乘
pub fn multiply(item_code: &str, lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_mul(rhs).ok_or_else(|| overflow(item_code))
}

/// 相加
pub fn add(item_code: &str, lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_add(rhs).ok_or_else(|| overflow(item_code))
}

/// 相除（除數為 0 亦視為溢位）
pub fn divide(item_code: &str, lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_div(rhs).ok_or_else(|| overflow(item_code))
}

/// 依百分比放大：`quantity × (1 + percentage/100)`
pub fn with_allowance(item_code: &str, quantity: Decimal, percentage: Decimal) -> Result<Decimal> {
    let factor = add(item_code, Decimal::ONE, divide(item_code, percentage, Decimal::ONE_HUNDRED)?)?;
    multiply(item_code, quantity, factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowance() {
        let quantity = with_allowance("FLAP-B", Decimal::from(200), Decimal::from(5)).unwrap();
        assert_eq!(quantity, Decimal::from(210));
    }

    #[test]
    fn test_overflow_names_item() {
        let err = multiply("FILM-RAW", Decimal::MAX, Decimal::from(2)).unwrap_err();
        assert_eq!(
            err,
            BomError::QuantityOverflow {
                item_code: "FILM-RAW".to_string()
            }
        );
        assert!(err.is_structural());
        assert!(add("FILM-RAW", Decimal::MAX, Decimal::MAX).is_err());
    }
}

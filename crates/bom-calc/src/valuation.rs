//! 加權平均成本與進貨價差

use bom_core::{quantity, BomError, Item, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 移動加權平均成本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedAverageCost {
    pub item_code: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
}

impl WeightedAverageCost {
    pub fn new(item_code: impl Into<String>) -> Self {
        Self {
            item_code: item_code.into(),
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
        }
    }

    /// 以期初庫存與成本建立
    pub fn with_opening(mut self, quantity: Decimal, average_cost: Decimal) -> Self {
        self.quantity = quantity;
        self.average_cost = average_cost;
        self
    }

    /// 進貨：新平均 = (庫存 × 平均 + 進貨量 × 單價) / (庫存 + 進貨量)
    pub fn apply_receipt(&mut self, quantity: Decimal, unit_price: Decimal) -> Result<Decimal> {
        if quantity <= Decimal::ZERO {
            return Err(BomError::InvalidQuantity {
                item_code: self.item_code.clone(),
                quantity,
            });
        }
        if unit_price < Decimal::ZERO {
            return Err(BomError::InvalidRecord(format!(
                "物料 {} 的進貨單價不可為負數: {}",
                self.item_code, unit_price
            )));
        }

        let code = self.item_code.as_str();
        let on_hand = self.quantity.max(Decimal::ZERO);
        let total_quantity = quantity::add(code, on_hand, quantity)?;
        let total_value = quantity::add(
            code,
            quantity::multiply(code, on_hand, self.average_cost)?,
            quantity::multiply(code, quantity, unit_price)?,
        )?;
        self.average_cost = quantity::divide(code, total_value, total_quantity)?;
        self.quantity = quantity::add(code, self.quantity, quantity)?;

        tracing::debug!(
            "物料 {} 進貨 {} @ {}，平均成本 {}",
            self.item_code,
            quantity,
            unit_price,
            self.average_cost
        );
        Ok(self.average_cost)
    }

    /// 發料：以目前平均成本扣減，回傳發料成本
    pub fn apply_issue(&mut self, quantity: Decimal) -> Result<Decimal> {
        if quantity <= Decimal::ZERO || quantity > self.quantity {
            return Err(BomError::InvalidQuantity {
                item_code: self.item_code.clone(),
                quantity,
            });
        }
        let cost = quantity::multiply(&self.item_code, quantity, self.average_cost)?;
        self.quantity -= quantity;
        Ok(cost)
    }

    /// 庫存價值
    pub fn inventory_value(&self) -> Result<Decimal> {
        quantity::multiply(&self.item_code, self.quantity, self.average_cost)
    }
}

/// 進貨價差
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceVariance {
    pub item_code: String,
    /// 比較基準（標準成本，無則為加權平均成本）
    pub reference_cost: Decimal,
    pub grn_price: Decimal,
    /// GRN 單價 - 基準
    pub variance: Decimal,
    /// 價差百分比（相對基準）
    pub variance_percentage: Decimal,
}

impl PriceVariance {
    /// 進貨價高於基準
    pub fn is_unfavorable(&self) -> bool {
        self.variance > Decimal::ZERO
    }
}

/// 進貨價差偵測器
pub struct PriceVarianceDetector;

impl PriceVarianceDetector {
    /// 比較 GRN 單價與物料成本，價差百分比超過門檻時回傳
    pub fn detect(item: &Item, grn_price: Decimal, threshold_percentage: Decimal) -> Option<PriceVariance> {
        let reference_cost = item
            .costs
            .standard_cost
            .or(item.costs.weighted_average_cost)
            .filter(|cost| !cost.is_zero())?;

        let variance = grn_price - reference_cost;
        let variance_percentage = variance / reference_cost * Decimal::ONE_HUNDRED;

        if variance_percentage.abs() <= threshold_percentage {
            return None;
        }

        tracing::warn!(
            "物料 {} 進貨價差 {}%（GRN {}，基準 {}）",
            item.item_code,
            variance_percentage.round_dp(2),
            grn_price,
            reference_cost
        );

        Some(PriceVariance {
            item_code: item.item_code.clone(),
            reference_cost,
            grn_price,
            variance,
            variance_percentage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bom_core::ItemType;
    use rstest::rstest;

    #[test]
    fn test_weighted_average_receipts() {
        let mut wac = WeightedAverageCost::new("FILM-RAW");
        wac.apply_receipt(Decimal::from(100), Decimal::from(4)).unwrap();
        let average = wac.apply_receipt(Decimal::from(100), Decimal::from(6)).unwrap();

        assert_eq!(average, Decimal::from(5));
        assert_eq!(wac.quantity, Decimal::from(200));
        assert_eq!(wac.inventory_value().unwrap(), Decimal::from(1000));
    }

    #[test]
    fn test_issue_keeps_average() {
        let mut wac = WeightedAverageCost::new("FILM-RAW").with_opening(Decimal::from(50), Decimal::from(5));

        let cost = wac.apply_issue(Decimal::from(20)).unwrap();

        assert_eq!(cost, Decimal::from(100));
        assert_eq!(wac.quantity, Decimal::from(30));
        assert_eq!(wac.average_cost, Decimal::from(5));
    }

    #[rstest]
    #[case(Decimal::ZERO, Decimal::from(4))]
    #[case(Decimal::from(-10), Decimal::from(4))]
    fn test_invalid_receipt_quantity(#[case] quantity: Decimal, #[case] price: Decimal) {
        let mut wac = WeightedAverageCost::new("FILM-RAW");
        assert!(matches!(
            wac.apply_receipt(quantity, price),
            Err(BomError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut wac = WeightedAverageCost::new("FILM-RAW");
        assert!(wac.apply_receipt(Decimal::ONE, Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_over_issue_rejected() {
        let mut wac = WeightedAverageCost::new("FILM-RAW").with_opening(Decimal::from(5), Decimal::ONE);
        assert!(wac.apply_issue(Decimal::from(6)).is_err());
        assert_eq!(wac.quantity, Decimal::from(5));
    }

    #[rstest]
    #[case(Decimal::from(11), Decimal::from(5), true)]
    #[case(Decimal::new(104, 1), Decimal::from(5), false)]
    #[case(Decimal::from(9), Decimal::from(5), true)]
    fn test_price_variance(#[case] grn_price: Decimal, #[case] threshold: Decimal, #[case] flagged: bool) {
        let item = Item::new("FLAP-B", "Flap", "pcs", ItemType::RawMaterial).with_standard_cost(Decimal::from(10));

        let variance = PriceVarianceDetector::detect(&item, grn_price, threshold);

        assert_eq!(variance.is_some(), flagged);
    }

    #[test]
    fn test_variance_falls_back_to_weighted_average() {
        let item = Item::new("INK-RED", "Ink", "kg", ItemType::Consumable)
            .with_weighted_average_cost(Decimal::from(8));

        let variance = PriceVarianceDetector::detect(&item, Decimal::from(10), Decimal::from(10)).unwrap();

        assert_eq!(variance.reference_cost, Decimal::from(8));
        assert_eq!(variance.variance, Decimal::from(2));
        assert_eq!(variance.variance_percentage, Decimal::from(25));
        assert!(variance.is_unfavorable());
    }

    #[test]
    fn test_no_reference_cost() {
        let item = Item::new("TRIM", "Trim", "kg", ItemType::RawMaterial);
        assert!(PriceVarianceDetector::detect(&item, Decimal::from(10), Decimal::ZERO).is_none());
    }
}

//! 單位換算

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{quantity, BomError, Result};

/// 單位換算係數：1 `from_uom` = `factor` `to_uom`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitConversion {
    pub from_uom: String,
    pub to_uom: String,
    pub factor: Decimal,
}

impl UnitConversion {
    pub fn new(from_uom: impl Into<String>, to_uom: impl Into<String>, factor: Decimal) -> Self {
        Self {
            from_uom: from_uom.into(),
            to_uom: to_uom.into(),
            factor,
        }
    }

    /// 驗證換算係數
    pub fn validate(&self) -> Result<()> {
        if self.factor <= Decimal::ZERO {
            return Err(BomError::Config(format!(
                "單位換算 {} -> {} 的係數必須大於 0: {}",
                self.from_uom, self.to_uom, self.factor
            )));
        }
        Ok(())
    }
}

/// 單位換算器
///
/// 只使用已配置的換算（或其精確倒數），找不到時回傳 `UnitMismatch`，
/// 絕不假設 1:1。
#[derive(Debug, Clone, Default)]
pub struct UnitConverter {
    factors: HashMap<(String, String), Decimal>,
}

impl UnitConverter {
    /// 創建空的換算器（只支援同單位）
    pub fn new() -> Self {
        Self::default()
    }

    /// 從換算表建立
    pub fn from_conversions<'a>(conversions: impl IntoIterator<Item = &'a UnitConversion>) -> Result<Self> {
        let mut converter = Self::new();
        for conversion in conversions {
            converter.add(conversion)?;
        }
        Ok(converter)
    }

    /// 添加換算（同一組單位後加入者覆蓋先前的）
    pub fn add(&mut self, conversion: &UnitConversion) -> Result<()> {
        conversion.validate()?;
        self.factors.insert(
            (normalize(&conversion.from_uom), normalize(&conversion.to_uom)),
            conversion.factor,
        );
        Ok(())
    }

    /// 已配置的換算數量
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// 查詢換算係數
    pub fn factor(&self, from_uom: &str, to_uom: &str) -> Option<Decimal> {
        let from = normalize(from_uom);
        let to = normalize(to_uom);

        if from == to {
            return Some(Decimal::ONE);
        }

        if let Some(factor) = self.factors.get(&(from.clone(), to.clone())) {
            return Some(*factor);
        }

        // 只配置了反方向時使用倒數
        self.factors
            .get(&(to, from))
            .map(|inverse| Decimal::ONE / *inverse)
    }

    /// 換算數量
    ///
    /// `item_code` 只用於錯誤訊息。
    pub fn convert(&self, item_code: &str, quantity: Decimal, from_uom: &str, to_uom: &str) -> Result<Decimal> {
        let factor = self
            .factor(from_uom, to_uom)
            .ok_or_else(|| BomError::UnitMismatch {
                item_code: item_code.to_string(),
                from_uom: from_uom.to_string(),
                to_uom: to_uom.to_string(),
            })?;
        quantity::multiply(item_code, quantity, factor)
    }
}

fn normalize(uom: &str) -> String {
    uom.trim().to_ascii_lowercase()
}

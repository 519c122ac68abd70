//! 缺料記錄模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 缺料嚴重度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortageSeverity {
    /// 不缺料
    None,
    /// 一般缺料
    Minor,
    /// 關鍵物料缺料
    Critical,
}

/// 建議處置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "item_code")]
pub enum SuggestedAction {
    /// 無需處置
    None,
    /// 下單採購
    Order,
    /// 使用替代料
    Substitute(String),
    /// 上報（關鍵物料且無替代料可用）
    Escalate,
}

/// 缺料記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageRecord {
    /// 物料代碼
    pub item_code: String,

    /// 需求量
    pub required_quantity: Decimal,

    /// 可用量
    pub available_quantity: Decimal,

    /// 缺料量 = max(0, 需求 - 可用)
    pub shortage_quantity: Decimal,

    /// 嚴重度
    pub severity: ShortageSeverity,

    /// 建議處置
    pub suggested_action: SuggestedAction,
}

impl ShortageRecord {
    /// 計算缺料量與嚴重度（處置預設為下單或上報）
    pub fn evaluate(
        item_code: impl Into<String>,
        required_quantity: Decimal,
        available_quantity: Decimal,
        is_critical: bool,
    ) -> Self {
        let shortage_quantity = (required_quantity - available_quantity).max(Decimal::ZERO);

        let (severity, suggested_action) = if shortage_quantity.is_zero() {
            (ShortageSeverity::None, SuggestedAction::None)
        } else if is_critical {
            (ShortageSeverity::Critical, SuggestedAction::Escalate)
        } else {
            (ShortageSeverity::Minor, SuggestedAction::Order)
        };

        Self {
            item_code: item_code.into(),
            required_quantity,
            available_quantity,
            shortage_quantity,
            severity,
            suggested_action,
        }
    }

    /// 是否缺料
    pub fn is_short(&self) -> bool {
        self.shortage_quantity > Decimal::ZERO
    }

    /// 建議使用的替代料
    pub fn substitute(&self) -> Option<&str> {
        match &self.suggested_action {
            SuggestedAction::Substitute(code) => Some(code),
            _ => None,
        }
    }
}

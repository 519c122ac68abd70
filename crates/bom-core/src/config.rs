//! 展開引擎配置模型（每個組織一份）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bom::BomTieBreak;
use crate::units::UnitConversion;
use crate::{BomError, Result};

/// 計價方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationPolicy {
    /// 標準成本
    #[default]
    StandardCost,
    /// 加權平均成本
    WeightedAverage,
    /// 最近進貨單價
    LastGrnPrice,
}

/// 展開引擎配置
///
/// 以明確的物件傳入引擎，不讀取任何全域狀態。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 組織ID
    pub organization_id: String,

    /// 計價方式
    pub valuation_policy: ValuationPolicy,

    /// 預設損耗率（%），用於未設定損耗率的明細
    pub default_waste_percentage: Decimal,

    /// 最大展開層數
    pub max_depth: usize,

    /// 預設顯示精度
    pub display_precision: u32,

    /// 多個生效版本時的判定規則
    pub bom_tie_break: BomTieBreak,

    /// 單位換算表
    pub unit_conversions: Vec<UnitConversion>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("DEFAULT")
    }
}

impl EngineConfig {
    /// 預設最大展開層數
    pub const DEFAULT_MAX_DEPTH: usize = 20;

    /// 創建新的引擎配置
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            valuation_policy: ValuationPolicy::StandardCost,
            default_waste_percentage: Decimal::ZERO,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            display_precision: 2,
            bom_tie_break: BomTieBreak::MostRecentEffectiveFrom,
            unit_conversions: Vec::new(),
        }
    }

    /// 建構器模式：設置計價方式
    pub fn with_valuation_policy(mut self, policy: ValuationPolicy) -> Self {
        self.valuation_policy = policy;
        self
    }

    /// 建構器模式：設置預設損耗率
    pub fn with_default_waste_percentage(mut self, waste: Decimal) -> Self {
        self.default_waste_percentage = waste;
        self
    }

    /// 建構器模式：設置最大展開層數
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 建構器模式：設置顯示精度
    pub fn with_display_precision(mut self, precision: u32) -> Self {
        self.display_precision = precision;
        self
    }

    /// 建構器模式：設置版本判定規則
    pub fn with_bom_tie_break(mut self, tie_break: BomTieBreak) -> Self {
        self.bom_tie_break = tie_break;
        self
    }

    /// 建構器模式：添加單位換算
    pub fn with_unit_conversion(mut self, conversion: UnitConversion) -> Self {
        self.unit_conversions.push(conversion);
        self
    }

    /// 從 JSON 字串載入並驗證
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BomError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 從 JSON 檔案載入並驗證
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BomError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// 驗證配置
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(BomError::Config("max_depth 必須大於 0".to_string()));
        }
        if self.default_waste_percentage < Decimal::ZERO
            || self.default_waste_percentage > Decimal::ONE_HUNDRED
        {
            return Err(BomError::Config(format!(
                "default_waste_percentage 必須介於 0 與 100 之間: {}",
                self.default_waste_percentage
            )));
        }
        if self.display_precision > 10 {
            return Err(BomError::Config(format!(
                "display_precision 過大: {}",
                self.display_precision
            )));
        }
        for conversion in &self.unit_conversions {
            conversion.validate()?;
        }
        Ok(())
    }
}

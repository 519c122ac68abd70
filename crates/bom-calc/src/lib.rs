//! # BOM Calculation Engine
//!
//! BOM 展開、缺料偵測與成本彙總

pub mod costing;
pub mod explosion;
pub mod shortage;
pub mod stage;
pub mod valuation;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export 主要類型
pub use costing::{CostLine, CostRollup, CostRollupResult, CostTreeResult};
pub use explosion::BomExplosionEngine;
pub use shortage::{ShortageDetector, ShortageSummary};
pub use stage::{StageRequirement, StageRequirementCalculator};
pub use valuation::{PriceVariance, PriceVarianceDetector, WeightedAverageCost};

use bom_core::{quantity, ExplosionResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 展開請求的根物料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionRoot {
    pub item_code: String,
    pub quantity: Decimal,
}

/// BOM 展開結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    /// 展開的根物料與數量
    pub roots: Vec<ExplosionRoot>,

    /// 展開基準日
    pub as_of: NaiveDate,

    /// 需求列（每個葉節點物料一筆）
    pub results: Vec<ExplosionResult>,

    /// 警告信息
    pub warnings: Vec<BomWarning>,

    /// BOM 圖涵蓋的所有物料
    pub graph_items: Vec<String>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl Explosion {
    /// 創建空的展開結果
    pub fn empty(as_of: NaiveDate) -> Self {
        Self {
            roots: Vec::new(),
            as_of,
            results: Vec::new(),
            warnings: Vec::new(),
            graph_items: Vec::new(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: BomWarning) {
        self.warnings.push(warning);
    }

    /// 查找某物料的需求列
    pub fn find(&self, item_code: &str) -> Option<&ExplosionResult> {
        self.results.iter().find(|r| r.item_code == item_code)
    }

    /// 根物料的總產出數量
    pub fn output_quantity(&self) -> bom_core::Result<Decimal> {
        self.roots
            .iter()
            .try_fold(Decimal::ZERO, |sum, r| quantity::add(&r.item_code, sum, r.quantity))
    }

    /// 依引擎計價方式的總物料成本
    pub fn total_cost(&self) -> bom_core::Result<Decimal> {
        self.results
            .iter()
            .try_fold(Decimal::ZERO, |sum, r| quantity::add(&r.item_code, sum, r.total_cost))
    }

    /// 圖中是否包含某物料
    pub fn touches(&self, item_code: &str) -> bool {
        self.graph_items.iter().any(|code| code == item_code)
    }
}

/// BOM 警告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomWarning {
    pub item_code: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl BomWarning {
    pub fn new(item_code: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            item_code,
            message,
            severity,
        }
    }

    pub fn warning(item_code: String, message: String) -> Self {
        Self::new(item_code, message, WarningSeverity::Warning)
    }

    /// 成本缺漏（以 0 計，不中止計算）
    pub fn cost_unavailable(item_code: &str, policy: bom_core::ValuationPolicy) -> Self {
        Self::warning(
            item_code.to_string(),
            format!("無法取得 {:?} 成本，以 0 計", policy),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warning,
}

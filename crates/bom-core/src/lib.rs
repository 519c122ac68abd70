//! # BOM Core
//!
//! 核心資料模型、主檔存取介面與類型定義

pub mod bom;
pub mod catalog;
pub mod config;
pub mod inventory;
pub mod item;
pub mod memory;
pub mod quantity;
pub mod records;
pub mod requirement;
pub mod shortage;
pub mod units;

// Re-export 主要類型
pub use bom::{
    select_active_bom, ActiveBom, ApprovalStatus, BomComponent, BomMaster, BomTieBreak,
    ConsumptionType,
};
pub use catalog::{ItemCatalog, LevelLoad, MasterDataSource};
pub use config::{EngineConfig, ValuationPolicy};
pub use inventory::{InMemoryStock, Inventory, StockLookup};
pub use item::{Item, ItemCosts, ItemType};
pub use memory::InMemoryMasterData;
pub use records::{BomComponentRecord, BomMasterRecord, ItemRecord};
pub use requirement::{ExplosionResult, StageQuantity};
pub use shortage::{ShortageRecord, ShortageSeverity, SuggestedAction};
pub use units::{UnitConversion, UnitConverter};

/// BOM 錯誤類型
///
/// 結構性錯誤（找不到、歧義、循環、單位不符、層級超限）會中止整個展開，
/// 不會回傳部分結果。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BomError {
    #[error("找不到物料: {0}")]
    ItemNotFound(String),

    #[error("物料 {item_code} 在 {as_of} 沒有生效的 BOM")]
    NoActiveBom {
        item_code: String,
        as_of: chrono::NaiveDate,
    },

    #[error("物料 {item_code} 有多個生效 BOM 無法判定: {candidates:?}")]
    AmbiguousBom {
        item_code: String,
        candidates: Vec<String>,
    },

    #[error("BOM 存在循環引用: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("物料 {item_code} 無法由 {from_uom} 換算為 {to_uom}")]
    UnitMismatch {
        item_code: String,
        from_uom: String,
        to_uom: String,
    },

    #[error("物料 {item_code} 位於第 {depth} 層，超過上限 {limit} 層")]
    DepthLimitExceeded {
        item_code: String,
        depth: usize,
        limit: usize,
    },

    #[error("BOM 資料無效 ({item_code}): {reason}")]
    InvalidBom { item_code: String, reason: String },

    #[error("無效的數量 ({item_code}): {quantity}")]
    InvalidQuantity {
        item_code: String,
        quantity: rust_decimal::Decimal,
    },

    #[error("物料 {item_code} 的數量計算溢位")]
    QuantityOverflow { item_code: String },

    #[error("記錄格式錯誤: {0}")]
    InvalidRecord(String),

    #[error("主檔資料來源錯誤: {0}")]
    DataSource(String),

    #[error("庫存查詢錯誤: {0}")]
    StockLookup(String),

    #[error("配置錯誤: {0}")]
    Config(String),
}

impl BomError {
    /// 是否為結構性錯誤（會中止展開）
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            BomError::ItemNotFound(_)
                | BomError::NoActiveBom { .. }
                | BomError::AmbiguousBom { .. }
                | BomError::Cycle { .. }
                | BomError::UnitMismatch { .. }
                | BomError::DepthLimitExceeded { .. }
                | BomError::QuantityOverflow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_path() {
        let err = BomError::Cycle {
            path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(err.to_string(), "BOM 存在循環引用: A -> B -> A");
        assert!(err.is_structural());
    }

    #[test]
    fn test_config_error_is_not_structural() {
        assert!(!BomError::Config("max_depth".to_string()).is_structural());
    }
}

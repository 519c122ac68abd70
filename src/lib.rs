//! # BOM
//!
//! 多階 BOM 展開、缺料偵測與成本彙總
//!
//! ```no_run
//! use bom::prelude::*;
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! # fn main() -> bom::bom_core::Result<()> {
//! let source = InMemoryMasterData::new();
//! let engine = BomExplosionEngine::new(&source, EngineConfig::default());
//! let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
//! let explosion = engine.explode("CARTON-A", Decimal::from(100), as_of)?;
//! let shortages = ShortageDetector::detect(&explosion.results, &InMemoryStock::new())?;
//! # let _ = shortages;
//! # Ok(())
//! # }
//! ```

pub use bom_cache;
pub use bom_calc;
pub use bom_core;
pub use bom_graph;

/// 常用類型
pub mod prelude {
    pub use bom_cache::ExplosionCache;
    pub use bom_calc::{
        BomExplosionEngine, BomWarning, CostRollup, CostRollupResult, CostTreeResult, Explosion,
        ShortageDetector, ShortageSummary, StageRequirementCalculator,
    };
    pub use bom_core::{
        BomComponent, BomError, BomMaster, EngineConfig, ExplosionResult, InMemoryMasterData,
        InMemoryStock, Item, ItemType, MasterDataSource, ShortageRecord, ShortageSeverity,
        StockLookup, SuggestedAction, UnitConversion, ValuationPolicy,
    };
    pub use bom_graph::BomGraph;
}

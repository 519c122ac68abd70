//! 展開結果緩存

use bom_calc::{BomExplosionEngine, Explosion};
use bom_core::{EngineConfig, MasterDataSource, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::dirty_tracking::DirtyTracker;

/// 緩存鍵：根物料與數量（依請求順序）+ 基準日 + 引擎配置
///
/// 配置中的損耗率、計價方式、換算表等都會影響結果，不同配置不共用緩存。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    roots: Vec<(String, Decimal)>,
    as_of: NaiveDate,
    config: EngineConfig,
}

impl CacheKey {
    pub fn new(requests: &[(String, Decimal)], as_of: NaiveDate, config: &EngineConfig) -> Self {
        Self {
            roots: requests
                .iter()
                .map(|(code, quantity)| (code.clone(), quantity.normalize()))
                .collect(),
            as_of,
            config: config.clone(),
        }
    }
}

/// 緩存統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// 展開結果緩存
///
/// 主檔異動時以 `mark_dirty` 記錄物料，`invalidate_dirty` 會移除所有
/// 圖中包含髒物料的展開結果。
#[derive(Debug, Default)]
pub struct ExplosionCache {
    entries: HashMap<CacheKey, Explosion>,
    dirty: DirtyTracker,
    stats: CacheStats,
}

impl ExplosionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查詢緩存
    pub fn get(
        &mut self,
        requests: &[(String, Decimal)],
        as_of: NaiveDate,
        config: &EngineConfig,
    ) -> Option<Explosion> {
        let key = CacheKey::new(requests, as_of, config);
        match self.entries.get(&key) {
            Some(explosion) => {
                self.stats.hits += 1;
                Some(explosion.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// 寫入緩存
    pub fn insert(
        &mut self,
        requests: &[(String, Decimal)],
        as_of: NaiveDate,
        config: &EngineConfig,
        explosion: Explosion,
    ) {
        self.entries.insert(CacheKey::new(requests, as_of, config), explosion);
    }

    /// 命中則回傳緩存，否則計算並寫入（計算失敗不寫入）
    pub fn get_or_compute<F>(
        &mut self,
        requests: &[(String, Decimal)],
        as_of: NaiveDate,
        config: &EngineConfig,
        compute: F,
    ) -> Result<Explosion>
    where
        F: FnOnce() -> Result<Explosion>,
    {
        self.invalidate_dirty();
        if let Some(cached) = self.get(requests, as_of, config) {
            tracing::debug!("展開緩存命中：{} 個根物料", requests.len());
            return Ok(cached);
        }

        let explosion = compute()?;
        self.insert(requests, as_of, config, explosion.clone());
        Ok(explosion)
    }

    /// 以引擎計算（透過緩存）
    pub fn explode_batch<S: MasterDataSource>(
        &mut self,
        engine: &BomExplosionEngine<S>,
        requests: &[(String, Decimal)],
        as_of: NaiveDate,
    ) -> Result<Explosion> {
        self.get_or_compute(requests, as_of, engine.config(), || engine.explode_batch(requests, as_of))
    }

    /// 標記異動物料
    pub fn mark_dirty(&mut self, item_code: impl Into<String>) {
        self.dirty.mark_dirty(item_code);
    }

    /// 移除圖中包含髒物料的展開結果，回傳移除筆數
    pub fn invalidate_dirty(&mut self) -> usize {
        if self.dirty.is_empty() {
            return 0;
        }

        let before = self.entries.len();
        let dirty = &self.dirty;
        self.entries
            .retain(|_, explosion| !dirty.any_dirty(explosion.graph_items.iter()));
        let removed = before - self.entries.len();

        tracing::debug!(
            "髒物料 {:?}，移除展開緩存 {} 筆",
            self.dirty.dirty_items(),
            removed
        );
        self.dirty.clear();
        self.stats.invalidations += removed as u64;
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

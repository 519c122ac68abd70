//! BOM 展開引擎

use bom_core::{
    quantity, BomError, EngineConfig, ExplosionResult, ItemCatalog, MasterDataSource,
    UnitConverter,
};
use bom_graph::{BomGraph, NodeIndex};
use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::{BomWarning, Explosion, ExplosionRoot};

/// BOM 展開引擎
///
/// 每次呼叫各自建立 BOM 圖與結果，不持有可變共享狀態。
pub struct BomExplosionEngine<S> {
    /// 物料目錄（主檔資料來源）
    catalog: ItemCatalog<S>,

    /// 引擎配置
    config: EngineConfig,
}

impl<S: MasterDataSource> BomExplosionEngine<S> {
    /// 創建新的展開引擎
    pub fn new(source: S, config: EngineConfig) -> Self {
        let catalog = ItemCatalog::new(source, config.bom_tie_break);
        Self { catalog, config }
    }

    /// 獲取引擎配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 獲取物料目錄
    pub fn catalog(&self) -> &ItemCatalog<S> {
        &self.catalog
    }

    /// 建立單位換算器（配置 + 資料來源的組織換算表，資料來源優先）
    pub fn unit_converter(&self) -> bom_core::Result<UnitConverter> {
        let mut converter = UnitConverter::from_conversions(&self.config.unit_conversions)?;
        for conversion in self
            .catalog
            .source()
            .get_unit_conversions(&self.config.organization_id)?
        {
            converter.add(&conversion)?;
        }
        Ok(converter)
    }

    /// 建構 BOM 圖
    pub fn build_graph(&self, root_codes: &[String], as_of: NaiveDate) -> bom_core::Result<BomGraph> {
        BomGraph::build_many(&self.catalog, root_codes, as_of, self.config.max_depth)
    }

    /// 展開單一物料
    pub fn explode(
        &self,
        item_code: &str,
        quantity: Decimal,
        as_of: NaiveDate,
    ) -> bom_core::Result<Explosion> {
        self.explode_batch(&[(item_code.to_string(), quantity)], as_of)
    }

    /// 批次展開多個根物料，相同物料合併為一筆
    ///
    /// 任何結構性錯誤都會中止整個展開，不回傳部分結果。
    pub fn explode_batch(
        &self,
        requests: &[(String, Decimal)],
        as_of: NaiveDate,
    ) -> bom_core::Result<Explosion> {
        tracing::info!("開始 BOM 展開：根物料 {} 筆，基準日 {}", requests.len(), as_of);
        let start_time = std::time::Instant::now();

        self.config.validate()?;
        for (item_code, quantity) in requests {
            if *quantity <= Decimal::ZERO {
                return Err(BomError::InvalidQuantity {
                    item_code: item_code.clone(),
                    quantity: *quantity,
                });
            }
        }

        // Step 1: 建構 BOM 圖（逐層批次載入）
        tracing::debug!("Step 1: 建構 BOM 圖");
        let root_codes: Vec<String> = requests.iter().map(|(code, _)| code.clone()).collect();
        let graph = self.build_graph(&root_codes, as_of)?;
        let converter = self.unit_converter()?;

        // Step 2: 各根物料獨立展開（可平行）
        tracing::debug!("Step 2: 展開 {} 個根物料", requests.len());
        let per_root: Vec<Vec<ExplosionResult>> = requests
            .par_iter()
            .map(|(item_code, quantity)| {
                let root = graph
                    .arena()
                    .find_node(item_code)
                    .ok_or_else(|| BomError::ItemNotFound(item_code.clone()))?;
                self.walk(&graph, &converter, root, *quantity)
            })
            .collect::<bom_core::Result<Vec<_>>>()?;

        // Step 3: 依請求順序合併
        tracing::debug!("Step 3: 合併需求");
        let mut results: Vec<ExplosionResult> = Vec::new();
        let mut row_index: HashMap<String, usize> = HashMap::new();
        for rows in per_root {
            for row in rows {
                match row_index.get(&row.item_code) {
                    Some(&idx) => results[idx].merge(row)?,
                    None => {
                        row_index.insert(row.item_code.clone(), results.len());
                        results.push(row);
                    }
                }
            }
        }

        // Step 4: 成本
        tracing::debug!("Step 4: 計價 ({:?})", self.config.valuation_policy);
        let mut explosion = Explosion::empty(as_of);
        for row in &mut results {
            if !row.apply_valuation(self.config.valuation_policy)? {
                tracing::warn!("物料 {} 缺少成本資料，以 0 計", row.item_code);
                explosion.add_warning(BomWarning::cost_unavailable(
                    &row.item_code,
                    self.config.valuation_policy,
                ));
            }
        }

        explosion.roots = requests
            .iter()
            .map(|(item_code, quantity)| ExplosionRoot {
                item_code: item_code.clone(),
                quantity: *quantity,
            })
            .collect();
        explosion.results = results;
        explosion.graph_items = graph.item_codes();
        explosion.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!(
            "BOM 展開完成，需求物料 {} 筆，耗時 {:?}",
            explosion.results.len(),
            start_time.elapsed()
        );

        Ok(explosion)
    }

    /// 展開單一根物料
    ///
    /// 依拓撲順序（父件先於子件）傳遞生產數量，每個節點只處理一次：
    /// 子件用量 = 單位用量 × 父件數量 × (1 + 損耗率/100)，再換算為子件庫存單位。
    /// 可展開的子件累加為其生產數量，葉節點累加為需求列。
    fn walk(
        &self,
        graph: &BomGraph,
        converter: &UnitConverter,
        root: NodeIndex,
        quantity: Decimal,
    ) -> bom_core::Result<Vec<ExplosionResult>> {
        let arena = graph.arena();
        let default_waste = self.config.default_waste_percentage;

        let mut build_quantity: HashMap<NodeIndex, Decimal> = HashMap::new();
        let root_quantity = match arena.node(root).and_then(|n| n.bom.as_ref().map(|bom| (n, bom))) {
            Some((node, bom)) => quantity::multiply(node.item_code(), quantity, bom.master.header_multiplier()?)?,
            None => quantity,
        };
        build_quantity.insert(root, root_quantity);

        let mut rows: Vec<ExplosionResult> = Vec::new();
        let mut row_index: HashMap<NodeIndex, usize> = HashMap::new();

        for &idx in graph.topological_order().iter().rev() {
            let parent_quantity = match build_quantity.get(&idx) {
                Some(q) => *q,
                None => continue,
            };

            for (child_idx, component) in arena.children(idx) {
                let child = arena
                    .node(child_idx)
                    .ok_or_else(|| BomError::ItemNotFound(component.component_item_code.clone()))?;

                let waste = component.effective_waste(default_waste);
                let code = child.item_code();
                let effective_quantity = quantity::with_allowance(
                    code,
                    quantity::multiply(code, component.quantity_per_unit, parent_quantity)?,
                    waste,
                )?;
                let stock_quantity = converter.convert(
                    child.item_code(),
                    effective_quantity,
                    &component.uom,
                    &child.item.unit_of_measure,
                )?;

                match &child.bom {
                    Some(bom) => {
                        let build = quantity::multiply(code, stock_quantity, bom.master.header_multiplier()?)?;
                        let total = build_quantity.entry(child_idx).or_insert(Decimal::ZERO);
                        *total = quantity::add(code, *total, build)?;
                    }
                    None => {
                        let row_idx = *row_index.entry(child_idx).or_insert_with(|| {
                            let precision = child
                                .item
                                .display_precision
                                .unwrap_or(self.config.display_precision);
                            rows.push(ExplosionResult::new(&child.item).with_display_precision(precision));
                            rows.len() - 1
                        });
                        let stage = component
                            .stage_id
                            .as_deref()
                            .map(|stage_id| (stage_id, component.stage_sequence));
                        rows[row_idx].accumulate(
                            stock_quantity,
                            stage,
                            component.is_critical,
                            &component.substitute_items,
                        )?;
                    }
                }
            }
        }

        Ok(rows)
    }
}

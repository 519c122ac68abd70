//! 物料成本彙總

use bom_core::{quantity, ExplosionResult, Result, UnitConverter, ValuationPolicy};
use bom_graph::BomGraph;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{BomWarning, Explosion};

/// 成本明細（每個需求物料一筆）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub item_code: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    /// 是否取得成本（否則以 0 計）
    pub cost_available: bool,
}

/// 成本彙總結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRollupResult {
    /// 計價方式
    pub policy: ValuationPolicy,

    /// 每單位產出的物料成本
    pub unit_cost: Decimal,

    /// 總物料成本
    pub total_cost: Decimal,

    /// 成本明細
    pub lines: Vec<CostLine>,

    /// 成本缺漏警告
    pub warnings: Vec<BomWarning>,
}

/// 逐物料單位成本（由下而上）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostTreeResult {
    /// 計價方式
    pub policy: ValuationPolicy,

    /// 每個物料的單位物料成本
    pub unit_costs: HashMap<String, Decimal>,

    /// 葉節點成本缺漏警告
    pub warnings: Vec<BomWarning>,
}

impl CostTreeResult {
    /// 查詢物料的單位成本
    pub fn unit_cost(&self, item_code: &str) -> Option<Decimal> {
        self.unit_costs.get(item_code).copied()
    }
}

/// 成本彙總計算器
pub struct CostRollup;

impl CostRollup {
    /// 依計價方式彙總需求列成本
    ///
    /// 總成本 = Σ 需求量 × 單位成本；單位成本 = 總成本 / 產出數量。
    /// 缺少成本的物料以 0 計並產生警告。
    pub fn rollup(
        results: &[ExplosionResult],
        policy: ValuationPolicy,
        output_quantity: Decimal,
    ) -> Result<CostRollupResult> {
        let mut lines = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();
        let mut total_cost = Decimal::ZERO;

        for result in results {
            let resolved = result.costs.resolve(policy);
            if resolved.is_none() {
                tracing::warn!("物料 {} 缺少 {:?} 成本，以 0 計", result.item_code, policy);
                warnings.push(BomWarning::cost_unavailable(&result.item_code, policy));
            }
            let unit_cost = resolved.unwrap_or(Decimal::ZERO);
            let line_cost = quantity::multiply(&result.item_code, result.total_quantity_required, unit_cost)?;
            total_cost = quantity::add(&result.item_code, total_cost, line_cost)?;
            lines.push(CostLine {
                item_code: result.item_code.clone(),
                quantity: result.total_quantity_required,
                unit_cost,
                total_cost: line_cost,
                cost_available: resolved.is_some(),
            });
        }

        let unit_cost = if output_quantity > Decimal::ZERO {
            total_cost / output_quantity
        } else {
            Decimal::ZERO
        };

        Ok(CostRollupResult {
            policy,
            unit_cost,
            total_cost,
            lines,
            warnings,
        })
    }

    /// 以展開結果的根物料總數量為產出數量
    pub fn rollup_explosion(explosion: &Explosion, policy: ValuationPolicy) -> Result<CostRollupResult> {
        Self::rollup(&explosion.results, policy, explosion.output_quantity()?)
    }

    /// 由下而上計算圖中每個物料的單位物料成本
    ///
    /// 依葉節點在前的順序處理：葉節點取自身成本，可展開節點為
    /// 表頭倍數 × Σ(單位用量 × (1 + 損耗率/100) 換算後 × 子件單位成本)。
    /// 葉節點缺少成本時以 0 計並產生警告。
    pub fn rollup_tree(
        graph: &BomGraph,
        converter: &UnitConverter,
        policy: ValuationPolicy,
        default_waste: Decimal,
    ) -> Result<CostTreeResult> {
        let arena = graph.arena();
        let mut unit_costs: HashMap<usize, Decimal> = HashMap::with_capacity(arena.node_count());
        let mut warnings = Vec::new();

        for &idx in graph.topological_order() {
            let Some(node) = arena.node(idx) else {
                continue;
            };
            let code = node.item_code();

            let cost = match &node.bom {
                None => match node.item.costs.resolve(policy) {
                    Some(cost) => cost,
                    None => {
                        tracing::warn!("物料 {} 缺少 {:?} 成本，以 0 計", code, policy);
                        warnings.push(BomWarning::cost_unavailable(code, policy));
                        Decimal::ZERO
                    }
                },
                Some(bom) => {
                    let mut material = Decimal::ZERO;
                    for (child_idx, component) in arena.children(idx) {
                        let Some(child) = arena.node(child_idx) else {
                            continue;
                        };
                        let child_code = child.item_code();
                        let waste = component.effective_waste(default_waste);
                        let line_quantity = converter.convert(
                            child_code,
                            quantity::with_allowance(child_code, component.quantity_per_unit, waste)?,
                            &component.uom,
                            &child.item.unit_of_measure,
                        )?;
                        let child_cost = unit_costs.get(&child_idx).copied().unwrap_or(Decimal::ZERO);
                        let line_cost = quantity::multiply(child_code, line_quantity, child_cost)?;
                        material = quantity::add(code, material, line_cost)?;
                    }
                    quantity::multiply(code, material, bom.master.header_multiplier()?)?
                }
            };

            unit_costs.insert(idx, cost);
        }

        let unit_costs = unit_costs
            .into_iter()
            .filter_map(|(idx, cost)| arena.node(idx).map(|n| (n.item_code().to_string(), cost)))
            .collect();

        Ok(CostTreeResult {
            policy,
            unit_costs,
            warnings,
        })
    }
}

//! 展開結果模型

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::ValuationPolicy;
use crate::item::{Item, ItemCosts, ItemType};
use crate::{quantity, Result};

/// 物料未設定顯示精度且未指定引擎配置時的小數位數
const DEFAULT_DISPLAY_PRECISION: u32 = 2;

/// 製程站別的用量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageQuantity {
    pub stage_id: String,
    pub stage_sequence: Option<u32>,
    pub quantity: Decimal,
}

/// 展開結果（每個葉節點物料一筆，跨路徑合併）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionResult {
    /// 物料代碼
    pub item_code: String,

    /// 物料名稱
    pub item_name: String,

    /// 物料類型
    pub item_type: ItemType,

    /// 庫存單位
    pub unit_of_measure: String,

    /// 總需求量（含損耗、已換算、已合併，保留完整精度）
    pub total_quantity_required: Decimal,

    /// 顯示精度
    pub display_precision: u32,

    /// 貢獻此需求的製程站別（依首次出現順序，不重複）
    pub contributing_stage_ids: Vec<String>,

    /// 各站別用量
    pub stage_quantities: Vec<StageQuantity>,

    /// 任一貢獻明細為關鍵物料
    pub is_critical: bool,

    /// 替代料（依首次出現順序，不重複）
    pub substitute_items: Vec<String>,

    /// 物料成本欄位
    pub costs: ItemCosts,

    /// 單位成本（依引擎配置的計價方式）
    pub unit_cost: Decimal,

    /// 總成本
    pub total_cost: Decimal,
}

impl ExplosionResult {
    /// 以物料建立空的需求列
    pub fn new(item: &Item) -> Self {
        Self {
            item_code: item.item_code.clone(),
            item_name: item.name.clone(),
            item_type: item.item_type,
            unit_of_measure: item.unit_of_measure.clone(),
            total_quantity_required: Decimal::ZERO,
            display_precision: item.display_precision.unwrap_or(DEFAULT_DISPLAY_PRECISION),
            contributing_stage_ids: Vec::new(),
            stage_quantities: Vec::new(),
            is_critical: false,
            substitute_items: Vec::new(),
            costs: item.costs.clone(),
            unit_cost: Decimal::ZERO,
            total_cost: Decimal::ZERO,
        }
    }

    /// 建構器模式：覆寫顯示精度
    pub fn with_display_precision(mut self, precision: u32) -> Self {
        self.display_precision = precision;
        self
    }

    /// 累加一條路徑的需求
    pub fn accumulate(
        &mut self,
        quantity: Decimal,
        stage: Option<(&str, Option<u32>)>,
        is_critical: bool,
        substitutes: &[String],
    ) -> Result<()> {
        self.total_quantity_required = quantity::add(&self.item_code, self.total_quantity_required, quantity)?;
        self.is_critical |= is_critical;

        if let Some((stage_id, sequence)) = stage {
            if !self.contributing_stage_ids.iter().any(|s| s == stage_id) {
                self.contributing_stage_ids.push(stage_id.to_string());
            }
            match self.stage_quantities.iter_mut().find(|s| s.stage_id == stage_id) {
                Some(existing) => {
                    existing.quantity = quantity::add(&self.item_code, existing.quantity, quantity)?;
                }
                None => self.stage_quantities.push(StageQuantity {
                    stage_id: stage_id.to_string(),
                    stage_sequence: sequence,
                    quantity,
                }),
            }
        }

        for substitute in substitutes {
            if !self.substitute_items.contains(substitute) {
                self.substitute_items.push(substitute.clone());
            }
        }
        Ok(())
    }

    /// 合併另一筆同物料的需求列
    pub fn merge(&mut self, other: ExplosionResult) -> Result<()> {
        debug_assert_eq!(self.item_code, other.item_code);

        let stageless = other.unstaged_quantity();
        for stage in &other.stage_quantities {
            self.accumulate(
                stage.quantity,
                Some((stage.stage_id.as_str(), stage.stage_sequence)),
                false,
                &[],
            )?;
        }
        self.accumulate(stageless, None, other.is_critical, &other.substitute_items)
    }

    /// 依計價方式計算成本；回傳是否取得成本
    pub fn apply_valuation(&mut self, policy: ValuationPolicy) -> Result<bool> {
        let resolved = self.costs.resolve(policy);
        self.unit_cost = resolved.unwrap_or(Decimal::ZERO);
        self.total_cost = quantity::multiply(&self.item_code, self.total_quantity_required, self.unit_cost)?;
        Ok(resolved.is_some())
    }

    /// 顯示用數量（只在輸出邊界四捨五入）
    pub fn display_quantity(&self) -> Decimal {
        self.total_quantity_required
            .round_dp_with_strategy(self.display_precision, RoundingStrategy::MidpointAwayFromZero)
    }

    /// 未分配站別的用量
    pub fn unstaged_quantity(&self) -> Decimal {
        self.total_quantity_required - self.stage_quantities.iter().map(|s| s.quantity).sum::<Decimal>()
    }
}

//! 物料主檔模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ValuationPolicy;

/// 物料類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// 原物料
    RawMaterial,
    /// 半成品（在製品）
    WorkInProgress,
    /// 耗材
    Consumable,
    /// 成品
    FinishedGood,
}

impl ItemType {
    /// 是否一律視為葉節點（採購件，不再展開）
    pub fn is_purchased(&self) -> bool {
        matches!(self, ItemType::RawMaterial | ItemType::Consumable)
    }

    /// 是否必須有生效 BOM
    pub fn requires_bom(&self) -> bool {
        *self == ItemType::WorkInProgress
    }

    /// 從字串解析（接受 `raw_material` 與 `RAW_MATERIAL` 等寫法）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "raw_material" | "raw" => Some(ItemType::RawMaterial),
            "work_in_progress" | "wip" | "semi_finished" => Some(ItemType::WorkInProgress),
            "consumable" => Some(ItemType::Consumable),
            "finished_good" | "finished" => Some(ItemType::FinishedGood),
            _ => None,
        }
    }
}

/// 物料成本欄位（依計價方式取用）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemCosts {
    /// 標準成本
    pub standard_cost: Option<Decimal>,
    /// 加權平均成本
    pub weighted_average_cost: Option<Decimal>,
    /// 最近進貨（GRN）單價
    pub last_grn_price: Option<Decimal>,
}

impl ItemCosts {
    /// 依計價方式取得單位成本
    pub fn resolve(&self, policy: ValuationPolicy) -> Option<Decimal> {
        match policy {
            ValuationPolicy::StandardCost => self.standard_cost,
            ValuationPolicy::WeightedAverage => self.weighted_average_cost,
            ValuationPolicy::LastGrnPrice => self.last_grn_price,
        }
    }
}

/// 物料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// 物料代碼（組織內唯一）
    pub item_code: String,

    /// 物料名稱
    pub name: String,

    /// 庫存單位
    pub unit_of_measure: String,

    /// 物料類型
    pub item_type: ItemType,

    /// 類別
    pub category: Option<String>,

    /// 成本
    pub costs: ItemCosts,

    /// 顯示精度（小數位數，未設定時使用引擎配置）
    pub display_precision: Option<u32>,
}

impl Item {
    /// 創建新的物料
    pub fn new(
        item_code: impl Into<String>,
        name: impl Into<String>,
        unit_of_measure: impl Into<String>,
        item_type: ItemType,
    ) -> Self {
        Self {
            item_code: item_code.into(),
            name: name.into(),
            unit_of_measure: unit_of_measure.into(),
            item_type,
            category: None,
            costs: ItemCosts::default(),
            display_precision: None,
        }
    }

    /// 建構器模式：設置類別
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// 建構器模式：設置標準成本
    pub fn with_standard_cost(mut self, cost: Decimal) -> Self {
        self.costs.standard_cost = Some(cost);
        self
    }

    /// 建構器模式：設置加權平均成本
    pub fn with_weighted_average_cost(mut self, cost: Decimal) -> Self {
        self.costs.weighted_average_cost = Some(cost);
        self
    }

    /// 建構器模式：設置最近進貨單價
    pub fn with_last_grn_price(mut self, price: Decimal) -> Self {
        self.costs.last_grn_price = Some(price);
        self
    }

    /// 建構器模式：設置顯示精度
    pub fn with_display_precision(mut self, precision: u32) -> Self {
        self.display_precision = Some(precision);
        self
    }

    /// 是否為製造件（可能有自己的 BOM）
    pub fn is_manufactured(&self) -> bool {
        !self.item_type.is_purchased()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_create_item() {
        let item = Item::new("FILM-RAW", "BOPP Film", "kg", ItemType::RawMaterial)
            .with_category("film")
            .with_standard_cost(Decimal::from(120));

        assert_eq!(item.item_code, "FILM-RAW");
        assert_eq!(item.display_precision, None);
        assert_eq!(item.costs.standard_cost, Some(Decimal::from(120)));
        assert!(!item.is_manufactured());
    }

    #[test]
    fn test_costs_resolve_by_policy() {
        let item = Item::new("INK-RED", "Red Ink", "kg", ItemType::Consumable)
            .with_standard_cost(Decimal::from(10))
            .with_last_grn_price(Decimal::from(12));

        assert_eq!(
            item.costs.resolve(ValuationPolicy::StandardCost),
            Some(Decimal::from(10))
        );
        assert_eq!(item.costs.resolve(ValuationPolicy::WeightedAverage), None);
        assert_eq!(
            item.costs.resolve(ValuationPolicy::LastGrnPrice),
            Some(Decimal::from(12))
        );
    }

    #[rstest]
    #[case("raw_material", Some(ItemType::RawMaterial))]
    #[case("WIP", Some(ItemType::WorkInProgress))]
    #[case("work-in-progress", Some(ItemType::WorkInProgress))]
    #[case("Finished Good", Some(ItemType::FinishedGood))]
    #[case("consumable", Some(ItemType::Consumable))]
    #[case("service", None)]
    fn test_item_type_parse(#[case] raw: &str, #[case] expected: Option<ItemType>) {
        assert_eq!(ItemType::parse(raw), expected);
    }
}

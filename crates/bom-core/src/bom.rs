//! BOM 表頭與明細模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{quantity, BomError, Result};

/// 核准狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// 草稿
    Draft,
    /// 已核准
    Approved,
    /// 已駁回
    Rejected,
}

/// 耗用類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionType {
    /// 直接耗用
    Direct,
    /// 間接耗用（如油墨、膠水）
    Indirect,
    /// 副產品（產出而非耗用，不產生需求）
    Byproduct,
}

/// 多個生效版本時的判定規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BomTieBreak {
    /// 生效日最新者勝出（同日則視為歧義）
    #[default]
    MostRecentEffectiveFrom,
    /// 任何多個生效版本都視為資料錯誤
    Strict,
}

/// BOM 表頭（某物料的一個 BOM 版本）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomMaster {
    /// BOM ID
    pub id: Uuid,

    /// 成品/半成品物料代碼
    pub item_code: String,

    /// 版本
    pub version: String,

    /// 生效日
    pub effective_from: NaiveDate,

    /// 失效日（含當日）
    pub effective_until: Option<NaiveDate>,

    /// 核准狀態
    pub approval_status: ApprovalStatus,

    /// 是否啟用
    pub is_active: bool,

    /// 良率（%）
    pub yield_percentage: Decimal,

    /// 報廢率（%）
    pub scrap_percentage: Decimal,
}

impl BomMaster {
    /// 創建新的 BOM 表頭（預設已核准、啟用、良率 100%）
    pub fn new(item_code: impl Into<String>, version: impl Into<String>, effective_from: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_code: item_code.into(),
            version: version.into(),
            effective_from,
            effective_until: None,
            approval_status: ApprovalStatus::Approved,
            is_active: true,
            yield_percentage: Decimal::ONE_HUNDRED,
            scrap_percentage: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置失效日
    pub fn with_effective_until(mut self, until: NaiveDate) -> Self {
        self.effective_until = Some(until);
        self
    }

    /// 建構器模式：設置核准狀態
    pub fn with_approval_status(mut self, status: ApprovalStatus) -> Self {
        self.approval_status = status;
        self
    }

    /// 建構器模式：設置是否啟用
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// 建構器模式：設置良率
    pub fn with_yield_percentage(mut self, yield_percentage: Decimal) -> Self {
        self.yield_percentage = yield_percentage;
        self
    }

    /// 建構器模式：設置報廢率
    pub fn with_scrap_percentage(mut self, scrap_percentage: Decimal) -> Self {
        self.scrap_percentage = scrap_percentage;
        self
    }

    /// 檢查指定日期是否在有效期內
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        let after_start = date >= self.effective_from;
        let before_end = self.effective_until.map_or(true, |until| date <= until);
        after_start && before_end
    }

    /// 檢查指定日期是否可用於展開（已核准、啟用且在有效期內）
    pub fn is_usable_on(&self, date: NaiveDate) -> bool {
        self.approval_status == ApprovalStatus::Approved && self.is_active && self.is_effective_on(date)
    }

    /// 表頭倍數：100 / 良率 × (1 + 報廢率/100)
    pub fn header_multiplier(&self) -> Result<Decimal> {
        let yield_factor = quantity::divide(&self.item_code, Decimal::ONE_HUNDRED, self.yield_percentage)?;
        quantity::with_allowance(&self.item_code, yield_factor, self.scrap_percentage)
    }

    /// 驗證表頭數值
    pub fn validate(&self) -> Result<()> {
        if self.yield_percentage <= Decimal::ZERO || self.yield_percentage > Decimal::ONE_HUNDRED {
            return Err(BomError::InvalidBom {
                item_code: self.item_code.clone(),
                reason: format!("良率必須介於 0 與 100 之間: {}", self.yield_percentage),
            });
        }
        if self.scrap_percentage < Decimal::ZERO || self.scrap_percentage >= Decimal::ONE_HUNDRED {
            return Err(BomError::InvalidBom {
                item_code: self.item_code.clone(),
                reason: format!("報廢率必須介於 0 與 100 之間: {}", self.scrap_percentage),
            });
        }
        Ok(())
    }
}

/// BOM 明細（表頭下的一行用料）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomComponent {
    /// 明細 ID
    pub id: Uuid,

    /// 所屬 BOM 表頭 ID
    pub bom_id: Uuid,

    /// 子件物料代碼
    pub component_item_code: String,

    /// 單位用量
    pub quantity_per_unit: Decimal,

    /// 用量單位
    pub uom: String,

    /// 損耗率（%），None 表示使用組織預設值
    pub waste_percentage: Option<Decimal>,

    /// 耗用類型
    pub consumption_type: ConsumptionType,

    /// 是否為關鍵物料
    pub is_critical: bool,

    /// 製程站別
    pub stage_id: Option<String>,

    /// 製程順序
    pub stage_sequence: Option<u32>,

    /// 替代料（依優先順序）
    pub substitute_items: Vec<String>,
}

impl BomComponent {
    /// 創建新的 BOM 明細
    pub fn new(
        bom_id: Uuid,
        component_item_code: impl Into<String>,
        quantity_per_unit: Decimal,
        uom: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bom_id,
            component_item_code: component_item_code.into(),
            quantity_per_unit,
            uom: uom.into(),
            waste_percentage: None,
            consumption_type: ConsumptionType::Direct,
            is_critical: false,
            stage_id: None,
            stage_sequence: None,
            substitute_items: Vec::new(),
        }
    }

    /// 建構器模式：設置損耗率
    pub fn with_waste_percentage(mut self, waste: Decimal) -> Self {
        self.waste_percentage = Some(waste);
        self
    }

    /// 建構器模式：設置耗用類型
    pub fn with_consumption_type(mut self, consumption_type: ConsumptionType) -> Self {
        self.consumption_type = consumption_type;
        self
    }

    /// 建構器模式：設置關鍵物料
    pub fn with_critical(mut self, is_critical: bool) -> Self {
        self.is_critical = is_critical;
        self
    }

    /// 建構器模式：設置製程站別
    pub fn with_stage(mut self, stage_id: impl Into<String>, sequence: u32) -> Self {
        self.stage_id = Some(stage_id.into());
        self.stage_sequence = Some(sequence);
        self
    }

    /// 建構器模式：設置替代料
    pub fn with_substitutes(mut self, substitutes: Vec<String>) -> Self {
        self.substitute_items = substitutes;
        self
    }

    /// 實際損耗率（未設定時使用預設值）
    pub fn effective_waste(&self, default_waste: Decimal) -> Decimal {
        self.waste_percentage.unwrap_or(default_waste)
    }

    /// 是否產生物料需求
    pub fn is_consumed(&self) -> bool {
        self.consumption_type != ConsumptionType::Byproduct
    }

    /// 驗證明細數值
    pub fn validate(&self, parent_item_code: &str) -> Result<()> {
        if self.quantity_per_unit <= Decimal::ZERO {
            return Err(BomError::InvalidBom {
                item_code: parent_item_code.to_string(),
                reason: format!(
                    "子件 {} 的單位用量必須大於 0: {}",
                    self.component_item_code, self.quantity_per_unit
                ),
            });
        }
        if let Some(waste) = self.waste_percentage {
            if waste < Decimal::ZERO || waste > Decimal::ONE_HUNDRED {
                return Err(BomError::InvalidBom {
                    item_code: parent_item_code.to_string(),
                    reason: format!(
                        "子件 {} 的損耗率必須介於 0 與 100 之間: {}",
                        self.component_item_code, waste
                    ),
                });
            }
        }
        Ok(())
    }
}

/// 選定的生效 BOM（表頭 + 明細）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBom {
    pub master: BomMaster,
    pub components: Vec<BomComponent>,
}

impl ActiveBom {
    pub fn new(master: BomMaster, components: Vec<BomComponent>) -> Self {
        Self { master, components }
    }

    /// 驗證表頭與所有明細
    pub fn validate(&self) -> Result<()> {
        self.master.validate()?;
        for component in &self.components {
            component.validate(&self.master.item_code)?;
        }
        Ok(())
    }
}

/// 從候選版本中選出指定日期的生效 BOM
///
/// 只考慮已核准、啟用且在有效期內的版本。沒有候選時回傳 `NoActiveBom`，
/// 無法唯一判定時回傳 `AmbiguousBom`，絕不任意挑選。
pub fn select_active_bom<'a>(
    item_code: &str,
    candidates: impl IntoIterator<Item = &'a BomMaster>,
    as_of: NaiveDate,
    tie_break: BomTieBreak,
) -> Result<&'a BomMaster> {
    let mut usable: Vec<&BomMaster> = candidates
        .into_iter()
        .filter(|m| m.item_code == item_code && m.is_usable_on(as_of))
        .collect();

    match usable.len() {
        0 => Err(BomError::NoActiveBom {
            item_code: item_code.to_string(),
            as_of,
        }),
        1 => Ok(usable[0]),
        _ => {
            let ambiguous = |masters: &[&BomMaster]| BomError::AmbiguousBom {
                item_code: item_code.to_string(),
                candidates: masters.iter().map(|m| m.version.clone()).collect(),
            };

            match tie_break {
                BomTieBreak::Strict => Err(ambiguous(&usable)),
                BomTieBreak::MostRecentEffectiveFrom => {
                    usable.sort_by(|a, b| b.effective_from.cmp(&a.effective_from));
                    let latest = usable[0].effective_from;
                    let tied: Vec<&BomMaster> = usable
                        .iter()
                        .copied()
                        .filter(|m| m.effective_from == latest)
                        .collect();
                    if tied.len() > 1 {
                        tracing::warn!("物料 {} 有 {} 個同日生效的 BOM 版本", item_code, tied.len());
                        return Err(ambiguous(&tied));
                    }
                    Ok(usable[0])
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_effective_range_is_inclusive() {
        let master = BomMaster::new("BOX-Y", "v1", date(2025, 1, 1))
            .with_effective_until(date(2025, 6, 30));

        assert!(!master.is_effective_on(date(2024, 12, 31)));
        assert!(master.is_effective_on(date(2025, 1, 1)));
        assert!(master.is_effective_on(date(2025, 6, 30)));
        assert!(!master.is_effective_on(date(2025, 7, 1)));
    }

    #[test]
    fn test_select_single_version() {
        let v1 = BomMaster::new("BOX-Y", "v1", date(2025, 1, 1));
        let draft = BomMaster::new("BOX-Y", "v2", date(2025, 3, 1))
            .with_approval_status(ApprovalStatus::Draft);

        let selected = select_active_bom(
            "BOX-Y",
            [&v1, &draft],
            date(2025, 4, 1),
            BomTieBreak::MostRecentEffectiveFrom,
        )
        .unwrap();
        assert_eq!(selected.version, "v1");
    }

    #[test]
    fn test_select_most_recent_effective_from() {
        let v1 = BomMaster::new("BOX-Y", "v1", date(2025, 1, 1));
        let v2 = BomMaster::new("BOX-Y", "v2", date(2025, 3, 1));

        let selected = select_active_bom(
            "BOX-Y",
            [&v1, &v2],
            date(2025, 4, 1),
            BomTieBreak::MostRecentEffectiveFrom,
        )
        .unwrap();
        assert_eq!(selected.version, "v2");

        // 在 v2 生效前只有 v1
        let selected = select_active_bom(
            "BOX-Y",
            [&v1, &v2],
            date(2025, 2, 1),
            BomTieBreak::MostRecentEffectiveFrom,
        )
        .unwrap();
        assert_eq!(selected.version, "v1");
    }

    #[test]
    fn test_same_day_versions_are_ambiguous() {
        let v1 = BomMaster::new("BOX-Y", "v1", date(2025, 3, 1));
        let v2 = BomMaster::new("BOX-Y", "v2", date(2025, 3, 1));

        let err = select_active_bom(
            "BOX-Y",
            [&v1, &v2],
            date(2025, 4, 1),
            BomTieBreak::MostRecentEffectiveFrom,
        )
        .unwrap_err();
        assert!(matches!(err, BomError::AmbiguousBom { ref candidates, .. } if candidates.len() == 2));
    }

    #[test]
    fn test_strict_tie_break_rejects_multiple() {
        let v1 = BomMaster::new("BOX-Y", "v1", date(2025, 1, 1));
        let v2 = BomMaster::new("BOX-Y", "v2", date(2025, 3, 1));

        let err =
            select_active_bom("BOX-Y", [&v1, &v2], date(2025, 4, 1), BomTieBreak::Strict).unwrap_err();
        assert!(matches!(err, BomError::AmbiguousBom { .. }));
    }

    #[test]
    fn test_no_active_version() {
        let inactive = BomMaster::new("BOX-Y", "v1", date(2025, 1, 1)).with_active(false);

        let err = select_active_bom(
            "BOX-Y",
            [&inactive],
            date(2025, 4, 1),
            BomTieBreak::MostRecentEffectiveFrom,
        )
        .unwrap_err();
        assert!(matches!(err, BomError::NoActiveBom { .. }));
    }

    #[test]
    fn test_header_multiplier() {
        let master = BomMaster::new("LAMINATE-X", "v1", date(2025, 1, 1))
            .with_yield_percentage(Decimal::from(80));
        assert_eq!(master.header_multiplier().unwrap(), Decimal::new(125, 2));

        let neutral = BomMaster::new("LAMINATE-X", "v1", date(2025, 1, 1));
        assert_eq!(neutral.header_multiplier().unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_header_multiplier_rejects_zero_yield() {
        let master = BomMaster::new("LAMINATE-X", "v1", date(2025, 1, 1))
            .with_yield_percentage(Decimal::ZERO);
        let err = master.header_multiplier().unwrap_err();
        assert!(matches!(err, BomError::QuantityOverflow { ref item_code } if item_code == "LAMINATE-X"));
    }

    #[test]
    fn test_component_validation() {
        let bom_id = Uuid::new_v4();
        let bad_qty = BomComponent::new(bom_id, "FLAP-B", Decimal::ZERO, "pcs");
        assert!(bad_qty.validate("CARTON-A").is_err());

        let bad_waste = BomComponent::new(bom_id, "FLAP-B", Decimal::ONE, "pcs")
            .with_waste_percentage(Decimal::from(101));
        assert!(bad_waste.validate("CARTON-A").is_err());

        let ok = BomComponent::new(bom_id, "FLAP-B", Decimal::from(2), "pcs")
            .with_waste_percentage(Decimal::from(5));
        assert!(ok.validate("CARTON-A").is_ok());
        assert_eq!(ok.effective_waste(Decimal::ZERO), Decimal::from(5));
    }
}

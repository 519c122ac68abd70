//! 物料主檔與 BOM 主檔存取

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::bom::{select_active_bom, ActiveBom, BomComponent, BomMaster, BomTieBreak};
use crate::item::Item;
use crate::units::UnitConversion;
use crate::{BomError, Result};

/// 主檔資料來源（外部持久層）
///
/// 所有方法皆為批次查詢，展開時每一層只呼叫一次，避免每個節點一次往返。
/// 查無資料的代碼直接略過，不視為錯誤。
pub trait MasterDataSource: Send + Sync {
    /// 批次取得物料
    fn get_items(&self, item_codes: &[String]) -> Result<Vec<Item>>;

    /// 批次取得 BOM 表頭（所有版本）
    fn get_bom_masters(&self, item_codes: &[String]) -> Result<Vec<BomMaster>>;

    /// 批次取得 BOM 明細
    fn get_bom_components(&self, bom_ids: &[Uuid]) -> Result<Vec<BomComponent>>;

    /// 取得組織的單位換算表
    fn get_unit_conversions(&self, _organization_id: &str) -> Result<Vec<UnitConversion>> {
        Ok(Vec::new())
    }
}

impl<T: MasterDataSource + ?Sized> MasterDataSource for &T {
    fn get_items(&self, item_codes: &[String]) -> Result<Vec<Item>> {
        (**self).get_items(item_codes)
    }

    fn get_bom_masters(&self, item_codes: &[String]) -> Result<Vec<BomMaster>> {
        (**self).get_bom_masters(item_codes)
    }

    fn get_bom_components(&self, bom_ids: &[Uuid]) -> Result<Vec<BomComponent>> {
        (**self).get_bom_components(bom_ids)
    }

    fn get_unit_conversions(&self, organization_id: &str) -> Result<Vec<UnitConversion>> {
        (**self).get_unit_conversions(organization_id)
    }
}

impl<T: MasterDataSource + ?Sized> MasterDataSource for Arc<T> {
    fn get_items(&self, item_codes: &[String]) -> Result<Vec<Item>> {
        (**self).get_items(item_codes)
    }

    fn get_bom_masters(&self, item_codes: &[String]) -> Result<Vec<BomMaster>> {
        (**self).get_bom_masters(item_codes)
    }

    fn get_bom_components(&self, bom_ids: &[Uuid]) -> Result<Vec<BomComponent>> {
        (**self).get_bom_components(bom_ids)
    }

    fn get_unit_conversions(&self, organization_id: &str) -> Result<Vec<UnitConversion>> {
        (**self).get_unit_conversions(organization_id)
    }
}

/// 單層批次載入結果
#[derive(Debug, Clone, Default)]
pub struct LevelLoad {
    /// 本層物料
    pub items: HashMap<String, Item>,

    /// 本層需要展開的物料及其生效 BOM
    pub boms: HashMap<String, ActiveBom>,
}

/// 物料目錄（唯讀）
pub struct ItemCatalog<S> {
    source: S,
    tie_break: BomTieBreak,
}

impl<S: MasterDataSource> ItemCatalog<S> {
    /// 創建新的物料目錄
    pub fn new(source: S, tie_break: BomTieBreak) -> Self {
        Self { source, tie_break }
    }

    /// 取得資料來源引用
    pub fn source(&self) -> &S {
        &self.source
    }

    /// 取得單一物料
    pub fn get_item(&self, item_code: &str) -> Result<Item> {
        self.source
            .get_items(&[item_code.to_string()])?
            .into_iter()
            .find(|item| item.item_code == item_code)
            .ok_or_else(|| BomError::ItemNotFound(item_code.to_string()))
    }

    /// 取得指定日期的生效 BOM（表頭 + 明細）
    pub fn get_active_bom(&self, item_code: &str, as_of: NaiveDate) -> Result<ActiveBom> {
        let masters = self.source.get_bom_masters(&[item_code.to_string()])?;
        let master = select_active_bom(item_code, &masters, as_of, self.tie_break)?.clone();
        let components = self.get_bom_components(master.id)?;
        Ok(ActiveBom::new(master, components))
    }

    /// 取得某 BOM 表頭的明細
    pub fn get_bom_components(&self, bom_id: Uuid) -> Result<Vec<BomComponent>> {
        Ok(self
            .source
            .get_bom_components(&[bom_id])?
            .into_iter()
            .filter(|c| c.bom_id == bom_id)
            .collect())
    }

    /// 批次載入一層物料
    ///
    /// `force_expand` 中的代碼一定要有生效 BOM（展開的根節點）；
    /// 其他物料依類型決定：在製品必須有 BOM，成品有 BOM 才展開，
    /// 原物料與耗材不查 BOM。
    pub fn load_level(
        &self,
        item_codes: &[String],
        force_expand: &HashSet<String>,
        as_of: NaiveDate,
    ) -> Result<LevelLoad> {
        let mut level = LevelLoad::default();
        if item_codes.is_empty() {
            return Ok(level);
        }

        // 1. 物料
        for item in self.source.get_items(item_codes)? {
            level.items.insert(item.item_code.clone(), item);
        }
        if let Some(missing) = item_codes.iter().find(|code| !level.items.contains_key(*code)) {
            return Err(BomError::ItemNotFound(missing.clone()));
        }

        // 2. 表頭（只查製造件）
        let manufactured: Vec<String> = item_codes
            .iter()
            .filter(|code| {
                force_expand.contains(*code)
                    || level.items.get(*code).map_or(false, |item| item.is_manufactured())
            })
            .cloned()
            .collect();
        if manufactured.is_empty() {
            return Ok(level);
        }

        let masters = self.source.get_bom_masters(&manufactured)?;
        let mut by_item: HashMap<&str, Vec<&BomMaster>> = HashMap::new();
        for master in &masters {
            by_item.entry(master.item_code.as_str()).or_default().push(master);
        }

        let mut selected: Vec<BomMaster> = Vec::new();
        for code in &manufactured {
            let candidates = by_item.get(code.as_str()).cloned().unwrap_or_default();
            match select_active_bom(code, candidates, as_of, self.tie_break) {
                Ok(master) => selected.push(master.clone()),
                Err(BomError::NoActiveBom { .. })
                    if !force_expand.contains(code)
                        && level.items.get(code).map_or(false, |item| !item.item_type.requires_bom()) =>
                {
                    // 沒有 BOM 的成品視為外購件
                    tracing::debug!("物料 {} 沒有生效 BOM，視為葉節點", code);
                }
                Err(e) => return Err(e),
            }
        }

        // 3. 明細（一次取回本層所有選定版本）
        let bom_ids: Vec<Uuid> = selected.iter().map(|m| m.id).collect();
        let mut components_by_bom: HashMap<Uuid, Vec<BomComponent>> = HashMap::new();
        if !bom_ids.is_empty() {
            for component in self.source.get_bom_components(&bom_ids)? {
                components_by_bom
                    .entry(component.bom_id)
                    .or_default()
                    .push(component);
            }
        }

        for master in selected {
            let components = components_by_bom.remove(&master.id).unwrap_or_default();
            let active = ActiveBom::new(master, components);
            active.validate()?;
            level.boms.insert(active.master.item_code.clone(), active);
        }

        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use crate::memory::InMemoryMasterData;
    use rust_decimal::Decimal;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn sample_source() -> InMemoryMasterData {
        let mut source = InMemoryMasterData::new();
        source.add_item(Item::new("CARTON-A", "Carton A", "pcs", ItemType::FinishedGood));
        source.add_item(Item::new("FLAP-B", "Flap B", "pcs", ItemType::RawMaterial));
        source.add_item(Item::new("LAMINATE-X", "Laminate X", "kg", ItemType::WorkInProgress));

        let master = BomMaster::new("CARTON-A", "v1", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let bom_id = master.id;
        source.add_bom(
            master,
            vec![BomComponent::new(bom_id, "FLAP-B", Decimal::from(2), "pcs")],
        );
        source
    }

    #[test]
    fn test_get_item_and_not_found() {
        let catalog = ItemCatalog::new(sample_source(), BomTieBreak::default());

        assert_eq!(catalog.get_item("FLAP-B").unwrap().name, "Flap B");
        assert_eq!(
            catalog.get_item("NOPE").unwrap_err(),
            BomError::ItemNotFound("NOPE".to_string())
        );
    }

    #[test]
    fn test_get_active_bom() {
        let catalog = ItemCatalog::new(sample_source(), BomTieBreak::default());

        let bom = catalog.get_active_bom("CARTON-A", date()).unwrap();
        assert_eq!(bom.master.version, "v1");
        assert_eq!(bom.components.len(), 1);

        let err = catalog.get_active_bom("FLAP-B", date()).unwrap_err();
        assert!(matches!(err, BomError::NoActiveBom { .. }));
    }

    #[test]
    fn test_load_level_skips_purchased_items() {
        let source = sample_source();
        let catalog = ItemCatalog::new(&source, BomTieBreak::default());
        let codes = vec!["CARTON-A".to_string(), "FLAP-B".to_string()];

        let level = catalog.load_level(&codes, &HashSet::new(), date()).unwrap();

        assert_eq!(level.items.len(), 2);
        assert!(level.boms.contains_key("CARTON-A"));
        assert!(!level.boms.contains_key("FLAP-B"));
        // 每一層只查一次物料、一次表頭、一次明細
        assert_eq!(source.fetch_counts(), (1, 1, 1));
    }

    #[test]
    fn test_load_level_wip_without_bom_fails() {
        let catalog = ItemCatalog::new(sample_source(), BomTieBreak::default());
        let codes = vec!["LAMINATE-X".to_string()];

        let err = catalog.load_level(&codes, &HashSet::new(), date()).unwrap_err();
        assert!(matches!(err, BomError::NoActiveBom { ref item_code, .. } if item_code == "LAMINATE-X"));
    }

    #[test]
    fn test_load_level_missing_item() {
        let catalog = ItemCatalog::new(sample_source(), BomTieBreak::default());
        let codes = vec!["GHOST".to_string()];

        let err = catalog.load_level(&codes, &HashSet::new(), date()).unwrap_err();
        assert_eq!(err, BomError::ItemNotFound("GHOST".to_string()));
    }
}

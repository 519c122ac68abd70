//! 記憶體主檔資料來源

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::bom::{BomComponent, BomMaster};
use crate::catalog::MasterDataSource;
use crate::item::Item;
use crate::records::{BomComponentRecord, BomMasterRecord, ItemRecord};
use crate::units::UnitConversion;
use crate::Result;

/// 記憶體主檔資料來源
///
/// 供測試、示範與離線計算使用；記錄每種批次查詢的呼叫次數。
#[derive(Debug, Default)]
pub struct InMemoryMasterData {
    items: HashMap<String, Item>,
    masters: Vec<BomMaster>,
    components: HashMap<Uuid, Vec<BomComponent>>,
    conversions: HashMap<String, Vec<UnitConversion>>,
    item_fetches: AtomicUsize,
    master_fetches: AtomicUsize,
    component_fetches: AtomicUsize,
}

impl InMemoryMasterData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加物料（同代碼覆蓋）
    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.item_code.clone(), item);
    }

    /// 添加 BOM 表頭與明細（明細的 bom_id 以表頭為準）
    pub fn add_bom(&mut self, master: BomMaster, components: Vec<BomComponent>) -> Uuid {
        let bom_id = master.id;
        let components = components
            .into_iter()
            .map(|mut c| {
                c.bom_id = bom_id;
                c
            })
            .collect();
        self.components.insert(bom_id, components);
        self.masters.push(master);
        bom_id
    }

    /// 刪除 BOM 表頭（連同明細）
    pub fn remove_bom(&mut self, bom_id: Uuid) -> bool {
        let before = self.masters.len();
        self.masters.retain(|m| m.id != bom_id);
        self.components.remove(&bom_id);
        self.masters.len() != before
    }

    /// 添加組織的單位換算
    pub fn add_unit_conversion(&mut self, organization_id: impl Into<String>, conversion: UnitConversion) {
        self.conversions
            .entry(organization_id.into())
            .or_default()
            .push(conversion);
    }

    /// 從原始記錄載入（經過型別邊界轉換）
    pub fn load_records(
        &mut self,
        items: Vec<ItemRecord>,
        masters: Vec<BomMasterRecord>,
        components: Vec<BomComponentRecord>,
    ) -> Result<()> {
        for record in items {
            self.add_item(Item::try_from(record)?);
        }
        for record in masters {
            let master = BomMaster::try_from(record)?;
            self.components.entry(master.id).or_default();
            self.masters.push(master);
        }
        for record in components {
            let component = BomComponent::try_from(record)?;
            self.components
                .entry(component.bom_id)
                .or_default()
                .push(component);
        }
        Ok(())
    }

    /// 批次查詢呼叫次數：(物料, 表頭, 明細)
    pub fn fetch_counts(&self) -> (usize, usize, usize) {
        (
            self.item_fetches.load(Ordering::Relaxed),
            self.master_fetches.load(Ordering::Relaxed),
            self.component_fetches.load(Ordering::Relaxed),
        )
    }

    /// 重置呼叫次數
    pub fn reset_fetch_counts(&self) {
        self.item_fetches.store(0, Ordering::Relaxed);
        self.master_fetches.store(0, Ordering::Relaxed);
        self.component_fetches.store(0, Ordering::Relaxed);
    }
}

impl MasterDataSource for InMemoryMasterData {
    fn get_items(&self, item_codes: &[String]) -> Result<Vec<Item>> {
        self.item_fetches.fetch_add(1, Ordering::Relaxed);
        Ok(item_codes
            .iter()
            .filter_map(|code| self.items.get(code).cloned())
            .collect())
    }

    fn get_bom_masters(&self, item_codes: &[String]) -> Result<Vec<BomMaster>> {
        self.master_fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .masters
            .iter()
            .filter(|m| item_codes.contains(&m.item_code))
            .cloned()
            .collect())
    }

    fn get_bom_components(&self, bom_ids: &[Uuid]) -> Result<Vec<BomComponent>> {
        self.component_fetches.fetch_add(1, Ordering::Relaxed);
        Ok(bom_ids
            .iter()
            .filter_map(|id| self.components.get(id))
            .flatten()
            .cloned()
            .collect())
    }

    fn get_unit_conversions(&self, organization_id: &str) -> Result<Vec<UnitConversion>> {
        Ok(self
            .conversions
            .get(organization_id)
            .cloned()
            .unwrap_or_default())
    }
}

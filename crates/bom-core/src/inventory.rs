//! 庫存模型與庫存查詢介面

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{BomError, Result};

/// 庫存查詢（外部庫存帳）
pub trait StockLookup: Send + Sync {
    /// 取得物料可用庫存（查無記錄視為 0）
    fn get_available_stock(&self, item_code: &str) -> Result<Decimal>;

    /// 批次取得可用庫存
    fn get_available_stock_bulk(&self, item_codes: &[String]) -> Result<HashMap<String, Decimal>> {
        item_codes
            .iter()
            .map(|code| Ok((code.clone(), self.get_available_stock(code)?)))
            .collect()
    }
}

/// 庫存狀態
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    /// 物料代碼
    pub item_code: String,

    /// 現有庫存
    pub on_hand_qty: Decimal,

    /// 已分配數量（鎖定）
    pub allocated_qty: Decimal,

    /// 可用庫存（現有 - 已分配）
    pub available_qty: Decimal,

    /// 倉庫
    pub warehouse_id: Option<String>,
}

impl Inventory {
    /// 創建新的庫存記錄
    pub fn new(item_code: impl Into<String>, on_hand_qty: Decimal) -> Self {
        Self {
            item_code: item_code.into(),
            on_hand_qty,
            allocated_qty: Decimal::ZERO,
            available_qty: on_hand_qty,
            warehouse_id: None,
        }
    }

    /// 建構器模式：設置已分配數量
    pub fn with_allocated_qty(mut self, allocated_qty: Decimal) -> Self {
        self.allocated_qty = allocated_qty;
        self.calculate_available();
        self
    }

    /// 建構器模式：設置倉庫
    pub fn with_warehouse_id(mut self, warehouse_id: impl Into<String>) -> Self {
        self.warehouse_id = Some(warehouse_id.into());
        self
    }

    /// 計算可用庫存（不低於 0）
    pub fn calculate_available(&mut self) {
        self.available_qty = (self.on_hand_qty - self.allocated_qty).max(Decimal::ZERO);
    }
}

/// 記憶體庫存快照（多倉合計）
#[derive(Debug, Clone, Default)]
pub struct InMemoryStock {
    available: HashMap<String, Decimal>,
}

impl InMemoryStock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從庫存記錄建立（同物料多倉加總）
    pub fn from_inventories(inventories: &[Inventory]) -> Self {
        let mut stock = Self::new();
        for inventory in inventories {
            stock.add(inventory);
        }
        stock
    }

    /// 加入一筆庫存記錄
    pub fn add(&mut self, inventory: &Inventory) {
        *self
            .available
            .entry(inventory.item_code.clone())
            .or_insert(Decimal::ZERO) += inventory.available_qty;
    }

    /// 直接設定可用量
    pub fn set(&mut self, item_code: impl Into<String>, quantity: Decimal) {
        self.available.insert(item_code.into(), quantity);
    }
}

impl StockLookup for InMemoryStock {
    fn get_available_stock(&self, item_code: &str) -> Result<Decimal> {
        let quantity = self
            .available
            .get(item_code)
            .copied()
            .unwrap_or(Decimal::ZERO);
        if quantity < Decimal::ZERO {
            return Err(BomError::StockLookup(format!(
                "物料 {} 的可用庫存為負數: {}",
                item_code, quantity
            )));
        }
        Ok(quantity)
    }
}

//! 原始記錄與型別邊界
//!
//! 持久層回傳的列含有鬆散型別欄位（字串狀態、JSON 規格欄位），
//! 在此轉換為嚴格型別：格式錯誤直接拒絕，未知鍵忽略，缺漏欄位採用預設值。
//! 計算核心只接觸轉換後的型別。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::bom::{ApprovalStatus, BomComponent, BomMaster, ConsumptionType};
use crate::item::{Item, ItemCosts, ItemType};
use crate::{BomError, Result};

/// 物料原始記錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_code: String,
    pub item_name: String,
    pub uom: String,
    pub item_type: String,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub standard_cost: Option<Decimal>,
    #[serde(default)]
    pub weighted_average_cost: Option<Decimal>,
    #[serde(default)]
    pub last_grn_price: Option<Decimal>,
    #[serde(default)]
    pub specifications: Option<Value>,
}

/// BOM 表頭原始記錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomMasterRecord {
    pub id: Uuid,
    pub item_code: String,
    pub bom_version: String,
    pub effective_from: NaiveDate,
    #[serde(default)]
    pub effective_until: Option<NaiveDate>,
    pub approval_status: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub yield_percentage: Option<Decimal>,
    #[serde(default)]
    pub scrap_percentage: Option<Decimal>,
}

/// BOM 明細原始記錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomComponentRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub bom_master_id: Uuid,
    pub component_item_code: String,
    pub quantity_per_unit: Decimal,
    pub uom: String,
    #[serde(default)]
    pub waste_percentage: Option<Decimal>,
    #[serde(default)]
    pub consumption_type: Option<String>,
    #[serde(default)]
    pub is_critical: Option<bool>,
    #[serde(default)]
    pub stage_id: Option<String>,
    #[serde(default)]
    pub stage_sequence: Option<u32>,
    /// 替代料：`["A", "B"]` 或 `[{"item_code": "A", "priority": 1}]`
    #[serde(default)]
    pub substitute_items: Option<Value>,
    /// 規格欄位，欄位為空時可由此補值
    #[serde(default)]
    pub specifications: Option<Value>,
}

fn default_true() -> bool {
    true
}

/// 物料規格欄位中認得的鍵
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemSpecifications {
    display_precision: Option<u32>,
}

/// 明細規格欄位中認得的鍵
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ComponentSpecifications {
    waste_percentage: Option<Decimal>,
    is_critical: Option<bool>,
    stage_id: Option<String>,
    stage_sequence: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubstituteEntry {
    Code(String),
    Detailed {
        item_code: String,
        #[serde(default)]
        priority: Option<i32>,
    },
}

/// 解析 JSON 規格欄位；null 或缺漏視為空
fn parse_blob<T: DeserializeOwned + Default>(owner: &str, field: &str, value: Option<Value>) -> Result<T> {
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| BomError::InvalidRecord(format!("{} 的 {} 欄位格式錯誤: {}", owner, field, e))),
    }
}

fn parse_substitutes(owner: &str, value: Option<Value>) -> Result<Vec<String>> {
    let entries: Vec<SubstituteEntry> = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(|e| {
            BomError::InvalidRecord(format!("{} 的 substitute_items 欄位格式錯誤: {}", owner, e))
        })?,
    };

    // 有 priority 者依 priority 排序（穩定排序，未設定者保留原順序排在最後）
    let mut ranked: Vec<(Option<i32>, usize, String)> = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            SubstituteEntry::Code(code) => (None, index, code),
            SubstituteEntry::Detailed { item_code, priority } => (priority, index, item_code),
        })
        .collect();
    ranked.sort_by_key(|(priority, index, _)| (priority.unwrap_or(i32::MAX), *index));

    let mut substitutes: Vec<String> = Vec::new();
    for (_, _, code) in ranked {
        let code = code.trim().to_string();
        if code.is_empty() || code == owner || substitutes.contains(&code) {
            continue;
        }
        substitutes.push(code);
    }
    Ok(substitutes)
}

fn parse_approval_status(value: &str) -> Result<ApprovalStatus> {
    match value.trim().to_ascii_lowercase().as_str() {
        "draft" | "pending" => Ok(ApprovalStatus::Draft),
        "approved" => Ok(ApprovalStatus::Approved),
        "rejected" => Ok(ApprovalStatus::Rejected),
        other => Err(BomError::InvalidRecord(format!("未知的核准狀態: {}", other))),
    }
}

fn parse_consumption_type(value: Option<&str>) -> Result<ConsumptionType> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(ConsumptionType::Direct),
        Some(v) => match v.as_str() {
            "" | "direct" => Ok(ConsumptionType::Direct),
            "indirect" => Ok(ConsumptionType::Indirect),
            "byproduct" | "by_product" => Ok(ConsumptionType::Byproduct),
            other => Err(BomError::InvalidRecord(format!("未知的耗用類型: {}", other))),
        },
    }
}

impl TryFrom<ItemRecord> for Item {
    type Error = BomError;

    fn try_from(record: ItemRecord) -> Result<Self> {
        let item_type = ItemType::parse(&record.item_type).ok_or_else(|| {
            BomError::InvalidRecord(format!("物料 {} 的類型未知: {}", record.item_code, record.item_type))
        })?;
        let specs: ItemSpecifications =
            parse_blob(&record.item_code, "specifications", record.specifications)?;

        Ok(Item {
            item_code: record.item_code,
            name: record.item_name,
            unit_of_measure: record.uom,
            item_type,
            category: record.category_name,
            costs: ItemCosts {
                standard_cost: record.standard_cost,
                weighted_average_cost: record.weighted_average_cost,
                last_grn_price: record.last_grn_price,
            },
            display_precision: specs.display_precision,
        })
    }
}

impl TryFrom<BomMasterRecord> for BomMaster {
    type Error = BomError;

    fn try_from(record: BomMasterRecord) -> Result<Self> {
        let master = BomMaster {
            id: record.id,
            approval_status: parse_approval_status(&record.approval_status)?,
            item_code: record.item_code,
            version: record.bom_version,
            effective_from: record.effective_from,
            effective_until: record.effective_until,
            is_active: record.is_active,
            yield_percentage: record.yield_percentage.unwrap_or(Decimal::ONE_HUNDRED),
            scrap_percentage: record.scrap_percentage.unwrap_or(Decimal::ZERO),
        };
        master.validate()?;
        Ok(master)
    }
}

impl TryFrom<BomComponentRecord> for BomComponent {
    type Error = BomError;

    fn try_from(record: BomComponentRecord) -> Result<Self> {
        let owner = record.component_item_code.clone();
        let specs: ComponentSpecifications =
            parse_blob(&owner, "specifications", record.specifications)?;
        let substitute_items = parse_substitutes(&owner, record.substitute_items)?;

        Ok(BomComponent {
            id: record.id.unwrap_or_else(Uuid::new_v4),
            bom_id: record.bom_master_id,
            consumption_type: parse_consumption_type(record.consumption_type.as_deref())?,
            quantity_per_unit: record.quantity_per_unit,
            uom: record.uom,
            waste_percentage: record.waste_percentage.or(specs.waste_percentage),
            is_critical: record.is_critical.or(specs.is_critical).unwrap_or(false),
            stage_id: record.stage_id.or(specs.stage_id),
            stage_sequence: record.stage_sequence.or(specs.stage_sequence),
            substitute_items,
            component_item_code: record.component_item_code,
        })
    }
}

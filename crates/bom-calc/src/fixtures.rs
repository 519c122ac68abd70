//! 測試用主檔資料

use bom_core::{BomComponent, BomMaster, InMemoryMasterData, Item, ItemType};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

pub fn effective_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// 以整數用量建立 BOM（單位取子件庫存單位 pcs）
pub fn add_simple_bom(source: &mut InMemoryMasterData, parent: &str, children: &[(&str, i64)]) {
    let master = BomMaster::new(parent, "v1", effective_from());
    let bom_id = master.id;
    let components = children
        .iter()
        .map(|(code, qty)| BomComponent::new(bom_id, *code, Decimal::from(*qty), "pcs"))
        .collect();
    source.add_bom(master, components);
}

/// CARTON-A：每個需要 2 個 FLAP-B，損耗 5%
pub fn carton_source() -> InMemoryMasterData {
    let mut source = InMemoryMasterData::new();
    source.add_item(
        Item::new("CARTON-A", "Carton A", "pcs", ItemType::FinishedGood)
            .with_standard_cost(Decimal::from(3)),
    );
    source.add_item(
        Item::new("FLAP-B", "Flap B", "pcs", ItemType::RawMaterial)
            .with_standard_cost(Decimal::new(5, 1))
            .with_weighted_average_cost(Decimal::new(6, 1)),
    );

    let master = BomMaster::new("CARTON-A", "v1", effective_from());
    let bom_id = master.id;
    source.add_bom(
        master,
        vec![BomComponent::new(bom_id, "FLAP-B", Decimal::from(2), "pcs")
            .with_waste_percentage(Decimal::from(5))],
    );
    source
}

/// BOX-Y → 3 × LAMINATE-X（WIP）→ 1.2 kg FILM-RAW
pub fn laminate_source() -> InMemoryMasterData {
    let mut source = InMemoryMasterData::new();
    source.add_item(Item::new("BOX-Y", "Box Y", "pcs", ItemType::FinishedGood));
    source.add_item(Item::new("LAMINATE-X", "Laminate X", "pcs", ItemType::WorkInProgress));
    source.add_item(
        Item::new("FILM-RAW", "Film", "kg", ItemType::RawMaterial)
            .with_standard_cost(Decimal::from(4)),
    );

    add_simple_bom(&mut source, "BOX-Y", &[("LAMINATE-X", 3)]);
    let master = BomMaster::new("LAMINATE-X", "v1", effective_from());
    let bom_id = master.id;
    source.add_bom(
        master,
        vec![BomComponent::new(bom_id, "FILM-RAW", Decimal::new(12, 1), "kg")],
    );
    source
}

/// CARTON-A 與 POUCH-C 共用 INK-RED（分屬 PRINTING / COATING 站別）
pub fn ink_source() -> InMemoryMasterData {
    let mut source = InMemoryMasterData::new();
    source.add_item(Item::new("CARTON-A", "Carton A", "pcs", ItemType::FinishedGood));
    source.add_item(Item::new("POUCH-C", "Pouch C", "pcs", ItemType::FinishedGood));
    source.add_item(
        Item::new("INK-RED", "Red Ink", "kg", ItemType::Consumable)
            .with_standard_cost(Decimal::from(8)),
    );
    source.add_item(
        Item::new("FLAP-B", "Flap B", "pcs", ItemType::RawMaterial)
            .with_standard_cost(Decimal::new(5, 1)),
    );

    let carton = BomMaster::new("CARTON-A", "v1", effective_from());
    let carton_id = carton.id;
    source.add_bom(
        carton,
        vec![
            BomComponent::new(carton_id, "FLAP-B", Decimal::from(2), "pcs")
                .with_stage("CUTTING", 10),
            BomComponent::new(carton_id, "INK-RED", Decimal::new(2, 2), "kg")
                .with_stage("PRINTING", 20),
        ],
    );

    let pouch = BomMaster::new("POUCH-C", "v1", effective_from());
    let pouch_id = pouch.id;
    source.add_bom(
        pouch,
        vec![BomComponent::new(pouch_id, "INK-RED", Decimal::new(5, 2), "kg")
            .with_stage("COATING", 30)],
    );
    source
}

//! 批次展開與缺料偵測示例

use bom::prelude::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== 批次展開與缺料偵測示例 ===\n");

    let effective_from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    let mut source = InMemoryMasterData::new();
    source.add_item(Item::new("CARTON-A", "Shipping Carton", "pcs", ItemType::FinishedGood));
    source.add_item(Item::new("POUCH-C", "Stand-up Pouch", "pcs", ItemType::FinishedGood));
    for (code, cost) in [("FLAP-B", 35), ("FLAP-ALT1", 38), ("FLAP-ALT2", 40)] {
        source.add_item(
            Item::new(code, code, "pcs", ItemType::RawMaterial).with_standard_cost(Decimal::new(cost, 2)),
        );
    }
    source.add_item(
        Item::new("INK-RED", "Red Ink", "kg", ItemType::Consumable).with_standard_cost(Decimal::from(8)),
    );
    source.add_item(Item::new("ZIPPER", "Zipper", "pcs", ItemType::RawMaterial));

    let carton = BomMaster::new("CARTON-A", "v3", effective_from);
    let carton_id = carton.id;
    source.add_bom(
        carton,
        vec![
            BomComponent::new(carton_id, "FLAP-B", Decimal::from(2), "pcs")
                .with_waste_percentage(Decimal::from(5))
                .with_critical(true)
                .with_substitutes(vec!["FLAP-ALT1".to_string(), "FLAP-ALT2".to_string()]),
            BomComponent::new(carton_id, "INK-RED", Decimal::new(2, 2), "kg").with_stage("PRINTING", 20),
        ],
    );

    let pouch = BomMaster::new("POUCH-C", "v1", effective_from);
    let pouch_id = pouch.id;
    source.add_bom(
        pouch,
        vec![
            BomComponent::new(pouch_id, "INK-RED", Decimal::new(5, 2), "kg").with_stage("COATING", 30),
            BomComponent::new(pouch_id, "ZIPPER", Decimal::ONE, "pcs").with_critical(true),
        ],
    );

    let engine = BomExplosionEngine::new(&source, EngineConfig::new("PKG-01"));
    let mut cache = ExplosionCache::new();

    let requests = vec![
        ("CARTON-A".to_string(), Decimal::from(100)),
        ("POUCH-C".to_string(), Decimal::from(40)),
    ];
    let explosion = cache.explode_batch(&engine, &requests, as_of)?;

    let mut stock = InMemoryStock::new();
    stock.set("FLAP-B", Decimal::from(200));
    stock.set("FLAP-ALT1", Decimal::from(3));
    stock.set("FLAP-ALT2", Decimal::from(25));
    stock.set("INK-RED", Decimal::from(5));
    stock.set("ZIPPER", Decimal::from(12));

    let shortages = ShortageDetector::detect(&explosion.results, &stock)?;

    println!("缺料檢查:");
    for record in &shortages {
        println!(
            "  - {:<10} 需求 {:>8} 可用 {:>8} 缺 {:>8}  {:?} / {:?}",
            record.item_code,
            record.required_quantity.round_dp(2),
            record.available_quantity,
            record.shortage_quantity.round_dp(2),
            record.severity,
            record.suggested_action
        );
    }

    let summary = ShortageSummary::from_records(&shortages);
    println!(
        "\n缺料 {} 筆（關鍵 {}，可替代 {}），可完工: {}",
        summary.short_items,
        summary.critical_items,
        summary.substitutable_items,
        summary.is_fully_buildable()
    );

    for warning in &explosion.warnings {
        println!("警告: {} {}", warning.item_code, warning.message);
    }

    // 主檔異動後重新展開
    cache.mark_dirty("INK-RED");
    let removed = cache.invalidate_dirty();
    println!("\nINK-RED 異動，移除緩存 {} 筆", removed);

    Ok(())
}

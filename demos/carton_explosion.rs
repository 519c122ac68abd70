//! 紙箱 BOM 展開示例

use bom::prelude::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== 紙箱 BOM 展開示例 ===\n");

    let effective_from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    // 主檔：BOX-Y → LAMINATE-X x3 → FILM-RAW 1.2 kg + ADHESIVE 15 g
    let mut source = InMemoryMasterData::new();
    source.add_item(Item::new("BOX-Y", "Gift Box", "pcs", ItemType::FinishedGood));
    source.add_item(Item::new("LAMINATE-X", "Laminated Board", "pcs", ItemType::WorkInProgress));
    source.add_item(
        Item::new("FILM-RAW", "BOPP Film", "kg", ItemType::RawMaterial)
            .with_standard_cost(Decimal::new(425, 2))
            .with_weighted_average_cost(Decimal::new(410, 2)),
    );
    source.add_item(
        Item::new("ADHESIVE", "Hot Melt", "kg", ItemType::Consumable)
            .with_standard_cost(Decimal::from(6))
            .with_display_precision(3),
    );

    let box_y = BomMaster::new("BOX-Y", "v1", effective_from);
    let box_id = box_y.id;
    source.add_bom(
        box_y,
        vec![BomComponent::new(box_id, "LAMINATE-X", Decimal::from(3), "pcs").with_stage("ASSEMBLY", 30)],
    );

    let laminate = BomMaster::new("LAMINATE-X", "v1", effective_from);
    let laminate_id = laminate.id;
    source.add_bom(
        laminate,
        vec![
            BomComponent::new(laminate_id, "FILM-RAW", Decimal::new(12, 1), "kg")
                .with_waste_percentage(Decimal::from(2))
                .with_stage("LAMINATION", 10),
            BomComponent::new(laminate_id, "ADHESIVE", Decimal::from(15), "g").with_stage("LAMINATION", 10),
        ],
    );

    let config = EngineConfig::new("PKG-01").with_unit_conversion(UnitConversion::new("g", "kg", Decimal::new(1, 3)));
    let engine = BomExplosionEngine::new(&source, config);

    let explosion = engine.explode("BOX-Y", Decimal::from(500), as_of)?;

    println!("需求物料:");
    for row in &explosion.results {
        println!(
            "  - {} ({}) {} {}  成本 {}",
            row.item_code,
            row.item_name,
            row.display_quantity(),
            row.unit_of_measure,
            row.total_cost.round_dp(2)
        );
    }

    println!("\n站別需求:");
    for stage in StageRequirementCalculator::calculate(&explosion) {
        println!(
            "  - {:<12} {} {}",
            stage.stage_id.as_deref().unwrap_or("-"),
            stage.item_code,
            stage.quantity.round_dp(3)
        );
    }

    for policy in [ValuationPolicy::StandardCost, ValuationPolicy::WeightedAverage] {
        let rollup = CostRollup::rollup_explosion(&explosion, policy)?;
        println!(
            "\n{:?}: 總成本 {}，單位成本 {}，警告 {} 筆",
            policy,
            rollup.total_cost.round_dp(2),
            rollup.unit_cost.round_dp(4),
            rollup.warnings.len()
        );
    }

    println!("\n{}", serde_json::to_string_pretty(&explosion.results)?);

    Ok(())
}

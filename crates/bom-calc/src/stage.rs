//! 製程站別需求

use bom_core::ExplosionResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::Explosion;

/// 某站別對某物料的需求量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRequirement {
    /// 站別（None 表示未指定站別）
    pub stage_id: Option<String>,
    pub stage_sequence: Option<u32>,
    pub item_code: String,
    pub quantity: Decimal,
}

/// 站別需求計算器
pub struct StageRequirementCalculator;

impl StageRequirementCalculator {
    /// 將展開需求依站別分組
    ///
    /// 依站別順序、站別代碼排序；未指定站別的用量排在最後。
    pub fn calculate(explosion: &Explosion) -> Vec<StageRequirement> {
        Self::from_results(&explosion.results)
    }

    pub fn from_results(results: &[ExplosionResult]) -> Vec<StageRequirement> {
        let mut requirements = Vec::new();

        for result in results {
            for stage in &result.stage_quantities {
                requirements.push(StageRequirement {
                    stage_id: Some(stage.stage_id.clone()),
                    stage_sequence: stage.stage_sequence,
                    item_code: result.item_code.clone(),
                    quantity: stage.quantity,
                });
            }

            let unstaged = result.unstaged_quantity();
            if unstaged > Decimal::ZERO {
                requirements.push(StageRequirement {
                    stage_id: None,
                    stage_sequence: None,
                    item_code: result.item_code.clone(),
                    quantity: unstaged,
                });
            }
        }

        // 穩定排序，同站別保留需求列順序
        requirements.sort_by(compare_stage);
        requirements
    }
}

fn compare_stage(a: &StageRequirement, b: &StageRequirement) -> Ordering {
    match (&a.stage_id, &b.stage_id) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a_id), Some(b_id)) => {
            let a_seq = a.stage_sequence.unwrap_or(u32::MAX);
            let b_seq = b.stage_sequence.unwrap_or(u32::MAX);
            a_seq.cmp(&b_seq).then_with(|| a_id.cmp(b_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::BomExplosionEngine;
    use bom_core::EngineConfig;

    #[test]
    fn test_groups_by_stage_sequence() {
        let source = ink_source();
        let engine = BomExplosionEngine::new(&source, EngineConfig::default());
        let explosion = engine
            .explode_batch(
                &[
                    ("POUCH-C".to_string(), Decimal::from(50)),
                    ("CARTON-A".to_string(), Decimal::from(100)),
                ],
                as_of(),
            )
            .unwrap();

        let stages = StageRequirementCalculator::calculate(&explosion);
        let ids: Vec<_> = stages.iter().map(|s| s.stage_id.as_deref()).collect();

        assert_eq!(ids, vec![Some("CUTTING"), Some("PRINTING"), Some("COATING")]);
        assert_eq!(stages[0].item_code, "FLAP-B");
        assert_eq!(stages[0].quantity, Decimal::from(200));
        assert_eq!(stages[1].quantity, Decimal::from(2));
        assert_eq!(stages[2].quantity, Decimal::new(25, 1));
    }

    #[test]
    fn test_unstaged_quantity_listed_last() {
        let source = laminate_source();
        let engine = BomExplosionEngine::new(&source, EngineConfig::default());
        let explosion = engine.explode("BOX-Y", Decimal::from(10), as_of()).unwrap();

        let stages = StageRequirementCalculator::calculate(&explosion);

        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].stage_id, None);
        assert_eq!(stages[0].item_code, "FILM-RAW");
        assert_eq!(stages[0].quantity, Decimal::from(36));
    }
}

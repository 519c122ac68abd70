//! 缺料偵測

use bom_core::{
    ExplosionResult, Result, ShortageRecord, ShortageSeverity, StockLookup, SuggestedAction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 缺料偵測器
pub struct ShortageDetector;

impl ShortageDetector {
    /// 對每一筆需求列比對可用庫存
    ///
    /// 庫存只查詢一次（需求物料 + 所有替代料）。替代料依宣告順序取第一個
    /// 可完全補足缺料者，其可用量須扣除本次展開自身的需求與先前已承諾的替代量。
    pub fn detect<L: StockLookup + ?Sized>(
        results: &[ExplosionResult],
        stock: &L,
    ) -> Result<Vec<ShortageRecord>> {
        tracing::debug!("缺料偵測：需求物料 {} 筆", results.len());

        let mut codes: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for result in results {
            for code in std::iter::once(&result.item_code).chain(&result.substitute_items) {
                if seen.insert(code.as_str()) {
                    codes.push(code.clone());
                }
            }
        }
        let available = stock.get_available_stock_bulk(&codes)?;

        let own_requirement: HashMap<&str, Decimal> = results
            .iter()
            .map(|r| (r.item_code.as_str(), r.total_quantity_required))
            .collect();
        let mut promised: HashMap<String, Decimal> = HashMap::new();

        let lookup = |code: &str| available.get(code).copied().unwrap_or(Decimal::ZERO);

        let mut records = Vec::with_capacity(results.len());
        for result in results {
            let mut record = ShortageRecord::evaluate(
                &result.item_code,
                result.total_quantity_required,
                lookup(result.item_code.as_str()),
                result.is_critical,
            );

            if record.is_short() {
                let chosen = result.substitute_items.iter().find(|substitute| {
                    let free = lookup(substitute.as_str())
                        - own_requirement
                            .get(substitute.as_str())
                            .copied()
                            .unwrap_or(Decimal::ZERO)
                        - promised.get(*substitute).copied().unwrap_or(Decimal::ZERO);
                    free >= record.shortage_quantity
                });

                if let Some(substitute) = chosen {
                    *promised.entry(substitute.clone()).or_insert(Decimal::ZERO) +=
                        record.shortage_quantity;
                    record.suggested_action = SuggestedAction::Substitute(substitute.clone());
                }

                tracing::debug!(
                    "物料 {} 缺料 {}，建議 {:?}",
                    record.item_code,
                    record.shortage_quantity,
                    record.suggested_action
                );
            }

            records.push(record);
        }

        Ok(records)
    }
}

/// 缺料彙總
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortageSummary {
    pub total_items: usize,
    pub short_items: usize,
    pub critical_items: usize,
    pub substitutable_items: usize,
}

impl ShortageSummary {
    pub fn from_records(records: &[ShortageRecord]) -> Self {
        let mut summary = Self {
            total_items: records.len(),
            ..Self::default()
        };
        for record in records {
            if record.is_short() {
                summary.short_items += 1;
            }
            if record.severity == ShortageSeverity::Critical {
                summary.critical_items += 1;
            }
            if record.substitute().is_some() {
                summary.substitutable_items += 1;
            }
        }
        summary
    }

    /// 所有缺料皆可由替代料補足（或完全不缺料）
    pub fn is_fully_buildable(&self) -> bool {
        self.short_items == self.substitutable_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bom_core::{BomError, InMemoryStock, Item, ItemType};
    use rstest::rstest;

    fn row(code: &str, required: i64, critical: bool, substitutes: &[&str]) -> ExplosionResult {
        let mut row = ExplosionResult::new(&Item::new(code, code, "pcs", ItemType::RawMaterial));
        let substitutes: Vec<String> = substitutes.iter().map(|s| s.to_string()).collect();
        row.accumulate(Decimal::from(required), None, critical, &substitutes).unwrap();
        row
    }

    fn stock(levels: &[(&str, i64)]) -> InMemoryStock {
        let mut stock = InMemoryStock::new();
        for (code, qty) in levels {
            stock.set(*code, Decimal::from(*qty));
        }
        stock
    }

    #[rstest]
    #[case(100, 100)]
    #[case(100, 150)]
    #[case(0, 0)]
    fn test_no_shortage_when_stock_covers(#[case] required: i64, #[case] available: i64) {
        let records = ShortageDetector::detect(
            &[row("FLAP-B", required, true, &[])],
            &stock(&[("FLAP-B", available)]),
        )
        .unwrap();

        assert_eq!(records[0].shortage_quantity, Decimal::ZERO);
        assert_eq!(records[0].severity, ShortageSeverity::None);
        assert_eq!(records[0].suggested_action, SuggestedAction::None);
    }

    #[rstest]
    #[case(false, ShortageSeverity::Minor, SuggestedAction::Order)]
    #[case(true, ShortageSeverity::Critical, SuggestedAction::Escalate)]
    fn test_shortage_without_substitute(
        #[case] critical: bool,
        #[case] severity: ShortageSeverity,
        #[case] action: SuggestedAction,
    ) {
        let records = ShortageDetector::detect(
            &[row("FILM-RAW", 36, critical, &[])],
            &stock(&[("FILM-RAW", 20)]),
        )
        .unwrap();

        assert_eq!(records[0].shortage_quantity, Decimal::from(16));
        assert_eq!(records[0].severity, severity);
        assert_eq!(records[0].suggested_action, action);
    }

    #[test]
    fn test_second_substitute_reported() {
        // 第一個替代料不足，第二個可完全補足
        let records = ShortageDetector::detect(
            &[row("FLAP-B", 210, true, &["FLAP-ALT1", "FLAP-ALT2"])],
            &stock(&[("FLAP-B", 200), ("FLAP-ALT1", 5), ("FLAP-ALT2", 50)]),
        )
        .unwrap();

        assert_eq!(records[0].shortage_quantity, Decimal::from(10));
        assert_eq!(records[0].severity, ShortageSeverity::Critical);
        assert_eq!(records[0].substitute(), Some("FLAP-ALT2"));
    }

    #[test]
    fn test_substitute_free_stock_excludes_own_requirement() {
        // FLAP-ALT 本身也是需求物料，扣除後不足
        let records = ShortageDetector::detect(
            &[
                row("FLAP-B", 210, false, &["FLAP-ALT"]),
                row("FLAP-ALT", 40, false, &[]),
            ],
            &stock(&[("FLAP-B", 200), ("FLAP-ALT", 45)]),
        )
        .unwrap();

        assert_eq!(records[0].suggested_action, SuggestedAction::Order);
        assert!(!records[1].is_short());
    }

    #[test]
    fn test_substitute_not_promised_twice() {
        let records = ShortageDetector::detect(
            &[
                row("INK-RED", 10, false, &["INK-ALT"]),
                row("INK-BLUE", 10, false, &["INK-ALT"]),
            ],
            &stock(&[("INK-RED", 4), ("INK-BLUE", 4), ("INK-ALT", 8)]),
        )
        .unwrap();

        assert_eq!(records[0].substitute(), Some("INK-ALT"));
        assert_eq!(records[1].suggested_action, SuggestedAction::Order);

        let summary = ShortageSummary::from_records(&records);
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.short_items, 2);
        assert_eq!(summary.substitutable_items, 1);
        assert!(!summary.is_fully_buildable());
    }

    #[test]
    fn test_missing_stock_record_is_zero() {
        let records =
            ShortageDetector::detect(&[row("FILM-RAW", 36, false, &[])], &InMemoryStock::new())
                .unwrap();

        assert_eq!(records[0].available_quantity, Decimal::ZERO);
        assert_eq!(records[0].shortage_quantity, Decimal::from(36));
    }

    #[test]
    fn test_stock_fault_propagates() {
        let err = ShortageDetector::detect(
            &[row("FILM-RAW", 36, false, &[])],
            &stock(&[("FILM-RAW", -1)]),
        )
        .unwrap_err();

        assert!(matches!(err, BomError::StockLookup(_)));
    }
}

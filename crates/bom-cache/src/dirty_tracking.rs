//! 髒標記追蹤

use std::collections::HashSet;

/// 髒標記追蹤器（記錄主檔異動過的物料代碼）
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty_items: HashSet<String>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記物料為髒
    pub fn mark_dirty(&mut self, item_code: impl Into<String>) {
        self.dirty_items.insert(item_code.into());
    }

    /// 批次標記
    pub fn mark_many<I, T>(&mut self, item_codes: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.dirty_items.extend(item_codes.into_iter().map(Into::into));
    }

    /// 檢查物料是否為髒
    pub fn is_dirty(&self, item_code: &str) -> bool {
        self.dirty_items.contains(item_code)
    }

    /// 任一物料為髒
    pub fn any_dirty<'a>(&self, mut item_codes: impl Iterator<Item = &'a String>) -> bool {
        item_codes.any(|code| self.dirty_items.contains(code))
    }

    pub fn is_empty(&self) -> bool {
        self.dirty_items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty_items.len()
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_items.clear();
    }

    /// 獲取所有髒物料（已排序）
    pub fn dirty_items(&self) -> Vec<String> {
        let mut items: Vec<String> = self.dirty_items.iter().cloned().collect();
        items.sort();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let mut tracker = DirtyTracker::new();
        tracker.mark_dirty("FLAP-B");
        tracker.mark_many(["INK-RED", "FLAP-B"]);

        assert_eq!(tracker.len(), 2);
        assert!(tracker.is_dirty("INK-RED"));
        assert!(!tracker.is_dirty("FILM-RAW"));
        assert_eq!(tracker.dirty_items(), vec!["FLAP-B", "INK-RED"]);

        tracker.clear();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_any_dirty() {
        let mut tracker = DirtyTracker::new();
        tracker.mark_dirty("LAMINATE-X");

        let graph = vec!["BOX-Y".to_string(), "LAMINATE-X".to_string()];
        let other = vec!["CARTON-A".to_string()];
        assert!(tracker.any_dirty(graph.iter()));
        assert!(!tracker.any_dirty(other.iter()));
    }
}

//! BOM 圖建構與驗證

use bom_core::{BomError, ItemCatalog, MasterDataSource, Result};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::arena::{BomArena, BomEdge, NodeIndex};

/// 驗證時的節點狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    New,
    OnPath,
    Done,
}

/// BOM 圖
///
/// 以批次方式逐層載入（每層一次查詢），完成後驗證無循環且不超過層數上限。
#[derive(Debug, Clone)]
pub struct BomGraph {
    arena: BomArena,
    roots: Vec<NodeIndex>,
    as_of: NaiveDate,
    max_depth: usize,
    /// 葉節點在前的拓撲順序
    order: Vec<NodeIndex>,
}

impl BomGraph {
    /// 建構單一物料的 BOM 圖
    pub fn build<S: MasterDataSource>(
        catalog: &ItemCatalog<S>,
        item_code: &str,
        as_of: NaiveDate,
        max_depth: usize,
    ) -> Result<Self> {
        Self::build_many(catalog, &[item_code.to_string()], as_of, max_depth)
    }

    /// 建構多個根物料共用的 BOM 圖
    pub fn build_many<S: MasterDataSource>(
        catalog: &ItemCatalog<S>,
        root_codes: &[String],
        as_of: NaiveDate,
        max_depth: usize,
    ) -> Result<Self> {
        let mut frontier: Vec<String> = Vec::new();
        for code in root_codes {
            if !frontier.contains(code) {
                frontier.push(code.clone());
            }
        }
        let force_expand: HashSet<String> = frontier.iter().cloned().collect();

        let mut arena = BomArena::new();
        let mut level = 0usize;

        // Step 1: 逐層批次載入
        while !frontier.is_empty() {
            if level > max_depth {
                return Err(BomError::DepthLimitExceeded {
                    item_code: frontier[0].clone(),
                    depth: level,
                    limit: max_depth,
                });
            }

            let force = if level == 0 { force_expand.clone() } else { HashSet::new() };
            let mut loaded = catalog.load_level(&frontier, &force, as_of)?;
            tracing::debug!(
                "BOM 載入第 {} 層: 物料 {} 筆，需展開 {} 筆",
                level,
                frontier.len(),
                loaded.boms.len()
            );

            let mut next: Vec<String> = Vec::new();
            for code in &frontier {
                let item = loaded
                    .items
                    .remove(code)
                    .ok_or_else(|| BomError::ItemNotFound(code.clone()))?;
                let bom = loaded.boms.remove(code);

                if let Some(bom) = &bom {
                    for component in bom.components.iter().filter(|c| c.is_consumed()) {
                        let child = &component.component_item_code;
                        if arena.find_node(child).is_none()
                            && !frontier.contains(child)
                            && !next.contains(child)
                        {
                            next.push(child.clone());
                        }
                    }
                }

                arena.add_node(item, bom);
            }

            frontier = next;
            level += 1;
        }

        // Step 2: 建立邊
        let mut pending: Vec<(NodeIndex, BomEdge)> = Vec::new();
        for (idx, node) in arena.nodes() {
            if let Some(bom) = &node.bom {
                for (component_index, component) in bom.components.iter().enumerate() {
                    if !component.is_consumed() {
                        continue;
                    }
                    let child = arena
                        .find_node(&component.component_item_code)
                        .ok_or_else(|| BomError::ItemNotFound(component.component_item_code.clone()))?;
                    pending.push((idx, BomEdge { child, component_index }));
                }
            }
        }
        for (parent, edge) in pending {
            arena.add_edge(parent, edge);
        }

        let roots: Vec<NodeIndex> = root_codes
            .iter()
            .filter_map(|code| arena.find_node(code))
            .fold(Vec::new(), |mut acc, idx| {
                if !acc.contains(&idx) {
                    acc.push(idx);
                }
                acc
            });

        let mut graph = Self {
            arena,
            roots,
            as_of,
            max_depth,
            order: Vec::new(),
        };

        // Step 3: 驗證（循環、層數）
        graph.validate()?;

        tracing::debug!(
            "BOM 圖建構完成: 節點 {} 個，邊 {} 條",
            graph.arena.node_count(),
            graph.arena.edge_count()
        );
        Ok(graph)
    }

    /// 深度優先驗證：路徑上重複出現的物料即為循環；超過層數上限即失敗
    fn validate(&mut self) -> Result<()> {
        let count = self.arena.node_count();
        let mut state = vec![VisitState::New; count];
        let mut height = vec![0usize; count];
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut order: Vec<NodeIndex> = Vec::with_capacity(count);

        for &root in &self.roots {
            self.visit(root, 0, &mut path, &mut state, &mut height, &mut order)?;
        }

        self.order = order;
        Ok(())
    }

    fn visit(
        &self,
        idx: NodeIndex,
        depth: usize,
        path: &mut Vec<NodeIndex>,
        state: &mut [VisitState],
        height: &mut [usize],
        order: &mut Vec<NodeIndex>,
    ) -> Result<usize> {
        match state[idx] {
            VisitState::OnPath => {
                let start = path.iter().position(|&p| p == idx).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|&p| self.code(p).to_string())
                    .collect();
                cycle.push(self.code(idx).to_string());
                tracing::warn!("BOM 循環引用: {}", cycle.join(" -> "));
                return Err(BomError::Cycle { path: cycle });
            }
            VisitState::Done => {
                if depth + height[idx] > self.max_depth {
                    return Err(self.depth_error(idx, depth + height[idx]));
                }
                return Ok(height[idx]);
            }
            VisitState::New => {}
        }

        if depth > self.max_depth {
            return Err(self.depth_error(idx, depth));
        }

        state[idx] = VisitState::OnPath;
        path.push(idx);

        let children: Vec<NodeIndex> = self.arena.children(idx).map(|(child, _)| child).collect();
        let mut node_height = 0usize;
        for child in children {
            let child_height = self.visit(child, depth + 1, path, state, height, order)?;
            node_height = node_height.max(child_height + 1);
        }

        path.pop();
        state[idx] = VisitState::Done;
        height[idx] = node_height;
        order.push(idx);
        Ok(node_height)
    }

    fn depth_error(&self, idx: NodeIndex, depth: usize) -> BomError {
        BomError::DepthLimitExceeded {
            item_code: self.code(idx).to_string(),
            depth,
            limit: self.max_depth,
        }
    }

    fn code(&self, idx: NodeIndex) -> &str {
        self.arena.node(idx).map_or("?", |n| n.item_code())
    }

    /// 取得節點儲存區
    pub fn arena(&self) -> &BomArena {
        &self.arena
    }

    /// 根節點
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// 展開基準日
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// 葉節點在前的拓撲順序（只含根節點可達的節點）
    pub fn topological_order(&self) -> &[NodeIndex] {
        &self.order
    }

    /// 圖中所有物料代碼
    pub fn item_codes(&self) -> Vec<String> {
        self.arena.nodes().map(|(_, n)| n.item.item_code.clone()).collect()
    }

    /// 各節點距離根節點的最大層數
    pub fn levels(&self) -> HashMap<String, usize> {
        let mut levels: HashMap<NodeIndex, usize> = self.roots.iter().map(|&r| (r, 0)).collect();
        // 拓撲順序反轉後父件必在子件之前
        for &idx in self.order.iter().rev() {
            let level = levels.get(&idx).copied().unwrap_or(0);
            for (child, _) in self.arena.children(idx) {
                let entry = levels.entry(child).or_insert(0);
                *entry = (*entry).max(level + 1);
            }
        }
        levels
            .into_iter()
            .map(|(idx, level)| (self.code(idx).to_string(), level))
            .collect()
    }
}

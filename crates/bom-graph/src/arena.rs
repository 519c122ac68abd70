//! BOM 節點儲存區（以索引存取）

use bom_core::{ActiveBom, BomComponent, Item};
use std::collections::HashMap;

/// 節點索引
pub type NodeIndex = usize;

/// BOM 邊：父件 → 子件，指向父件 BOM 中的一行明細
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BomEdge {
    /// 子件節點
    pub child: NodeIndex,
    /// 明細在父件 BOM 中的位置
    pub component_index: usize,
}

/// BOM 節點（一個物料）
#[derive(Debug, Clone)]
pub struct BomNode {
    /// 物料
    pub item: Item,

    /// 生效 BOM（葉節點為 None）
    pub bom: Option<ActiveBom>,

    /// 子件邊（不含副產品）
    pub edges: Vec<BomEdge>,
}

impl BomNode {
    /// 是否需要繼續展開
    pub fn is_expandable(&self) -> bool {
        self.bom.is_some()
    }

    pub fn item_code(&self) -> &str {
        &self.item.item_code
    }
}

/// 節點儲存區
#[derive(Debug, Clone, Default)]
pub struct BomArena {
    nodes: Vec<BomNode>,
    index: HashMap<String, NodeIndex>,
}

impl BomArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加節點；同物料已存在時回傳既有索引
    pub fn add_node(&mut self, item: Item, bom: Option<ActiveBom>) -> NodeIndex {
        if let Some(&existing) = self.index.get(&item.item_code) {
            return existing;
        }
        let idx = self.nodes.len();
        self.index.insert(item.item_code.clone(), idx);
        self.nodes.push(BomNode {
            item,
            bom,
            edges: Vec::new(),
        });
        idx
    }

    /// 添加邊
    pub(crate) fn add_edge(&mut self, parent: NodeIndex, edge: BomEdge) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.edges.push(edge);
        }
    }

    /// 以物料代碼查找節點
    pub fn find_node(&self, item_code: &str) -> Option<NodeIndex> {
        self.index.get(item_code).copied()
    }

    /// 取得節點
    pub fn node(&self, idx: NodeIndex) -> Option<&BomNode> {
        self.nodes.get(idx)
    }

    /// 取得子件（子件索引 + 明細）
    pub fn children(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, &BomComponent)> + '_ {
        self.nodes
            .get(idx)
            .into_iter()
            .flat_map(|node| {
                node.edges.iter().filter_map(move |edge| {
                    node.bom
                        .as_ref()
                        .and_then(|bom| bom.components.get(edge.component_index))
                        .map(|component| (edge.child, component))
                })
            })
    }

    /// 所有節點
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &BomNode)> + '_ {
        self.nodes.iter().enumerate()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }
}

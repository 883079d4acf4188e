use super::rectangle::Rectangle;

/// R-tree节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// 叶子节点：只包含数据条目
    Leaf,
    /// 索引节点：只包含指向子节点的条目
    Index,
}

/// R-tree节点条目
///
/// - Data条目：条目ID（内容项ID）及其点MBR，只出现在叶子节点中
/// - Node条目：子节点及其MBR，只出现在索引节点中
#[derive(Debug, Clone)]
pub enum Entry {
    Data { mbr: Rectangle, data: i64 },
    Node { mbr: Rectangle, node: Box<Node> },
}

impl Entry {
    /// 获取条目的MBR
    pub fn mbr(&self) -> &Rectangle {
        match self {
            Entry::Data { mbr, .. } => mbr,
            Entry::Node { mbr, .. } => mbr,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Entry::Data { .. })
    }

    /// 获取数据条目的ID（如果是数据条目）
    pub fn data(&self) -> Option<i64> {
        match self {
            Entry::Data { data, .. } => Some(*data),
            Entry::Node { .. } => None,
        }
    }

    pub fn child(&self) -> Option<&Node> {
        match self {
            Entry::Data { .. } => None,
            Entry::Node { node, .. } => Some(node),
        }
    }
}

/// R-tree节点
#[derive(Debug, Clone)]
pub struct Node {
    /// 包含所有条目的最小边界矩形
    pub mbr: Rectangle,
    pub entries: Vec<Entry>,
    pub node_type: NodeType,
    /// 叶子层为0，根节点层级最高
    pub level: usize,
}

impl Node {
    pub fn new_leaf_node() -> Self {
        Self::new(NodeType::Leaf, 0)
    }

    pub fn new_index_node(level: usize) -> Self {
        Self::new(NodeType::Index, level)
    }

    pub fn new(node_type: NodeType, level: usize) -> Self {
        Node {
            mbr: Rectangle::new(0.0, 0.0, 0.0, 0.0),
            entries: Vec::new(),
            node_type,
            level,
        }
    }

    pub fn is_leaf_node(&self) -> bool {
        matches!(self.node_type, NodeType::Leaf)
    }

    pub fn is_index_node(&self) -> bool {
        matches!(self.node_type, NodeType::Index)
    }

    /// 更新节点的MBR以包含所有条目
    pub fn update_mbr(&mut self) {
        let mut iter = self.entries.iter().map(Entry::mbr);
        self.mbr = match iter.next() {
            Some(first) => iter.fold(*first, |acc, mbr| acc.union(mbr)),
            None => Rectangle::new(0.0, 0.0, 0.0, 0.0),
        };
    }

    /// 添加条目到节点
    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
        self.update_mbr();
    }

    /// 递归收集子树中的所有数据条目
    pub(crate) fn collect_data(&self, out: &mut Vec<(Rectangle, i64)>) {
        for entry in &self.entries {
            match entry {
                Entry::Data { mbr, data } => out.push((*mbr, *data)),
                Entry::Node { node, .. } => node.collect_data(out),
            }
        }
    }
}

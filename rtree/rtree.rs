use super::node::Node;
use super::rectangle::Rectangle;
use std::collections::HashMap;

/// R-tree主结构
///
/// 每个条目是一个点（经度, 纬度），以内容项ID为键。
/// `points` 记录每个ID当前的位置，保证同一ID在树中至多出现一次。
#[derive(Debug, Clone)]
pub struct RTree {
    root: Option<Box<Node>>,
    /// 最大条目数M
    max_entries: usize,
    /// 最小条目数m（M/2）
    min_entries: usize,
    pub(crate) points: HashMap<i64, [f64; 2]>,
}

impl Default for RTree {
    /// 使用默认参数创建R-tree（M=10, m=5）
    fn default() -> Self {
        Self::new(10)
    }
}

impl RTree {
    /// 创建新的R-tree
    pub fn new(max_entries: usize) -> Self {
        assert!(max_entries >= 2, "Max entries must be at least 2");

        RTree {
            root: None,
            max_entries,
            min_entries: max_entries / 2,
            points: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root_mbr(&self) -> Option<&Rectangle> {
        self.root.as_ref().map(|node| &node.mbr)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    /// 获取树的深度
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |node| node.level + 1)
    }

    /// 统计树中数据条目的数量（遍历整棵树）
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |node| Self::count_entries(node))
    }

    #[cfg(test)]
    fn count_entries(node: &Node) -> usize {
        use super::node::Entry;

        node.entries
            .iter()
            .map(|entry| match entry {
                Entry::Node { node, .. } => Self::count_entries(node),
                Entry::Data { .. } => 1,
            })
            .sum()
    }

    /// 已登记的ID数量（O(1)，与 `len` 在一致状态下相等）
    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// 获取某个ID当前的位置 [经度, 纬度]
    pub fn get(&self, data: i64) -> Option<[f64; 2]> {
        self.points.get(&data).copied()
    }

    /// 遍历所有 (ID, 位置)
    pub fn iter(&self) -> impl Iterator<Item = (i64, [f64; 2])> + '_ {
        self.points.iter().map(|(id, point)| (*id, *point))
    }

    pub(crate) fn root_mut(&mut self) -> &mut Option<Box<Node>> {
        &mut self.root
    }

    pub(crate) fn root_ref(&self) -> &Option<Box<Node>> {
        &self.root
    }

    pub(crate) fn max_entries_internal(&self) -> usize {
        self.max_entries
    }

    pub(crate) fn min_entries_internal(&self) -> usize {
        self.min_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtree_creation() {
        let rtree = RTree::new(10);
        assert_eq!(rtree.max_entries(), 10);
        assert_eq!(rtree.min_entries(), 5);
        assert!(rtree.is_empty());
        assert_eq!(rtree.depth(), 0);
        assert!(rtree.root_mbr().is_none());
    }

    #[test]
    fn test_rtree_insert_single() {
        let mut rtree = RTree::new(4);
        rtree.insert_point(1, 20.0, 10.0);

        assert!(!rtree.is_empty());
        assert_eq!(rtree.len(), 1);
        assert_eq!(rtree.count(), 1);
        assert_eq!(rtree.depth(), 1);
        assert_eq!(rtree.get(1), Some([20.0, 10.0]));
    }

    #[test]
    fn test_rtree_grows_and_counts_match() {
        let mut rtree = RTree::new(4);
        for i in 0..50 {
            rtree.insert_point(i, (i % 7) as f64, (i / 7) as f64);
        }

        assert_eq!(rtree.len(), 50);
        assert_eq!(rtree.count(), 50);
        assert!(rtree.depth() > 1);
        assert_eq!(rtree.iter().count(), 50);
    }
}

use super::super::node::{Entry, Node};
use super::super::rtree::RTree;

/// R-tree工具函数实现
impl RTree {
    /// 向上调整树 - 更新MBR
    ///
    /// 从路径末端节点开始逐层向上，重新计算节点MBR并同步到父节点中对应条目的MBR
    pub(crate) fn adjust_tree_upward(&mut self, mut path: Vec<usize>) {
        loop {
            let current_mbr = match self.get_last_node_mut(&path) {
                Some(node) => {
                    node.update_mbr();
                    node.mbr
                }
                None => return,
            };

            // 已经到达根节点
            let Some(index) = path.pop() else {
                return;
            };

            let Some(parent) = self.get_last_node_mut(&path) else {
                return;
            };
            if let Some(Entry::Node { mbr, .. }) = parent.entries.get_mut(index) {
                *mbr = current_mbr;
            }
        }
    }

    /// 获取路径中最后一个节点的可变引用
    ///
    /// 根据给定的路径从根节点开始遍历，空路径返回根节点
    pub(crate) fn get_last_node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut current: &mut Node = self.root_mut().as_deref_mut()?;

        for &index in path {
            match current.entries.get_mut(index) {
                Some(Entry::Node { node, .. }) => current = node,
                _ => return None,
            }
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtree::Rectangle;

    #[test]
    fn test_get_last_node_mut() {
        let mut rtree = RTree::new(4);
        assert!(rtree.get_last_node_mut(&[]).is_none());

        for i in 0..5 {
            rtree.insert_point(i, i as f64 * 2.0, i as f64 * 2.0);
        }

        // 空路径返回根节点
        assert!(rtree.get_last_node_mut(&[]).is_some());
        // 5 个条目超过 M=4，根节点已分裂为索引节点
        assert!(rtree.get_last_node_mut(&[0]).is_some());
        assert!(rtree.get_last_node_mut(&[99]).is_none());
    }

    #[test]
    fn test_adjust_tree_upward_keeps_root_mbr() {
        let mut rtree = RTree::new(3);
        for i in 0..4 {
            rtree.insert_point(i, i as f64 * 2.0, i as f64 * 2.0);
        }

        rtree.adjust_tree_upward(vec![]);

        let root_mbr = rtree.root_mbr().copied().unwrap();
        assert!(root_mbr.contains(&Rectangle::from_point(0.0, 0.0)));
        assert!(root_mbr.contains(&Rectangle::from_point(6.0, 6.0)));
    }
}

use super::super::node::{Entry, Node};
use super::super::rectangle::Rectangle;
use super::super::rtree::RTree;

/// 插入操作相关算法
impl RTree {
    /// 插入或替换一个点 - 同一ID已存在时先删除旧位置
    pub fn insert_point(&mut self, data: i64, x: f64, y: f64) {
        if self.points.contains_key(&data) {
            self.delete(data);
        }

        self.insert(Rectangle::from_point(x, y), data);
        self.points.insert(data, [x, y]);
    }

    /// 插入新的数据条目 - 遵循论文Algorithm Insert
    ///
    /// 只维护树结构，不登记 `points`；删除时的重新插入也走这里
    pub(crate) fn insert(&mut self, rect: Rectangle, data: i64) {
        // I1: 如果根节点不存在，创建根节点
        if self.root_ref().is_none() {
            let mut root = Node::new_leaf_node();
            root.add_entry(Entry::Data { mbr: rect, data });
            *self.root_mut() = Some(Box::new(root));
            return;
        }

        // I2: 选择叶子节点
        let leaf_path = self.choose_leaf_path(&rect);

        // I3: 添加记录到叶子节点
        let max_entries = self.max_entries_internal();
        let overflow = match self.get_last_node_mut(&leaf_path) {
            Some(leaf_node) => {
                debug_assert!(leaf_node.is_leaf_node());
                leaf_node.add_entry(Entry::Data { mbr: rect, data });
                leaf_node.entries.len() > max_entries
            }
            None => return,
        };

        // I4: 检查是否需要分裂并调整树
        if overflow {
            self.handle_overflow(leaf_path);
        } else {
            self.adjust_tree_upward(leaf_path);
        }
    }

    /// 选择叶子节点路径 - 遵循论文ChooseLeaf算法
    fn choose_leaf_path(&self, rect: &Rectangle) -> Vec<usize> {
        let mut path = Vec::new();
        let Some(mut current) = self.root_ref().as_deref() else {
            return path;
        };

        while !current.is_leaf_node() {
            // CL3: 选择子树 - 选择扩大面积最小的条目
            let best_index = Self::choose_subtree(&current.entries, rect);

            // CL4: 下降到子节点
            match current.entries.get(best_index) {
                Some(Entry::Node { node, .. }) => {
                    path.push(best_index);
                    current = node;
                }
                _ => break,
            }
        }

        path
    }

    /// 选择子树 - 面积扩大量最小者优先，其次面积最小，最后周长扩大量最小
    fn choose_subtree(entries: &[Entry], rect: &Rectangle) -> usize {
        let mut best_index = 0;
        let mut best_key = (f64::INFINITY, f64::INFINITY, f64::INFINITY);

        for (i, entry) in entries.iter().enumerate() {
            let mbr = entry.mbr();
            let key = (
                mbr.enlargement(rect),
                mbr.area(),
                mbr.margin_enlargement(rect),
            );

            if key < best_key {
                best_key = key;
                best_index = i;
            }
        }

        best_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_basic() {
        let mut rtree = RTree::new(4);

        assert!(rtree.is_empty());
        rtree.insert_point(1, 0.0, 0.0);
        assert_eq!(rtree.len(), 1);

        rtree.insert_point(2, 5.0, 5.0);
        rtree.insert_point(3, 20.0, 20.0);
        assert_eq!(rtree.len(), 3);
    }

    #[test]
    fn test_insert_same_id_overwrites() {
        let mut rtree = RTree::new(4);

        rtree.insert_point(42, 1.0, 2.0);
        rtree.insert_point(42, 10.0, 20.0);

        // 覆盖而不是添加
        assert_eq!(rtree.len(), 1);
        assert_eq!(rtree.count(), 1);
        assert_eq!(rtree.get(42), Some([10.0, 20.0]));

        // 旧位置查不到，新位置可以查到
        let old = rtree.search_bbox(&Rectangle::new(0.5, 1.5, 1.5, 2.5));
        assert!(!old.contains(&42));
        let new = rtree.search_bbox(&Rectangle::new(9.5, 19.5, 10.5, 20.5));
        assert!(new.contains(&42));
    }

    #[test]
    fn test_insert_same_point_twice_is_idempotent() {
        let mut rtree = RTree::new(4);
        rtree.insert_point(7, 3.0, 4.0);
        rtree.insert_point(7, 3.0, 4.0);

        assert_eq!(rtree.len(), 1);
        assert_eq!(rtree.search_bbox(&Rectangle::from_point(3.0, 4.0)), vec![7]);
    }

    #[test]
    fn test_choose_subtree() {
        let entries = vec![
            Entry::Data {
                mbr: Rectangle::new(0.0, 0.0, 5.0, 5.0),
                data: 1,
            },
            Entry::Data {
                mbr: Rectangle::new(10.0, 10.0, 15.0, 15.0),
                data: 2,
            },
            Entry::Data {
                mbr: Rectangle::new(20.0, 20.0, 25.0, 25.0),
                data: 3,
            },
        ];

        // 第一个条目已包含测试矩形，无需扩大
        let best_index = RTree::choose_subtree(&entries, &Rectangle::new(2.0, 2.0, 3.0, 3.0));
        assert_eq!(best_index, 0);
    }

    #[test]
    fn test_choose_leaf_path_descends_index_nodes() {
        let mut rtree = RTree::new(3);
        for i in 0..6 {
            rtree.insert_point(i, (i as f64) * 2.0, 0.0);
        }

        let root_is_index = rtree.root_ref().as_ref().is_some_and(|r| r.is_index_node());
        assert!(root_is_index);
        let path = rtree.choose_leaf_path(&Rectangle::from_point(0.5, 0.5));
        assert!(!path.is_empty());
    }
}

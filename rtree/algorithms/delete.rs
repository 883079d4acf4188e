use super::super::node::{Entry, Node};
use super::super::rectangle::Rectangle;
use super::super::rtree::RTree;

/// R-tree删除算法实现
impl RTree {
    /// 删除指定ID的条目 - 遵循论文Algorithm Delete
    ///
    /// 返回是否真的删除了条目；ID 不存在时什么都不做
    pub fn delete(&mut self, data: i64) -> bool {
        let Some([x, y]) = self.points.remove(&data) else {
            return false;
        };

        self.delete_in_rtree(&Rectangle::from_point(x, y), data)
    }

    /// 从树结构中删除 (rect, data) 条目
    pub(crate) fn delete_in_rtree(&mut self, rect: &Rectangle, data: i64) -> bool {
        // D1: 找到包含目标条目的叶子节点
        let Some(leaf_path) = self.find_leaf_path(rect, data) else {
            return false;
        };

        // D2: 从叶子节点删除条目
        let removed = match self.get_last_node_mut(&leaf_path) {
            Some(leaf_node) => {
                let initial_count = leaf_node.entries.len();
                leaf_node.entries.retain(|entry| {
                    !matches!(entry, Entry::Data { mbr, data: entry_data }
                        if mbr == rect && *entry_data == data)
                });
                leaf_node.entries.len() != initial_count
            }
            None => false,
        };
        if !removed {
            return false;
        }

        // D3: 压缩树，重新插入下溢节点中的条目
        self.condense_tree(leaf_path);

        // D4: 根节点只有一个子节点时缩短树
        self.shorten_tree();

        true
    }

    /// 查找包含指定数据条目的叶子节点路径
    pub(crate) fn find_leaf_path(&self, rect: &Rectangle, data: i64) -> Option<Vec<usize>> {
        let root = self.root_ref().as_deref()?;
        let mut path = Vec::new();
        Self::find_leaf_recursive(root, rect, data, &mut path).then_some(path)
    }

    fn find_leaf_recursive(node: &Node, rect: &Rectangle, data: i64, path: &mut Vec<usize>) -> bool {
        if node.is_leaf_node() {
            return node.entries.iter().any(|entry| {
                matches!(entry, Entry::Data { mbr, data: entry_data }
                    if mbr == rect && *entry_data == data)
            });
        }

        for (i, entry) in node.entries.iter().enumerate() {
            if let Entry::Node { mbr, node: child } = entry {
                // 只在MBR包含目标矩形的子树中搜索
                if mbr.contains(rect) {
                    path.push(i);
                    if Self::find_leaf_recursive(child, rect, data, path) {
                        return true;
                    }
                    path.pop();
                }
            }
        }

        false
    }

    /// CondenseTree - 从叶子向上处理下溢
    ///
    /// 下溢节点从父节点中移除，其子树中的数据条目收集起来，
    /// 整棵树调整完毕后再逐个重新插入
    pub(crate) fn condense_tree(&mut self, mut path: Vec<usize>) {
        let min_entries = self.min_entries_internal();
        let mut orphans: Vec<(Rectangle, i64)> = Vec::new();

        while let Some(child_index) = path.pop() {
            let Some(parent) = self.get_last_node_mut(&path) else {
                break;
            };

            let underflow = match parent.entries.get(child_index) {
                Some(Entry::Node { node, .. }) => node.entries.len() < min_entries,
                _ => false,
            };

            if underflow {
                if let Entry::Node { node, .. } = parent.entries.remove(child_index) {
                    node.collect_data(&mut orphans);
                }
            } else if let Some(Entry::Node { mbr, node }) = parent.entries.get_mut(child_index) {
                node.update_mbr();
                *mbr = node.mbr;
            }
            parent.update_mbr();
        }

        // 根节点变空时清空整棵树
        let root_empty = match self.root_mut() {
            Some(root) => {
                root.update_mbr();
                root.entries.is_empty()
            }
            None => false,
        };
        if root_empty {
            *self.root_mut() = None;
        }

        for (mbr, data) in orphans {
            self.insert(mbr, data);
        }
    }

    /// 缩短树 - 根节点为只有一个条目的索引节点时，将其子节点提升为根
    pub(crate) fn shorten_tree(&mut self) {
        loop {
            let should_shorten = self
                .root_ref()
                .as_ref()
                .is_some_and(|root| root.is_index_node() && root.entries.len() == 1);
            if !should_shorten {
                break;
            }

            let Some(mut old_root) = self.root_mut().take() else {
                break;
            };
            match old_root.entries.pop() {
                Some(Entry::Node { node, .. }) => *self.root_mut() = Some(node),
                Some(entry) => {
                    // 不应出现：索引节点中的数据条目，原样放回
                    old_root.entries.push(entry);
                    *self.root_mut() = Some(old_root);
                    break;
                }
                None => break,
            }
        }
    }
}

use super::super::node::{Entry, Node};
use super::super::rectangle::Rectangle;
use super::super::rtree::RTree;

/// 节点分裂算法 - 二次分裂(Quadratic Split)
impl RTree {
    /// 处理节点溢出
    pub(crate) fn handle_overflow(&mut self, path: Vec<usize>) {
        if !path.is_empty() {
            self.split_and_propagate(path);
            return;
        }

        // 根节点溢出 - 分裂后创建新的根节点
        let Some(old_root) = self.root_mut().take() else {
            return;
        };
        let (group1, group2) = self.quadratic_split(old_root.entries);

        let mut node1 = Node::new(old_root.node_type, old_root.level);
        node1.entries = group1;
        node1.update_mbr();

        let mut node2 = Node::new(old_root.node_type, old_root.level);
        node2.entries = group2;
        node2.update_mbr();

        let mut new_root = Node::new_index_node(old_root.level + 1);
        new_root.add_entry(Entry::Node {
            mbr: node1.mbr,
            node: Box::new(node1),
        });
        new_root.add_entry(Entry::Node {
            mbr: node2.mbr,
            node: Box::new(node2),
        });

        *self.root_mut() = Some(Box::new(new_root));
    }

    /// 分裂非根节点，并在父节点溢出时继续向上传播
    pub(crate) fn split_and_propagate(&mut self, mut path: Vec<usize>) {
        let max_entries = self.max_entries_internal();

        let (entries, node_type, level) = {
            let Some(node) = self.get_last_node_mut(&path) else {
                return;
            };
            if node.entries.len() <= max_entries {
                self.adjust_tree_upward(path);
                return;
            }
            (std::mem::take(&mut node.entries), node.node_type, node.level)
        };

        let (group1, group2) = self.quadratic_split(entries);

        // 原节点保留第一组
        let kept_mbr = {
            let Some(node) = self.get_last_node_mut(&path) else {
                return;
            };
            node.entries = group1;
            node.update_mbr();
            node.mbr
        };

        // 第二组放入新的兄弟节点
        let mut sibling = Node::new(node_type, level);
        sibling.entries = group2;
        sibling.update_mbr();

        let Some(index) = path.pop() else {
            return;
        };
        let parent_overflow = {
            let Some(parent) = self.get_last_node_mut(&path) else {
                return;
            };
            if let Some(Entry::Node { mbr, .. }) = parent.entries.get_mut(index) {
                *mbr = kept_mbr;
            }
            parent.add_entry(Entry::Node {
                mbr: sibling.mbr,
                node: Box::new(sibling),
            });
            parent.entries.len() > max_entries
        };

        if parent_overflow {
            self.handle_overflow(path);
        } else {
            self.adjust_tree_upward(path);
        }
    }

    /// 二次分裂算法 - 遵循Gut84论文Algorithm QuadraticSplit
    fn quadratic_split(&self, mut entries: Vec<Entry>) -> (Vec<Entry>, Vec<Entry>) {
        let min_entries = self.min_entries_internal();
        let total_entries = entries.len();

        // QS1: 选择种子
        let (seed1, seed2) = Self::pick_seeds(&entries);

        // 先移除索引大的，避免 swap_remove 打乱另一个种子
        let mut group1 = vec![entries.swap_remove(seed1.max(seed2))];
        let mut group2 = vec![entries.swap_remove(seed1.min(seed2))];

        while !entries.is_empty() {
            // QS2: 某一组已满额时，剩余条目全部分给另一组以满足最小条目数
            if group1.len() == total_entries - min_entries {
                group2.append(&mut entries);
                break;
            } else if group2.len() == total_entries - min_entries {
                group1.append(&mut entries);
                break;
            }

            // QS3: 选择偏好最强的条目
            let (next_index, to_first) = Self::pick_next(&entries, &group1, &group2);
            let entry = entries.swap_remove(next_index);

            if to_first {
                group1.push(entry);
            } else {
                group2.push(entry);
            }
        }

        (group1, group2)
    }

    /// PickSeeds算法 - 选择组合后死空间最大的两个条目
    ///
    /// 点数据死空间可能全为0，此时以组合周长区分
    fn pick_seeds(entries: &[Entry]) -> (usize, usize) {
        let mut max_waste = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut best_pair = (0, 1);

        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let rect1 = entries[i].mbr();
                let rect2 = entries[j].mbr();
                let combined = rect1.union(rect2);
                let waste = (
                    combined.area() - rect1.area() - rect2.area(),
                    combined.perimeter(),
                );

                if waste > max_waste {
                    max_waste = waste;
                    best_pair = (i, j);
                }
            }
        }

        best_pair
    }

    /// PickNext算法 - 返回 (条目索引, 是否分给第一组)
    fn pick_next(remaining: &[Entry], group1: &[Entry], group2: &[Entry]) -> (usize, bool) {
        let group1_mbr = Self::calculate_group_mbr(group1);
        let group2_mbr = Self::calculate_group_mbr(group2);

        let mut max_preference = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut best_entry = 0;
        let mut to_first = true;

        for (i, entry) in remaining.iter().enumerate() {
            let entry_mbr = entry.mbr();
            let cost1 = (
                group1_mbr.enlargement(entry_mbr),
                group1_mbr.margin_enlargement(entry_mbr),
            );
            let cost2 = (
                group2_mbr.enlargement(entry_mbr),
                group2_mbr.margin_enlargement(entry_mbr),
            );
            let preference = ((cost1.0 - cost2.0).abs(), (cost1.1 - cost2.1).abs());

            if preference > max_preference {
                max_preference = preference;
                best_entry = i;
                to_first = if cost1 == cost2 {
                    // 扩大成本相同：面积较小的组优先，再比较条目数
                    (group1_mbr.area(), group1.len()) <= (group2_mbr.area(), group2.len())
                } else {
                    cost1 < cost2
                };
            }
        }

        (best_entry, to_first)
    }

    fn calculate_group_mbr(group: &[Entry]) -> Rectangle {
        let mut iter = group.iter().map(Entry::mbr);
        match iter.next() {
            Some(first) => iter.fold(*first, |acc, mbr| acc.union(mbr)),
            None => Rectangle::new(0.0, 0.0, 0.0, 0.0),
        }
    }
}

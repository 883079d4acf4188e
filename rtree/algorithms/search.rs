use super::super::node::{Entry, Node};
use super::super::rectangle::Rectangle;
use super::super::rtree::RTree;

/// 搜索操作相关算法
impl RTree {
    /// 返回位置落在查询矩形内（含边界）的所有ID
    #[cfg(test)]
    pub(crate) fn search_bbox(&self, query: &Rectangle) -> Vec<i64> {
        self.search_points(query, 0)
            .into_iter()
            .map(|(data, _)| data)
            .collect()
    }

    /// 返回位置落在查询矩形内的 (ID, [经度, 纬度])
    ///
    /// limit == 0 表示无限制
    pub fn search_points(&self, query: &Rectangle, limit: usize) -> Vec<(i64, [f64; 2])> {
        let mut results = Vec::new();

        if let Some(root) = self.root_ref() {
            Self::search_recursive(root, query, &mut results, limit);
        }

        results
    }

    /// 递归搜索 - 遵循论文Search算法
    fn search_recursive(
        node: &Node,
        query: &Rectangle,
        results: &mut Vec<(i64, [f64; 2])>,
        limit: usize,
    ) {
        for entry in &node.entries {
            if limit > 0 && results.len() >= limit {
                return;
            }
            // S1: 只下降到与查询矩形相交的子树
            if !entry.mbr().intersects(query) {
                continue;
            }
            match entry {
                // S2: 点条目与查询矩形相交即被包含
                Entry::Data { mbr, data } => results.push((*data, mbr.min)),
                Entry::Node { node, .. } => Self::search_recursive(node, query, results, limit),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_bbox() {
        let mut rtree = RTree::new(4);
        rtree.insert_point(1, 5.0, 5.0);
        rtree.insert_point(2, 10.0, 10.0);
        rtree.insert_point(3, 25.0, 25.0);

        let mut results = rtree.search_bbox(&Rectangle::new(0.0, 0.0, 15.0, 15.0));
        results.sort();
        assert_eq!(results, vec![1, 2]);

        assert!(rtree.search_bbox(&Rectangle::new(50.0, 50.0, 60.0, 60.0)).is_empty());
    }

    #[test]
    fn test_search_returns_positions() {
        let mut rtree = RTree::new(4);
        rtree.insert_point(1, 20.0, 10.0);

        let results = rtree.search_points(&Rectangle::new(19.0, 9.0, 21.0, 11.0), 0);
        assert_eq!(results, vec![(1, [20.0, 10.0])]);
    }

    #[test]
    fn test_search_with_limit() {
        let mut rtree = RTree::new(3);
        for i in 1..=10 {
            rtree.insert_point(i, i as f64, i as f64);
        }

        let query = Rectangle::new(0.0, 0.0, 11.0, 11.0);
        assert_eq!(rtree.search_points(&query, 0).len(), 10);
        assert_eq!(rtree.search_points(&query, 3).len(), 3);
        assert_eq!(rtree.search_points(&query, 20).len(), 10);
    }

    #[test]
    fn test_search_matches_linear_scan() {
        let mut rtree = RTree::new(8);
        let mut points = Vec::new();
        for i in 0..500i64 {
            // 伪随机但确定的分布
            let x = ((i * 7919) % 360) as f64 - 180.0;
            let y = ((i * 104_729) % 180) as f64 - 90.0;
            rtree.insert_point(i, x, y);
            points.push((i, x, y));
        }

        let query = Rectangle::new(-30.0, -20.0, 45.0, 35.0);
        let mut found = rtree.search_bbox(&query);
        found.sort();
        let expected: Vec<i64> = points
            .iter()
            .filter(|(_, x, y)| query.contains_point(*x, *y))
            .map(|(id, _, _)| *id)
            .collect();
        assert_eq!(found, expected);
    }
}

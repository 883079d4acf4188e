use super::geo_utils::{BoundingBox, Coordinate};
use crate::error::GeoSearchError;
use crate::rtree::RTree;
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

/// 一个已索引的 `(item, field)` 位置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub item_id: i64,
    pub field_name: String,
    pub position: Coordinate,
}

/// 重建暂存期间记录的索引写入
#[derive(Debug, Clone)]
enum JournalOp {
    Upsert {
        item_id: i64,
        field_name: String,
        position: Coordinate,
    },
    Delete {
        item_id: i64,
        field_name: String,
    },
    Clear,
}

type Journal = Arc<Mutex<Option<Vec<JournalOp>>>>;

/// 坐标字段的空间索引，每个字段名一棵 R-tree
///
/// 每棵树以 item id 为键，因此 `(item_id, field_name)` 天然唯一。
/// 同一字段的写入由该字段的锁串行化，不同字段之间互不阻塞；
/// 读者看到的是获取读锁那一刻的树。
pub struct IndexStore {
    // SharedMap: 外层管理各字段的树，内层管理单棵树
    fields: Arc<RwLock<HashMap<String, Arc<RwLock<RTree>>>>>,
    // Some(..) while a rebuild is staging; live writes are also appended here
    journal: Journal,
    max_children: usize,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new(10)
    }
}

impl IndexStore {
    pub fn new(max_children: usize) -> Self {
        Self {
            fields: Arc::new(RwLock::new(HashMap::new())),
            journal: Arc::new(Mutex::new(None)),
            max_children: max_children.max(2),
        }
    }

    pub fn max_children(&self) -> usize {
        self.max_children
    }

    /// 获取 `field_name` 对应的树，不存在则创建
    ///
    /// 返回的外层读锁必须在整个写入期间保持，重建提交才无法在写入中途替换整张表
    async fn field_tree(
        &self,
        field_name: &str,
    ) -> (
        RwLockReadGuard<'_, HashMap<String, Arc<RwLock<RTree>>>>,
        Arc<RwLock<RTree>>,
    ) {
        loop {
            {
                let fields = self.fields.read().await;
                if let Some(tree) = fields.get(field_name) {
                    let tree = Arc::clone(tree);
                    return (fields, tree);
                }
            }

            // 双检查：等待写锁期间可能已有其他任务创建
            let mut fields = self.fields.write().await;
            fields
                .entry(field_name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(RTree::new(self.max_children))));
        }
    }

    fn record(&self, op: JournalOp) {
        let mut journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ops) = journal.as_mut() {
            ops.push(op);
        }
    }

    /// 插入或替换 `(item_id, field_name)` 的条目
    pub async fn upsert(&self, item_id: i64, field_name: &str, position: Coordinate) -> Result<()> {
        if !position.lat.is_finite() || !position.lng.is_finite() {
            return Err(GeoSearchError::Storage(format!(
                "refusing to index non-finite position for item {}",
                item_id
            )));
        }

        let (_fields, handle) = self.field_tree(field_name).await;
        let mut tree = handle.write().await;
        tree.insert_point(item_id, position.lng, position.lat);
        self.record(JournalOp::Upsert {
            item_id,
            field_name: field_name.to_string(),
            position,
        });

        debug!(item_id, field = field_name, lat = position.lat, lng = position.lng, "index upsert");
        Ok(())
    }

    /// 删除 `(item_id, field_name)` 的条目，返回条目是否存在
    pub async fn delete(&self, item_id: i64, field_name: &str) -> Result<bool> {
        let fields = self.fields.read().await;
        let removed = match fields.get(field_name) {
            Some(handle) => {
                // 持有树锁直到写入日志，保证同一字段上树与日志的顺序一致
                let mut tree = handle.write().await;
                let removed = tree.delete(item_id);
                self.record(JournalOp::Delete {
                    item_id,
                    field_name: field_name.to_string(),
                });
                removed
            }
            None => {
                // 即使当前索引中没有该条目也要记录，重建扫描可能已读到旧值
                self.record(JournalOp::Delete {
                    item_id,
                    field_name: field_name.to_string(),
                });
                false
            }
        };
        drop(fields);

        debug!(item_id, field = field_name, removed, "index delete");
        Ok(removed)
    }

    /// 清空所有条目
    pub async fn clear(&self) -> Result<()> {
        let mut fields = self.fields.write().await;
        fields.clear();
        self.record(JournalOp::Clear);
        info!("index cleared");
        Ok(())
    }

    /// `field_name` 中位于 `bbox` 内的所有条目（包含边界）
    pub async fn query_bounding_box(&self, field_name: &str, bbox: &BoundingBox) -> Result<Vec<IndexEntry>> {
        let handle = {
            let fields = self.fields.read().await;
            match fields.get(field_name) {
                Some(handle) => Arc::clone(handle),
                None => return Ok(Vec::new()),
            }
        };

        let tree = handle.read().await;
        let entries = tree
            .search_points(&bbox.to_rectangle(), 0)
            .into_iter()
            .map(|(item_id, [lng, lat])| IndexEntry {
                item_id,
                field_name: field_name.to_string(),
                position: Coordinate { lat, lng },
            })
            .collect();

        Ok(entries)
    }

    /// `(item_id, field_name)` 当前的位置
    pub async fn get(&self, item_id: i64, field_name: &str) -> Option<Coordinate> {
        let handle = {
            let fields = self.fields.read().await;
            Arc::clone(fields.get(field_name)?)
        };
        let tree = handle.read().await;
        tree.get(item_id).map(|[lng, lat]| Coordinate { lat, lng })
    }

    /// 索引中的全部条目，按字段名、item id 排序
    pub async fn entries(&self) -> Vec<IndexEntry> {
        let fields = self.fields.read().await;
        let mut out = Vec::new();
        for (field_name, handle) in fields.iter() {
            let tree = handle.read().await;
            out.extend(tree.iter().map(|(item_id, [lng, lat])| IndexEntry {
                item_id,
                field_name: field_name.clone(),
                position: Coordinate { lat, lng },
            }));
        }
        out.sort_by(|a, b| (&a.field_name, a.item_id).cmp(&(&b.field_name, b.item_id)));
        out
    }

    pub async fn len(&self) -> usize {
        self.stats().await.total_entries
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> IndexStats {
        let fields = self.fields.read().await;
        let mut per_field = Vec::with_capacity(fields.len());
        for (name, handle) in fields.iter() {
            let tree = handle.read().await;
            let entries = tree.count();
            per_field.push(FieldStats {
                field_name: name.clone(),
                entries,
                depth: tree.depth(),
                extent: tree
                    .root_mbr()
                    .filter(|_| entries > 0)
                    .map(BoundingBox::from_rectangle),
            });
        }
        per_field.sort_by(|a, b| a.field_name.cmp(&b.field_name));

        IndexStats {
            total_entries: per_field.iter().map(|f| f.entries).sum(),
            fields: per_field,
        }
    }

    /// 开始一次重建，数据写入独立的暂存区
    ///
    /// 暂存提交之前，所有实时写入同时记入日志，提交时在重建结果上重放。
    /// 同一时间只允许一个重建；未提交就丢弃暂存即放弃重建，实时索引保持不变。
    pub fn begin_rebuild(&self) -> Result<RebuildStaging> {
        let mut journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
        if journal.is_some() {
            return Err(GeoSearchError::Storage(
                "a rebuild is already in progress".to_string(),
            ));
        }
        *journal = Some(Vec::new());

        Ok(RebuildStaging {
            trees: HashMap::new(),
            max_children: self.max_children,
            journal: Arc::clone(&self.journal),
            finished: false,
        })
    }

    /// 重放暂存期间的写入，然后原子地换入暂存的树，返回重放的写入数
    pub async fn commit_rebuild(&self, mut staging: RebuildStaging) -> usize {
        // 外层写锁等待所有进行中的写入完成，此后日志不会再增长
        let mut fields = self.fields.write().await;
        let ops = {
            let mut journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
            journal.take().unwrap_or_default()
        };
        staging.finished = true;

        let replayed = ops.len();
        for op in ops {
            match op {
                JournalOp::Upsert {
                    item_id,
                    field_name,
                    position,
                } => staging.upsert(item_id, &field_name, position),
                JournalOp::Delete {
                    item_id,
                    field_name,
                } => {
                    staging.delete(item_id, &field_name);
                }
                JournalOp::Clear => staging.trees.clear(),
            }
        }

        *fields = std::mem::take(&mut staging.trees)
            .into_iter()
            .map(|(name, tree)| (name, Arc::new(RwLock::new(tree))))
            .collect();

        info!(replayed, fields = fields.len(), "rebuilt index swapped in");
        replayed
    }
}

/// 在实时索引之外重建中的树
pub struct RebuildStaging {
    trees: HashMap<String, RTree>,
    max_children: usize,
    journal: Journal,
    finished: bool,
}

impl RebuildStaging {
    pub fn upsert(&mut self, item_id: i64, field_name: &str, position: Coordinate) {
        let max_children = self.max_children;
        self.trees
            .entry(field_name.to_string())
            .or_insert_with(|| RTree::new(max_children))
            .insert_point(item_id, position.lng, position.lat);
    }

    pub fn delete(&mut self, item_id: i64, field_name: &str) -> bool {
        self.trees
            .get_mut(field_name)
            .is_some_and(|tree| tree.delete(item_id))
    }

    pub fn len(&self) -> usize {
        self.trees.values().map(RTree::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for RebuildStaging {
    fn drop(&mut self) {
        if !self.finished {
            let mut journal = self.journal.lock().unwrap_or_else(|e| e.into_inner());
            *journal = None;
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldStats {
    pub field_name: String,
    pub entries: usize,
    pub depth: usize,
    /// 该字段所有条目的外包矩形
    pub extent: Option<BoundingBox>,
}

/// 索引统计信息
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_entries: usize,
    pub fields: Vec<FieldStats>,
}

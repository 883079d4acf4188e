use crate::content::{BoxFuture, ContentRepository, FieldEvent, FieldObserver};
use crate::registry::FieldRegistry;
use crate::storage::{parse_coordinate, IndexStore};
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 单个字段事件对索引的影响
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// 条目被插入或替换
    Indexed,
    /// 条目被删除（或本就不存在）
    Removed,
    /// `(content type, field)` 未注册，索引未改动
    NotRegistered,
    /// 值不是有效坐标，未为其建立索引
    Skipped,
}

/// 全量重建的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildStats {
    pub indexed: usize,
    pub skipped: usize,
}

/// 使 [`IndexStore`] 与坐标字段的变更保持一致
pub struct IndexSynchronizer {
    registry: Arc<dyn FieldRegistry>,
    store: Arc<IndexStore>,
}

impl IndexSynchronizer {
    pub fn new(registry: Arc<dyn FieldRegistry>, store: Arc<IndexStore>) -> Self {
        Self { registry, store }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub async fn on_field_written(
        &self,
        item_id: i64,
        content_type: &str,
        field_name: &str,
        value: &Value,
    ) -> Result<SyncOutcome> {
        if !self.registry.is_indexed(content_type, field_name) {
            return Ok(SyncOutcome::NotRegistered);
        }

        match parse_coordinate(value) {
            Ok(position) => {
                self.store.upsert(item_id, field_name, position).await?;
                Ok(SyncOutcome::Indexed)
            }
            Err(e) => {
                warn!(item_id, content_type, field = field_name, error = %e, "skipping unparsable coordinate");
                // 字段已不再是有效坐标，旧位置不能继续留在索引中
                self.store.delete(item_id, field_name).await?;
                Ok(SyncOutcome::Skipped)
            }
        }
    }

    pub async fn on_field_deleted(
        &self,
        item_id: i64,
        content_type: &str,
        field_name: &str,
    ) -> Result<SyncOutcome> {
        if !self.registry.is_indexed(content_type, field_name) {
            return Ok(SyncOutcome::NotRegistered);
        }

        self.store.delete(item_id, field_name).await?;
        Ok(SyncOutcome::Removed)
    }

    /// 根据仓库中存储的值重新计算整个索引
    ///
    /// 新索引在旁路构建，结束时换入；期间到达的写入会在其上重放。
    /// 枚举失败时实时索引保持原样。
    pub async fn rebuild<R: ContentRepository + ?Sized>(&self, repo: &R) -> Result<RebuildStats> {
        let specs = self.registry.field_specs();
        info!(fields = specs.len(), "index rebuild started");

        let mut staging = self.store.begin_rebuild()?;
        let mut stats = RebuildStats::default();

        for spec in &specs {
            let values = repo
                .field_values(&spec.content_type, &spec.field_name)
                .await?;
            debug!(spec = %spec, values = values.len(), "scanning field");

            for (item_id, value) in values {
                match parse_coordinate(&value) {
                    Ok(position) => {
                        staging.upsert(item_id, &spec.field_name, position);
                        stats.indexed += 1;
                    }
                    Err(e) => {
                        warn!(item_id, spec = %spec, error = %e, "skipping unparsable coordinate during rebuild");
                        stats.skipped += 1;
                    }
                }
            }
        }

        let replayed = self.store.commit_rebuild(staging).await;
        info!(
            indexed = stats.indexed,
            skipped = stats.skipped,
            replayed,
            "index rebuild finished"
        );
        Ok(stats)
    }
}

impl FieldObserver for IndexSynchronizer {
    fn on_event<'a>(&'a self, event: &'a FieldEvent) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match event {
                FieldEvent::Written {
                    item_id,
                    content_type,
                    field_name,
                    value,
                } => {
                    self.on_field_written(*item_id, content_type, field_name, value)
                        .await?;
                }
                FieldEvent::Deleted {
                    item_id,
                    content_type,
                    field_name,
                } => {
                    self.on_field_deleted(*item_id, content_type, field_name)
                        .await?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryRepository;
    use crate::registry::{FieldSpec, StaticRegistry};
    use crate::storage::{BoundingBox, Coordinate};
    use serde_json::json;

    fn setup(specs: Vec<FieldSpec>) -> (Arc<StaticRegistry>, Arc<IndexStore>, IndexSynchronizer) {
        let registry = Arc::new(StaticRegistry::new(specs));
        let store = Arc::new(IndexStore::new(4));
        let sync = IndexSynchronizer::new(registry.clone(), store.clone());
        (registry, store, sync)
    }

    #[tokio::test]
    async fn test_written_event_indexes_registered_field() {
        let (_, store, sync) = setup(vec![FieldSpec::new("post", "location")]);

        let outcome = sync
            .on_field_written(1, "post", "location", &json!({"lat": 10.0, "lng": 20.0}))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Indexed);
        assert_eq!(
            store.get(1, "location").await,
            Some(Coordinate { lat: 10.0, lng: 20.0 })
        );
    }

    #[tokio::test]
    async fn test_unregistered_field_never_touches_store() {
        let (_, store, sync) = setup(vec![FieldSpec::new("post", "location")]);

        let value = json!({"lat": 1.0, "lng": 1.0});
        assert_eq!(
            sync.on_field_written(1, "page", "location", &value).await.unwrap(),
            SyncOutcome::NotRegistered
        );
        assert_eq!(
            sync.on_field_written(1, "post", "address", &value).await.unwrap(),
            SyncOutcome::NotRegistered
        );
        assert!(store.is_empty().await);

        store.upsert(2, "location", Coordinate { lat: 0.0, lng: 0.0 }).await.unwrap();
        assert_eq!(
            sync.on_field_deleted(2, "page", "location").await.unwrap(),
            SyncOutcome::NotRegistered
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_malformed_value_is_not_indexed() {
        let (_, store, sync) = setup(vec![FieldSpec::new("post", "location")]);

        let outcome = sync
            .on_field_written(1, "post", "location", &json!({"lat": 10.0}))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped);
        assert!(store.is_empty().await);

        // 有效值被无效值覆盖后，旧位置被移除
        sync.on_field_written(1, "post", "location", &json!({"lat": 1, "lng": 1}))
            .await
            .unwrap();
        sync.on_field_written(1, "post", "location", &json!({"lat": "", "lng": ""}))
            .await
            .unwrap();
        assert_eq!(store.get(1, "location").await, None);
    }

    #[tokio::test]
    async fn test_deleted_event_removes_entry() {
        let (_, store, sync) = setup(vec![FieldSpec::new("post", "location")]);
        sync.on_field_written(1, "post", "location", &json!({"lat": 1, "lng": 1}))
            .await
            .unwrap();

        assert_eq!(
            sync.on_field_deleted(1, "post", "location").await.unwrap(),
            SyncOutcome::Removed
        );
        let everywhere = BoundingBox::new(-180.0, -90.0, 180.0, 90.0).unwrap();
        assert!(store.query_bounding_box("location", &everywhere).await.unwrap().is_empty());

        // 重复删除无副作用
        assert_eq!(
            sync.on_field_deleted(1, "post", "location").await.unwrap(),
            SyncOutcome::Removed
        );
    }

    #[tokio::test]
    async fn test_registry_is_rechecked_per_event() {
        let (registry, store, sync) = setup(vec![]);
        let value = json!({"lat": 1, "lng": 1});

        sync.on_field_written(1, "post", "location", &value).await.unwrap();
        assert!(store.is_empty().await);

        registry.register(FieldSpec::new("post", "location"));
        sync.on_field_written(1, "post", "location", &value).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_rebuild_counts_and_replaces() {
        let (_, store, sync) = setup(vec![
            FieldSpec::new("post", "location"),
            FieldSpec::new("page", "pagelocation"),
        ]);
        let repo = MemoryRepository::new();
        let a = repo.create_item("post", "a").await;
        let b = repo.create_item("post", "b").await;
        let c = repo.create_item("page", "c").await;
        repo.write_field(a, "location", json!({"lat": 1, "lng": 1})).await.unwrap();
        repo.write_field(b, "location", json!({"lat": 2})).await.unwrap();
        repo.write_field(c, "pagelocation", json!({"lat": "3", "lng": "3"})).await.unwrap();

        // 不在源数据中的陈旧条目会被重建丢弃
        store.upsert(999, "location", Coordinate { lat: 0.0, lng: 0.0 }).await.unwrap();

        let stats = sync.rebuild(&repo).await.unwrap();
        assert_eq!(stats, RebuildStats { indexed: 2, skipped: 1 });
        assert_eq!(store.len().await, 2);
        assert_eq!(store.get(999, "location").await, None);
        assert_eq!(
            store.get(c, "pagelocation").await,
            Some(Coordinate { lat: 3.0, lng: 3.0 })
        );
    }

    #[tokio::test]
    async fn test_rebuild_with_empty_registry_clears() {
        let (_, store, sync) = setup(vec![]);
        store.upsert(1, "location", Coordinate { lat: 0.0, lng: 0.0 }).await.unwrap();

        let stats = sync.rebuild(&MemoryRepository::new()).await.unwrap();
        assert_eq!(stats, RebuildStats { indexed: 0, skipped: 0 });
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_observer_dispatch() {
        let (_, store, sync) = setup(vec![FieldSpec::new("post", "location")]);
        let sync = Arc::new(sync);
        let repo = MemoryRepository::new();
        repo.subscribe(sync.clone());

        let id = repo.create_item("post", "x").await;
        repo.write_field(id, "location", json!({"lat": 5, "lng": 6})).await.unwrap();
        assert_eq!(store.get(id, "location").await, Some(Coordinate { lat: 5.0, lng: 6.0 }));

        repo.delete_item(id).await.unwrap();
        assert!(store.is_empty().await);
    }
}

use super::{ContentItem, ContentQuery, ContentRepository, FieldEvent, FieldObserver};
use crate::error::GeoSearchError;
use crate::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use tokio::sync::{Mutex, RwLock};

/// In-process content repository.
///
/// Every field mutation is stored first and then dispatched to the
/// subscribed observers in registration order; the first observer error is
/// returned to the caller. Mutations are serialized from store through
/// dispatch, so observers see them in the order they were stored.
#[derive(Default)]
pub struct MemoryRepository {
    items: RwLock<BTreeMap<i64, ContentItem>>,
    next_id: AtomicI64,
    // 存储与派发之间持有，保证事件顺序与存储顺序一致
    write_order: Mutex<()>,
    observers: StdRwLock<Vec<Arc<dyn FieldObserver>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn FieldObserver>) {
        let mut observers = self.observers.write().unwrap_or_else(|e| e.into_inner());
        observers.push(observer);
    }

    async fn notify(&self, event: FieldEvent) -> Result<()> {
        let observers: Vec<Arc<dyn FieldObserver>> = self
            .observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for observer in observers {
            observer.on_event(&event).await?;
        }
        Ok(())
    }

    /// Create an empty item and return its id.
    pub async fn create_item(&self, content_type: &str, title: &str) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let item = ContentItem {
            id,
            content_type: content_type.to_string(),
            title: title.to_string(),
            fields: Map::new(),
        };
        self.items.write().await.insert(id, item);
        id
    }

    /// Store a complete item under its own id, dispatching a write event per field.
    pub async fn import_item(&self, item: ContentItem) -> Result<()> {
        let id = item.id;
        let content_type = item.content_type.clone();
        let fields: Vec<(String, Value)> = item
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let _order = self.write_order.lock().await;
        self.next_id.fetch_max(id, Ordering::SeqCst);
        self.items.write().await.insert(id, item);

        for (field_name, value) in fields {
            self.notify(FieldEvent::Written {
                item_id: id,
                content_type: content_type.clone(),
                field_name,
                value,
            })
            .await?;
        }
        Ok(())
    }

    pub async fn write_field(&self, item_id: i64, field_name: &str, value: Value) -> Result<()> {
        let _order = self.write_order.lock().await;
        let content_type = {
            let mut items = self.items.write().await;
            let item = items
                .get_mut(&item_id)
                .ok_or_else(|| GeoSearchError::Storage(format!("item {} does not exist", item_id)))?;
            item.fields.insert(field_name.to_string(), value.clone());
            item.content_type.clone()
        };

        self.notify(FieldEvent::Written {
            item_id,
            content_type,
            field_name: field_name.to_string(),
            value,
        })
        .await
    }

    pub async fn delete_field(&self, item_id: i64, field_name: &str) -> Result<()> {
        let _order = self.write_order.lock().await;
        let content_type = {
            let mut items = self.items.write().await;
            let item = items
                .get_mut(&item_id)
                .ok_or_else(|| GeoSearchError::Storage(format!("item {} does not exist", item_id)))?;
            if item.fields.remove(field_name).is_none() {
                return Ok(());
            }
            item.content_type.clone()
        };

        self.notify(FieldEvent::Deleted {
            item_id,
            content_type,
            field_name: field_name.to_string(),
        })
        .await
    }

    /// Remove an item, dispatching a delete event for each of its fields.
    pub async fn delete_item(&self, item_id: i64) -> Result<bool> {
        let _order = self.write_order.lock().await;
        let Some(item) = self.items.write().await.remove(&item_id) else {
            return Ok(false);
        };

        for field_name in item.fields.keys() {
            self.notify(FieldEvent::Deleted {
                item_id,
                content_type: item.content_type.clone(),
                field_name: field_name.clone(),
            })
            .await?;
        }
        Ok(true)
    }

    pub async fn get(&self, item_id: i64) -> Option<ContentItem> {
        self.items.read().await.get(&item_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl ContentRepository for MemoryRepository {
    async fn field_values(&self, content_type: &str, field_name: &str) -> Result<Vec<(i64, Value)>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| item.content_type == content_type)
            .filter_map(|item| item.fields.get(field_name).map(|v| (item.id, v.clone())))
            .collect())
    }

    async fn fetch_items(&self, ids: &[i64], query: &ContentQuery) -> Result<Vec<ContentItem>> {
        let items = self.items.read().await;
        let matched = ids
            .iter()
            .filter_map(|id| items.get(id))
            .filter(|item| query.matches(item))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::BoxFuture;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<FieldEvent>>,
    }

    impl FieldObserver for Recorder {
        fn on_event<'a>(&'a self, event: &'a FieldEvent) -> BoxFuture<'a, Result<()>> {
            Box::pin(async move {
                self.events.lock().unwrap().push(event.clone());
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_write_and_delete_dispatch_events() {
        let repo = MemoryRepository::new();
        let recorder = Arc::new(Recorder::default());
        repo.subscribe(recorder.clone());

        let id = repo.create_item("post", "Hello").await;
        repo.write_field(id, "location", json!({"lat": 1.0, "lng": 2.0})).await.unwrap();
        repo.delete_field(id, "location").await.unwrap();
        // 字段已不存在，不再派发事件
        repo.delete_field(id, "location").await.unwrap();

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], FieldEvent::Written { field_name, .. } if field_name == "location"));
        assert!(matches!(&events[1], FieldEvent::Deleted { content_type, .. } if content_type == "post"));
    }

    #[derive(Default)]
    struct LastValue {
        values: Mutex<BTreeMap<i64, Value>>,
    }

    impl FieldObserver for LastValue {
        fn on_event<'a>(&'a self, event: &'a FieldEvent) -> BoxFuture<'a, Result<()>> {
            Box::pin(async move {
                if let FieldEvent::Written { item_id, value, .. } = event {
                    // 让出调度，放大并发写入交错的机会
                    tokio::task::yield_now().await;
                    self.values.lock().unwrap().insert(*item_id, value.clone());
                }
                Ok(())
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_writes_dispatch_in_store_order() {
        let repo = Arc::new(MemoryRepository::new());
        let observer = Arc::new(LastValue::default());
        repo.subscribe(observer.clone());
        let id = repo.create_item("post", "Race").await;

        let mut tasks = Vec::new();
        for n in 0..64 {
            let repo = Arc::clone(&repo);
            tasks.push(tokio::spawn(async move {
                repo.write_field(id, "location", json!({"lat": n, "lng": n})).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // 观察者最后看到的值就是仓库中存储的值
        let stored = repo.get(id).await.unwrap().fields["location"].clone();
        assert_eq!(observer.values.lock().unwrap().get(&id), Some(&stored));
    }

    #[tokio::test]
    async fn test_write_to_missing_item_fails() {
        let repo = MemoryRepository::new();
        let err = repo.write_field(5, "location", json!({})).await.unwrap_err();
        assert!(matches!(err, GeoSearchError::Storage(_)));
    }

    #[tokio::test]
    async fn test_field_values_and_fetch() {
        let repo = MemoryRepository::new();
        let a = repo.create_item("post", "A").await;
        let b = repo.create_item("page", "B").await;
        let c = repo.create_item("post", "C").await;
        repo.write_field(a, "location", json!({"lat": 1, "lng": 1})).await.unwrap();
        repo.write_field(b, "location", json!({"lat": 2, "lng": 2})).await.unwrap();

        let values = repo.field_values("post", "location").await.unwrap();
        assert_eq!(values, vec![(a, json!({"lat": 1, "lng": 1}))]);

        let fetched = repo
            .fetch_items(&[c, b, a], &ContentQuery::of_types(["post"]))
            .await
            .unwrap();
        let ids: Vec<i64> = fetched.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![c, a]);

        let limited = ContentQuery {
            limit: Some(1),
            ..ContentQuery::default()
        };
        assert_eq!(repo.fetch_items(&[c, b, a], &limited).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_and_delete_item() {
        let repo = MemoryRepository::new();
        let recorder = Arc::new(Recorder::default());
        repo.subscribe(recorder.clone());

        let mut fields = Map::new();
        fields.insert("location".into(), json!({"lat": 3, "lng": 4}));
        fields.insert("venue".into(), json!({"lat": 5, "lng": 6}));
        repo.import_item(ContentItem {
            id: 40,
            content_type: "event".into(),
            title: "Gig".into(),
            fields,
        })
        .await
        .unwrap();

        // 新建条目的 ID 不会与导入的 ID 冲突
        assert_eq!(repo.create_item("event", "Next").await, 41);

        assert!(repo.delete_item(40).await.unwrap());
        assert!(!repo.delete_item(40).await.unwrap());
        assert_eq!(recorder.events.lock().unwrap().len(), 4);
        assert_eq!(repo.len().await, 1);
    }
}

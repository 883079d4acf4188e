//! 面向调用方的入口，组合查询规划器、同步器与内容仓库

use crate::content::{ContentItem, ContentQuery, ContentRepository};
use crate::query::{GeoFilter, QueryPlanner, SearchRequest};
use crate::registry::FieldRegistry;
use crate::storage::IndexStore;
use crate::sync::{IndexSynchronizer, RebuildStats};
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 地理查询返回的内容条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedResult {
    #[serde(flatten)]
    pub item: ContentItem,
    /// 到查询中心的英里数，矩形查询不计算
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

pub struct GeoSearch<R> {
    repository: Arc<R>,
    store: Arc<IndexStore>,
    synchronizer: Arc<IndexSynchronizer>,
    planner: QueryPlanner,
}

impl<R: ContentRepository> GeoSearch<R> {
    pub fn new(repository: Arc<R>, registry: Arc<dyn FieldRegistry>, store: Arc<IndexStore>) -> Self {
        let synchronizer = Arc::new(IndexSynchronizer::new(registry.clone(), store.clone()));
        let planner = QueryPlanner::new(registry, store.clone());
        Self {
            repository,
            store,
            synchronizer,
            planner,
        }
    }

    /// 用于订阅仓库字段事件的观察者
    pub fn synchronizer(&self) -> Arc<IndexSynchronizer> {
        Arc::clone(&self.synchronizer)
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// 只返回命中的 id 与距离，不读取内容
    pub async fn plan(&self, request: &SearchRequest) -> Result<GeoFilter> {
        self.planner.plan(request).await
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<AnnotatedResult>> {
        self.search_with(request, &ContentQuery::default()).await
    }

    /// 执行 `request`，并用调用方自己的 `query` 收窄结果
    ///
    /// 结果保持规划器的顺序，因此 `query` 中的 `limit` 保留半径查询中最近的条目
    pub async fn search_with(
        &self,
        request: &SearchRequest,
        query: &ContentQuery,
    ) -> Result<Vec<AnnotatedResult>> {
        let filter = self.planner.plan(request).await?;
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let distances: HashMap<i64, Option<f64>> = filter
            .matches
            .iter()
            .map(|m| (m.item_id, m.distance_miles))
            .collect();
        let items = self.repository.fetch_items(&filter.ids(), query).await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let distance_miles = distances.get(&item.id).copied().flatten();
                AnnotatedResult {
                    item,
                    distance_miles,
                }
            })
            .collect())
    }

    /// 由 `geo_radius` / `geo_bounds` 查询变量驱动的查询
    ///
    /// 两个变量都未设置时返回 `Ok(None)`，调用方的查询不做地理过滤
    pub async fn search_query_vars(
        &self,
        geo_radius: Option<&str>,
        geo_bounds: Option<&str>,
        query: &ContentQuery,
    ) -> Result<Option<Vec<AnnotatedResult>>> {
        match SearchRequest::from_query_vars(geo_radius, geo_bounds)? {
            Some(request) => self.search_with(&request, query).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn trigger_rebuild(&self) -> Result<RebuildStats> {
        let stats = self.synchronizer.rebuild(&*self.repository).await?;
        info!(indexed = stats.indexed, skipped = stats.skipped, "rebuild triggered");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryRepository;
    use crate::error::GeoSearchError;
    use crate::registry::{FieldSpec, StaticRegistry};
    use serde_json::json;

    async fn service() -> GeoSearch<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::new());
        let registry = Arc::new(StaticRegistry::new(vec![FieldSpec::new("post", "location")]));
        let geo = GeoSearch::new(repo.clone(), registry, Arc::new(IndexStore::new(4)));
        repo.subscribe(geo.synchronizer());

        for (title, lat, lng) in [("origin", 0.0, 0.0), ("east", 0.0, 1.0), ("far", 45.0, 45.0)] {
            let id = repo.create_item("post", title).await;
            repo.write_field(id, "location", json!({"lat": lat, "lng": lng}))
                .await
                .unwrap();
        }
        geo
    }

    #[tokio::test]
    async fn test_search_annotates_distance() {
        let geo = service().await;
        let results = geo
            .search(&SearchRequest::radius("location", 0.0, 0.0, 100.0))
            .await
            .unwrap();

        let titles: Vec<&str> = results.iter().map(|r| r.item.title.as_str()).collect();
        assert_eq!(titles, vec!["origin", "east"]);
        assert_eq!(results[0].distance_miles, Some(0.0));
        assert!(results[1].distance_miles.unwrap() > 69.0);
    }

    #[tokio::test]
    async fn test_search_with_caller_query() {
        let geo = service().await;
        let query = ContentQuery {
            title_contains: Some("EAST".to_string()),
            ..ContentQuery::default()
        };
        let results = geo
            .search_with(&SearchRequest::radius("location", 0.0, 0.0, 100.0), &query)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.title, "east");

        let nearest = ContentQuery {
            limit: Some(1),
            ..ContentQuery::default()
        };
        let results = geo
            .search_with(&SearchRequest::radius("location", 0.0, 0.0, 10_000.0), &nearest)
            .await
            .unwrap();
        assert_eq!(results[0].item.title, "origin");
    }

    #[tokio::test]
    async fn test_bounds_results_have_no_distance() {
        let geo = service().await;
        let results = geo
            .search(&SearchRequest::bounds("location", -1.0, -1.0, 2.0, 1.0))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.distance_miles.is_none()));

        let json = serde_json::to_value(&results[0]).unwrap();
        assert!(json.get("distance_miles").is_none());
        assert_eq!(json["content_type"], "post");
    }

    #[tokio::test]
    async fn test_query_vars() {
        let geo = service().await;
        let none = geo
            .search_query_vars(None, None, &ContentQuery::default())
            .await
            .unwrap();
        assert!(none.is_none());

        let results = geo
            .search_query_vars(Some("location,0,0,100"), None, &ContentQuery::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(results.len(), 2);

        let err = geo
            .search_query_vars(Some("nowhere,0,0,100"), None, &ContentQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoSearchError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_trigger_rebuild() {
        let geo = service().await;
        let id = geo.repository().create_item("post", "broken").await;
        geo.repository()
            .write_field(id, "location", json!({"lat": 3.0}))
            .await
            .unwrap();

        geo.store().clear().await.unwrap();
        let stats = geo.trigger_rebuild().await.unwrap();
        assert_eq!(stats, RebuildStats { indexed: 3, skipped: 1 });
        assert_eq!(geo.store().len().await, 3);
    }
}

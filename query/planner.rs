use super::distance::distance_miles;
use super::request::{SearchArea, SearchRequest};
use crate::error::GeoSearchError;
use crate::registry::FieldRegistry;
use crate::storage::{BoundingBox, IndexStore};
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 命中的条目及其到查询中心的距离
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoMatch {
    pub item_id: i64,
    /// 到中心的英里数；矩形查询为 `None`
    pub distance_miles: Option<f64>,
}

/// 一次查询的规划结果：命中的 id 及其标注
///
/// 过滤器不读取内容，调用方通过 [`GeoFilter::apply`] 与自身查询得到的候选集求交
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFilter {
    pub field_name: String,
    /// 索引查找使用的矩形
    pub bbox: BoundingBox,
    /// 矩形查找返回的候选数，距离检查之前
    pub candidates: usize,
    /// 半径查询按距离由近到远，矩形查询按 item id
    pub matches: Vec<GeoMatch>,
}

impl GeoFilter {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.matches.iter().map(|m| m.item_id).collect()
    }

    pub fn contains(&self, item_id: i64) -> bool {
        self.matches.iter().any(|m| m.item_id == item_id)
    }

    pub fn distance(&self, item_id: i64) -> Option<f64> {
        self.matches
            .iter()
            .find(|m| m.item_id == item_id)
            .and_then(|m| m.distance_miles)
    }

    /// 保留调用方候选中被命中的部分，保持调用方的顺序
    pub fn apply(&self, candidates: &[i64]) -> Vec<GeoMatch> {
        let accepted: HashMap<i64, GeoMatch> = self.matches.iter().map(|m| (m.item_id, *m)).collect();
        candidates
            .iter()
            .filter_map(|id| accepted.get(id).copied())
            .collect()
    }
}

/// 两阶段地把 [`SearchRequest`] 转换为 [`GeoFilter`]：
/// 先在索引中做矩形查找，半径查询再做精确的大圆距离检查
pub struct QueryPlanner {
    registry: Arc<dyn FieldRegistry>,
    store: Arc<IndexStore>,
}

impl QueryPlanner {
    pub fn new(registry: Arc<dyn FieldRegistry>, store: Arc<IndexStore>) -> Self {
        Self { registry, store }
    }

    pub async fn plan(&self, request: &SearchRequest) -> Result<GeoFilter> {
        let area = request.validate()?;
        let field_name = request.field_name();
        if !self.registry.has_field(field_name) {
            return Err(GeoSearchError::unregistered(field_name));
        }

        let bbox = area.bounding_box();
        let filter = match area {
            SearchArea::Radius {
                center,
                radius_miles,
            } => {
                let entries = self.store.query_bounding_box(field_name, &bbox).await?;
                let candidates = entries.len();

                let mut matches: Vec<GeoMatch> = entries
                    .into_iter()
                    .filter_map(|entry| {
                        let distance = distance_miles(center, entry.position);
                        (distance < radius_miles).then_some(GeoMatch {
                            item_id: entry.item_id,
                            distance_miles: Some(distance),
                        })
                    })
                    .collect();
                matches.sort_by(|a, b| {
                    let da = a.distance_miles.unwrap_or_default();
                    let db = b.distance_miles.unwrap_or_default();
                    da.total_cmp(&db).then(a.item_id.cmp(&b.item_id))
                });

                GeoFilter {
                    field_name: field_name.to_string(),
                    bbox,
                    candidates,
                    matches,
                }
            }
            SearchArea::Bounds(_) => {
                let entries = self.store.query_bounding_box(field_name, &bbox).await?;
                let mut matches: Vec<GeoMatch> = entries
                    .into_iter()
                    .map(|entry| GeoMatch {
                        item_id: entry.item_id,
                        distance_miles: None,
                    })
                    .collect();
                matches.sort_by_key(|m| m.item_id);

                GeoFilter {
                    field_name: field_name.to_string(),
                    bbox,
                    candidates: matches.len(),
                    matches,
                }
            }
        };

        debug!(
            request = %request,
            candidates = filter.candidates,
            accepted = filter.matches.len(),
            "geo query planned"
        );
        Ok(filter)
    }
}

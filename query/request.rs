use super::distance::radius_bounding_box;
use crate::error::GeoSearchError;
use crate::storage::{BoundingBox, Coordinate};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 针对单个索引字段的地理查询
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchRequest {
    Radius {
        field_name: String,
        lat: f64,
        lng: f64,
        radius_miles: f64,
    },
    Bounds {
        field_name: String,
        min_lng: f64,
        min_lat: f64,
        max_lng: f64,
        max_lat: f64,
    },
}

/// 参数已校验的查询区域
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchArea {
    Radius {
        center: Coordinate,
        radius_miles: f64,
    },
    Bounds(BoundingBox),
}

impl SearchArea {
    /// 索引查找使用的矩形；半径查询为预过滤矩形
    pub fn bounding_box(&self) -> BoundingBox {
        match *self {
            SearchArea::Radius {
                center,
                radius_miles,
            } => radius_bounding_box(center, radius_miles),
            SearchArea::Bounds(bbox) => bbox,
        }
    }
}

impl SearchRequest {
    pub fn radius(field_name: impl Into<String>, lat: f64, lng: f64, radius_miles: f64) -> Self {
        SearchRequest::Radius {
            field_name: field_name.into(),
            lat,
            lng,
            radius_miles,
        }
    }

    pub fn bounds(
        field_name: impl Into<String>,
        min_lng: f64,
        min_lat: f64,
        max_lng: f64,
        max_lat: f64,
    ) -> Self {
        SearchRequest::Bounds {
            field_name: field_name.into(),
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    pub fn field_name(&self) -> &str {
        match self {
            SearchRequest::Radius { field_name, .. } | SearchRequest::Bounds { field_name, .. } => field_name,
        }
    }

    /// 校验数值参数
    pub fn validate(&self) -> Result<SearchArea> {
        if self.field_name().trim().is_empty() {
            return Err(GeoSearchError::validation("field name is empty"));
        }

        match *self {
            SearchRequest::Radius {
                lat,
                lng,
                radius_miles,
                ..
            } => {
                let center = Coordinate::new(lat, lng)
                    .map_err(|e| GeoSearchError::validation(format!("invalid center: {}", e)))?;
                if !radius_miles.is_finite() || radius_miles <= 0.0 {
                    return Err(GeoSearchError::validation(format!(
                        "radius must be a positive number of miles, got {}",
                        radius_miles
                    )));
                }
                Ok(SearchArea::Radius {
                    center,
                    radius_miles,
                })
            }
            SearchRequest::Bounds {
                min_lng,
                min_lat,
                max_lng,
                max_lat,
                ..
            } => BoundingBox::new(min_lng, min_lat, max_lng, max_lat).map(SearchArea::Bounds),
        }
    }

    /// 由 `geo_radius` / `geo_bounds` 查询变量构建请求
    ///
    /// 空白或缺失的变量视为不存在；两者都给出时以矩形变量为准
    pub fn from_query_vars(geo_radius: Option<&str>, geo_bounds: Option<&str>) -> Result<Option<Self>> {
        if let Some(bounds) = non_blank(geo_bounds) {
            return Self::parse_bounds(bounds).map(Some);
        }
        if let Some(radius) = non_blank(geo_radius) {
            return Self::parse_radius(radius).map(Some);
        }
        Ok(None)
    }

    /// 解析 `"field,lat,lng,radius"`
    pub fn parse_radius(s: &str) -> Result<Self> {
        let (field_name, numbers) = split_query_var::<3>(s, "field,lat,lng,radius")?;
        Ok(SearchRequest::radius(field_name, numbers[0], numbers[1], numbers[2]))
    }

    /// 解析 `"field,minLng,minLat,maxLng,maxLat"`
    pub fn parse_bounds(s: &str) -> Result<Self> {
        let (field_name, numbers) = split_query_var::<4>(s, "field,minLng,minLat,maxLng,maxLat")?;
        Ok(SearchRequest::bounds(
            field_name, numbers[0], numbers[1], numbers[2], numbers[3],
        ))
    }

    /// 转回查询变量语法
    pub fn to_query_var(&self) -> String {
        match self {
            SearchRequest::Radius {
                field_name,
                lat,
                lng,
                radius_miles,
            } => format!("{},{},{},{}", field_name, lat, lng, radius_miles),
            SearchRequest::Bounds {
                field_name,
                min_lng,
                min_lat,
                max_lng,
                max_lat,
            } => format!("{},{},{},{},{}", field_name, min_lng, min_lat, max_lng, max_lat),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn split_query_var<const N: usize>(s: &str, shape: &str) -> Result<(String, [f64; N])> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N + 1 {
        return Err(GeoSearchError::validation(format!(
            "expected '{}', got '{}'",
            shape, s
        )));
    }

    let field_name = parts[0];
    if field_name.is_empty() {
        return Err(GeoSearchError::validation(format!("missing field name in '{}'", s)));
    }

    let mut numbers = [0.0; N];
    for (slot, raw) in numbers.iter_mut().zip(&parts[1..]) {
        *slot = raw
            .parse::<f64>()
            .map_err(|_| GeoSearchError::validation(format!("'{}' is not a number in '{}'", raw, s)))?;
    }
    Ok((field_name.to_string(), numbers))
}

impl fmt::Display for SearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchRequest::Radius { .. } => write!(f, "geo_radius={}", self.to_query_var()),
            SearchRequest::Bounds { .. } => write!(f, "geo_bounds={}", self.to_query_var()),
        }
    }
}

impl FromStr for SearchRequest {
    type Err = GeoSearchError;

    /// 接受 `geo_radius=...` 或 `geo_bounds=...`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('=') {
            Some(("geo_radius", value)) => Self::parse_radius(value),
            Some(("geo_bounds", value)) => Self::parse_bounds(value),
            _ => Err(GeoSearchError::validation(format!(
                "expected geo_radius=... or geo_bounds=..., got '{}'",
                s
            ))),
        }
    }
}

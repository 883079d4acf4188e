use crate::error::GeoSearchError;
use crate::rtree::Rectangle;
use crate::Result;
use geo::{coord, Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WGS84 坐标，单位为度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// 构建坐标，拒绝非有限值和越界值
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(GeoSearchError::Parse(format!(
                "non-finite coordinate ({}, {})",
                lat, lng
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoSearchError::Parse(format!("latitude {} out of range", lat)));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(GeoSearchError::Parse(format!("longitude {} out of range", lng)));
        }
        Ok(Self { lat, lng })
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lng, c.lat)
    }
}

/// (经度, 纬度) 空间中的轴对齐矩形，包含边界
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// 由调用方给出的边界构建矩形
    ///
    /// 拒绝非有限值以及空的或颠倒的范围
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Result<Self> {
        let values = [min_lng, min_lat, max_lng, max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeoSearchError::validation(format!(
                "bounding box contains non-finite values: {:?}",
                values
            )));
        }
        if min_lng >= max_lng || min_lat >= max_lat {
            return Err(GeoSearchError::validation(format!(
                "degenerate bounding box [{}, {}, {}, {}]",
                min_lng, min_lat, max_lng, max_lat
            )));
        }
        Ok(Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        })
    }

    /// 以 `center` 为中心、两轴各扩展 `delta` 度的矩形
    pub fn around(center: Coordinate, delta: f64) -> Self {
        Self {
            min_lng: center.lng - delta,
            min_lat: center.lat - delta,
            max_lng: center.lng + delta,
            max_lat: center.lat + delta,
        }
    }

    pub fn contains(&self, c: &Coordinate) -> bool {
        self.min_lng <= c.lng && c.lng <= self.max_lng && self.min_lat <= c.lat && c.lat <= self.max_lat
    }

    pub(crate) fn to_rectangle(self) -> Rectangle {
        Rectangle::new(self.min_lng, self.min_lat, self.max_lng, self.max_lat)
    }

    pub(crate) fn from_rectangle(rect: &Rectangle) -> Self {
        Self {
            min_lng: rect.min[0],
            min_lat: rect.min[1],
            max_lng: rect.max[0],
            max_lat: rect.max[1],
        }
    }

    pub fn to_geo_rect(self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_lng, y: self.min_lat },
            coord! { x: self.max_lng, y: self.max_lat },
        )
    }
}

/// 把存储的字段值解析为坐标
///
/// 接受带有 `lat` 与 `lng` 的对象（数字或数字字符串，`address` 等其他键忽略），
/// 或内容为此类对象 JSON 的字符串
pub fn parse_coordinate(value: &Value) -> Result<Coordinate> {
    match value {
        Value::Object(map) => {
            let lat = read_degrees(map.get("lat"), "lat")?;
            let lng = read_degrees(map.get("lng"), "lng")?;
            Coordinate::new(lat, lng)
        }
        Value::String(raw) => {
            let inner: Value = serde_json::from_str(raw)
                .map_err(|e| GeoSearchError::Parse(format!("unreadable value '{}': {}", raw, e)))?;
            if inner.is_object() {
                parse_coordinate(&inner)
            } else {
                Err(GeoSearchError::Parse(format!("expected an object, got '{}'", raw)))
            }
        }
        Value::Null => Err(GeoSearchError::Parse("empty value".to_string())),
        other => Err(GeoSearchError::Parse(format!("expected an object, got {}", other))),
    }
}

fn read_degrees(value: Option<&Value>, key: &str) -> Result<f64> {
    let degrees = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => return Err(GeoSearchError::Parse(format!("missing {}", key))),
    };
    degrees.ok_or_else(|| GeoSearchError::Parse(format!("{} is not a number", key)))
}

use crate::storage::{BoundingBox, Coordinate};

/// 预过滤矩形使用的每度英里数，只用于确定矩形大小，不用于判定结果
pub const MILES_PER_DEGREE: f64 = 69.0;

pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// 覆盖 `center` 周围 `radius_miles` 范围内所有点的预过滤矩形
pub fn radius_bounding_box(center: Coordinate, radius_miles: f64) -> BoundingBox {
    BoundingBox::around(center, radius_miles / MILES_PER_DEGREE)
}

/// 大圆距离，单位英里（球面余弦定理）
pub fn distance_miles(from: Coordinate, to: Coordinate) -> f64 {
    let (lat1, lng1) = (from.lat.to_radians(), from.lng.to_radians());
    let (lat2, lng2) = (to.lat.to_radians(), to.lng.to_radians());

    let cosine = lat1.cos() * lat2.cos() * (lng2 - lng1).cos() + lat1.sin() * lat2.sin();
    // 浮点误差可能使结果略超出 [-1, 1]
    EARTH_RADIUS_MILES * cosine.clamp(-1.0, 1.0).acos()
}

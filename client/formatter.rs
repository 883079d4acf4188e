use crate::service::AnnotatedResult;
use crate::storage::{parse_coordinate, BoundingBox, Coordinate, IndexStats};
use crate::sync::RebuildStats;
use crate::Result;
use colored::*;
use geo::Point;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject};

pub struct OutputFormatter;

impl OutputFormatter {
    /// Numbered listing of results; `field_name` selects the coordinate shown.
    pub fn format_results(results: &[AnnotatedResult], field_name: &str) -> String {
        if results.is_empty() {
            return "(no results)".yellow().to_string();
        }

        let mut out = String::new();
        for (i, result) in results.iter().enumerate() {
            let position = Self::position(result, field_name)
                .map(|c| format!("({:.4}, {:.4})", c.lat, c.lng))
                .unwrap_or_else(|| "(no position)".to_string());
            let distance = match result.distance_miles {
                Some(d) => format!("{:.2} mi", d).cyan().to_string(),
                None => "-".dimmed().to_string(),
            };
            out.push_str(&format!(
                "{}) #{} [{}] {} {} {}\n",
                (i + 1).to_string().blue(),
                result.item.id,
                result.item.content_type.green(),
                result.item.title,
                position,
                distance
            ));
        }
        out.trim_end().to_string()
    }

    pub fn results_json(results: &[AnnotatedResult]) -> Result<String> {
        Ok(serde_json::to_string_pretty(results)?)
    }

    /// Results as a GeoJSON FeatureCollection of points, with the searched box as its `bbox`.
    pub fn results_geojson(
        results: &[AnnotatedResult],
        field_name: &str,
        search_box: Option<&BoundingBox>,
    ) -> Result<String> {
        let features = results
            .iter()
            .map(|result| {
                let geometry = Self::position(result, field_name).map(|c| {
                    let point: Point<f64> = c.into();
                    Geometry::new(geojson::Value::from(&point))
                });

                let mut properties = JsonObject::new();
                properties.insert("title".to_string(), result.item.title.clone().into());
                properties.insert(
                    "content_type".to_string(),
                    result.item.content_type.clone().into(),
                );
                if let Some(d) = result.distance_miles {
                    properties.insert("distance_miles".to_string(), d.into());
                }

                Feature {
                    bbox: None,
                    geometry,
                    id: Some(geojson::feature::Id::Number(result.item.id.into())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let bbox = search_box.map(|b| {
            let rect = b.to_geo_rect();
            vec![rect.min().x, rect.min().y, rect.max().x, rect.max().y]
        });
        let collection = GeoJson::FeatureCollection(FeatureCollection {
            bbox,
            features,
            foreign_members: None,
        });
        Ok(serde_json::to_string_pretty(&collection)?)
    }

    pub fn format_rebuild(stats: &RebuildStats) -> String {
        let skipped = if stats.skipped > 0 {
            stats.skipped.to_string().yellow()
        } else {
            stats.skipped.to_string().normal()
        };
        format!(
            "Rebuilt index: {} indexed, {} skipped",
            stats.indexed.to_string().green(),
            skipped
        )
    }

    pub fn format_stats(stats: &IndexStats) -> String {
        let mut out = format!("(integer) {} entries", stats.total_entries.to_string().cyan());
        for field in &stats.fields {
            out.push_str(&format!(
                "\n  {} {} entries, depth {}",
                field.field_name.blue(),
                field.entries,
                field.depth
            ));
            if let Some(e) = &field.extent {
                out.push_str(&format!(
                    ", extent [{:.3}, {:.3}, {:.3}, {:.3}]",
                    e.min_lng, e.min_lat, e.max_lng, e.max_lat
                ));
            }
        }
        out
    }

    pub fn format_error(err: &str) -> String {
        format!("(error) {}", err.red())
    }

    fn position(result: &AnnotatedResult, field_name: &str) -> Option<Coordinate> {
        result
            .item
            .fields
            .get(field_name)
            .and_then(|value| parse_coordinate(value).ok())
    }
}

use super::MemoryRepository;
use crate::Result;
use rand::Rng;
use serde_json::json;
use tracing::info;

/// Random coordinate value in the stored field format, three decimals of precision.
pub fn random_location<R: Rng + ?Sized>(rng: &mut R) -> serde_json::Value {
    let lat = rng.gen_range(-90_000..=90_000) as f64 / 1000.0;
    let lng = rng.gen_range(-180_000..=180_000) as f64 / 1000.0;
    json!({ "address": "", "lat": lat, "lng": lng })
}

/// Create `count` items of `content_type`, each with a random value in `field_name`.
///
/// Values go through the regular write path, so subscribed observers see
/// every write. Returns the created ids.
pub async fn seed_random<R: Rng + Send>(
    repo: &MemoryRepository,
    content_type: &str,
    field_name: &str,
    count: usize,
    rng: &mut R,
) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(count);
    for i in 1..=count {
        let id = repo
            .create_item(content_type, &format!("Test {} {}", content_type, i))
            .await;
        let value = random_location(rng);
        repo.write_field(id, field_name, value).await?;
        ids.push(id);
    }

    info!(content_type, field = field_name, count, "seeded random content");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentRepository;
    use crate::storage::parse_coordinate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_location_is_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let value = random_location(&mut rng);
            assert!(parse_coordinate(&value).is_ok());
        }
    }

    #[tokio::test]
    async fn test_seed_random() {
        let repo = MemoryRepository::new();
        let mut rng = StdRng::seed_from_u64(42);

        let ids = seed_random(&repo, "post", "location", 25, &mut rng).await.unwrap();
        assert_eq!(ids.len(), 25);
        assert_eq!(repo.len().await, 25);

        let values = repo.field_values("post", "location").await.unwrap();
        assert_eq!(values.len(), 25);
        assert_eq!(repo.get(ids[0]).await.unwrap().title, "Test post 1");
    }
}

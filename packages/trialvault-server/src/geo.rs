use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::ServerConfig;
use trialvault_core::model::Coordinates;

/// Geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Geocoding is disabled")]
    Disabled,

    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    city: String,
    country: String,
}

impl CacheKey {
    fn new(city: &str, country: &str) -> Self {
        Self {
            city: city.trim().to_lowercase(),
            country: country.trim().to_uppercase(),
        }
    }
}

struct CachedCoordinates {
    coords: Coordinates,
    fetched_at: Instant,
}

/// Wire format of the Open-Meteo geocoding search endpoint
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Option<Vec<GeocodeResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    latitude: f64,
    longitude: f64,
    country_code: Option<String>,
}

/// Resolves site city/country pairs to coordinates with a per-process
/// TTL cache. Negative lookups are not cached, so a transient upstream
/// failure does not pin an empty answer for the TTL window.
pub struct Geocoder {
    client: Client,
    base_url: String,
    cache: RwLock<HashMap<CacheKey, CachedCoordinates>>,
    ttl: Duration,
    enabled: bool,
}

impl Geocoder {
    pub fn new(config: &ServerConfig) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.geocode_timeout_seconds))
            .build()
            .map_err(|e| GeoError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.geocode_base_url.trim_end_matches('/').to_string(),
            cache: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(config.geocode_cache_ttl_seconds),
            enabled: config.enable_geocoding,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve a city/country pair, consulting the cache first.
    pub async fn lookup(&self, city: &str, country: &str) -> Result<Option<Coordinates>, GeoError> {
        if !self.enabled {
            return Err(GeoError::Disabled);
        }

        let key = CacheKey::new(city, country);
        if let Some(coords) = self.cache_get(&key) {
            debug!("Geocode cache hit for {} {}", key.city, key.country);
            return Ok(Some(coords));
        }

        let url = format!("{}/v1/search", self.base_url);
        let response: GeocodeResponse = self
            .client
            .get(&url)
            .query(&[("name", city), ("count", "10"), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let hit = response.results.unwrap_or_default().into_iter().find(|r| {
            r.country_code
                .as_deref()
                .map(|c| c.eq_ignore_ascii_case(country))
                .unwrap_or(false)
        });

        match hit {
            Some(result) => {
                let coords = Coordinates {
                    latitude: result.latitude,
                    longitude: result.longitude,
                };
                self.cache_put(key, coords);
                Ok(Some(coords))
            }
            None => Ok(None),
        }
    }

    fn cache_get(&self, key: &CacheKey) -> Option<Coordinates> {
        let cache = self.cache.read();
        cache
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.coords)
    }

    fn cache_put(&self, key: CacheKey, coords: Coordinates) {
        self.cache.write().insert(
            key,
            CachedCoordinates {
                coords,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries; returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let mut cache = self.cache.write();
        let before = cache.len();
        cache.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        before - cache.len()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_ttl(ttl: u64, enabled: bool) -> ServerConfig {
        ServerConfig {
            port: 8080,
            bind_addr: "127.0.0.1".to_string(),
            database_url: "postgres://localhost/test".to_string(),
            cors_origins: vec![],
            max_export_rows: 1000,
            enable_geocoding: enabled,
            geocode_base_url: "https://geocoding-api.open-meteo.com".to_string(),
            geocode_timeout_seconds: 5,
            geocode_cache_ttl_seconds: ttl,
        }
    }

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(CacheKey::new(" Berlin ", "de"), CacheKey::new("berlin", "DE"));
    }

    #[test]
    fn test_cache_hit_within_ttl() {
        let geocoder = Geocoder::new(&config_with_ttl(3600, true)).unwrap();
        let key = CacheKey::new("Berlin", "DE");
        let coords = Coordinates {
            latitude: 52.52,
            longitude: 13.405,
        };
        geocoder.cache_put(key.clone(), coords);
        assert_eq!(geocoder.cache_get(&key), Some(coords));
        assert_eq!(geocoder.cached_entries(), 1);
    }

    #[test]
    fn test_expired_entries_miss_and_prune() {
        let geocoder = Geocoder::new(&config_with_ttl(0, true)).unwrap();
        let key = CacheKey::new("Berlin", "DE");
        geocoder.cache_put(
            key.clone(),
            Coordinates {
                latitude: 52.52,
                longitude: 13.405,
            },
        );
        // TTL of zero expires entries immediately
        assert_eq!(geocoder.cache_get(&key), None);
        assert_eq!(geocoder.prune_expired(), 1);
        assert_eq!(geocoder.cached_entries(), 0);
    }

    #[tokio::test]
    async fn test_disabled_lookup_errors() {
        let geocoder = Geocoder::new(&config_with_ttl(3600, false)).unwrap();
        assert!(matches!(
            geocoder.lookup("Berlin", "DE").await,
            Err(GeoError::Disabled)
        ));
    }
}

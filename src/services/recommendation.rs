use crate::{
    config::Config,
    error::{ApiError, Result},
    models::{Product, ProductId},
    recommender::{locate, FittedCatalog, Recommendations, Recommender},
    services::catalog::CatalogSource,
};
use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

// Fitted snapshots kept before expired entries are purged
const MAX_CACHE_ENTRIES: usize = 8;

struct CacheEntry {
    fitted: Arc<FittedCatalog>,
    timestamp: Instant,
}

/// Serves related-product requests against the current catalog snapshot.
///
/// Fits are cached by a fingerprint of the full snapshot contents and only
/// reused for a snapshot equal to the one they were fitted on.
#[derive(Clone)]
pub struct RecommendationService {
    catalog: CatalogSource,
    recommender: Arc<Recommender>,
    max_catalog_size: usize,
    max_top_k: usize,
    cache_ttl: Duration,
    fitted_cache: Arc<RwLock<HashMap<u64, CacheEntry>>>,
    prewarmed: Arc<AtomicBool>,
}

impl RecommendationService {
    pub fn new(catalog: CatalogSource, config: &Config) -> Self {
        Self {
            catalog,
            recommender: Arc::new(Recommender::new(config.recommender())),
            max_catalog_size: config.max_catalog_size,
            max_top_k: config.max_top_k,
            cache_ttl: config.cache_ttl(),
            fitted_cache: Arc::new(RwLock::new(HashMap::new())),
            prewarmed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fits the current snapshot so the next request for it is a cache hit.
    ///
    /// Returns true if this was the first prewarm.
    pub async fn prewarm(&self) -> Result<bool> {
        info!("Warming up RecommendationService...");
        let snapshot = self.bounded_snapshot().await?;
        if snapshot.len() > 1 {
            let fitted = self.fitted(snapshot).await?;
            info!(
                "Prewarmed {} products, vocabulary of {} terms",
                fitted.len(),
                fitted.vocabulary_size()
            );
        } else {
            debug!("Catalog has {} product(s), nothing to prewarm", snapshot.len());
        }

        Ok(!self.prewarmed.swap(true, Ordering::AcqRel))
    }

    /// Related products for the product identified by `product_id`.
    pub async fn recommend(
        &self,
        product_id: Option<&str>,
        k: Option<usize>,
    ) -> Result<Recommendations> {
        let target_id = parse_product_id(product_id)?;
        let k = self.resolve_k(k)?;

        let snapshot = self.bounded_snapshot().await?;
        let target = locate(&snapshot, target_id.as_str())?;
        if snapshot.len() <= 1 {
            info!(
                "Catalog has {} product(s), no recommendations possible",
                snapshot.len()
            );
            return Ok(Recommendations::InsufficientCatalog);
        }

        let fitted = self.fitted(snapshot).await?;
        let recommendations =
            tokio::task::spawn_blocking(move || fitted.recommend_at(target, k)).await?;

        info!(
            "Returning {} related products for {}",
            recommendations.len(),
            target_id
        );
        Ok(recommendations)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product> {
        let id = parse_product_id(Some(product_id))?;
        self.catalog.get_product(id.as_str()).await
    }

    pub fn cached_snapshots(&self) -> usize {
        self.fitted_cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    fn resolve_k(&self, k: Option<usize>) -> Result<usize> {
        match k {
            None => Ok(self.recommender.config().top_k),
            Some(k) if (1..=self.max_top_k).contains(&k) => Ok(k),
            Some(k) => Err(ApiError::InvalidInput(format!(
                "k must be between 1 and {}, got {}",
                self.max_top_k, k
            ))),
        }
    }

    async fn bounded_snapshot(&self) -> Result<Vec<Product>> {
        let snapshot = self.catalog.snapshot().await?;
        if snapshot.len() > self.max_catalog_size {
            warn!(
                "Rejecting catalog of {} products (limit {})",
                snapshot.len(),
                self.max_catalog_size
            );
            return Err(ApiError::CatalogTooLarge {
                size: snapshot.len(),
                limit: self.max_catalog_size,
            });
        }
        Ok(snapshot)
    }

    /// Cached fit for an identical snapshot, or a fresh fit on the blocking pool.
    async fn fitted(&self, snapshot: Vec<Product>) -> Result<Arc<FittedCatalog>> {
        let key = fingerprint(&snapshot);

        if let Ok(cache) = self.fitted_cache.read() {
            if let Some(entry) = cache.get(&key) {
                if entry.timestamp.elapsed() < self.cache_ttl
                    && entry.fitted.products() == snapshot.as_slice()
                {
                    info!("CACHE HIT for catalog snapshot {:016x}", key);
                    return Ok(entry.fitted.clone());
                }
            }
        }

        info!(
            "CACHE MISS for catalog snapshot {:016x}, fitting {} products",
            key,
            snapshot.len()
        );
        let recommender = self.recommender.clone();
        let fitted = Arc::new(tokio::task::spawn_blocking(move || recommender.fit(snapshot)).await??);

        if let Ok(mut cache) = self.fitted_cache.write() {
            let fresh = cache
                .get(&key)
                .is_some_and(|entry| entry.timestamp.elapsed() < self.cache_ttl);
            if !fresh {
                cache.insert(
                    key,
                    CacheEntry {
                        fitted: fitted.clone(),
                        timestamp: Instant::now(),
                    },
                );
            }

            if cache.len() > MAX_CACHE_ENTRIES {
                self.cleanup_cache(&mut cache);
            }
        }

        Ok(fitted)
    }

    fn cleanup_cache(&self, cache: &mut HashMap<u64, CacheEntry>) {
        cache.retain(|_, entry| entry.timestamp.elapsed() < self.cache_ttl);

        while cache.len() > MAX_CACHE_ENTRIES {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(key, _)| *key);
            match oldest {
                Some(key) => {
                    cache.remove(&key);
                }
                None => break,
            }
        }

        debug!("Fitted snapshot cache holds {} entries", cache.len());
    }
}

fn parse_product_id(raw: Option<&str>) -> Result<ProductId> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| ApiError::InvalidIdentifier("product_id is required".into()))?;

    ProductId::parse(raw).ok_or_else(|| ApiError::InvalidIdentifier(raw.to_string()))
}

/// Hash of everything a fit and its results depend on, order included.
fn fingerprint(snapshot: &[Product]) -> u64 {
    let mut hasher = DefaultHasher::new();
    snapshot.len().hash(&mut hasher);
    for product in snapshot {
        product.id.hash(&mut hasher);
        product.name.hash(&mut hasher);
        product.category.hash(&mut hasher);
        product.description.hash(&mut hasher);
        product.price.to_bits().hash(&mut hasher);
        product.image_url.hash(&mut hasher);
    }
    hasher.finish()
}

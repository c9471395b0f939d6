use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::{MovieId, MovieQuery};

/// Keys for cached catalog responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Trending,
    Popular(u32),
    Upcoming(u32),
    Discover(String),
    Search(String),
    MovieDetails(MovieId),
    WatchProviders(MovieId),
    Genres,
}

impl CacheKey {
    /// Key for a discover or search query; title text is case-folded
    pub fn for_query(query: &MovieQuery) -> Self {
        let filters = query
            .filter_params()
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        match query.text() {
            Some(text) => CacheKey::Search(format!("{}|{}", text.to_lowercase(), filters)),
            None => CacheKey::Discover(filters),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Trending => write!(f, "tmdb:trending:day"),
            CacheKey::Popular(page) => write!(f, "tmdb:popular:{}", page),
            CacheKey::Upcoming(page) => write!(f, "tmdb:upcoming:{}", page),
            CacheKey::Discover(filters) => write!(f, "tmdb:discover:{}", filters),
            CacheKey::Search(query) => write!(f, "tmdb:search:{}", query),
            CacheKey::MovieDetails(id) => write!(f, "tmdb:movie:{}", id),
            CacheKey::WatchProviders(id) => write!(f, "tmdb:providers:{}", id),
            CacheKey::Genres => write!(f, "tmdb:genres"),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Read-through cache for catalog responses
///
/// Reads hit Redis directly; writes are queued to a background task so a
/// slow cache never delays a response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task and waits until pending writes are flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

impl Cache {
    /// Creates a cache and spawns its background writer
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0;
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }

                    tracing::info!(flushed = flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves and deserializes a cached value; `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for writing without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: format!("{}", key),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decade, GenreId, SortOrder};

    #[tokio::test]
    async fn test_shutdown_waits_for_writer() {
        // Opening a client does not connect
        let client = Client::open("redis://127.0.0.1:1/").unwrap();
        let (cache, writer) = Cache::new(client);

        writer.shutdown().await;

        // The writer owned the receiving end; it is gone once the task ends
        assert!(cache.write_tx.is_closed());
    }

    #[test]
    fn test_cache_key_display_lists() {
        assert_eq!(CacheKey::Trending.to_string(), "tmdb:trending:day");
        assert_eq!(CacheKey::Popular(2).to_string(), "tmdb:popular:2");
        assert_eq!(CacheKey::Upcoming(1).to_string(), "tmdb:upcoming:1");
        assert_eq!(CacheKey::Genres.to_string(), "tmdb:genres");
    }

    #[test]
    fn test_cache_key_display_movie() {
        assert_eq!(CacheKey::MovieDetails(MovieId(550)).to_string(), "tmdb:movie:550");
        assert_eq!(
            CacheKey::WatchProviders(MovieId(550)).to_string(),
            "tmdb:providers:550"
        );
    }

    #[test]
    fn test_cache_key_for_search_is_case_insensitive() {
        let upper = MovieQuery {
            text: Some("THE MATRIX".to_string()),
            page: 1,
            ..Default::default()
        };
        let lower = MovieQuery {
            text: Some("the matrix".to_string()),
            page: 1,
            ..Default::default()
        };
        assert_eq!(CacheKey::for_query(&upper), CacheKey::for_query(&lower));
        assert!(CacheKey::for_query(&upper)
            .to_string()
            .starts_with("tmdb:search:the matrix|"));
    }

    #[test]
    fn test_cache_key_for_discover_includes_filters() {
        let query = MovieQuery {
            text: None,
            genres: vec![GenreId(28)],
            decade: Some(Decade::Nineties),
            sort: SortOrder::Popularity,
            page: 2,
        };
        assert_eq!(
            CacheKey::for_query(&query).to_string(),
            "tmdb:discover:page=2&with_genres=28&primary_release_date.gte=1990-01-01\
             &primary_release_date.lte=1999-12-31&sort_by=popularity.desc"
        );
    }
}

/// Read-through caching over an optional [`Cache`](crate::db::Cache).
///
/// With a cache, a hit returns the stored value and a miss runs `$block`,
/// queues the result for a background write and returns it. Without one,
/// `$block` runs every time. A failing cache read is logged and treated as a
/// miss.
///
/// # Arguments
/// * `$cache`: `Option<&Cache>`
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write
/// * `$ttl`: time-to-live of a written value, in seconds
/// * `$block`: future computing the value on a miss
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache.as_ref(), CacheKey::Genres, GENRE_CACHE_TTL, async move {
///     fetch_genres().await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache {
            Some(cache) => {
                let hit = match cache.get_from_cache(&key).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::warn!(error = %e, key = %key, "Cache read failed");
                        None
                    }
                };
                match hit {
                    Some(cached) => Ok(cached),
                    None => {
                        let value = $block.await?;
                        cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                }
            }
            None => $block.await,
        }
    }};
}

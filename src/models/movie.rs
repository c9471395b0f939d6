use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// Numeric catalog identifier (TMDB movie id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Snapshot of a catalog movie
///
/// The typed fields are the ones the client reads; everything else the
/// catalog returned is kept verbatim in `extra` so a stored snapshot
/// round-trips without loss. Snapshots are never refreshed after they are
/// added to a watch-list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genre_ids: Vec<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Movie {
    /// Creates a bare snapshot with only an id and a title
    pub fn new(id: impl Into<MovieId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            poster_path: None,
            backdrop_path: None,
            vote_average: None,
            release_date: None,
            overview: None,
            genre_ids: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Release date parsed as a calendar date, if the catalog provided one
    pub fn release_day(&self) -> Option<chrono::NaiveDate> {
        self.release_date
            .as_deref()
            .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

/// A user's watch-list
///
/// Insertion order is add order. Membership is keyed strictly by [`MovieId`]:
/// adding a movie whose id is already present leaves the list unchanged, and
/// removal matches on the id alone.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct WatchList {
    entries: Vec<Movie>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `movie` unless an entry with the same id exists.
    /// Returns whether the list changed.
    pub fn insert(&mut self, movie: Movie) -> bool {
        if self.contains(movie.id) {
            return false;
        }
        self.entries.push(movie);
        true
    }

    /// Removes the entry with `id`, returning it
    pub fn remove(&mut self, id: MovieId) -> Option<Movie> {
        let index = self.entries.iter().position(|m| m.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.entries.iter().any(|m| m.id == id)
    }

    pub fn get(&self, id: MovieId) -> Option<&Movie> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<MovieId> {
        self.entries.iter().map(|m| m.id).collect()
    }

    /// Entries whose title contains `query`, case-insensitively
    pub fn filter_by_title(&self, query: &str) -> Vec<Movie> {
        let needle = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|m| needle.is_empty() || m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn into_vec(self) -> Vec<Movie> {
        self.entries
    }
}

impl FromIterator<Movie> for WatchList {
    fn from_iter<I: IntoIterator<Item = Movie>>(iter: I) -> Self {
        let mut list = WatchList::new();
        for movie in iter {
            list.insert(movie);
        }
        list
    }
}

impl From<Vec<Movie>> for WatchList {
    fn from(movies: Vec<Movie>) -> Self {
        movies.into_iter().collect()
    }
}

impl<'de> Deserialize<'de> for WatchList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let movies = Vec::<Movie>::deserialize(deserializer)?;
        Ok(movies.into_iter().collect())
    }
}

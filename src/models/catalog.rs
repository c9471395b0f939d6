use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    str::FromStr,
};

use super::Movie;

/// Genre used by the home screen's "by genre" row until the user picks another
pub const DEFAULT_GENRE: GenreId = GenreId(28);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenreId(pub u64);

impl Display for GenreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// One page of a paged catalog result set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }

    /// Whether a later page exists
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Detail fields merged into upcoming movies on the explore screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: super::MovieId,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// Upcoming movie with its details, as listed on the explore screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExploreEntry {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

// ============================================================================
// Watch providers
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Provider {
    pub provider_id: u64,
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

/// Providers offering a title in one region
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RegionProviders {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub flatrate: Vec<Provider>,
    #[serde(default)]
    pub rent: Vec<Provider>,
    #[serde(default)]
    pub buy: Vec<Provider>,
}

/// Raw watch-provider listing keyed by region code
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct WatchProviders {
    #[serde(default)]
    pub results: HashMap<String, RegionProviders>,
}

/// Provider names per offer type for a single region
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AvailablePlatforms {
    pub flatrate: Vec<String>,
    pub rent: Vec<String>,
    pub buy: Vec<String>,
    /// Search link per provider name, for providers that have one
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

impl AvailablePlatforms {
    pub fn is_empty(&self) -> bool {
        self.flatrate.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }

    /// Every provider name across offer types
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flatrate
            .iter()
            .chain(&self.rent)
            .chain(&self.buy)
            .map(String::as_str)
    }
}

impl WatchProviders {
    /// Reduces the listing to provider names for `region`; an unknown region
    /// yields no platforms
    pub fn platforms_in(&self, region: &str) -> AvailablePlatforms {
        let Some(providers) = self.results.get(region) else {
            return AvailablePlatforms::default();
        };
        let names = |list: &[Provider]| list.iter().map(|p| p.provider_name.clone()).collect();

        AvailablePlatforms {
            flatrate: names(&providers.flatrate),
            rent: names(&providers.rent),
            buy: names(&providers.buy),
            links: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Sort order accepted by discover/search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "popularity.desc")]
    Popularity,
    #[serde(rename = "vote_average.desc")]
    Rating,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Popularity => "popularity.desc",
            SortOrder::Rating => "vote_average.desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popularity.desc" | "popularity" => Ok(SortOrder::Popularity),
            "vote_average.desc" | "rating" => Ok(SortOrder::Rating),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}

/// Release-decade filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decade {
    #[serde(rename = "2020s")]
    Twenties,
    #[serde(rename = "2010s")]
    Tens,
    #[serde(rename = "2000s")]
    Noughties,
    #[serde(rename = "1990s")]
    Nineties,
}

impl Decade {
    /// Inclusive year range covered by the decade
    pub fn years(&self) -> (u16, u16) {
        match self {
            Decade::Twenties => (2020, 2029),
            Decade::Tens => (2010, 2019),
            Decade::Noughties => (2000, 2009),
            Decade::Nineties => (1990, 1999),
        }
    }
}

impl FromStr for Decade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2020s" => Ok(Decade::Twenties),
            "2010s" => Ok(Decade::Tens),
            "2000s" => Ok(Decade::Noughties),
            "1990s" => Ok(Decade::Nineties),
            other => Err(format!("Unknown time period: {}", other)),
        }
    }
}

/// Filters shared by discover and title search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieQuery {
    /// Title text; empty means browse via discover
    pub text: Option<String>,
    pub genres: Vec<GenreId>,
    pub decade: Option<Decade>,
    pub sort: SortOrder,
    pub page: u32,
}

impl MovieQuery {
    pub fn genre(genre: GenreId, page: u32) -> Self {
        Self {
            genres: vec![genre],
            page,
            ..Default::default()
        }
    }

    /// Trimmed title text, if any
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Query parameters for the filters (title text excluded)
    pub fn filter_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.max(1).to_string())];

        if !self.genres.is_empty() {
            let joined = self
                .genres
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(",");
            params.push(("with_genres", joined));
        }

        if let Some(decade) = self.decade {
            let (start, end) = decade.years();
            params.push(("primary_release_date.gte", format!("{}-01-01", start)));
            params.push(("primary_release_date.lte", format!("{}-12-31", end)));
        }

        params.push(("sort_by", self.sort.as_param().to_string()));
        params
    }
}

/// "See all" feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCategory {
    /// Popular movies, shown as "recommended"
    Recommended,
    Upcoming,
    Genre(GenreId),
}

impl FeedCategory {
    /// Parses a category name; unknown names fall back to recommended
    pub fn parse(name: &str, genre: Option<GenreId>) -> Self {
        match name {
            "upcoming" => FeedCategory::Upcoming,
            "genres" | "genre" => FeedCategory::Genre(genre.unwrap_or(DEFAULT_GENRE)),
            _ => FeedCategory::Recommended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserialization_and_has_more() {
        let json = r#"{
            "page": 1,
            "results": [{"id": 1, "title": "A"}],
            "total_pages": 3,
            "total_results": 55
        }"#;
        let page: Page<Movie> = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 1);
        assert!(page.has_more());

        let last = Page::<Movie> {
            page: 3,
            ..page
        };
        assert!(!last.has_more());
    }

    #[test]
    fn test_platforms_for_region() {
        let json = r#"{
            "id": 550,
            "results": {
                "TH": {
                    "link": "https://www.themoviedb.org/movie/550/watch?locale=TH",
                    "flatrate": [{"provider_id": 8, "provider_name": "Netflix", "logo_path": "/n.jpg"}],
                    "rent": [{"provider_id": 2, "provider_name": "Apple TV"}]
                },
                "US": {
                    "buy": [{"provider_id": 3, "provider_name": "Google Play Movies"}]
                }
            }
        }"#;
        let providers: WatchProviders = serde_json::from_str(json).unwrap();

        let th = providers.platforms_in("TH");
        assert_eq!(th.flatrate, vec!["Netflix"]);
        assert_eq!(th.rent, vec!["Apple TV"]);
        assert!(th.buy.is_empty());

        assert!(providers.platforms_in("JP").is_empty());
    }

    #[test]
    fn test_filter_params() {
        let query = MovieQuery {
            text: None,
            genres: vec![GenreId(28), GenreId(12)],
            decade: Some(Decade::Tens),
            sort: SortOrder::Rating,
            page: 0,
        };
        let params = query.filter_params();
        assert!(params.contains(&("page", "1".to_string())));
        assert!(params.contains(&("with_genres", "28,12".to_string())));
        assert!(params.contains(&("primary_release_date.gte", "2010-01-01".to_string())));
        assert!(params.contains(&("primary_release_date.lte", "2019-12-31".to_string())));
        assert!(params.contains(&("sort_by", "vote_average.desc".to_string())));
    }

    #[test]
    fn test_blank_text_is_no_text() {
        let query = MovieQuery {
            text: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.text(), None);
    }

    #[test]
    fn test_feed_category_parse() {
        assert_eq!(FeedCategory::parse("upcoming", None), FeedCategory::Upcoming);
        assert_eq!(
            FeedCategory::parse("genres", Some(GenreId(35))),
            FeedCategory::Genre(GenreId(35))
        );
        assert_eq!(FeedCategory::parse("genres", None), FeedCategory::Genre(DEFAULT_GENRE));
        assert_eq!(FeedCategory::parse("whatever", None), FeedCategory::Recommended);
    }

    #[test]
    fn test_sort_order_serialization() {
        assert_eq!(
            serde_json::to_string(&SortOrder::Popularity).unwrap(),
            "\"popularity.desc\""
        );
        assert_eq!("rating".parse::<SortOrder>(), Ok(SortOrder::Rating));
    }
}

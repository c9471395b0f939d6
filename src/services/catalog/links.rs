//! Title-search deep links into streaming apps

use reqwest::Url;

/// Search URL for `title` on `provider`, matched case-insensitively on the
/// provider name. Providers without a known search page get no link.
pub fn watch_link(provider: &str, title: &str) -> Option<String> {
    let (base, param, extra): (&str, &str, &[(&str, &str)]) =
        match provider.trim().to_lowercase().as_str() {
            "netflix" => ("https://www.netflix.com/search", "q", &[]),
            "primevideo" | "amazon prime video" | "amazon" => (
                "https://www.primevideo.com/search/ref=atv_sr_sug_1",
                "phrase",
                &[],
            ),
            "disney" | "hotstar" => ("https://www.disneyplus.com/search", "q", &[]),
            "apple" | "itunes" | "appletv" | "apple tv" => {
                ("https://tv.apple.com/search", "term", &[])
            }
            "hbo" | "hbomax" | "hbo go" => ("https://www.hbogo.co.th/search", "q", &[]),
            "google play" | "google play movies" | "play movies" => (
                "https://play.google.com/store/search",
                "q",
                &[("c", "movies")],
            ),
            _ => return None,
        };

    let params = std::iter::once((param, title)).chain(extra.iter().copied());
    Url::parse_with_params(base, params)
        .ok()
        .map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_providers() {
        assert_eq!(
            watch_link("Netflix", "The Matrix").as_deref(),
            Some("https://www.netflix.com/search?q=The+Matrix")
        );
        assert_eq!(
            watch_link("Amazon Prime Video", "Up").as_deref(),
            Some("https://www.primevideo.com/search/ref=atv_sr_sug_1?phrase=Up")
        );
        assert_eq!(
            watch_link("Google Play Movies", "Up").as_deref(),
            Some("https://play.google.com/store/search?q=Up&c=movies")
        );
        assert_eq!(
            watch_link("HOTSTAR", "Up").as_deref(),
            Some("https://www.disneyplus.com/search?q=Up")
        );
    }

    #[test]
    fn test_title_is_encoded() {
        assert_eq!(
            watch_link("hbo", "Tom & Jerry").as_deref(),
            Some("https://www.hbogo.co.th/search?q=Tom+%26+Jerry")
        );
    }

    #[test]
    fn test_unknown_provider_has_no_link() {
        assert_eq!(watch_link("True ID", "Up"), None);
        assert_eq!(watch_link("Disney Plus Hotstar", "Up"), None);
    }
}

/// Discover-query composition
///
/// Turns a filter selection plus the category/genre a list was opened with into
/// the flat parameter set the catalog client sends. Pure: no I/O, no clock.
///
/// Rules run in a fixed order and later rules overwrite earlier ones:
/// paging, language, rating floor, vote-count floor, runtime, decade,
/// category sort bias, explicit genre.
use crate::{
    models::{Category, FilterKey, FilterState},
    services::catalog::DiscoverParams,
};

/// Vote-count floor forced by the top-rated category when none is selected
pub const TOP_RATED_MIN_VOTES: u32 = 200;

/// Last day covered by the `older` decade bucket
pub const OLDER_DECADE_END: &str = "1979-12-31";

const SORT_POPULARITY_DESC: &str = "popularity.desc";
const SORT_RATING_DESC: &str = "vote_average.desc";

/// Inclusive numeric range; `None` on either side means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span<T> {
    lower: Option<T>,
    upper: Option<T>,
}

impl<T: Ord + Copy> Span<T> {
    /// Widest span enclosing both. Gaps between disjoint selections are filled.
    fn union(self, other: Self) -> Self {
        Span {
            lower: match (self.lower, other.lower) {
                (Some(a), Some(b)) => Some(a.min(b)),
                _ => None,
            },
            upper: match (self.upper, other.upper) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }
}

fn runtime_bucket(bucket: &str) -> Option<Span<u32>> {
    match bucket.trim() {
        "<90" => Some(Span {
            lower: Some(0),
            upper: Some(89),
        }),
        "90-120" => Some(Span {
            lower: Some(90),
            upper: Some(120),
        }),
        ">120" => Some(Span {
            lower: Some(121),
            upper: None,
        }),
        other => {
            tracing::debug!(bucket = %other, "Ignoring unknown runtime bucket");
            None
        }
    }
}

/// Decade as (first year, last year); `older` has no lower bound
fn decade_bucket(decade: &str) -> Option<Span<i32>> {
    let decade = decade.trim();
    if decade == "older" {
        return Some(Span {
            lower: None,
            upper: Some(1979),
        });
    }

    if decade.len() == 4 && decade.chars().all(|c| c.is_ascii_digit()) {
        let start: i32 = decade.parse().ok()?;
        return Some(Span {
            lower: Some(start),
            upper: Some(start + 9),
        });
    }

    tracing::debug!(decade = %decade, "Ignoring unknown decade bucket");
    None
}

fn merged<T: Ord + Copy>(spans: impl Iterator<Item = Span<T>>) -> Option<Span<T>> {
    spans.reduce(Span::union)
}

fn format_number(value: f64) -> String {
    // 7.0 -> "7", 6.5 -> "6.5"
    format!("{}", value)
}

/// Builds discover parameters for one page of a filtered listing.
///
/// `genre_id`, when given, wins over any genre derived from `category`.
pub fn compose_discover_params(
    filters: &FilterState,
    category: Option<&Category>,
    genre_id: Option<&str>,
    page: u32,
) -> DiscoverParams {
    let mut params = DiscoverParams::new().with_page(page.max(1));
    params.insert("include_adult", false);

    if let Some(language) = filters.get(FilterKey::Language) {
        let codes: Vec<&str> = language
            .as_list()
            .into_iter()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .collect();
        if !codes.is_empty() {
            params.insert("with_original_language", codes.join(","));
        }
    }

    if let Some(rating) = filters.get(FilterKey::Rating).and_then(|v| v.as_number()) {
        params.insert("vote_average.gte", format_number(rating));
    }

    if let Some(votes) = filters.get(FilterKey::VoteCount).and_then(|v| v.as_number()) {
        params.insert("vote_count.gte", format_number(votes.max(0.0).floor()));
    }

    if let Some(runtime) = filters.get(FilterKey::Runtime) {
        let span = merged(runtime.as_list().into_iter().filter_map(runtime_bucket));
        if let Some(span) = span {
            if let Some(lower) = span.lower {
                params.insert("with_runtime.gte", lower);
            }
            if let Some(upper) = span.upper {
                params.insert("with_runtime.lte", upper);
            }
        }
    }

    if let Some(decade) = filters.get(FilterKey::Decade) {
        let span = merged(decade.as_list().into_iter().filter_map(decade_bucket));
        if let Some(span) = span {
            if let Some(first_year) = span.lower {
                params.insert("primary_release_date.gte", format!("{:04}-01-01", first_year));
            }
            if let Some(last_year) = span.upper {
                params.insert("primary_release_date.lte", format!("{:04}-12-31", last_year));
            }
        }
    }

    match category {
        Some(Category::Popular) | Some(Category::Trending) => {
            params.insert("sort_by", SORT_POPULARITY_DESC);
        }
        Some(Category::TopRated) => {
            params.insert("sort_by", SORT_RATING_DESC);
            if !params.contains("vote_count.gte") {
                params.insert("vote_count.gte", TOP_RATED_MIN_VOTES);
            }
        }
        Some(Category::Genre(id)) => {
            params.insert("with_genres", id);
        }
        Some(Category::All) | None => {}
    }

    if let Some(genre_id) = genre_id.map(str::trim).filter(|id| !id.is_empty()) {
        params.insert("with_genres", genre_id);
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE_KEYS: [&str; 4] = [
        "with_runtime.gte",
        "with_runtime.lte",
        "primary_release_date.gte",
        "primary_release_date.lte",
    ];

    #[test]
    fn test_base_params() {
        let params = compose_discover_params(&FilterState::new(), None, None, 1);
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("include_adult"), Some("false"));
        assert_eq!(params.keys().count(), 2);
    }

    #[test]
    fn test_runtime_and_rating() {
        let filters = FilterState::new()
            .with(FilterKey::Runtime, "90-120")
            .with(FilterKey::Rating, "7");

        let params = compose_discover_params(&filters, None, None, 1);

        assert_eq!(params.get("with_runtime.gte"), Some("90"));
        assert_eq!(params.get("with_runtime.lte"), Some("120"));
        assert_eq!(params.get("vote_average.gte"), Some("7"));
        let range_keys = RANGE_KEYS.iter().filter(|k| params.contains(k)).count();
        assert_eq!(range_keys, 2);
        assert!(!params.contains("vote_count.gte"));
    }

    #[test]
    fn test_top_rated_raises_vote_floor_when_unset() {
        let params =
            compose_discover_params(&FilterState::new(), Some(&Category::TopRated), None, 1);
        assert_eq!(params.get("vote_count.gte"), Some("200"));
        assert_eq!(params.get("sort_by"), Some("vote_average.desc"));
    }

    #[test]
    fn test_top_rated_keeps_explicit_vote_floor() {
        let filters = FilterState::new().with(FilterKey::VoteCount, "50");
        let params = compose_discover_params(&filters, Some(&Category::TopRated), None, 1);
        assert_eq!(params.get("vote_count.gte"), Some("50"));
    }

    #[test]
    fn test_popular_and_trending_sort_by_popularity() {
        for category in [Category::Popular, Category::Trending] {
            let params = compose_discover_params(&FilterState::new(), Some(&category), None, 2);
            assert_eq!(params.get("sort_by"), Some("popularity.desc"));
            assert_eq!(params.get("page"), Some("2"));
        }
        let params = compose_discover_params(&FilterState::new(), Some(&Category::All), None, 1);
        assert!(!params.contains("sort_by"));
    }

    #[test]
    fn test_runtime_buckets_merge_to_widest_span() {
        let filters = FilterState::new().with(FilterKey::Runtime, vec!["<90", "90-120"]);
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("with_runtime.gte"), Some("0"));
        assert_eq!(params.get("with_runtime.lte"), Some("120"));

        // disjoint buckets still produce one enclosing range
        let filters = FilterState::new().with(FilterKey::Runtime, vec!["<90", ">120"]);
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("with_runtime.gte"), Some("0"));
        assert!(!params.contains("with_runtime.lte"));
    }

    #[test]
    fn test_short_runtime_bounds() {
        let filters = FilterState::new().with(FilterKey::Runtime, "<90");
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("with_runtime.gte"), Some("0"));
        assert_eq!(params.get("with_runtime.lte"), Some("89"));
    }

    #[test]
    fn test_long_runtime_has_no_upper_bound() {
        let filters = FilterState::new().with(FilterKey::Runtime, ">120");
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("with_runtime.gte"), Some("121"));
        assert!(!params.contains("with_runtime.lte"));
    }

    #[test]
    fn test_decades() {
        let filters = FilterState::new().with(FilterKey::Decade, "1990");
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("primary_release_date.gte"), Some("1990-01-01"));
        assert_eq!(params.get("primary_release_date.lte"), Some("1999-12-31"));

        let filters = FilterState::new().with(FilterKey::Decade, vec!["2010", "1980"]);
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("primary_release_date.gte"), Some("1980-01-01"));
        assert_eq!(params.get("primary_release_date.lte"), Some("2019-12-31"));

        let filters = FilterState::new().with(FilterKey::Decade, vec!["older", "1990"]);
        let params = compose_discover_params(&filters, None, None, 1);
        assert!(!params.contains("primary_release_date.gte"));
        assert_eq!(params.get("primary_release_date.lte"), Some("1999-12-31"));

        let filters = FilterState::new().with(FilterKey::Decade, "older");
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("primary_release_date.lte"), Some(OLDER_DECADE_END));
    }

    #[test]
    fn test_decade_years_keep_four_digits() {
        let filters = FilterState::new().with(FilterKey::Decade, "0990");
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("primary_release_date.gte"), Some("0990-01-01"));
        assert_eq!(params.get("primary_release_date.lte"), Some("0999-12-31"));
    }

    #[test]
    fn test_invalid_buckets_are_ignored() {
        let filters = FilterState::new()
            .with(FilterKey::Decade, "90s")
            .with(FilterKey::Runtime, "long")
            .with(FilterKey::Rating, "great");
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.keys().count(), 2);
    }

    #[test]
    fn test_languages_joined() {
        let filters = FilterState::new().with(FilterKey::Language, vec!["de", "en", " "]);
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.get("with_original_language"), Some("de,en"));
    }

    #[test]
    fn test_explicit_genre_overrides_category_genre() {
        let category = Category::from("35");
        let params = compose_discover_params(&FilterState::new(), Some(&category), None, 1);
        assert_eq!(params.get("with_genres"), Some("35"));

        let params =
            compose_discover_params(&FilterState::new(), Some(&category), Some("18"), 1);
        assert_eq!(params.get("with_genres"), Some("18"));
    }

    #[test]
    fn test_local_only_filters_do_not_leak_into_query() {
        let filters = FilterState::new()
            .with(FilterKey::FavoritesOnly, true)
            .with(FilterKey::HideWatched, false);
        let params = compose_discover_params(&filters, None, None, 1);
        assert_eq!(params.keys().count(), 2);
    }
}

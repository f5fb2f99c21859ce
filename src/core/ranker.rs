use crate::core::{
    distance::haversine_meters,
    filters::{matches_restaurant_type, passes_noise_threshold},
    scoring::score_place,
};
use crate::models::{PlaceCandidate, PriceRange, RankedRestaurant, RankingSettings, RestaurantType};
use crate::services::{NearbyRequest, NearbySearch, PlacesError};
use std::sync::Arc;

/// What the user is looking for around a point
#[derive(Debug, Clone, Default)]
pub struct RecommendQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Accepted for display only; the search never filters on price
    pub price_range: Option<PriceRange>,
    pub restaurant_type: Option<RestaurantType>,
    /// Overrides the configured radius
    pub radius_m: Option<u32>,
}

/// Restaurant recommendation pipeline
///
/// # Pipeline Stages
/// 1. Nearby search with the type keyword as a coarse pre-filter
/// 2. Local keyword filter on the place name
/// 3. Noise filter (rating present, enough reviews)
/// 4. Popularity ranking and truncation
pub struct RestaurantRanker {
    search: Arc<dyn NearbySearch>,
    settings: RankingSettings,
}

impl RestaurantRanker {
    pub fn new(search: Arc<dyn NearbySearch>, settings: RankingSettings) -> Self {
        Self { search, settings }
    }

    pub fn settings(&self) -> &RankingSettings {
        &self.settings
    }

    /// Recommend restaurants, treating any search failure as "nothing found"
    pub async fn recommend(&self, query: &RecommendQuery) -> Vec<RankedRestaurant> {
        match self.try_recommend(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Nearby search failed, returning no results: {}", e);
                Vec::new()
            }
        }
    }

    /// Recommend restaurants, surfacing search failures to the caller
    pub async fn try_recommend(&self, query: &RecommendQuery) -> Result<Vec<RankedRestaurant>, PlacesError> {
        let request = NearbyRequest {
            latitude: query.latitude,
            longitude: query.longitude,
            radius_m: query.radius_m.unwrap_or(self.settings.radius_m),
            keyword: query
                .restaurant_type
                .as_ref()
                .map(|t| t.keyword.clone())
                .filter(|k| !k.trim().is_empty()),
        };

        let candidates = self.search.nearby_restaurants(&request).await?;
        let total = candidates.len();

        let ranked = rank_candidates(
            (query.latitude, query.longitude),
            candidates,
            query.restaurant_type.as_ref(),
            &self.settings,
        );

        tracing::info!("Ranked {} of {} nearby places", ranked.len(), total);
        Ok(ranked)
    }
}

/// Filter, score and order candidates; stable for equal scores
pub fn rank_candidates(
    origin: (f64, f64),
    candidates: Vec<PlaceCandidate>,
    restaurant_type: Option<&RestaurantType>,
    settings: &RankingSettings,
) -> Vec<RankedRestaurant> {
    let (lat, lng) = origin;

    let mut ranked: Vec<RankedRestaurant> = candidates
        .into_iter()
        // Stage 2: keyword filter on the name
        .filter(|place| matches_restaurant_type(place, restaurant_type))
        // Stage 3: noise threshold
        .filter(|place| passes_noise_threshold(place, settings.min_review_count))
        // Stage 4a: scoring
        .map(|place| {
            let distance_m = haversine_meters(lat, lng, place.latitude, place.longitude);
            RankedRestaurant {
                score: score_place(&place),
                distance_m,
                place,
            }
        })
        .collect();

    // Stage 4b: descending by score; sort_by is stable so ties keep API order
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked.truncate(settings.limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use async_trait::async_trait;

    fn place(name: &str, rating: Option<f64>, count: Option<u32>) -> PlaceCandidate {
        PlaceCandidate {
            name: name.to_string(),
            address: Some("台北市".to_string()),
            rating,
            rating_count: count,
            price_level: None,
            photo_reference: None,
            latitude: 25.05,
            longitude: 121.52,
        }
    }

    struct StaticSearch(Result<Vec<PlaceCandidate>, ()>);

    #[async_trait]
    impl NearbySearch for StaticSearch {
        async fn nearby_restaurants(&self, _request: &NearbyRequest) -> Result<Vec<PlaceCandidate>, PlacesError> {
            self.0
                .clone()
                .map_err(|_| PlacesError::ApiError("boom".into()))
        }
    }

    #[test]
    fn test_rank_orders_by_popularity_and_limits() {
        let candidates = vec![
            place("A", Some(4.0), Some(10)),
            place("B", Some(4.8), Some(500)),
            place("C", Some(3.5), Some(2000)),
            place("D", Some(5.0), Some(3)),
            place("E", None, Some(900)),
            place("F", Some(4.2), Some(120)),
            place("G", Some(4.4), Some(60)),
            place("H", Some(4.9), Some(6)),
        ];

        let ranked = rank_candidates((25.05, 121.52), candidates, None, &RankingSettings::default());
        let names: Vec<_> = ranked.iter().map(|r| r.place.name.as_str()).collect();

        // B=29.8, C=26.6, F=20.2, G=18.2, H=9.5, A=9.6
        assert_eq!(names, vec!["B", "C", "F", "G", "A"]);
    }

    #[test]
    fn test_rank_ties_keep_original_order() {
        let candidates = vec![
            place("first", Some(4.0), Some(50)),
            place("second", Some(4.0), Some(50)),
        ];
        let ranked = rank_candidates((25.05, 121.52), candidates, None, &RankingSettings::default());
        assert_eq!(ranked[0].place.name, "first");
        assert_eq!(ranked[1].place.name, "second");
    }

    #[test]
    fn test_rank_applies_type_filter() {
        let japanese = RestaurantType { category: Category::Japanese, keyword: "日式料理".into() };
        let candidates = vec![
            place("三井日式料理", Some(4.1), Some(300)),
            place("鼎王麻辣鍋", Some(4.7), Some(3000)),
            place("晶華日式餐廳", Some(4.3), Some(80)),
        ];
        let ranked = rank_candidates((25.05, 121.52), candidates, Some(&japanese), &RankingSettings::default());
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.place.name.contains("日式")));
    }

    #[tokio::test]
    async fn test_recommend_degrades_to_empty_on_error() {
        let ranker = RestaurantRanker::new(Arc::new(StaticSearch(Err(()))), RankingSettings::default());
        let query = RecommendQuery { latitude: 25.0, longitude: 121.5, ..Default::default() };

        assert!(ranker.recommend(&query).await.is_empty());
        assert!(ranker.try_recommend(&query).await.is_err());
    }

    #[tokio::test]
    async fn test_recommend_ranks_search_results() {
        let ranker = RestaurantRanker::new(
            Arc::new(StaticSearch(Ok(vec![
                place("low", Some(3.0), Some(20)),
                place("high", Some(4.5), Some(800)),
            ]))),
            RankingSettings::default(),
        );
        let query = RecommendQuery { latitude: 25.05, longitude: 121.52, ..Default::default() };

        let ranked = ranker.recommend(&query).await;
        assert_eq!(ranked[0].place.name, "high");
        assert!(ranked[0].distance_m < 1.0);
    }
}

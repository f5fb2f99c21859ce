use crate::models::PlaceCandidate;

/// Popularity score rewarding both quality and confidence
///
/// score = rating * ln(review_count + 1)
#[inline]
pub fn popularity_score(rating: f64, review_count: u32) -> f64 {
    rating * (review_count as f64 + 1.0).ln()
}

/// Score a candidate; places without a rating score zero
#[inline]
pub fn score_place(place: &PlaceCandidate) -> f64 {
    match place.rating {
        Some(rating) => popularity_score(rating, place.rating_count.unwrap_or(0)),
        None => 0.0,
    }
}

use crate::models::{PlaceCandidate, RestaurantType};

/// Generic suffixes meaning "cuisine", stripped before name matching
const CUISINE_SUFFIXES: [&str; 3] = ["料理", "菜", "cuisine"];

/// Reduce a category keyword to the part expected in a restaurant's name.
///
/// `日式料理` becomes `日式`; keywords without a known suffix are returned trimmed.
pub fn base_keyword(keyword: &str) -> &str {
    let trimmed = keyword.trim();
    for suffix in CUISINE_SUFFIXES {
        if let Some(stripped) = strip_suffix_ignore_case(trimmed, suffix) {
            let stripped = stripped.trim_end();
            if !stripped.is_empty() {
                return stripped;
            }
        }
    }
    trimmed
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    if !text.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = text.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

/// Case-insensitive substring match that is correct for non-Latin scripts
#[inline]
pub fn name_contains(name: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    name.to_lowercase().contains(&needle.to_lowercase())
}

/// Stricter local keyword filter applied after the API's coarse keyword search.
///
/// With no restaurant type every candidate passes.
#[inline]
pub fn matches_restaurant_type(place: &PlaceCandidate, restaurant_type: Option<&RestaurantType>) -> bool {
    match restaurant_type {
        Some(t) => name_contains(&place.name, base_keyword(&t.keyword)),
        None => true,
    }
}

/// Drop places without a rating or with too few reviews to trust it
#[inline]
pub fn passes_noise_threshold(place: &PlaceCandidate, min_review_count: u32) -> bool {
    place.rating.is_some() && place.rating_count.map_or(false, |count| count > min_review_count)
}

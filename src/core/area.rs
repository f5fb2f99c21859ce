use crate::models::AreaInput;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AreaError {
    #[error("Failed to read area file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse area file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Static city -> districts directory, loaded once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaDirectory {
    cities: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct AreaFile(BTreeMap<String, Vec<String>>);

impl AreaDirectory {
    pub fn new<I, C, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, Vec<D>)>,
        C: Into<String>,
        D: Into<String>,
    {
        let cities = entries
            .into_iter()
            .map(|(city, districts)| {
                (city.into(), districts.into_iter().map(Into::into).collect())
            })
            .collect();
        Self { cities }
    }

    /// Parse a TOML document of the form `台北市 = ["中山區", "大安區"]`
    pub fn from_toml_str(source: &str) -> Result<Self, AreaError> {
        let AreaFile(map) = toml::from_str(source)?;
        Ok(Self::new(map))
    }

    /// Load the directory from disk; a missing file yields an empty directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AreaError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("Area file {} not found, area lookups will always miss", path.display());
            return Ok(Self::default());
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn contains(&self, city: &str, district: &str) -> bool {
        self.cities
            .get(city)
            .map(|districts| districts.contains(district))
            .unwrap_or(false)
    }

    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// Outcome of checking a well-formed `city district` input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaCheck {
    pub area: AreaInput,
    pub found: bool,
}

impl AreaCheck {
    pub fn message(&self) -> String {
        if self.found {
            format!("輸入成功: {} {} 存在於資料中", self.area.city, self.area.district)
        } else {
            format!("輸入錯誤: {} {} 不存在於資料中", self.area.city, self.area.district)
        }
    }
}

/// Check free text against the `city district` shape and the directory.
///
/// Returns `None` when the text is not exactly two whitespace-separated tokens,
/// so the caller can fall through to its default handling.
pub fn check_area(directory: &AreaDirectory, input: &str) -> Option<AreaCheck> {
    let mut tokens = input.split_whitespace();
    let city = tokens.next()?;
    let district = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }

    Some(AreaCheck {
        found: directory.contains(city, district),
        area: AreaInput {
            city: city.to_string(),
            district: district.to_string(),
        },
    })
}

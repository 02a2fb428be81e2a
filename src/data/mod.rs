use std::fs;
use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson, Value};

use crate::error::LoadError;
use crate::labels::{LabelKind, LabelPoint};

/// Property names tried, in order, for a country's display text.
pub const COUNTRY_NAME_FIELDS: &[&str] = &["name", "NAME", "ADMIN", "SOVEREIGNT"];

/// Property names tried, in order, for a city's display text.
pub const CITY_NAME_FIELDS: &[&str] = &["name", "NAME", "NAMEASCII", "city", "CITY_NAME"];

/// Property names tried, in order, for a city's population.
const POPULATION_FIELDS: &[&str] = &["population", "POP_MAX", "pop_max"];

pub fn name_fields(kind: LabelKind) -> &'static [&'static str] {
    match kind {
        LabelKind::Country => COUNTRY_NAME_FIELDS,
        LabelKind::City => CITY_NAME_FIELDS,
    }
}

/// Where to read the two label collections from.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelSources {
    pub countries: PathBuf,
    pub cities: PathBuf,
    /// Drop cities whose known population is below this.
    pub min_city_population: Option<u64>,
}

impl LabelSources {
    /// The default file names inside a data directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            countries: dir.join("countries_points.geojson"),
            cities: dir.join("cities_big.geojson"),
            min_city_population: None,
        }
    }

    pub fn exist(&self) -> bool {
        self.countries.exists() && self.cities.exists()
    }
}

impl Default for LabelSources {
    fn default() -> Self {
        Self::in_dir(Path::new("data"))
    }
}

/// Read both collections in parallel. Either failure fails the whole load.
pub fn load_sources(
    sources: &LabelSources,
) -> Result<(Vec<LabelPoint>, Vec<LabelPoint>), LoadError> {
    let (countries, cities) = rayon::join(
        || load_points(LabelKind::Country, &sources.countries, None),
        || load_points(LabelKind::City, &sources.cities, sources.min_city_population),
    );
    Ok((countries?, cities?))
}

/// Read one FeatureCollection of points from disk.
pub fn load_points(
    kind: LabelKind,
    path: &Path,
    min_population: Option<u64>,
) -> Result<Vec<LabelPoint>, LoadError> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson =
        simd_json::serde::from_slice(&mut bytes).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let points = parse_points(kind, &geojson, min_population).ok_or_else(|| {
        LoadError::NotFeatureCollection {
            path: path.to_path_buf(),
        }
    })?;

    tracing::info!(
        kind = kind.as_str(),
        path = %path.display(),
        count = points.len(),
        "loaded label points"
    );
    Ok(points)
}

/// Extract label points from a FeatureCollection. `None` for any other GeoJSON root.
///
/// Features that are not points, have non-finite coordinates, or have no
/// non-empty name among the kind's candidate fields are skipped.
pub fn parse_points(
    kind: LabelKind,
    geojson: &GeoJson,
    min_population: Option<u64>,
) -> Option<Vec<LabelPoint>> {
    let GeoJson::FeatureCollection(fc) = geojson else {
        return None;
    };

    let fields = name_fields(kind);
    let mut skipped = 0usize;
    let mut points = Vec::with_capacity(fc.features.len());

    for feature in &fc.features {
        let Some((lon, lat)) = point_coords(feature) else {
            skipped += 1;
            continue;
        };
        let Some(text) = resolve_text(feature, fields) else {
            skipped += 1;
            continue;
        };
        if let (Some(min), Some(pop)) = (min_population, population(feature)) {
            if pop < min as f64 {
                continue;
            }
        }
        points.push(LabelPoint::new(lon, lat, text));
    }

    if skipped > 0 {
        tracing::debug!(kind = kind.as_str(), skipped, "skipped unusable features");
    }
    Some(points)
}

fn point_coords(feature: &Feature) -> Option<(f64, f64)> {
    let geometry = feature.geometry.as_ref()?;
    let Value::Point(coords) = &geometry.value else {
        return None;
    };
    if coords.len() < 2 {
        return None;
    }
    let (lon, lat) = (coords[0], coords[1]);
    (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
}

/// First candidate property holding a non-blank string.
fn resolve_text(feature: &Feature, fields: &[&str]) -> Option<String> {
    let props = feature.properties.as_ref()?;
    fields
        .iter()
        .filter_map(|f| props.get(*f))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn population(feature: &Feature) -> Option<f64> {
    let props = feature.properties.as_ref()?;
    POPULATION_FIELDS
        .iter()
        .filter_map(|f| props.get(*f))
        .find_map(|v| v.as_f64())
}

/// Built-in labels for when no data files are available.
pub fn sample_world() -> (Vec<LabelPoint>, Vec<LabelPoint>) {
    let countries = [
        (-98.5, 39.8, "United States"),
        (-106.3, 56.1, "Canada"),
        (-102.5, 23.6, "Mexico"),
        (-51.9, -14.2, "Brazil"),
        (-63.6, -38.4, "Argentina"),
        (-74.3, 4.6, "Colombia"),
        (-75.0, -9.2, "Peru"),
        (-3.4, 40.4, "Spain"),
        (2.2, 46.2, "France"),
        (10.4, 51.2, "Germany"),
        (12.6, 42.8, "Italy"),
        (-1.5, 52.4, "United Kingdom"),
        (19.1, 52.1, "Poland"),
        (31.2, 48.4, "Ukraine"),
        (15.0, 62.0, "Sweden"),
        (95.0, 61.5, "Russia"),
        (35.2, 39.0, "Turkey"),
        (30.8, 26.8, "Egypt"),
        (8.7, 9.1, "Nigeria"),
        (40.5, 9.1, "Ethiopia"),
        (23.7, -2.9, "DR Congo"),
        (24.7, -29.0, "South Africa"),
        (2.6, 28.0, "Algeria"),
        (45.1, 23.9, "Saudi Arabia"),
        (53.7, 32.4, "Iran"),
        (69.3, 30.4, "Pakistan"),
        (78.9, 21.0, "India"),
        (104.2, 35.9, "China"),
        (103.8, 46.9, "Mongolia"),
        (138.3, 36.2, "Japan"),
        (113.9, -0.8, "Indonesia"),
        (134.5, -25.7, "Australia"),
        (172.5, -41.5, "New Zealand"),
    ];
    let cities = [
        (-74.0, 40.7, "New York"),
        (-118.2, 34.0, "Los Angeles"),
        (-87.6, 41.9, "Chicago"),
        (-79.4, 43.7, "Toronto"),
        (-99.1, 19.4, "Mexico City"),
        (-46.6, -23.5, "São Paulo"),
        (-43.2, -22.9, "Rio de Janeiro"),
        (-58.4, -34.6, "Buenos Aires"),
        (-77.0, -12.0, "Lima"),
        (-74.1, 4.7, "Bogotá"),
        (-0.1, 51.5, "London"),
        (2.3, 48.9, "Paris"),
        (-3.7, 40.4, "Madrid"),
        (13.4, 52.5, "Berlin"),
        (12.5, 41.9, "Rome"),
        (37.6, 55.8, "Moscow"),
        (29.0, 41.0, "Istanbul"),
        (31.2, 30.0, "Cairo"),
        (3.4, 6.5, "Lagos"),
        (36.8, -1.3, "Nairobi"),
        (15.3, -4.3, "Kinshasa"),
        (28.0, -26.2, "Johannesburg"),
        (51.4, 35.7, "Tehran"),
        (55.3, 25.3, "Dubai"),
        (67.0, 24.9, "Karachi"),
        (72.9, 19.1, "Mumbai"),
        (77.2, 28.6, "Delhi"),
        (88.4, 22.6, "Kolkata"),
        (90.4, 23.8, "Dhaka"),
        (100.5, 13.8, "Bangkok"),
        (106.8, -6.2, "Jakarta"),
        (116.4, 39.9, "Beijing"),
        (121.5, 31.2, "Shanghai"),
        (114.2, 22.3, "Hong Kong"),
        (127.0, 37.6, "Seoul"),
        (139.7, 35.7, "Tokyo"),
        (135.5, 34.7, "Osaka"),
        (121.0, 14.6, "Manila"),
        (151.2, -33.9, "Sydney"),
        (145.0, -37.8, "Melbourne"),
    ];

    fn to_points(rows: &[(f64, f64, &str)]) -> Vec<LabelPoint> {
        rows.iter()
            .map(|&(lon, lat, name)| LabelPoint::new(lon, lat, name))
            .collect()
    }
    (to_points(&countries), to_points(&cities))
}

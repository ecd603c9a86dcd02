/// Spatial context: geodata elements and distance features.
///
/// ```text
///   Overpass API / saved response
///        │
///        ▼
///   ┌────────────┐
///   │  overpass   │  GeodataSource → Vec<GeoElement>
///   └────────────┘
///        │
///        ▼
///   ┌────────────┐
///   │  distance   │  nearest geodesic distance per land-use category
///   └────────────┘
/// ```

pub mod distance;
pub mod element;
pub mod overpass;

pub use distance::{nearest_distance, CategoryDistances, LandUse, SENTINEL_DISTANCE_M};
pub use element::{GeoElement, GeoPoint};
pub use overpass::{GeodataSource, OverpassClient, StaticGeodata};

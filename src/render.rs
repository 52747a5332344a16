use sheed_api::{artifact_url, JobResult, SheedApiError};
use url::Url;

pub const MAP_VIEWER_BASE: &str = "https://caltopo.com/map.html";
pub const MAP_ZOOM: u8 = 13;
pub const CLIPPED_WARNING: &str = "Warning: clipping was detected! The watershed may extend past the DEM area; try a larger expand factor.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLink {
    pub label: &'static str,
    pub href: String,
}

/// Rendered job result: two artifact downloads plus an embedded map view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPanel {
    pub title: String,
    pub kml: ResultLink,
    pub geojson: ResultLink,
    /// Source of the embedded map frame.
    pub map: ResultLink,
    pub warning: Option<String>,
}

impl ResultPanel {
    pub fn links(&self) -> [&ResultLink; 3] {
        [&self.kml, &self.geojson, &self.map]
    }
}

/// Build the panel for `result`, resolving artifact paths against `origin`.
pub fn render_result(origin: &Url, result: &JobResult) -> Result<ResultPanel, SheedApiError> {
    let kml = artifact_url(origin, &result.kml)?;
    let geojson = artifact_url(origin, &result.geojson)?;
    let map = map_view_url(result.lat, result.lon, &kml);

    let title = match result.name.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => format!("Watershed {name} ({}, {})", result.lat, result.lon),
        None => format!("Watershed at ({}, {})", result.lat, result.lon),
    };

    Ok(ResultPanel {
        title,
        kml: ResultLink {
            label: "Download KML",
            href: kml.to_string(),
        },
        geojson: ResultLink {
            label: "Download GeoJSON",
            href: geojson.to_string(),
        },
        map: ResultLink {
            label: "Map view",
            href: map,
        },
        warning: result.was_clipped().then(|| CLIPPED_WARNING.to_string()),
    })
}

/// Map viewer link centred on the pour point with the KML overlay. The KML
/// URL is inserted as already serialized; encoding it again breaks paths that
/// contain spaces.
pub fn map_view_url(lat: f64, lon: f64, kml: &Url) -> String {
    format!("{MAP_VIEWER_BASE}#ll={lat},{lon}&z={MAP_ZOOM}&kml={kml}")
}

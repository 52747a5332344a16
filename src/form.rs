use sheed_api::JobRequest;
use url::Url;

pub const DEFAULT_DEM: &str = "USGS10m";
pub const DEFAULT_EXPAND_FACTOR: &str = "0.05";

/// `lat`, `lon` and `name` from the page URL. Missing keys read as empty; the
/// first occurrence of a repeated key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub lat: String,
    pub lon: String,
    pub name: String,
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        let (mut lat, mut lon, mut name) = (false, false, false);

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let (slot, seen) = match key.as_ref() {
                "lat" => (&mut params.lat, &mut lat),
                "lon" => (&mut params.lon, &mut lon),
                "name" => (&mut params.name, &mut name),
                _ => continue,
            };
            if !*seen {
                *slot = value.into_owned();
                *seen = true;
            }
        }
        params
    }

    pub fn from_page_url(url: &Url) -> Self {
        Self::parse(url.query().unwrap_or_default())
    }

    /// `"<lat>, <lon>"`, only when both halves are present.
    pub fn coordinates(&self) -> Option<String> {
        let lat = self.lat.trim();
        let lon = self.lon.trim();
        if lat.is_empty() || lon.is_empty() {
            return None;
        }
        Some(format!("{lat}, {lon}"))
    }
}

/// Current values of the job form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub coordinates: String,
    pub name: String,
    pub expand_factor: String,
    pub dem: String,
    pub snap: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            coordinates: String::new(),
            name: String::new(),
            expand_factor: DEFAULT_EXPAND_FACTOR.to_string(),
            dem: DEFAULT_DEM.to_string(),
            snap: true,
        }
    }
}

impl FormState {
    /// Fill coordinates and name from the page query. A lone `lat` or `lon`
    /// leaves the coordinates field alone.
    pub fn prefill(&mut self, params: &QueryParams) {
        if let Some(coordinates) = params.coordinates() {
            self.coordinates = coordinates;
        }
        if !params.name.is_empty() {
            self.name = params.name.clone();
        }
    }

    pub fn prefilled(params: &QueryParams) -> Self {
        let mut form = Self::default();
        form.prefill(params);
        form
    }

    /// Snapshot the form into a fresh request tagged with `client_id`.
    pub fn to_job_request(&self, client_id: &str) -> JobRequest {
        JobRequest::new(
            self.coordinates.as_str(),
            self.name.as_str(),
            self.expand_factor.as_str(),
            client_id,
            self.dem.as_str(),
            self.snap,
        )
    }
}

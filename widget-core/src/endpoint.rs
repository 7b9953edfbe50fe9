use anyhow::{Context, Result, bail};
use reqwest::Url;

/// Open-data datastore root of the Central Weather Administration.
pub const DEFAULT_API_BASE: &str = "https://opendata.cwa.gov.tw/api/v1/rest/datastore";

/// Dataset id of the current-conditions (station observation) endpoint.
pub const OBSERVATION_DATASET: &str = "O-A0003-001";

/// Dataset id of the 36-hour county forecast endpoint.
pub const FORECAST_DATASET: &str = "F-C0032-001";

/// Where the datastore lives and the credential it expects.
#[derive(Clone)]
pub struct Endpoint {
    base: Url,
    authorization: String,
}

impl Endpoint {
    /// A base that is not an absolute http(s) URL is a configuration error.
    pub fn new(base: &str, authorization: impl Into<String>) -> Result<Self> {
        let raw = base;
        let base = Url::parse(raw.trim_end_matches('/'))
            .with_context(|| format!("Invalid API base URL '{raw}'"))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            bail!("API base URL '{raw}' must be an http(s) URL");
        }
        Ok(Self {
            base,
            authorization: authorization.into(),
        })
    }

    /// `{base}/{dataset}?Authorization=..&locationName=..`
    pub fn dataset_url(&self, dataset: &str, location_name: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(dataset);
        }
        url.query_pairs_mut()
            .append_pair("Authorization", &self.authorization)
            .append_pair("locationName", location_name);
        url
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("base", &self.base.as_str())
            .field("authorization", &"<redacted>")
            .finish()
    }
}

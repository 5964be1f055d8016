use std::collections::BTreeMap;
use url::Url;

/// Metadata key that names the route outright, skipping URL inspection.
pub const ROUTE_METADATA_KEY: &str = "route";

/// An outbound request as seen at interception time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    url: String,
    method: String,
    metadata: BTreeMap<String, String>,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Parses the URL if it is absolute. Relative URLs yield `None`.
    pub fn parsed_url(&self) -> Option<Url> {
        Url::parse(&self.url).ok()
    }

    /// Extracts the route identifier.
    ///
    /// The `route` metadata entry wins. Otherwise the value of `param` is
    /// read from the query string, but only on `/action` endpoints. Relative
    /// URLs are resolved against a placeholder origin first.
    pub fn route(&self, param: &str) -> Option<String> {
        if let Some(route) = self.metadata(ROUTE_METADATA_KEY) {
            return Some(route.to_string());
        }

        let url = match Url::parse(&self.url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse("http://relative.invalid/").ok()?;
                base.join(&self.url).ok()?
            }
            Err(_) => return None,
        };

        if !url.path().ends_with("/action") {
            return None;
        }

        url.query_pairs()
            .find(|(key, _)| key == param)
            .map(|(_, value)| value.into_owned())
    }
}

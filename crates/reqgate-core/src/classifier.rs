use std::collections::HashSet;
use serde::Serialize;
use url::{Host, Url};

use crate::config::GateConfig;
use crate::descriptor::RequestDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PriorityClass {
    High,
    Low,
    /// Exempt from admission control: forwarded untouched and uncounted.
    Bypass,
}

/// Maps request descriptors to a priority class.
///
/// Route identifiers are resolved with a set-membership test against the
/// identifier parsed out of the request, not by pattern matching the whole
/// URL. Anything the classifier does not recognise is `High`.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    low_routes: HashSet<String>,
    route_param: String,
    bypass_mixed_content: bool,
}

impl RequestClassifier {
    /// A classifier with the default bulk routes.
    pub fn new() -> Self {
        Self::from_config(&GateConfig::default())
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            low_routes: config.low_priority_routes.iter().cloned().collect(),
            route_param: config.route_param.clone(),
            bypass_mixed_content: config.bypass_mixed_content,
        }
    }

    /// Registers an additional low-priority route identifier.
    pub fn route(mut self, identifier: &str) -> Self {
        self.low_routes.insert(identifier.to_string());
        self
    }

    pub fn is_low_priority_route(&self, identifier: &str) -> bool {
        self.low_routes.contains(identifier)
    }

    pub fn classify(&self, descriptor: &RequestDescriptor) -> PriorityClass {
        if let Some(route) = descriptor.route(&self.route_param) {
            if self.low_routes.contains(&route) {
                return PriorityClass::Low;
            }
        }

        if self.bypass_mixed_content {
            if let Some(url) = descriptor.parsed_url() {
                if is_mixed_content(&url) {
                    return PriorityClass::Bypass;
                }
            }
        }

        PriorityClass::High
    }
}

impl Default for RequestClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Plaintext resource that is not served from the loopback origin.
pub fn is_mixed_content(url: &Url) -> bool {
    url.scheme() == "http" && !is_loopback(url)
}

/// Hosts served from this machine: `localhost` with or without a port, any
/// address in `127.0.0.0/8`, and `::1`.
///
/// Wider than a literal `http://localhost:<port>` prefix match on purpose:
/// a port-less or numeric loopback origin is just as local.
pub fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

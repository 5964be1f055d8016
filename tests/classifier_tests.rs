//! # Classification Tests
//!
//! Validates route extraction, bulk-route matching, the mixed-content
//! bypass and the fail-open default.

use reqgate_core::{GateConfig, PriorityClass, RequestClassifier, RequestDescriptor};
use std::time::Instant;

fn classify(url: &str) -> PriorityClass {
    RequestClassifier::new().classify(&RequestDescriptor::new(url))
}

/// Every default bulk route is `Low`, on secure and loopback origins alike.
#[test]
fn test_default_bulk_routes_are_low() {
    let t = Instant::now();

    for route in ["GetLayerTile", "GetWFSFeatures", "GetWFSVectorTile"] {
        let secure = format!("https://maps.local/action?action_route={}&id=3&z=5", route);
        let loopback = format!("http://localhost:8080/action?action_route={}&id=3", route);
        assert_eq!(classify(&secure), PriorityClass::Low, "{}", secure);
        assert_eq!(classify(&loopback), PriorityClass::Low, "{}", loopback);
    }

    let overhead = t.elapsed();
    println!("test_default_bulk_routes_are_low: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_unrecognised_routes_are_high() {
    assert_eq!(
        classify("https://maps.local/action?action_route=GetMapLayers&lang=en"),
        PriorityClass::High
    );
    assert_eq!(classify("https://maps.local/api/search?q=harbour"), PriorityClass::High);
    // Route parameter outside an `/action` endpoint does not count.
    assert_eq!(
        classify("https://maps.local/static?action_route=GetLayerTile"),
        PriorityClass::High
    );
    // Identifiers are matched exactly, not by prefix.
    assert_eq!(
        classify("https://maps.local/action?action_route=GetLayerTileInfo"),
        PriorityClass::High
    );
}

/// Malformed or odd URLs are never penalised.
#[test]
fn test_fail_open_on_malformed_urls() {
    assert_eq!(classify(""), PriorityClass::High);
    assert_eq!(classify("not a url at all"), PriorityClass::High);
    assert_eq!(classify("https://"), PriorityClass::High);
    assert_eq!(classify("data:image/png;base64,AAAA"), PriorityClass::High);
}

#[test]
fn test_relative_urls_are_routed() {
    assert_eq!(
        classify("/action?action_route=GetWFSFeatures&layer=7"),
        PriorityClass::Low
    );
    assert_eq!(classify("/action?action_route=GetAppSetup"), PriorityClass::High);
}

/// Plaintext requests off the loopback origin are bypassed; loopback and
/// TLS traffic is not.
#[test]
fn test_mixed_content_bypass() {
    assert_eq!(classify("http://example.com/wms?layers=base"), PriorityClass::Bypass);
    assert_eq!(classify("http://tiles.example.org:8080/1/2/3.png"), PriorityClass::Bypass);

    assert_eq!(classify("http://localhost:8080/api/layers"), PriorityClass::High);
    assert_eq!(classify("http://localhost/api/layers"), PriorityClass::High);
    assert_eq!(classify("http://127.0.0.1:8080/api/layers"), PriorityClass::High);
    assert_eq!(classify("http://127.4.5.6/api/layers"), PriorityClass::High);
    assert_eq!(classify("http://[::1]:8080/api/layers"), PriorityClass::High);
    assert_eq!(classify("https://example.com/wms"), PriorityClass::High);
}

/// A plaintext bulk request is still bulk: route matching comes first.
#[test]
fn test_route_match_wins_over_bypass() {
    assert_eq!(
        classify("http://example.com/action?action_route=GetLayerTile&id=1"),
        PriorityClass::Low
    );
}

#[test]
fn test_bypass_can_be_disabled() {
    let config = GateConfig {
        bypass_mixed_content: false,
        ..GateConfig::default()
    };
    let classifier = RequestClassifier::from_config(&config);
    let descriptor = RequestDescriptor::new("http://example.com/wms");
    assert_eq!(classifier.classify(&descriptor), PriorityClass::High);
}

/// The `route` metadata entry overrides whatever the URL says.
#[test]
fn test_metadata_route_override() {
    let classifier = RequestClassifier::new();

    let tagged = RequestDescriptor::new("https://maps.local/api/v2/tiles/3/4/5")
        .with_metadata("route", "GetWFSVectorTile");
    assert_eq!(classifier.classify(&tagged), PriorityClass::Low);

    let untagged = RequestDescriptor::new("https://maps.local/action?action_route=GetLayerTile")
        .with_metadata("route", "GetMapLayers");
    assert_eq!(classifier.classify(&untagged), PriorityClass::High);
}

#[test]
fn test_custom_routes_and_param() {
    let config = GateConfig {
        low_priority_routes: vec!["Export".to_string()],
        route_param: "op".to_string(),
        ..GateConfig::default()
    };
    let classifier = RequestClassifier::from_config(&config).route("Thumbnail");

    assert!(classifier.is_low_priority_route("Export"));
    assert!(classifier.is_low_priority_route("Thumbnail"));
    assert!(!classifier.is_low_priority_route("GetLayerTile"));

    let export = RequestDescriptor::new("https://app.local/action?op=Export&fmt=csv");
    assert_eq!(classifier.classify(&export), PriorityClass::Low);

    let old_param = RequestDescriptor::new("https://app.local/action?action_route=Export");
    assert_eq!(classifier.classify(&old_param), PriorityClass::High);
}

#[test]
fn test_descriptor_accessors() {
    let descriptor = RequestDescriptor::new("https://maps.local/action?action_route=GetLayerTile&id=2")
        .with_method("post")
        .with_metadata("layer", "2");

    assert_eq!(descriptor.method(), "POST");
    assert_eq!(descriptor.metadata("layer"), Some("2"));
    assert_eq!(descriptor.metadata("missing"), None);
    assert_eq!(descriptor.route("action_route").as_deref(), Some("GetLayerTile"));
    assert_eq!(descriptor.parsed_url().unwrap().host_str(), Some("maps.local"));

    // Percent-encoded identifiers are decoded before matching.
    let encoded = RequestDescriptor::new("https://maps.local/action?action_route=Get%4CayerTile");
    assert_eq!(encoded.route("action_route").as_deref(), Some("GetLayerTile"));
}

/// Same input, same answer.
#[test]
fn test_classification_is_deterministic() {
    let classifier = RequestClassifier::new();
    let urls = [
        "https://maps.local/action?action_route=GetLayerTile&x=1",
        "http://example.com/a.png",
        "https://maps.local/api",
    ];
    let first: Vec<PriorityClass> = urls
        .iter()
        .map(|u| classifier.classify(&RequestDescriptor::new(*u)))
        .collect();
    for _ in 0..100 {
        let again: Vec<PriorityClass> = urls
            .iter()
            .map(|u| classifier.classify(&RequestDescriptor::new(*u)))
            .collect();
        assert_eq!(first, again);
    }
}

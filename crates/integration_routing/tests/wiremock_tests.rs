//! Integration tests for the OSRM client (wiremock-based)

use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integration_routing::{
    OsrmClient, OsrmConfig, RoutingBackend, RoutingError, Waypoint,
};

const fn route_ok_json() -> &'static str {
    r#"{
        "code": "Ok",
        "routes": [{
            "distance": 55600.0,
            "duration": 2520.0,
            "legs": [{
                "annotation": { "speed": [33.3, 27.8, 13.9, 8.3] }
            }]
        }],
        "waypoints": []
    }"#
}

fn waypoints() -> Vec<Waypoint> {
    vec![Waypoint::new(52.0, 5.0), Waypoint::new(52.5, 5.0)]
}

#[tokio::test]
async fn route_returns_distance_duration_and_speeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/.+$"))
        .and(query_param("overview", "false"))
        .and(query_param("annotations", "speed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(route_ok_json()))
        .mount(&server)
        .await;

    let client = OsrmClient::new(&OsrmConfig::for_testing(&server.uri())).unwrap();
    let summary = client.route(&waypoints()).await.unwrap();

    assert!((summary.distance_km() - 55.6).abs() < 1e-9);
    assert!((summary.duration_minutes() - 42.0).abs() < 1e-9);
    assert_eq!(summary.segment_speeds_ms.len(), 4);
    // 33.3 m/s is ~120 km/h
    let kmh: Vec<f64> = summary.segment_speeds_kmh().collect();
    assert!((kmh[0] - 119.88).abs() < 0.01);
}

#[tokio::test]
async fn route_with_via_waypoint_hits_three_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/5,52;5\.05,52\.2;5,52\.5$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(route_ok_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = OsrmClient::new(&OsrmConfig::for_testing(&server.uri())).unwrap();
    client
        .route(&[
            Waypoint::new(52.0, 5.0),
            Waypoint::new(52.2, 5.05),
            Waypoint::new(52.5, 5.0),
        ])
        .await
        .unwrap();
}

#[tokio::test]
async fn no_route_code_is_not_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/.+$"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"code": "NoRoute", "message": "Impossible route"}"#),
        )
        .mount(&server)
        .await;

    let client = OsrmClient::new(&OsrmConfig::for_testing(&server.uri())).unwrap();
    let err = client.route(&waypoints()).await.unwrap_err();

    assert!(matches!(err, RoutingError::NoRoute { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/.+$"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = OsrmClient::new(&OsrmConfig::for_testing(&server.uri())).unwrap();
    let err = client.route(&waypoints()).await.unwrap_err();

    assert!(matches!(err, RoutingError::ServiceUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn malformed_payload_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let client = OsrmClient::new(&OsrmConfig::for_testing(&server.uri())).unwrap();
    let err = client.route(&waypoints()).await.unwrap_err();

    assert!(matches!(err, RoutingError::ParseError(_)));
}

#[tokio::test]
async fn single_waypoint_is_rejected_locally() {
    let server = MockServer::start().await;
    let client = OsrmClient::new(&OsrmConfig::for_testing(&server.uri())).unwrap();

    let err = client.route(&[Waypoint::new(52.0, 5.0)]).await.unwrap_err();
    assert!(matches!(err, RoutingError::TooFewWaypoints(1)));
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn missing_annotations_yield_empty_speed_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"code": "Ok", "routes": [{"distance": 1000.0, "duration": 90.0, "legs": [{}]}]}"#,
        ))
        .mount(&server)
        .await;

    let client = OsrmClient::new(&OsrmConfig::for_testing(&server.uri())).unwrap();
    let summary = client.route(&waypoints()).await.unwrap();

    assert!(summary.segment_speeds_ms.is_empty());
}

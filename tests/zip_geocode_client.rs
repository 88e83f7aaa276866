use geoforecast::cache::Source;
use geoforecast::geocode::{ZipCode, ZipCodeStackClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, api_key: Option<&str>) -> ZipCodeStackClient {
    ZipCodeStackClient::new(
        &format!("{}/api/v1/search", server.uri()),
        api_key.map(str::to_owned),
        Duration::from_secs(5),
        "geoforecast-test",
    )
    .unwrap()
}

fn golden() -> ZipCode {
    ZipCode::parse("80401").unwrap()
}

#[tokio::test]
async fn test_geocodes_first_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .and(query_param("codes", "80401"))
        .and(query_param("country", "us"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"codes": ["80401"], "country": "us"},
            "results": {
                "80401": [
                    {
                        "postal_code": "80401",
                        "country_code": "US",
                        "latitude": 39.7555,
                        "longitude": -105.2211,
                        "city": "Golden",
                        "state": "Colorado",
                        "state_code": "CO"
                    },
                    {
                        "postal_code": "80401",
                        "latitude": 39.7,
                        "longitude": -105.2,
                        "city": "Elsewhere",
                        "state_code": "CO"
                    }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let geocode = client(&server, Some("test-key")).geocode(&golden()).await.unwrap();

    assert_eq!(geocode.zip, "80401");
    assert_eq!(geocode.lat, 39.7555);
    assert_eq!(geocode.lon, -105.2211);
    assert_eq!(geocode.city, "Golden");
    assert_eq!(geocode.state, "CO");
    assert_eq!(geocode.source, Source::Upstream);
}

#[tokio::test]
async fn test_empty_result_list_is_no_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let err = client(&server, None).geocode(&golden()).await.unwrap_err();

    assert_eq!(err.kind(), "no_result");
}

#[tokio::test]
async fn test_rejected_key_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid API key"})))
        .mount(&server)
        .await;

    let err = client(&server, Some("bad-key")).geocode(&golden()).await.unwrap_err();

    assert_eq!(err.kind(), "status");
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_match_without_city_is_incomplete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {"80401": [{"latitude": 39.7555, "longitude": -105.2211, "state_code": "CO"}]}
        })))
        .mount(&server)
        .await;

    let err = client(&server, None).geocode(&golden()).await.unwrap_err();

    assert_eq!(err.kind(), "incomplete");
}

#![allow(clippy::unwrap_used)]
// Integration tests for `CloudClient` using wiremock. Both the cloud API
// and the identity provider are pointed at the same mock server and
// disambiguated by path / x-amz-target header.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use radoff_api::{CloudClient, Credentials, Error};

// ── Helpers ─────────────────────────────────────────────────────────

fn creds() -> Credentials {
    Credentials {
        username: "user@example.com".into(),
        password: SecretString::from("hunter2".to_string()),
        client_id: "client-123".into(),
        pool_id: "eu-west-1_TestPool".into(),
        pool_region: "eu-west-1".into(),
    }
}

async fn setup(credentials: Credentials) -> (MockServer, CloudClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let auth = Url::parse(&server.uri()).unwrap();
    let client = CloudClient::with_endpoints(credentials, base, auth).unwrap();
    (server, client)
}

/// Mount the full SRP happy path: challenge, verifier, matching domain.
async fn mount_auth_flow(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(
            "x-amz-target",
            "AWSCognitoIdentityProviderService.InitiateAuth",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ChallengeName": "PASSWORD_VERIFIER",
            "ChallengeParameters": {
                "SRP_B": "1a2b3c4d5e6f",
                "SALT": "00aa11bb",
                "SECRET_BLOCK": "c2VjcmV0LWJsb2Nr",
                "USER_ID_FOR_SRP": "user-uuid-1",
                "USERNAME": "user@example.com"
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(
            "x-amz-target",
            "AWSCognitoIdentityProviderService.RespondToAuthChallenge",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthenticationResult": {
                "IdToken": "test-id-token",
                "AccessToken": "test-access-token",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        })))
        .mount(server)
        .await;

    mount_domains(server).await;
}

async fn mount_domains(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/user/me/domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domains": [
                { "id": "unrelated", "parentDomainId": "some-other-root" },
                {
                    "id": "tenant-domain-1",
                    "parentDomainId": "94e966f9-e0b2-11ec-a450-02ab88ac9cd7"
                }
            ]
        })))
        .mount(server)
        .await;
}

// ── connect() ───────────────────────────────────────────────────────

#[tokio::test]
async fn connect_performs_srp_exchange_and_domain_discovery() {
    let (server, mut client) = setup(creds()).await;
    mount_auth_flow(&server).await;

    assert!(!client.connected());
    client.connect().await.unwrap();
    assert!(client.connected());
}

#[tokio::test]
async fn connect_requires_all_credentials() {
    let mut incomplete = creds();
    incomplete.client_id = String::new();
    // Unroutable endpoints: the call must fail before any I/O happens.
    let client = CloudClient::with_endpoints(
        incomplete,
        Url::parse("http://127.0.0.1:9/").unwrap(),
        Url::parse("http://127.0.0.1:9/").unwrap(),
    );
    let mut client = client.unwrap();

    let result = client.connect().await;
    assert!(
        matches!(result, Err(Error::AuthConfig { .. })),
        "expected AuthConfig error, got: {result:?}"
    );
    assert!(!client.connected());
}

#[tokio::test]
async fn connect_surfaces_rejected_credentials() {
    let (server, mut client) = setup(creds()).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "NotAuthorizedException",
            "message": "Incorrect username or password."
        })))
        .mount(&server)
        .await;

    let result = client.connect().await;
    assert!(
        matches!(result, Err(Error::InvalidCredentials { .. })),
        "expected InvalidCredentials error, got: {result:?}"
    );
    assert!(!client.connected());
}

#[tokio::test]
async fn connect_fails_when_no_domain_matches_parent_scope() {
    let (server, mut client) = setup(creds()).await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthenticationResult": { "IdToken": "test-id-token" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/user/me/domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domains": [{ "id": "other", "parentDomainId": "not-the-root" }]
        })))
        .mount(&server)
        .await;

    let result = client.connect().await;
    assert!(
        matches!(result, Err(Error::DomainNotFound)),
        "expected DomainNotFound, got: {result:?}"
    );
    assert!(!client.connected());
}

// ── list_devices() / fetch_telemetry() ──────────────────────────────

#[tokio::test]
async fn list_devices_filters_types_and_maps_telemetry() {
    let (server, mut client) = setup(creds()).await;
    mount_auth_flow(&server).await;

    Mock::given(method("POST"))
        .and(path("/data/devices/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                {
                    "id": "dev-1",
                    "serial": "RAD-0001",
                    "deviceTypeName": "Now+",
                    "name": "Living room"
                },
                {
                    "id": "dev-2",
                    "serial": "RAD-0002",
                    "deviceTypeName": "LegacyModel",
                    "name": "Attic"
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/devices/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "data": [
                    { "propertyName": "tvoc", "value": 42.0 },
                    { "propertyName": "internal_temperature", "value": 100.0 },
                    { "propertyName": "airqualityindex", "value": 5.0 },
                    { "propertyName": "battery_level", "value": 9.0 }
                ],
                "aggregatedData": [
                    { "propertyName": "airqualityindex", "aggregationValue": 2.0 }
                ]
            }
        })))
        .mount(&server)
        .await;

    client.connect().await.unwrap();
    let devices = client.list_devices().await.unwrap();

    // The unsupported model is silently excluded.
    assert_eq!(devices.len(), 1);
    let device = &devices[0];
    assert_eq!(device.device_id, "dev-1");
    assert_eq!(device.device_serial, "RAD-0001");
    assert_eq!(device.device_type, "Now+");
    assert_eq!(device.name, "Living room");

    // Unmapped property names never appear.
    assert!(!device.sensors.contains_key("battery_level"));

    let tvoc = &device.sensors["tvoc"];
    assert_eq!(tvoc.raw_value, 42.0);
    assert_eq!(tvoc.value(), 42.0);
    assert_eq!(tvoc.unit, Some("µg/m³"));

    // Temperature is normalized; 100 raw -> 0.8 °C.
    let temp = &device.sensors["internal_temperature"];
    assert_eq!(temp.raw_value, 100.0);
    assert_eq!(temp.value(), 0.8);
    assert_eq!(temp.unit, Some("°C"));

    // The aggregated group wins for shared property names.
    let aqi = &device.sensors["airqualityindex"];
    assert_eq!(aqi.raw_value, 2.0);
    assert_eq!(aqi.unit, None);

    // Round-trip: the mapped (key, value, unit) triples match the wire
    // payload modulo the documented temperature normalization.
    let mut triples: Vec<(&str, f64, Option<&str>)> = device
        .sensors
        .values()
        .map(|s| (s.key.as_str(), s.value(), s.unit))
        .collect();
    triples.sort_by(|a, b| a.0.cmp(b.0));
    assert_eq!(
        triples,
        vec![
            ("airqualityindex", 2.0, None),
            ("internal_temperature", 0.8, Some("°C")),
            ("tvoc", 42.0, Some("µg/m³")),
        ]
    );
}

#[tokio::test]
async fn valueless_property_is_skipped_without_failing_the_fetch() {
    let (server, mut client) = setup(creds()).await;
    mount_auth_flow(&server).await;

    // "pressure" carries neither `value` nor `aggregationValue`.
    Mock::given(method("GET"))
        .and(path("/data/devices/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "data": [
                    { "propertyName": "pressure" },
                    { "propertyName": "tvoc", "value": 7.0 }
                ]
            }
        })))
        .mount(&server)
        .await;

    client.connect().await.unwrap();
    let sensors = client.fetch_telemetry("dev-1").await.unwrap();

    assert!(!sensors.contains_key("pressure"));
    assert_eq!(sensors["tvoc"].raw_value, 7.0);
    assert_eq!(sensors.len(), 1);
}

#[tokio::test]
async fn non_200_resets_session_before_raising() {
    let (server, mut client) = setup(creds()).await;

    // Auth succeeds exactly once; the eager reconnect after the failure
    // below finds no identity provider and its error is swallowed.
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthenticationResult": { "IdToken": "test-id-token" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_domains(&server).await;

    Mock::given(method("POST"))
        .and(path("/data/devices/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    client.connect().await.unwrap();
    assert!(client.connected());

    let result = client.list_devices().await;
    assert!(
        matches!(result, Err(Error::ApiAuth { status: 500 })),
        "expected ApiAuth(500), got: {result:?}"
    );
    // Reconnect-and-fail ordering: the session was dropped before the
    // error surfaced, and the failed reconnect left it disconnected.
    assert!(!client.connected());
}

#[tokio::test]
async fn telemetry_requires_connected_session() {
    let (_server, mut client) = setup(creds()).await;

    let result = client.fetch_telemetry("dev-1").await;
    assert!(
        matches!(result, Err(Error::TokenMissing)),
        "expected TokenMissing, got: {result:?}"
    );
}

// ── Radoff cloud API client ──
//
// Owns the vendor session (bearer token + tenant domain), performs the
// SRP login, discovers devices, and maps raw telemetry into typed
// readings. Single-owner by contract: the poll coordinator is the only
// driver, so every method takes `&mut self` and the client holds no locks.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE, HOST, HeaderMap, HeaderValue, USER_AGENT,
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::IdentityProvider;
use crate::error::Error;
use crate::mapping::{TelemetryGroup, descriptor, is_supported_device_type};
use crate::model::{
    Device, DomainsResponse, SearchRequest, SearchResponse, SensorReading, TelemetryResponse,
};

/// Production base endpoint of the Radoff cloud API.
pub const BASE_URL: &str = "https://api.iot.radoff.life/api/v1/core";

/// The fixed root scope: tenant domains are children of this domain id.
pub const PARENT_DOMAIN: &str = "94e966f9-e0b2-11ec-a450-02ab88ac9cd7";

/// Per-request network timeout. Bounds worst-case staleness of a stuck poll.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(50);

const CLIENT_USER_AGENT: &str = "Dart/3.5 (dart:io)";

/// Cloud account credentials. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub client_id: String,
    pub pool_id: String,
    pub pool_region: String,
}

/// Vendor session state. Token and domain are populated together by
/// [`CloudClient::connect`] and cleared together by
/// [`CloudClient::disconnect`] -- never partially mutated.
#[derive(Default)]
struct Session {
    connected: bool,
    bearer: Option<SecretString>,
    domain: Option<String>,
}

/// Async client for the Radoff IoT cloud.
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
    idp: IdentityProvider,
    credentials: Credentials,
    session: Session,
}

impl CloudClient {
    /// Build a client against the production endpoints.
    ///
    /// Does not authenticate -- call [`connect()`](Self::connect) first.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        let base_url = Url::parse(BASE_URL)?;
        let idp = IdentityProvider::new(
            &credentials.client_id,
            &credentials.pool_id,
            &credentials.pool_region,
        )?;
        Self::build(credentials, base_url, idp)
    }

    /// Build a client against explicit endpoints.
    ///
    /// Use this to point both the cloud API and the identity provider at
    /// mock servers in tests.
    pub fn with_endpoints(
        credentials: Credentials,
        base_url: Url,
        auth_endpoint: Url,
    ) -> Result<Self, Error> {
        let idp = IdentityProvider::with_endpoint(
            &credentials.client_id,
            &credentials.pool_id,
            auth_endpoint,
        );
        Self::build(credentials, base_url, idp)
    }

    fn build(credentials: Credentials, base_url: Url, idp: IdentityProvider) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url,
            idp,
            credentials,
            session: Session::default(),
        })
    }

    /// Whether the session currently holds a token and tenant domain.
    pub fn connected(&self) -> bool {
        self.session.connected
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Authenticate and resolve the tenant domain.
    ///
    /// Runs the SRP exchange against the identity provider, then the
    /// domain-discovery call scoped to the fixed parent domain. The
    /// session is replaced wholesale on success and left empty on any
    /// failure.
    pub async fn connect(&mut self) -> Result<(), Error> {
        if self.credentials.username.is_empty()
            || self.credentials.password.expose_secret().is_empty()
            || self.credentials.client_id.is_empty()
        {
            return Err(Error::AuthConfig {
                message: "username, password, and client id are all required".into(),
            });
        }

        let tokens = self
            .idp
            .authenticate(&self.http, &self.credentials.username, &self.credentials.password)
            .await?;
        debug!(expires_in = ?tokens.expires_in, "identity provider issued tokens");

        match self.discover_domain(&tokens.id_token).await? {
            Some(domain) => {
                info!(%domain, "connected to cloud API");
                self.session = Session {
                    connected: true,
                    bearer: Some(tokens.id_token),
                    domain: Some(domain),
                };
                Ok(())
            }
            None => {
                self.session = Session::default();
                Err(Error::DomainNotFound)
            }
        }
    }

    /// Clear the session. Idempotent; always succeeds.
    pub fn disconnect(&mut self) {
        self.session = Session::default();
    }

    // ── Device discovery & telemetry ─────────────────────────────────

    /// Discover devices and fetch each one's current telemetry.
    ///
    /// Devices whose reported type is outside the supported allow-list
    /// are dropped without error. Requires a connected session.
    pub async fn list_devices(&mut self) -> Result<Vec<Device>, Error> {
        let url = self.url("data/devices/search")?;
        debug!("POST {url}");

        let headers = self.authed_headers()?;
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&SearchRequest::all())
            .send()
            .await?;
        let resp = self.ensure_ok(resp).await?;
        let search: SearchResponse = parse_json(resp).await?;

        let mut devices = Vec::new();
        for wire in search.devices {
            let supported = wire
                .device_type_name
                .as_deref()
                .is_some_and(is_supported_device_type);
            let Some(device_type) = wire.device_type_name.filter(|_| supported) else {
                debug!(device_id = %wire.id, "skipping unsupported device type");
                continue;
            };

            let sensors = self.fetch_telemetry(&wire.id).await?;
            devices.push(Device {
                device_id: wire.id,
                device_serial: wire.serial,
                device_type,
                name: wire.name,
                sensors,
            });
        }
        Ok(devices)
    }

    /// Fetch one device's current readings, mapped through the static
    /// sensor table. Unmapped property names are silently ignored.
    pub async fn fetch_telemetry(
        &mut self,
        device_id: &str,
    ) -> Result<HashMap<String, SensorReading>, Error> {
        let url = self.url(&format!("data/devices/{device_id}"))?;
        debug!("GET {url}");

        let headers = self.authed_headers()?;
        let resp = self.http.get(url).headers(headers).send().await?;
        let resp = self.ensure_ok(resp).await?;
        let telemetry: TelemetryResponse = parse_json(resp).await?;

        let mut sensors = HashMap::new();
        let groups = [
            (TelemetryGroup::Data, telemetry.data.data),
            (TelemetryGroup::Aggregated, telemetry.data.aggregated_data),
        ];
        for (group, properties) in groups {
            for property in properties {
                let Some(desc) = descriptor(group, &property.property_name) else {
                    continue;
                };
                let Some(raw) = property.reading() else {
                    debug!(
                        property = %property.property_name,
                        "property carried neither value nor aggregationValue"
                    );
                    continue;
                };
                // Later groups overwrite earlier ones for shared names.
                sensors.insert(
                    property.property_name.clone(),
                    SensorReading::from_descriptor(property.property_name, raw, desc),
                );
            }
        }

        debug!(device_id, count = sensors.len(), "mapped telemetry");
        Ok(sensors)
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Resolve the tenant domain: the first listed domain whose parent is
    /// the fixed root scope. `None` when no domain matches.
    async fn discover_domain(&self, bearer: &SecretString) -> Result<Option<String>, Error> {
        let url = self.url("auth/user/me/domains")?;
        debug!("GET {url}");

        let headers = self.headers(bearer, PARENT_DOMAIN)?;
        let resp = self.http.get(url).headers(headers).send().await?;
        let listing: DomainsResponse = parse_json(resp).await?;

        Ok(listing
            .domains
            .into_iter()
            .find(|d| d.parent_domain_id.as_deref() == Some(PARENT_DOMAIN))
            .map(|d| d.id))
    }

    /// Reconnect-and-fail protocol: on any non-200 status, drop the
    /// session, eagerly try to establish a fresh one (so the *next* poll
    /// has a valid token), and fail the current call. The reconnect's own
    /// failure is swallowed -- only the original error surfaces.
    async fn ensure_ok(&mut self, resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status == StatusCode::OK {
            return Ok(resp);
        }

        warn!(%status, "cloud API returned non-200, resetting session");
        self.disconnect();
        if let Err(e) = self.connect().await {
            debug!(error = %e, "eager reconnect failed");
        }
        Err(Error::ApiAuth { status: status.as_u16() })
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Headers for a tenant-scoped call, using the session's token+domain.
    fn authed_headers(&self) -> Result<HeaderMap, Error> {
        let bearer = self.session.bearer.as_ref().ok_or(Error::TokenMissing)?;
        let domain = self.session.domain.as_ref().ok_or(Error::TokenMissing)?;
        self.headers(bearer, domain)
    }

    /// The fixed header set the vendor app sends on every request.
    fn headers(&self, bearer: &SecretString, x_domain: &str) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(
            "x-domain",
            HeaderValue::from_str(x_domain).map_err(|_| Error::AuthConfig {
                message: format!("tenant domain {x_domain:?} is not a valid header value"),
            })?,
        );
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        if let Some(host) = self.base_url.host_str() {
            if let Ok(value) = HeaderValue::from_str(host) {
                headers.insert(HOST, value);
            }
        }
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", bearer.expose_secret()))
            .map_err(|_| Error::InvalidCredentials {
                message: "bearer token is not a valid header value".into(),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

/// Read the body and deserialize, keeping the raw text for diagnostics.
async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

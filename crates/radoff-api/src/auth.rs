// ── Identity provider client (Cognito USER_SRP_AUTH) ──
//
// Two JSON POSTs against the regional Cognito endpoint:
//   1. InitiateAuth          -> PASSWORD_VERIFIER challenge (SRP_B, SALT, ...)
//   2. RespondToAuthChallenge -> AuthenticationResult with the tokens
//
// The SRP math lives in `srp.rs`; this module only moves bytes.

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::srp::SrpSession;

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_HEADER: &str = "x-amz-target";
const TARGET_INITIATE: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const TARGET_RESPOND: &str = "AWSCognitoIdentityProviderService.RespondToAuthChallenge";

/// The authentication result we keep: the identity token doubles as the
/// cloud API bearer token.
pub(crate) struct AuthTokens {
    pub id_token: SecretString,
    pub expires_in: Option<u64>,
}

/// Client for the identity provider's SRP login flow.
pub(crate) struct IdentityProvider {
    endpoint: Url,
    client_id: String,
    pool_id: String,
}

impl IdentityProvider {
    /// Build against the regional endpoint derived from the pool region.
    pub(crate) fn new(client_id: &str, pool_id: &str, pool_region: &str) -> Result<Self, Error> {
        let endpoint = Url::parse(&format!("https://cognito-idp.{pool_region}.amazonaws.com/"))?;
        Ok(Self::with_endpoint(client_id, pool_id, endpoint))
    }

    /// Build against an explicit endpoint (tests, private deployments).
    pub(crate) fn with_endpoint(client_id: &str, pool_id: &str, endpoint: Url) -> Self {
        Self {
            endpoint,
            client_id: client_id.to_owned(),
            pool_id: pool_id.to_owned(),
        }
    }

    /// Run the full SRP exchange and return the resulting tokens.
    pub(crate) async fn authenticate(
        &self,
        http: &reqwest::Client,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthTokens, Error> {
        let srp = SrpSession::new(&self.pool_id)?;

        debug!(%username, "initiating SRP auth");
        let initiate = json!({
            "AuthFlow": "USER_SRP_AUTH",
            "ClientId": self.client_id,
            "AuthParameters": {
                "USERNAME": username,
                "SRP_A": srp.srp_a_hex(),
            },
        });
        let first: AuthResponse = self.call(http, TARGET_INITIATE, &initiate).await?;

        // Servers may short-circuit straight to a result (and so do mocks).
        if let Some(result) = first.authentication_result {
            return result.into_tokens();
        }

        let challenge = match first.challenge_name.as_deref() {
            Some("PASSWORD_VERIFIER") => first.challenge_parameters.ok_or_else(|| Error::Srp {
                message: "PASSWORD_VERIFIER challenge without parameters".into(),
            })?,
            other => {
                return Err(Error::InvalidCredentials {
                    message: format!("unexpected auth challenge: {other:?}"),
                });
            }
        };

        let claim = srp.password_claim(
            &challenge.user_id_for_srp,
            password.expose_secret(),
            &challenge.srp_b,
            &challenge.salt,
            &challenge.secret_block,
            Utc::now(),
        )?;

        debug!(user_id = %challenge.user_id_for_srp, "answering PASSWORD_VERIFIER challenge");
        let respond = json!({
            "ChallengeName": "PASSWORD_VERIFIER",
            "ClientId": self.client_id,
            "ChallengeResponses": {
                "USERNAME": challenge.user_id_for_srp,
                "TIMESTAMP": claim.timestamp,
                "PASSWORD_CLAIM_SECRET_BLOCK": challenge.secret_block,
                "PASSWORD_CLAIM_SIGNATURE": claim.signature,
            },
        });
        let second: AuthResponse = self.call(http, TARGET_RESPOND, &respond).await?;

        second
            .authentication_result
            .ok_or_else(|| Error::InvalidCredentials {
                message: "identity provider returned no authentication result".into(),
            })?
            .into_tokens()
    }

    /// One `x-amz-json-1.1` RPC call. Non-200 responses carry a
    /// `{"__type", "message"}` body which we fold into the error.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        http: &reqwest::Client,
        target: &str,
        body: &serde_json::Value,
    ) -> Result<T, Error> {
        let resp = http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, AMZ_JSON)
            .header(TARGET_HEADER, target)
            .body(serde_json::to_vec(body).map_err(|e| Error::Srp {
                message: format!("request serialization failed: {e}"),
            })?)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let err: ProviderError = serde_json::from_str(&text).unwrap_or_default();
            return Err(Error::InvalidCredentials {
                message: format!(
                    "{} ({})",
                    err.message.unwrap_or_else(|| "authentication failed".into()),
                    err.type_name.unwrap_or_else(|| status.to_string()),
                ),
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text,
        })
    }
}

// ── Wire shapes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthResponse {
    #[serde(default)]
    challenge_name: Option<String>,
    #[serde(default)]
    challenge_parameters: Option<ChallengeParameters>,
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
struct ChallengeParameters {
    #[serde(rename = "SRP_B")]
    srp_b: String,
    #[serde(rename = "SALT")]
    salt: String,
    #[serde(rename = "SECRET_BLOCK")]
    secret_block: String,
    #[serde(rename = "USER_ID_FOR_SRP")]
    user_id_for_srp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl AuthenticationResult {
    fn into_tokens(self) -> Result<AuthTokens, Error> {
        let id_token = self.id_token.ok_or_else(|| Error::InvalidCredentials {
            message: "authentication result carried no identity token".into(),
        })?;
        Ok(AuthTokens {
            id_token: SecretString::from(id_token),
            expires_in: self.expires_in,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProviderError {
    #[serde(rename = "__type")]
    type_name: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

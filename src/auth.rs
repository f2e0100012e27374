//! Identity-provider token verification and tenant resolution.
//!
//! Verification is delegated to Google's OAuth endpoints: a token is first
//! treated as an ID token, then as an access token. Where a token is
//! optional, verification failure degrades to the explicit tenant id and
//! the degradation is recorded in the resolution value instead of being
//! swallowed.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::core::errors::ApiError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

pub const DEFAULT_TENANT: &str = "default";

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: String,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, ApiError>;
}

pub struct GoogleTokenVerifier {
    client: Client,
}

impl GoogleTokenVerifier {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn verify_id_token(&self, token: &str) -> Result<Value, ApiError> {
        let res = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(ApiError::Unauthorized);
        }
        res.json().await.map_err(ApiError::internal)
    }

    async fn verify_access_token(&self, token: &str) -> Result<Value, ApiError> {
        let res = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(token)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(ApiError::Unauthorized);
        }
        res.json().await.map_err(ApiError::internal)
    }
}

impl Default for GoogleTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, ApiError> {
        let info = match self.verify_id_token(token).await {
            Ok(info) => info,
            Err(_) => {
                tracing::debug!("Token is not an ID token, trying as access token");
                self.verify_access_token(token).await?
            }
        };

        user_from_claims(&info)
    }
}

/// Build the user record from provider claims. The tenant-facing `user_id`
/// is the local part of the verified email address.
pub fn user_from_claims(info: &Value) -> Result<VerifiedUser, ApiError> {
    let email = info
        .get("email")
        .and_then(|v| v.as_str())
        .filter(|e| !e.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let name = info
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("User")
        .to_string();
    let picture = info
        .get("picture")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Ok(VerifiedUser {
        user_id: local_part(email),
        email: email.to_string(),
        name,
        picture,
    })
}

fn local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// How the tenant id for a request was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantResolution {
    /// Derived from a verified identity token.
    Verified,
    /// Taken from an explicit tenant id in the request.
    Explicit,
    /// Nothing usable was supplied; the default tenant applies.
    DefaultFallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTenant {
    pub tenant_id: String,
    pub resolution: TenantResolution,
}

/// Resolve the tenant for a request from an optional bearer token and an
/// optional explicit tenant id. An invalid token does not fail the request;
/// it degrades to the explicit id (or the default tenant), and the outcome
/// says which happened.
pub async fn resolve_tenant(
    verifier: &dyn TokenVerifier,
    token: Option<&str>,
    explicit: Option<&str>,
) -> ResolvedTenant {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        match verifier.verify(token).await {
            Ok(user) => {
                return ResolvedTenant {
                    tenant_id: user.user_id,
                    resolution: TenantResolution::Verified,
                }
            }
            Err(err) => {
                tracing::debug!("Token verification failed, falling back: {}", err);
            }
        }
    }

    match explicit.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tenant) => ResolvedTenant {
            tenant_id: tenant.to_string(),
            resolution: TenantResolution::Explicit,
        },
        None => ResolvedTenant {
            tenant_id: DEFAULT_TENANT.to_string(),
            resolution: TenantResolution::DefaultFallback,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubVerifier {
        accept: bool,
    }

    #[async_trait]
    impl TokenVerifier for StubVerifier {
        async fn verify(&self, _token: &str) -> Result<VerifiedUser, ApiError> {
            if self.accept {
                Ok(VerifiedUser {
                    user_id: "jane.doe".to_string(),
                    email: "jane.doe@example.com".to_string(),
                    name: "Jane Doe".to_string(),
                    picture: String::new(),
                })
            } else {
                Err(ApiError::Unauthorized)
            }
        }
    }

    #[test]
    fn user_id_is_email_local_part() {
        let user = user_from_claims(&json!({
            "email": "jane.doe@example.com",
            "name": "Jane Doe",
            "picture": "https://example.com/p.png"
        }))
        .unwrap();
        assert_eq!(user.user_id, "jane.doe");
        assert_eq!(user.name, "Jane Doe");
    }

    #[test]
    fn missing_email_is_unauthorized() {
        let err = user_from_claims(&json!({"name": "No Email"})).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn valid_token_wins_over_explicit_tenant() {
        let resolved =
            resolve_tenant(&StubVerifier { accept: true }, Some("tok"), Some("acme")).await;
        assert_eq!(resolved.tenant_id, "jane.doe");
        assert_eq!(resolved.resolution, TenantResolution::Verified);
    }

    #[tokio::test]
    async fn invalid_token_degrades_to_explicit_tenant() {
        let resolved =
            resolve_tenant(&StubVerifier { accept: false }, Some("bad"), Some("acme")).await;
        assert_eq!(resolved.tenant_id, "acme");
        assert_eq!(resolved.resolution, TenantResolution::Explicit);
    }

    #[tokio::test]
    async fn nothing_supplied_falls_back_to_default() {
        let resolved = resolve_tenant(&StubVerifier { accept: false }, None, None).await;
        assert_eq!(resolved.tenant_id, "default");
        assert_eq!(resolved.resolution, TenantResolution::DefaultFallback);
    }

    #[tokio::test]
    async fn blank_explicit_tenant_counts_as_missing() {
        let resolved = resolve_tenant(&StubVerifier { accept: false }, None, Some("  ")).await;
        assert_eq!(resolved.tenant_id, "default");
        assert_eq!(resolved.resolution, TenantResolution::DefaultFallback);
    }
}

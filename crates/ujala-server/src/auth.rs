//! Session tokens, password hashing and per-request authorization.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use ujala_shared::{Capability, Role};
use ujala_store::{Account, Database, StoreError};
use uuid::Uuid;

use crate::config::{ServerConfig, SuperadminCredentials};
use crate::error::ServerError;

/// Subject used for the superadmin, who has no stored account.
pub const SUPERADMIN_SUBJECT: &str = "superadmin";

const SUPERADMIN_NAME: &str = "Super Admin";

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Account id, or [`SUPERADMIN_SUBJECT`].
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Stored account id; `None` for the superadmin.
    pub fn account_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[derive(Clone)]
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: chrono::Duration,
    superadmin: Option<SuperadminCredentials>,
}

impl Authenticator {
    pub fn new(secret: &str, ttl: std::time::Duration, superadmin: Option<SuperadminCredentials>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(24)),
            superadmin,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_ttl, config.superadmin.clone())
    }

    fn issue(&self, sub: String, email: String, role: Role, name: String) -> Result<String, ServerError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub,
            email,
            role,
            name,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("token signing failed: {e}")))
    }

    pub fn issue_for_account(&self, account: &Account) -> Result<String, ServerError> {
        self.issue(
            account.id.to_string(),
            account.email.clone(),
            account.role,
            account.name.clone(),
        )
    }

    /// Check the configured superadmin pair and issue a token on match.
    pub fn superadmin_login(&self, email: &str, password: &str) -> Result<String, ServerError> {
        let invalid = || ServerError::Unauthorized("Invalid superadmin credentials".into());
        let creds = self.superadmin.as_ref().ok_or_else(invalid)?;

        let email_ok = creds.email.as_bytes().ct_eq(email.as_bytes());
        let pass_ok = creds.password.as_bytes().ct_eq(password.as_bytes());
        if !bool::from(email_ok & pass_ok) {
            return Err(invalid());
        }

        self.issue(
            SUPERADMIN_SUBJECT.to_string(),
            creds.email.clone(),
            Role::Superadmin,
            SUPERADMIN_NAME.to_string(),
        )
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServerError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ServerError::Unauthorized("Invalid or expired token".into()))
    }

    /// Decode the bearer token of a request.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, ServerError> {
        let token = bearer_token(headers)
            .ok_or_else(|| ServerError::Unauthorized("No token provided".into()))?;
        self.verify(token)
    }

    /// Authenticate and check that the caller's role grants `capability`.
    ///
    /// Reporter tokens are re-checked against the store, so a reporter that
    /// was deleted or is not (or no longer) approved is turned away even
    /// with an unexpired token.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        capability: Capability,
        db: &Database,
    ) -> Result<Claims, ServerError> {
        let claims = self.authenticate(headers)?;
        if !claims.role.can(capability) {
            return Err(ServerError::Forbidden("Insufficient permissions".into()));
        }

        if claims.role == Role::Reporter {
            let id = claims
                .account_id()
                .ok_or_else(|| ServerError::Unauthorized("Invalid or expired token".into()))?;
            let account = match db.get_account(id) {
                Ok(account) => account,
                Err(StoreError::NotFound) => {
                    return Err(ServerError::Unauthorized("Account no longer exists".into()))
                }
                Err(e) => return Err(e.into()),
            };
            if account.role != Role::Reporter || !account.is_approved {
                return Err(ServerError::Forbidden(
                    "Reporter account pending approval".into(),
                ));
            }
        }

        Ok(claims)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Argon2id PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| ServerError::Internal(format!("salt encoding failed: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServerError::Internal(format!("password hashing failed: {e}")))
}

/// `false` for a wrong password and for an unparseable hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;
    use ujala_store::NewAccount;

    fn authenticator() -> Authenticator {
        Authenticator::new(
            "test_secret",
            Duration::from_secs(3600),
            Some(SuperadminCredentials {
                email: "root@ujala.in".into(),
                password: "s3cret".into(),
            }),
        )
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn account(db: &Database, role: Role, approved: bool) -> Account {
        db.create_account(NewAccount {
            name: "Asha".into(),
            email: format!("{}@ujala.in", Uuid::new_v4()),
            password_hash: "x".into(),
            role,
            is_approved: approved,
            avatar: None,
        })
        .unwrap()
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-hash"));
    }

    #[test]
    fn test_token_round_trip() {
        let auth = authenticator();
        let db = Database::open_in_memory().unwrap();
        let admin = account(&db, Role::Admin, true);

        let token = auth.issue_for_account(&admin).unwrap();
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.account_id(), Some(admin.id));
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.name, "Asha");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = authenticator().superadmin_login("root@ujala.in", "s3cret").unwrap();
        let other = Authenticator::new("other", Duration::from_secs(60), None);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_superadmin_login() {
        let auth = authenticator();
        assert!(auth.superadmin_login("root@ujala.in", "wrong").is_err());
        assert!(auth.superadmin_login("x@ujala.in", "s3cret").is_err());
        assert!(auth.superadmin_login(" root@ujala.in", "s3cret").is_err());
        assert!(auth.superadmin_login("ROOT@ujala.in", "s3cret").is_err());

        let claims = auth
            .verify(&auth.superadmin_login("root@ujala.in", "s3cret").unwrap())
            .unwrap();
        assert_eq!(claims.sub, SUPERADMIN_SUBJECT);
        assert_eq!(claims.role, Role::Superadmin);
        assert_eq!(claims.account_id(), None);

        let disabled = Authenticator::new("k", Duration::from_secs(60), None);
        assert!(disabled.superadmin_login("", "").is_err());
    }

    #[test]
    fn test_authorize_checks_capabilities() {
        let auth = authenticator();
        let db = Database::open_in_memory().unwrap();
        let admin = account(&db, Role::Admin, true);
        let headers = headers_with(&auth.issue_for_account(&admin).unwrap());

        assert!(auth.authorize(&headers, Capability::EditArticle, &db).is_ok());
        assert!(matches!(
            auth.authorize(&headers, Capability::ModerateArticles, &db),
            Err(ServerError::Forbidden(_))
        ));
        assert!(matches!(
            auth.authorize(&HeaderMap::new(), Capability::SubmitArticle, &db),
            Err(ServerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_reporter_token_rechecked_against_store() {
        let auth = authenticator();
        let db = Database::open_in_memory().unwrap();

        let pending = account(&db, Role::Reporter, false);
        let headers = headers_with(&auth.issue_for_account(&pending).unwrap());
        assert!(matches!(
            auth.authorize(&headers, Capability::SubmitArticle, &db),
            Err(ServerError::Forbidden(_))
        ));

        db.approve_reporter(pending.id).unwrap();
        assert!(auth.authorize(&headers, Capability::SubmitArticle, &db).is_ok());

        db.delete_reporter(pending.id).unwrap();
        assert!(matches!(
            auth.authorize(&headers, Capability::SubmitArticle, &db),
            Err(ServerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}

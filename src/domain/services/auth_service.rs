use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, Identity}, role::Role, user::{NewUser, User}},
    ports::UserRepository,
};
use crate::error::{AppError, FieldViolation};
use crate::config::Config;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use tracing::{debug, info, warn};

const MIN_CREDENTIAL_LEN: usize = 7;

/// Acceptance rule shared by usernames and passwords.
///
/// Anything containing `admin` passes regardless of length, which is what lets
/// the seeded `admin`/`admin` account log in. Everything else needs at least
/// seven characters.
pub fn credential_policy(value: &str) -> bool {
    value.contains("admin") || value.chars().count() >= MIN_CREDENTIAL_LEN
}

pub fn check_credentials(username: &str, password: &str) -> Result<(), AppError> {
    let mut violations = Vec::new();
    if !credential_policy(username) {
        violations.push(FieldViolation::new("username", "Username must be at least 7 characters."));
    }
    if !credential_policy(password) {
        violations.push(FieldViolation::new("password", "Password must be at least 7 characters."));
    }
    if violations.is_empty() { Ok(()) } else { Err(AppError::Validation(violations)) }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalWithMsg(format!("password hashing failed: {}", e)))
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &Config) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_ttl_secs: config.token_ttl.as_secs() as i64,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        check_credentials(username, password)?;

        let user = self.users.find_by_username(username).await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::InternalWithMsg(format!("stored hash for user {} is unreadable", user.id)))?;

        Argon2::default().verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| {
                warn!("Rejected password for user {}", user.id);
                AppError::InvalidCredential
            })?;

        let token = self.issue_token(&user)?;
        info!("User logged in: {}", user.id);
        Ok(token)
    }

    pub async fn register(&self, username: &str, password: &str, role: Role) -> Result<User, AppError> {
        check_credentials(username, password)?;

        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::DuplicateUsername);
        }

        let password_hash = hash_password(password)?;
        let created = self.users.create(&NewUser::new(username.to_string(), password_hash, role)).await
            .map_err(|e| if e.is_unique_violation() { AppError::DuplicateUsername } else { e })?;

        info!("Registered user {} with role {}", created.id, created.role);
        Ok(created)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now + self.token_ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })
    }

    /// Decodes a bearer token. A bad signature or garbled token is `Unauthorized`;
    /// a well-formed token past its `exp` still decodes, flagged as expired.
    pub fn verify(&self, token: Option<&str>) -> Result<Identity, AppError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(AppError::Unauthorized)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AppError::Unauthorized
            })?;

        let claims = token_data.claims;
        Ok(Identity {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
            expired: claims.exp <= Utc::now().timestamp(),
        })
    }
}

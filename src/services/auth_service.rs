use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::{prelude::*, *};
use crate::utils::auth::{create_jwt, validate_jwt};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde::Serialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated identity bound to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    pub user_id: i32,
    pub username: String,
}

impl From<users::Model> for Principal {
    fn from(user: users::Model) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }
}

/// A freshly issued session token, ready to be placed in the session cookie.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    db: DatabaseConnection,
    config: AppConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self { db, config }
    }

    /// Register a new user with an argon2 password hash.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<users::Model, AppError> {
        let existing = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            debug!("user exists: {}", username);
            return Err(AppError::DuplicateUsername(username.to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Unexpected(anyhow::anyhow!("hashing error: {}", e)))?
            .to_string();

        let user = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            ..Default::default()
        };

        // The unique index still decides when two registrations race
        let user = user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::DuplicateUsername(username.to_string())
            }
            _ => AppError::Storage(e),
        })?;

        info!(user_id = user.id, username = %user.username, "user_registered");
        Ok(user)
    }

    /// Verify credentials. Unknown users and wrong passwords are indistinguishable.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AppError> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let parsed_hash = argon2::PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Unexpected(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        Ok(Principal::from(user))
    }

    /// Persist a session row for the principal and sign a token referencing it.
    pub async fn start_session(&self, principal: &Principal) -> Result<SessionToken, AppError> {
        let token_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.session_ttl_hours);

        let token = create_jwt(principal.user_id, &token_id, expires_at, &self.config.jwt_secret)?;

        tokens::ActiveModel {
            id: Set(token_id),
            user_id: Set(principal.user_id),
            created_at: Set(now),
            expires_at: Set(expires_at),
        }
        .insert(&self.db)
        .await?;

        info!(user_id = principal.user_id, username = %principal.username, "user_logged_in");
        Ok(SessionToken { token, expires_at })
    }

    /// Resolve the principal behind a session token, if the session is still live.
    pub async fn current_principal(&self, token: Option<&str>) -> Result<Option<Principal>, AppError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let claims = match validate_jwt(token, &self.config.jwt_secret) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("rejected session token: {}", e);
                return Ok(None);
            }
        };
        let Ok(user_id) = claims.user_id() else {
            return Ok(None);
        };

        let session = Tokens::find_by_id(claims.jti.clone()).one(&self.db).await?;
        let live = session
            .as_ref()
            .is_some_and(|s| s.user_id == user_id && s.expires_at > Utc::now());
        if !live {
            return Ok(None);
        }

        let user = Users::find_by_id(user_id).one(&self.db).await?;
        Ok(user.map(Principal::from))
    }

    /// End the session behind `token`. Unknown or already-ended sessions are ignored.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AppError> {
        let Some(token) = token else {
            return Ok(());
        };
        let Ok(claims) = validate_jwt(token, &self.config.jwt_secret) else {
            return Ok(());
        };

        let res = Tokens::delete_by_id(claims.jti).exec(&self.db).await?;
        debug!("session rows removed: {}", res.rows_affected);
        Ok(())
    }

    /// Drop expired session rows; returns how many were removed.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let res = Tokens::delete_many()
            .filter(tokens::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await?;
        if res.rows_affected > 0 {
            info!("🧹 Purged {} expired session(s)", res.rows_affected);
        }
        Ok(res.rows_affected)
    }
}

//! Authentication service for account registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{violated_constraint, AppError, AppResult};
use crate::models::User;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Input for logging in
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response after successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    password_hash: String,
    is_active: bool,
}

/// Decode and validate an access token
pub fn decode_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a new account and sign it in
    pub async fn register(&self, input: RegisterInput) -> AppResult<RegisterResponse> {
        input.validate()?;

        let email = normalize_email(&input.email);

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some("users_email_key") => {
                AppError::conflict("email", "An account with this email already exists")
            }
            _ => AppError::from(e),
        })?;

        tracing::info!(%user_id, "Account registered");

        let tokens = self.generate_tokens(user_id)?;
        self.store_refresh_token(user_id, &tokens.refresh_token).await?;

        Ok(RegisterResponse { user_id, tokens })
    }

    /// Authenticate with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        input.validate()?;

        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, password_hash, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(&input.email))
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let tokens = self.generate_tokens(user.id)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        Ok(tokens)
    }

    /// Exchange a refresh token for a new token pair; the old one is revoked
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = hash_token(refresh_token);

        let mut tx = self.db.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE refresh_tokens rt
            SET revoked_at = NOW()
            FROM users u
            WHERE u.id = rt.user_id
              AND rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            RETURNING rt.user_id
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

        let tokens = self.generate_tokens(user_id)?;

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(hash_token(&tokens.refresh_token))
        .bind(Utc::now() + Duration::seconds(self.refresh_token_expiry))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(tokens)
    }

    /// Account of the signed-in user
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        let (id, email, name, created_at, updated_at) =
            sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>, DateTime<Utc>)>(
                r#"
                SELECT id, email, name, created_at, updated_at
                FROM users
                WHERE id = $1 AND is_active = true
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(User {
            id,
            email,
            name,
            created_at,
            updated_at,
        })
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, user_id: Uuid) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        let access_claims = Claims {
            sub: user_id.to_string(),
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        // Refresh token (opaque random value, only its hash is stored)
        let refresh_token = Uuid::new_v4().to_string();

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Store refresh token in database
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(hash_token(token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

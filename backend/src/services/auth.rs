//! Authentication service for login and token management
//!
//! Users log in with a taller username and password; permissions come from
//! the user's role and are embedded in the access token as `module:action`
//! strings so the authorization gate never has to hit the database.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{Role, User};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for creating a user account
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub name: String,
    pub password: String,
    pub role_id: Uuid,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub username: String,
    pub permissions: Vec<String>,
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

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    username: String,
    name: String,
    role_id: Uuid,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    is_system_role: bool,
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

    /// Create a user account with a role
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<Uuid> {
        shared::validation::validate_username(&input.username).map_err(|msg| {
            AppError::Validation {
                field: "username".to_string(),
                message: msg.to_string(),
                message_es: "Nombre de usuario no válido".to_string(),
            }
        })?;
        shared::validation::validate_password(&input.password).map_err(|msg| {
            AppError::Validation {
                field: "password".to_string(),
                message: msg.to_string(),
                message_es: "La contraseña debe tener al menos 8 caracteres".to_string(),
            }
        })?;

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
                .bind(&input.username)
                .fetch_one(&self.db)
                .await?;
        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "Username already exists".to_string(),
                message_es: "El nombre de usuario ya existe".to_string(),
            });
        }

        let role_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1)")
                .bind(input.role_id)
                .fetch_one(&self.db)
                .await?;
        if !role_exists {
            return Err(AppError::NotFound("Role".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, name, password_hash, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.username)
        .bind(&input.name)
        .bind(&password_hash)
        .bind(input.role_id)
        .fetch_one(&self.db)
        .await?;

        Ok(user_id)
    }

    /// Authenticate user with username and password
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid username or password".to_string(),
            message_es: "Usuario o contraseña incorrectos".to_string(),
        })?;

        if !user.is_active {
            return Err(AppError::Unauthorized {
                message: "Account is disabled".to_string(),
                message_es: "La cuenta está deshabilitada".to_string(),
            });
        }

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::Unauthorized {
                message: "Invalid username or password".to_string(),
                message_es: "Usuario o contraseña incorrectos".to_string(),
            });
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let permissions = self.get_user_permissions(user.id).await?;

        let tokens = self.generate_tokens(user.id, &user.username, &permissions)?;

        self.store_refresh_token(user.id, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }

    /// Refresh access token using refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = Self::hash_token(refresh_token);

        let token_record = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT rt.user_id, u.username
            FROM refresh_tokens rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid or expired refresh token".to_string(),
            message_es: "Token de renovación no válido o caducado".to_string(),
        })?;

        let (user_id, username) = token_record;

        // Rotate: the presented refresh token is single-use.
        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.db)
            .await?;

        let permissions = self.get_user_permissions(user_id).await?;

        let tokens = self.generate_tokens(user_id, &username, &permissions)?;

        self.store_refresh_token(user_id, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }

    /// Get the profile of one user
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        let user = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, username, name, role_id, is_active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(User {
            id: user.id,
            username: user.username,
            name: user.name,
            role_id: user.role_id,
            is_active: user.is_active,
            created_at: user.created_at,
        })
    }

    /// List the roles users can be assigned to
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, is_system_role FROM roles ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(roles
            .into_iter()
            .map(|r| Role {
                id: r.id,
                name: r.name,
                is_system_role: r.is_system_role,
            })
            .collect())
    }

    /// Get user permissions from database
    async fn get_user_permissions(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let permissions = sqlx::query_scalar::<_, String>(
            r#"
            SELECT rp.permission
            FROM users u
            JOIN role_permissions rp ON rp.role_id = u.role_id
            WHERE u.id = $1
            ORDER BY rp.permission
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(permissions)
    }

    /// Generate access and refresh tokens
    fn generate_tokens(
        &self,
        user_id: Uuid,
        username: &str,
        permissions: &[String],
    ) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        let access_claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            permissions: permissions.to_vec(),
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

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
        let token_hash = Self::hash_token(token);
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Hash a token for storage
    fn hash_token(token: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

//! Authentication and account service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, User, UserClaims,
        UserProfile, UserRole,
    },
    repository::{Repository, UserStore},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn user_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("User with id {} not found", id))
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self {
            users: repository.users,
            config,
        }
    }

    /// Register a regular account and sign it in
    pub async fn register(&self, request: RegisterRequest) -> AppResult<(String, UserProfile)> {
        request.validate()?;

        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let user = self
            .users
            .insert(NewUser {
                name,
                email: request.email.trim().to_string(),
                password_hash: self.hash_password(&request.password)?,
                role: UserRole::User,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");
        let token = self.create_token(&user)?;
        Ok((token, UserProfile::from(&user)))
    }

    /// Authenticate by email and password and return a JWT token
    pub async fn login(&self, request: LoginRequest) -> AppResult<(String, UserProfile)> {
        request.validate()?;

        let user = self
            .users
            .get_by_email(request.email.trim())
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !self.verify_password(&user, &request.password)? {
            tracing::warn!(user_id = user.id, "Failed login attempt");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.create_token(&user)?;
        Ok((token, UserProfile::from(&user)))
    }

    /// Profile of the authenticated user
    pub async fn me(&self, claims: &UserClaims) -> AppResult<UserProfile> {
        let user = self.account(claims.user_id).await?;
        Ok(UserProfile::from(&user))
    }

    /// Change the authenticated user's name, email or password
    pub async fn update_profile(
        &self,
        claims: &UserClaims,
        request: UpdateProfileRequest,
    ) -> AppResult<UserProfile> {
        request.validate()?;

        let mut user = self.account(claims.user_id).await?;
        if let Some(name) = request.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Name must not be empty".to_string()));
            }
            user.name = name.to_string();
        }
        if let Some(email) = request.email {
            user.email = email.trim().to_string();
        }
        if let Some(password) = request.password {
            user.password_hash = self.hash_password(&password)?;
        }

        let saved = self
            .users
            .update(&user)
            .await?
            .ok_or_else(|| user_not_found(user.id))?;

        tracing::info!(user_id = saved.id, "Profile updated");
        Ok(UserProfile::from(&saved))
    }

    /// Delete the authenticated user's account
    pub async fn delete_account(&self, claims: &UserClaims) -> AppResult<()> {
        let user = self.account(claims.user_id).await?;
        self.keep_an_admin(&user).await?;

        if !self.users.delete(user.id).await? {
            return Err(user_not_found(user.id));
        }
        tracing::info!(user_id = user.id, "Account deleted");
        Ok(())
    }

    /// All accounts
    pub async fn list_users(&self) -> AppResult<Vec<UserProfile>> {
        let users = self.users.list().await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    /// Grant or revoke administrator rights.
    ///
    /// Takes effect on the account's next login; tokens already issued keep
    /// the role they were signed with.
    pub async fn update_role(&self, id: i32, role: UserRole) -> AppResult<UserProfile> {
        let mut user = self.account(id).await?;
        if user.role == role {
            return Ok(UserProfile::from(&user));
        }
        if role != UserRole::Admin {
            self.keep_an_admin(&user).await?;
        }

        user.role = role;
        let saved = self
            .users
            .update(&user)
            .await?
            .ok_or_else(|| user_not_found(id))?;

        tracing::info!(user_id = id, role = %role, "Role changed");
        Ok(UserProfile::from(&saved))
    }

    /// Create the configured administrator account if it does not exist yet
    pub async fn ensure_admin(&self) -> AppResult<Option<UserProfile>> {
        let (Some(email), Some(password)) = (
            self.config.admin_email.as_deref(),
            self.config.admin_password.as_deref(),
        ) else {
            return Ok(None);
        };

        if let Some(existing) = self.users.get_by_email(email).await? {
            return Ok(Some(UserProfile::from(&existing)));
        }

        let admin = self
            .users
            .insert(NewUser {
                name: self
                    .config
                    .admin_name
                    .clone()
                    .unwrap_or_else(|| "Administrator".to_string()),
                email: email.to_string(),
                password_hash: self.hash_password(password)?,
                role: UserRole::Admin,
            })
            .await?;

        tracing::info!(user_id = admin.id, "Administrator account created");
        Ok(Some(UserProfile::from(&admin)))
    }

    async fn account(&self, id: i32) -> AppResult<User> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }

    /// Refuse to remove the last administrator
    async fn keep_an_admin(&self, leaving: &User) -> AppResult<()> {
        if leaving.role != UserRole::Admin {
            return Ok(());
        }
        let admins = self
            .users
            .list()
            .await?
            .into_iter()
            .filter(|u| u.role == UserRole::Admin && u.id != leaving.id)
            .count();
        if admins == 0 {
            return Err(AppError::InvalidState(
                "At least one administrator account must remain".to_string(),
            ));
        }
        Ok(())
    }

    fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            iat: now,
            exp: now + (self.config.jwt_expiration_hours as i64 * 3600),
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

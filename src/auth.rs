//! Authentication and authorization.

use crate::db::{Database, User, now_timestamp};
use crate::error::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization label attached to an account.
///
/// Roles are independent: `ADMIN` does not imply `USER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// May create books.
    User,
    /// May delete books.
    Admin,
}

impl Role {
    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AppError::InvalidFormat(format!(
                "Unknown role '{}', expected USER or ADMIN",
                other
            ))),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Username the caller authenticated as.
    pub username: String,
    /// Roles granted to the caller.
    pub roles: Vec<Role>,
}

impl Principal {
    /// Create a principal.
    pub fn new(username: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// Check whether the principal holds a role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            roles: user.roles,
        }
    }
}

/// Maps basic-auth credentials to a principal.
pub trait CredentialProvider: Send + Sync {
    /// Returns `None` for an unknown user or a wrong password.
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Principal>>;
}

/// Decide whether a request may proceed.
///
/// No principal is 401; a principal without `required` is 403.
pub fn authorize(principal: Option<&Principal>, required: Role) -> Result<&Principal> {
    let principal = principal
        .ok_or_else(|| AppError::Unauthorized("Full authentication is required".to_string()))?;

    if !principal.has_role(required) {
        return Err(AppError::Forbidden(format!(
            "User '{}' lacks role {}",
            principal.username, required
        )));
    }

    Ok(principal)
}

/// Parse an `Authorization: Basic ...` header value into username and password.
pub fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Authentication service.
pub struct AuthService {
    db: Database,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new user.
    pub fn create_user(&self, username: &str, password: &str, roles: &[Role]) -> Result<User> {
        // Validate username
        if username.is_empty() || username.len() > 64 {
            return Err(AppError::InvalidFormat(
                "Username must be 1-64 characters".to_string(),
            ));
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::InvalidFormat(
                "Username can only contain letters, numbers, _ and -".to_string(),
            ));
        }

        // Validate password
        if password.len() < 4 {
            return Err(AppError::InvalidFormat(
                "Password must be at least 4 characters".to_string(),
            ));
        }

        if roles.is_empty() {
            return Err(AppError::InvalidFormat(
                "At least one role is required".to_string(),
            ));
        }

        let mut roles = roles.to_vec();
        roles.sort();
        roles.dedup();

        let password_hash = hash_password(password)?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            roles,
            created_at: now_timestamp(),
        };

        self.db.create_user(&user)?;
        Ok(user)
    }

    /// Create the given accounts when no user exists yet. Returns how many were added.
    pub fn seed(&self, users: &[(String, String, Vec<Role>)]) -> Result<usize> {
        if self.db.count_users()? > 0 {
            return Ok(0);
        }

        for (username, password, roles) in users {
            self.create_user(username, password, roles)?;
        }

        tracing::info!(users = users.len(), "Seeded user accounts");
        Ok(users.len())
    }

    /// Change user password.
    pub fn change_password(&self, username: &str, new_password: &str) -> Result<bool> {
        if new_password.len() < 4 {
            return Err(AppError::InvalidFormat(
                "Password must be at least 4 characters".to_string(),
            ));
        }

        let password_hash = hash_password(new_password)?;
        self.db.update_user_password(username, &password_hash)
    }

    /// Delete a user.
    pub fn delete_user(&self, username: &str) -> Result<bool> {
        self.db.delete_user(username)
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.db.list_users()
    }
}

impl CredentialProvider for AuthService {
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Principal>> {
        let Some(user) = self.db.get_user_by_username(username)? else {
            return Ok(None);
        };

        if !verify_password(password, &user.password_hash)? {
            return Ok(None);
        }

        Ok(Some(user.into()))
    }
}

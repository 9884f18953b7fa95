use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{password, AuthError};
use crate::store::{StoreError, User, UserStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn store_failure(e: StoreError) -> AuthError {
    error!(error = %e, "user store failure");
    AuthError::Internal
}

/// Business rules on top of the credential store: input validation, email
/// uniqueness, password hashing and verification.
pub struct AuthService {
    store: UserStore,
    // Serializes the load-check-append-save unit in `register`. Without it
    // two concurrent signups could both pass the uniqueness check and one
    // snapshot write would clobber the other.
    write_lock: Mutex<()>,
}

impl AuthService {
    pub fn new(store: UserStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Creates an account. Fails before touching the store if any field is
    /// missing or the email is not plausibly an email.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Name, email and password are required.".into(),
            ));
        }
        if !is_valid_email(email) {
            warn!("signup with invalid email format");
            return Err(AuthError::Validation("Invalid email address.".into()));
        }
        let normalized = email.to_lowercase();

        let _guard = self.write_lock.lock().await;

        let mut users = self.store.load_all().await.map_err(store_failure)?;
        if users.iter().any(|u| u.email.to_lowercase() == normalized) {
            warn!("signup with already registered email");
            return Err(AuthError::DuplicateEmail);
        }

        let plain = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
            .await
            .map_err(|e| {
                error!(error = %e, "hashing task failed");
                AuthError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, "hash_password failed");
                AuthError::Internal
            })?;

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash: hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        self.store.save_all(&users).await.map_err(store_failure)?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Checks credentials against the store. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required.".into(),
            ));
        }
        let normalized = email.to_lowercase();

        let users = self.store.load_all().await.map_err(store_failure)?;
        let Some(user) = users
            .into_iter()
            .find(|u| u.email.to_lowercase() == normalized)
        else {
            warn!("login with unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let plain = password.to_owned();
        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
            .await
            .map_err(|e| {
                error!(error = %e, "verification task failed");
                AuthError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, user_id = %user.id, "verify_password failed");
                AuthError::Internal
            })?;

        if !ok {
            warn!(user_id = %user.id, "login with invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }
}

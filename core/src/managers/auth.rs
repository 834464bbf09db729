use log::{error, info, warn};

use crate::client::Credentials;
use crate::error::ApiError;
use crate::storage::{keys, SessionStorage};
use crate::transport::{ApiClient, Transport};
use crate::types::{AccountType, LoginResponse, RegisterDraft, RegisterResponse, User};

/// Login session: the cached user plus the storage that outlives the process.
#[derive(Debug)]
pub struct AuthManager<S> {
    storage: S,
    current_user: Option<User>,
}

impl<S: SessionStorage> AuthManager<S> {
    /// Restore whatever session `storage` still holds.
    pub fn new(storage: S) -> Self {
        let current_user = load_user(&storage);
        Self { storage, current_user }
    }

    /// Sign up. A confirmation that differs from the password is rejected
    /// before any request goes out.
    pub async fn register<T: Transport>(
        &self,
        api: &ApiClient<T>,
        draft: RegisterDraft,
    ) -> Result<RegisterResponse, ApiError> {
        let input = draft.into_request()?;
        info!("Registering user: {}", input.email);
        let response = api.call(api.client().build_register(&input)?).await?;
        info!("Registration successful");
        Ok(response)
    }

    /// Log in, persist the session keys and install credentials on `api`.
    pub async fn login<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        info!("Logging in user: {email}");
        let response = api.call(api.client().build_login(email, password)?).await?;

        let user = response.user();
        let token = response.session_token();
        if let Err(e) = self.persist(&user, &token) {
            self.current_user = None;
            api.clear_credentials();
            return Err(e);
        }
        api.set_credentials(Credentials {
            token,
            user_id: user.id,
        });
        self.current_user = Some(user);

        info!("Login successful: {}", response.name);
        Ok(response)
    }

    /// Drop the session locally. The server keeps no session to end.
    pub fn logout<T: Transport>(&mut self, api: &mut ApiClient<T>) -> Result<(), ApiError> {
        info!("Logging out user");
        api.clear_credentials();
        self.current_user = None;
        for key in keys::SESSION {
            if let Err(e) = self.storage.remove(key) {
                error!("Logout failed: {e}");
                return Err(e);
            }
        }
        info!("Logout successful");
        Ok(())
    }

    /// Credentials left in storage by an earlier login.
    pub fn stored_credentials(&self) -> Option<Credentials> {
        let token = self.storage.get(keys::AUTH_TOKEN)?;
        let user_id = self.storage.get(keys::USER_ID)?.parse().ok()?;
        Some(Credentials { token, user_id })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// The logged-in user, or `NotAuthenticated`.
    pub fn require_user(&self) -> Result<&User, ApiError> {
        self.current_user.as_ref().ok_or(ApiError::NotAuthenticated)
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn has_role(&self, account_type: AccountType) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|user| user.account_type == account_type)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Write every session key, token first. On failure the keys already
    /// written are removed again so no half session survives a restart.
    fn persist(&mut self, user: &User, token: &str) -> Result<(), ApiError> {
        let blob = serde_json::to_string(user).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let id = user.id.to_string();
        let entries = [
            (keys::AUTH_TOKEN, token),
            (keys::USER_ID, id.as_str()),
            (keys::USER_NAME, user.name.as_str()),
            (keys::USER_EMAIL, user.email.as_str()),
            (keys::ACCOUNT_TYPE, user.account_type.as_str()),
            (keys::USER, blob.as_str()),
        ];
        for (key, value) in entries {
            if let Err(e) = self.storage.set(key, value) {
                error!("Saving session failed at {key}: {e}");
                self.discard_session();
                return Err(e);
            }
        }
        Ok(())
    }

    fn discard_session(&mut self) {
        for key in keys::SESSION {
            if let Err(e) = self.storage.remove(key) {
                warn!("Could not remove {key}: {e}");
            }
        }
    }
}

/// The stored user, provided a token was stored with it.
fn load_user<S: SessionStorage>(storage: &S) -> Option<User> {
    let id = storage.get(keys::USER_ID)?;
    if storage.get(keys::AUTH_TOKEN).filter(|token| !token.is_empty()).is_none() {
        warn!("Ignoring stored session without a token");
        return None;
    }
    let Ok(id) = id.parse() else {
        warn!("Ignoring stored session with bad user id: {id}");
        return None;
    };
    let account_type = storage
        .get(keys::ACCOUNT_TYPE)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default();
    Some(User {
        id,
        name: storage.get(keys::USER_NAME).unwrap_or_default(),
        email: storage.get(keys::USER_EMAIL).unwrap_or_default(),
        account_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::testing::{api, ScriptedTransport};
    use crate::types::Gender;

    /// Memory storage whose writes to one key always fail.
    #[derive(Debug, Clone)]
    struct FailingStorage {
        inner: MemoryStorage,
        fail_on: &'static str,
    }

    impl SessionStorage for FailingStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
            if key == self.fail_on {
                return Err(ApiError::Storage("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), ApiError> {
            self.inner.remove(key)
        }
    }

    fn draft(password: &str, confirm_password: &str) -> RegisterDraft {
        RegisterDraft {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            gender: Gender::Female,
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
            account_type: None,
        }
    }

    const LOGIN_OK: &str = r#"{"message":"Login successful","user_id":7,"name":"Asha","email":"asha@example.com","account_type":"passenger"}"#;

    #[tokio::test]
    async fn login_persists_session_and_credentials() {
        let mut api = api(ScriptedTransport::new().reply(200, LOGIN_OK));
        let mut auth = AuthManager::new(MemoryStorage::new());

        auth.login(&mut api, "asha@example.com", "secret1").await.unwrap();

        assert!(auth.is_logged_in());
        assert!(auth.has_role(AccountType::Passenger));
        assert_eq!(auth.storage().get(keys::AUTH_TOKEN).as_deref(), Some("user_7"));
        assert_eq!(auth.storage().get(keys::USER_NAME).as_deref(), Some("Asha"));
        assert_eq!(auth.storage().get(keys::ACCOUNT_TYPE).as_deref(), Some("passenger"));
        let blob: User = serde_json::from_str(&auth.storage().get(keys::USER).unwrap()).unwrap();
        assert_eq!(blob.id, 7);
        assert_eq!(api.credentials().map(|c| c.token.as_str()), Some("user_7"));
    }

    #[tokio::test]
    async fn logout_clears_storage_and_credentials() {
        let mut api = api(ScriptedTransport::new().reply(200, LOGIN_OK));
        let mut auth = AuthManager::new(MemoryStorage::new());
        auth.login(&mut api, "asha@example.com", "secret1").await.unwrap();

        auth.logout(&mut api).unwrap();

        for key in [keys::AUTH_TOKEN, keys::USER_ID, keys::USER_NAME, keys::ACCOUNT_TYPE] {
            assert!(auth.storage().get(key).is_none(), "{key} survived logout");
        }
        assert!(auth.storage().is_empty());
        assert!(auth.current_user().is_none());
        assert!(api.credentials().is_none());
        assert!(auth.stored_credentials().is_none());
    }

    #[tokio::test]
    async fn failed_login_leaves_storage_untouched() {
        let mut api = api(ScriptedTransport::new().reply(401, r#"{"message":"Invalid credentials"}"#));
        let mut auth = AuthManager::new(MemoryStorage::new());

        let err = auth.login(&mut api, "asha@example.com", "wrong").await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!auth.is_logged_in());
        assert!(auth.storage().is_empty());
        assert!(api.credentials().is_none());
    }

    #[test]
    fn new_restores_stored_session() {
        let mut storage = MemoryStorage::new();
        storage.set(keys::USER_ID, "3").unwrap();
        storage.set(keys::USER_NAME, "Ravi").unwrap();
        storage.set(keys::ACCOUNT_TYPE, "driver").unwrap();
        storage.set(keys::AUTH_TOKEN, "user_3").unwrap();

        let auth = AuthManager::new(storage);

        let user = auth.current_user().unwrap();
        assert_eq!(user.id, 3);
        assert!(auth.has_role(AccountType::Driver));
        assert_eq!(
            auth.stored_credentials(),
            Some(Credentials {
                token: "user_3".to_string(),
                user_id: 3
            })
        );
    }

    #[tokio::test]
    async fn register_with_mismatched_confirmation_sends_nothing() {
        let api = api(ScriptedTransport::new());
        let auth = AuthManager::new(MemoryStorage::new());

        let err = auth.register(&api, draft("secret1", "secret2")).await.unwrap_err();

        assert_eq!(err.to_string(), "Passwords do not match");
        assert!(api.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn register_sends_password_once() {
        let api = api(ScriptedTransport::new().reply(
            201,
            r#"{"message":"Registration successful","user_id":3,"name":"Asha"}"#,
        ));
        let auth = AuthManager::new(MemoryStorage::new());

        let registered = auth.register(&api, draft("secret1", "secret1")).await.unwrap();

        assert_eq!(registered.user_id, 3);
        let request = &api.transport().requests()[0];
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["password"], "secret1");
        assert!(body.get("confirm_password").is_none());
    }

    #[tokio::test]
    async fn storage_failure_during_login_leaves_no_session() {
        for fail_on in [keys::AUTH_TOKEN, keys::ACCOUNT_TYPE, keys::USER] {
            let mut api = api(ScriptedTransport::new().reply(200, LOGIN_OK));
            let storage = FailingStorage {
                inner: MemoryStorage::new(),
                fail_on,
            };
            let mut auth = AuthManager::new(storage);

            let err = auth.login(&mut api, "asha@example.com", "secret1").await.unwrap_err();

            assert!(matches!(err, ApiError::Storage(_)), "{fail_on}");
            assert!(!auth.is_logged_in(), "{fail_on}");
            assert!(api.credentials().is_none(), "{fail_on}");
            assert!(auth.storage().inner.is_empty(), "{fail_on} left keys behind");
            let restarted = AuthManager::new(auth.storage().clone());
            assert!(!restarted.is_logged_in(), "{fail_on}");
            assert!(restarted.stored_credentials().is_none(), "{fail_on}");
        }
    }

    #[test]
    fn session_without_token_is_logged_out() {
        let mut storage = MemoryStorage::new();
        storage.set(keys::USER_ID, "3").unwrap();
        storage.set(keys::USER_NAME, "Ravi").unwrap();
        storage.set(keys::ACCOUNT_TYPE, "driver").unwrap();

        let auth = AuthManager::new(storage);

        assert!(!auth.is_logged_in());
        assert!(auth.stored_credentials().is_none());
    }

    #[test]
    fn corrupt_user_id_is_not_a_session() {
        let mut storage = MemoryStorage::new();
        storage.set(keys::USER_ID, "seven").unwrap();
        storage.set(keys::AUTH_TOKEN, "user_7").unwrap();
        let auth = AuthManager::new(storage);
        assert!(!auth.is_logged_in());
        assert!(matches!(auth.require_user(), Err(ApiError::NotAuthenticated)));
    }
}

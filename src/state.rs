//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the credential store, the token codec and the optional LLM
//! client. None of it is mutated per request.

use std::sync::Arc;

use crate::llm::LlmChat;
use crate::services::credentials::CredentialStore;
use crate::services::token::TokenCodec;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub tokens: TokenCodec,
    /// Optional LLM client. `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenCodec, llm: Option<Arc<dyn LlmChat>>) -> Self {
        Self { store, tokens, llm }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::llm::types::{ChatResponse, LlmError, Message};
    use crate::services::credentials::{Identity, NewIdentity, StoreError, UniqueField};
    use crate::services::password;

    pub const TEST_SECRET: &[u8] = b"test-secret-for-orientation-backend-tokens";

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serializes every test that reads or writes process environment variables.
    pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // In-memory credential store
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct MemoryInner {
        next_id: i64,
        users: Vec<Identity>,
        preverified: HashSet<String>,
    }

    /// `CredentialStore` backed by a mutex. `create` checks and inserts under
    /// one lock, matching the atomicity of the table constraints.
    #[derive(Default)]
    pub struct MemoryCredentialStore {
        inner: Mutex<MemoryInner>,
        fail: bool,
    }

    impl MemoryCredentialStore {
        /// A store whose every call fails with a database error.
        #[must_use]
        pub fn failing() -> Self {
            Self { inner: Mutex::default(), fail: true }
        }

        pub fn allow_email(&self, email: &str) {
            self.inner.lock().unwrap().preverified.insert(email.to_owned());
        }

        #[must_use]
        pub fn user_count(&self) -> usize {
            self.inner.lock().unwrap().users.len()
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }

        fn find(&self, pred: impl Fn(&Identity) -> bool) -> Result<Option<Identity>, StoreError> {
            self.check()?;
            Ok(self.inner.lock().unwrap().users.iter().find(|u| pred(u)).cloned())
        }
    }

    #[async_trait::async_trait]
    impl CredentialStore for MemoryCredentialStore {
        async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
            self.find(|u| u.id == id)
        }

        async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError> {
            self.find(|u| u.login == login)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
            self.find(|u| u.email == email)
        }

        async fn is_preverified(&self, email: &str) -> Result<bool, StoreError> {
            self.check()?;
            Ok(self.inner.lock().unwrap().preverified.contains(email))
        }

        async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
            self.check()?;
            let mut inner = self.inner.lock().unwrap();
            if inner.users.iter().any(|u| u.email == new.email) {
                return Err(StoreError::Duplicate(UniqueField::Email));
            }
            if inner.users.iter().any(|u| u.login == new.login) {
                return Err(StoreError::Duplicate(UniqueField::Login));
            }
            inner.next_id += 1;
            let identity = Identity {
                id: inner.next_id,
                login: new.login,
                email: new.email,
                password_hash: new.password_hash,
                first_name: new.first_name,
                last_name: new.last_name,
            };
            inner.users.push(identity.clone());
            Ok(identity)
        }
    }

    /// Insert a user directly, bypassing the allow-list. Returns the identity.
    pub async fn seed_user(store: &MemoryCredentialStore, login: &str, email: &str, password: &str) -> Identity {
        let password_hash = password::hash_password(password).unwrap();
        store
            .create(NewIdentity {
                login: login.into(),
                email: email.into(),
                password_hash,
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap()
    }

    // -------------------------------------------------------------------------
    // Mock LLM
    // -------------------------------------------------------------------------

    /// Replies with a fixed text (or error) and records every prompt it sees.
    pub struct MockLlm {
        reply: Result<String, u16>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl MockLlm {
        #[must_use]
        pub fn replying(text: &str) -> Self {
            Self { reply: Ok(text.to_owned()), prompts: Mutex::new(Vec::new()) }
        }

        /// Fails every call with an `ApiResponse` error carrying `status`.
        #[must_use]
        pub fn failing(status: u16) -> Self {
            Self { reply: Err(status), prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait::async_trait]
    impl LlmChat for MockLlm {
        async fn chat(&self, _max_tokens: u32, messages: &[Message]) -> Result<ChatResponse, LlmError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.extend(messages.iter().map(|m| m.content.clone()));
            match &self.reply {
                Ok(text) => Ok(ChatResponse {
                    text: text.clone(),
                    model: "mock".into(),
                    stop_reason: "end_turn".into(),
                    input_tokens: 0,
                    output_tokens: 0,
                }),
                Err(status) => Err(LlmError::ApiResponse { status: *status, body: "upstream secret detail".into() }),
            }
        }
    }

    // -------------------------------------------------------------------------
    // App state
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn test_codec() -> TokenCodec {
        TokenCodec::new(TEST_SECRET)
    }

    /// Create a test `AppState` over an empty in-memory store and no LLM.
    #[must_use]
    pub fn test_app_state() -> (AppState, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::default());
        let state = AppState::new(store.clone(), test_codec(), None);
        (state, store)
    }

    /// Create a test `AppState` with a mock LLM.
    #[must_use]
    pub fn test_app_state_with_llm(llm: Arc<dyn LlmChat>) -> AppState {
        let store = Arc::new(MemoryCredentialStore::default());
        AppState::new(store, test_codec(), Some(llm))
    }
}

//! Shared types for the HTTP API layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::booking::BookingService;
use crate::db::{self, DatabaseError};

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Process-wide service state. Wrapped in `Arc` and shared by handlers
/// and middleware via `ApiContext`.
pub struct AppState {
    pub db_path: PathBuf,
    pub booking: BookingService,
    pub sessions: RwLock<SessionRegistry>,
    /// Publishable processor key, returned to clients with each order.
    pub processor_account_key: String,
}

impl AppState {
    pub fn new(db_path: PathBuf, booking: BookingService, processor_account_key: String) -> Self {
        Self {
            db_path,
            booking,
            sessions: RwLock::new(SessionRegistry::new()),
            processor_account_key,
        }
    }

    /// Open a database connection for the current request.
    pub fn open_db(&self) -> Result<rusqlite::Connection, DatabaseError> {
        db::open_database(&self.db_path)
    }
}

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
}

impl ApiContext {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

// ═══════════════════════════════════════════════════════════
// Caller context — injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, injected into request extensions by the auth
/// middleware. Every appointment read/write is scoped to `caller_id`;
/// it never comes from a request body.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub caller_id: String,
}

// ═══════════════════════════════════════════════════════════
// Session registry — bearer token → caller lookup
// ═══════════════════════════════════════════════════════════

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Opaque token→caller lookup. Only token hashes are held in memory.
pub struct SessionRegistry {
    sessions: HashMap<[u8; 32], String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Associate a bearer token with a caller id.
    pub fn register(&mut self, token: &str, caller_id: &str) {
        self.sessions.insert(hash_token(token), caller_id.to_string());
    }

    /// Resolve a bearer token to its caller id, if the session exists.
    pub fn resolve(&self, token: &str) -> Option<String> {
        self.sessions.get(&hash_token(token)).cloned()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_token_resolves_to_caller() {
        let mut registry = SessionRegistry::new();
        registry.register("tok-a", "caller-1");
        assert_eq!(registry.resolve("tok-a").as_deref(), Some("caller-1"));
    }

    #[test]
    fn unknown_token_does_not_resolve() {
        let registry = SessionRegistry::new();
        assert!(registry.resolve("tok-missing").is_none());
    }

    #[test]
    fn tokens_are_isolated_per_caller() {
        let mut registry = SessionRegistry::new();
        registry.register("tok-a", "caller-1");
        registry.register("tok-b", "caller-2");
        assert_eq!(registry.resolve("tok-b").as_deref(), Some("caller-2"));
        assert_ne!(registry.resolve("tok-a"), registry.resolve("tok-b"));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert!(!t1.is_empty());
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("test"), hash_token("test"));
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }
}

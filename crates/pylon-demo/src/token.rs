//! Opaque access tokens.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// Default token lifetime, in days.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone)]
struct Grant {
    user_id: u32,
    expires_at: DateTime<Utc>,
}

/// Why a token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token was never issued.
    #[error("unknown token")]
    Unknown,
    /// The token is past its expiry.
    #[error("token expired")]
    Expired,
}

/// Issues and resolves UUID v7 tokens.
#[derive(Debug)]
pub struct TokenIssuer {
    grants: DashMap<String, Grant>,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer whose tokens live [`DEFAULT_TOKEN_TTL_DAYS`] days.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::days(DEFAULT_TOKEN_TTL_DAYS))
    }

    /// Creates an issuer whose tokens live for `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            grants: DashMap::new(),
            ttl,
        }
    }

    /// Issues a token for `user_id`.
    pub fn issue(&self, user_id: u32) -> String {
        let token = Uuid::now_v7().to_string();
        self.grants.insert(
            token.clone(),
            Grant {
                user_id,
                expires_at: Utc::now() + self.ttl,
            },
        );
        tracing::debug!(user_id, "token issued");
        token
    }

    /// Returns the user a token was issued to.
    ///
    /// Expired tokens are dropped on lookup.
    pub fn resolve(&self, token: &str) -> Result<u32, TokenError> {
        let grant = self
            .grants
            .get(token)
            .map(|grant| grant.clone())
            .ok_or(TokenError::Unknown)?;
        if grant.expires_at <= Utc::now() {
            self.grants.remove(token);
            return Err(TokenError::Expired);
        }
        Ok(grant.user_id)
    }

    /// Number of live grants, expired ones included until looked up.
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Returns `true` if nothing was issued.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new()
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::Account;

/// Lifetime of every issued token.
pub const TOKEN_TTL_HOURS: i64 = 24;

const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by a bearer token. Binds the holder to one account.
///
/// Numbers are freed when an account is deleted, so the claim also pins the
/// account's `id`, which is never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaim {
    #[serde(rename = "accountNumber")]
    pub account_number: i32,
    #[serde(rename = "accountId")]
    pub account_id: i32,
    pub iat: usize,
    pub exp: usize,
}

impl TokenClaim {
    pub fn for_account(account: &Account) -> Self {
        let now = Utc::now();
        Self {
            account_number: account.number,
            account_id: account.id,
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
        }
    }
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, claims: &TokenClaim) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(TOKEN_ALGORITHM), claims, &self.encoding)
    }

    /// Verifies signature and expiry. Tokens whose header names any algorithm
    /// other than HS256 are rejected before the signature is checked.
    pub fn verify(&self, token: &str) -> Result<TokenClaim, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        decode::<TokenClaim>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

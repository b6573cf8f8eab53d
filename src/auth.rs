use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Verification key for bearer tokens. Tokens are minted by the identity provider.
#[derive(Clone)]
pub struct JWTKeys {
    decoding: DecodingKey,
}

impl JWTKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identity-provider user id.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn decode_jwt(token: &str, keys: &JWTKeys) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(token, &keys.decoding, &Validation::default()).map(|data| data.claims)
}

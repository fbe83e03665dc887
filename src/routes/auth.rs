use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::models::PartyRef;
use crate::routes::{ApiError, AppState};

/// Bearer token claims; `sub` is the user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub exp: usize,
}

/// HS256 token signer and verifier
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<PartyRef, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| ApiError::Unauthorized(format!("invalid token: {}", e)))?;

        if data.claims.sub.is_empty() {
            return Err(ApiError::Unauthorized("token has no subject".to_string()));
        }

        Ok(PartyRef::new(data.claims.sub, data.claims.name))
    }

    /// Sign a token for `party` valid until `exp` (seconds since epoch)
    pub fn issue(&self, party: &PartyRef, exp: usize) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: party.user_id.clone(),
            name: party.display_name.clone(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }
}

/// The authenticated caller, taken from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub PartyRef);

impl FromRequest for CallerIdentity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identify(req))
    }
}

fn identify(req: &HttpRequest) -> Result<CallerIdentity, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Unauthorized("authentication is not configured".to_string()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    state.tokens.verify(token.trim()).map(CallerIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_token_roundtrip_identifies_party() {
        let verifier = TokenVerifier::new("test-secret");
        let party = PartyRef::new("user-1", "Ana");

        let token = verifier.issue(&party, far_future()).unwrap();

        assert_eq!(verifier.verify(&token).unwrap(), party);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenVerifier::new("one")
            .issue(&PartyRef::new("user-1", "Ana"), far_future())
            .unwrap();

        let result = TokenVerifier::new("two").verify(&token);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new("test-secret");
        let token = verifier.issue(&PartyRef::new("user-1", "Ana"), 1_000).unwrap();

        assert!(verifier.verify(&token).is_err());
    }
}

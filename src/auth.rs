use crate::error::ApiError;
use crate::models::{Claims, User};
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::Header as _;
use actix_web::{web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use std::future::{ready, Ready};

/// Signs and checks the bearer tokens handed out by `/token`.
///
/// Validity is a pure function of the signature, the `exp` claim and the
/// current time; nothing is stored and nothing can be revoked.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        self.issue_at(user, now())
    }

    pub fn issue_at(&self, user: &User, now: usize) -> Result<String, ApiError> {
        let exp = now
            .checked_add(self.ttl.num_seconds() as usize)
            .ok_or_else(|| ApiError::Internal(format!("token expiry overflows at {now}")))?;
        let claims = Claims {
            sub: user.username.clone(),
            exp,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("sign token failed: {e}")))
    }

    /// Returns the subject of a valid token.
    pub fn verify(&self, token: &str) -> Result<String, ApiError> {
        self.verify_at(token, now())
    }

    pub fn verify_at(&self, token: &str, now: usize) -> Result<String, ApiError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is compared against `now` below, with no leeway.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Reject token: {e}");
                return Err(ApiError::Unauthorized);
            }
        };

        if claims.sub.is_empty() {
            debug!("Reject token: empty subject");
            return Err(ApiError::Unauthorized);
        }

        if claims.exp <= now {
            debug!("Reject token for {}: expired", claims.sub);
            return Err(ApiError::Unauthorized);
        }

        Ok(claims.sub)
    }
}

/// Resolves the caller of a protected route. A missing `Authorization`
/// header is rejected the same way as a bad token.
pub fn bearer_subject(tokens: &TokenService, token: Option<&str>) -> Result<String, ApiError> {
    match token {
        Some(token) => tokens.verify(token),
        None => {
            debug!("Reject request: missing bearer token");
            Err(ApiError::Unauthorized)
        }
    }
}

/// The verified username of the caller.
///
/// Put it first in a protected handler's arguments: actix resolves
/// extractors in order, so a bad token answers 401 before the body or the
/// path is parsed.
#[derive(Debug)]
pub struct CurrentUser(pub String);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(current_user(req))
    }
}

fn current_user(req: &HttpRequest) -> Result<CurrentUser, ApiError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        return Err(ApiError::Internal("app state is not registered".to_string()));
    };

    let auth = match Authorization::<Bearer>::parse(req) {
        Ok(auth) => Some(auth.into_scheme()),
        Err(e) => {
            debug!("Unusable authorization header: {e}");
            None
        }
    };

    let username = bearer_subject(&state.tokens, auth.as_ref().map(|b| b.token()))?;
    Ok(CurrentUser(username))
}

fn now() -> usize {
    Utc::now().timestamp() as usize
}

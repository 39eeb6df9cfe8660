//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs minted by the external identity provider. A request
//! without an `Authorization` header is anonymous; a malformed or expired token is
//! rejected outright.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Author id
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Expiry, seconds since the epoch
    pub exp: usize,
}

impl Claims {
    pub fn new(id: Uuid, username: &str, email: &str, ttl: chrono::Duration) -> Self {
        Self {
            sub: id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            exp: (chrono::Utc::now() + ttl).timestamp().max(0) as usize,
        }
    }
}

/// Sign claims with the shared secret. Used by tooling and tests; the service
/// itself only validates.
pub fn encode_token(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// The authenticated caller, stored in request extensions after auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl TryFrom<Claims> for Viewer {
    type Error = uuid::Error;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&claims.sub)?,
            username: claims.username,
            email: claims.email,
        })
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Viewer>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Authentication required")),
        )
    }
}

struct JwtKeys {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    fn validate(&self, token: &str) -> Option<Viewer> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).ok()?;
        Viewer::try_from(data.claims).ok()
    }
}

/// Actix middleware that validates an optional Bearer token.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    keys: Arc<JwtKeys>,
}

impl JwtAuthMiddleware {
    pub fn new(secret: &str) -> Self {
        Self {
            keys: Arc::new(JwtKeys {
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                validation: Validation::new(Algorithm::HS256),
            }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<JwtKeys>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let keys = self.keys.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .map(|h| h.to_str().map(str::to_owned));

            match header {
                None => {}
                Some(Err(_)) => return Err(ErrorUnauthorized("Invalid Authorization header")),
                Some(Ok(value)) => {
                    let token = value
                        .strip_prefix("Bearer ")
                        .ok_or_else(|| ErrorUnauthorized("Invalid Authorization scheme"))?;
                    let viewer = keys
                        .validate(token)
                        .ok_or_else(|| ErrorUnauthorized("Invalid or expired token"))?;
                    req.extensions_mut().insert(viewer);
                }
            }

            service.call(req).await
        })
    }
}

use std::future::{ready, Ready};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::auth::{decode_jwt, JWTKeys};
use crate::error::AppError;

/// Identity established by the bearer token, passed explicitly into every account-scoped call.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or(AppError::Unauthenticated),
        )
    }
}

pub struct Authentication {
    pub jwt_keys: JWTKeys,
}

// Middleware factory is `Transform` trait
// `S` - type of the next service
// `B` - type of response's body
impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddleware {
            service,
            jwt_keys: self.jwt_keys.clone(),
        }))
    }
}

pub struct AuthenticationMiddleware<S> {
    service: S,
    jwt_keys: JWTKeys,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Requests without a valid token pass through unauthenticated; the extractor rejects
        // them only on routes that ask for an `AuthenticatedUser`.
        let auth_header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match auth_header {
            Some(token) => match decode_jwt(token, &self.jwt_keys) {
                Ok(claims) => {
                    debug!("Authenticated user: {}", &claims.sub);
                    req.extensions_mut().insert(AuthenticatedUser {
                        user_id: claims.sub,
                    });
                }
                Err(e) => {
                    warn!("Invalid token: {:?}", e);
                }
            },
            None => {
                debug!("No Authorization header found on {}", req.path());
            }
        };

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

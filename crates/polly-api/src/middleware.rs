use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};

/// Header carrying the caller's id, set by whatever authenticates requests
/// in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The already-identified caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

/// Lift the caller id from the request headers into an extension. Requests
/// without one pass through anonymously.
pub async fn identify_user(mut req: Request, next: Next) -> Response {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    if let Some(id) = user_id {
        req.extensions_mut().insert(CurrentUser { id });
    }
    next.run(req).await
}

/// Extractor for routes that act on behalf of a user.
pub struct AuthUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

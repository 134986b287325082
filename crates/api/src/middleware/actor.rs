//! Identity supplied by the upstream gateway.
//!
//! The gateway authenticates the caller and forwards the tenant and user as
//! headers; this service trusts them as given.

use axum::{extract::FromRequestParts, http::request::Parts};
use backoffice_shared::types::{BusinessId, UserId};

use crate::error::ApiError;

/// Header carrying the tenant.
pub const BUSINESS_HEADER: &str = "x-business-id";
/// Header carrying the acting user.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Tenant and user a request acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    /// Business every operation is scoped to.
    pub business_id: BusinessId,
    /// User recorded on ledger lines and movements.
    pub actor_id: UserId,
}

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            business_id: header_id(parts, BUSINESS_HEADER)?,
            actor_id: header_id(parts, ACTOR_HEADER)?,
        })
    }
}

fn header_id<T: std::str::FromStr>(parts: &Parts, name: &str) -> Result<T, ApiError> {
    let value = parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::validation(format!("{name} header is required")))?;
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::validation(format!("{name} header is not a valid UUID")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use backoffice_shared::AppError;

    async fn extract(request: Request<()>) -> Result<ActorContext, ApiError> {
        let (mut parts, ()) = request.into_parts();
        ActorContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_both_headers() {
        let business = BusinessId::new();
        let actor = UserId::new();
        let request = Request::builder()
            .header(BUSINESS_HEADER, business.to_string())
            .header(ACTOR_HEADER, actor.to_string())
            .body(())
            .unwrap();

        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.business_id, business);
        assert_eq!(ctx.actor_id, actor);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_rejected() {
        let missing = Request::builder()
            .header(BUSINESS_HEADER, BusinessId::new().to_string())
            .body(())
            .unwrap();
        let err = extract(missing).await.unwrap_err();
        assert!(matches!(err.0, AppError::Validation(ref m) if m.contains(ACTOR_HEADER)));

        let malformed = Request::builder()
            .header(BUSINESS_HEADER, "acme")
            .header(ACTOR_HEADER, UserId::new().to_string())
            .body(())
            .unwrap();
        let err = extract(malformed).await.unwrap_err();
        assert_eq!(err.0.status_code(), 400);
    }
}

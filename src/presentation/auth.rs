use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::AccountId;
use crate::presentation::handlers::ErrorResponse;

/// Header carrying the account id verified by the upstream auth
/// collaborator. This core trusts it; token verification is not its
/// concern.
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

#[derive(Debug, Clone, Copy)]
pub struct VerifiedAccount(pub AccountId);

impl<S> FromRequestParts<S> for VerifiedAccount
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("missing account identity"))?;

        let uuid = Uuid::parse_str(raw).map_err(|_| unauthorized("invalid account identity"))?;
        Ok(VerifiedAccount(AccountId::from_uuid(uuid)))
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

//! JWT Extractor
//!
//! Custom extractor for handlers that need the authenticated user

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::auth::CurrentUser;
use crate::auth::middleware::authenticate;
use crate::core::ServerState;

/// Reuses the user resolved by `require_auth`; authenticates from scratch
/// only on routes the middleware does not cover.
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let uri = parts.uri.to_string();
        let user = authenticate(state, &parts.headers, &uri).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

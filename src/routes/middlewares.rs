use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::{debug, warn};

use crate::{
    database::StoreError,
    models::{Account, AuthError, Error, TokenClaim},
    AppState,
};

/// Legacy header carrying the raw token, accepted when no `Authorization` is sent.
pub const TOKEN_HEADER: &str = "x-jwt-token";

/// Set on login so browser clients know which account id they hold.
pub const USER_ID_HEADER: &str = "user-id";

/// Identity of the caller, valid for the current request only.
///
/// Only [`auth_guard`] can build one, so a handler that takes
/// `Extension<Session>` cannot run without a verified token.
#[derive(Debug, Clone)]
pub struct Session {
    account: Account,
    claims: TokenClaim,
}

impl Session {
    pub fn account_number(&self) -> i32 {
        self.account.number
    }
}

/// An account the current session has been verified to own.
#[derive(Debug, Clone)]
pub struct Authorized {
    account: Account,
}

impl Authorized {
    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn into_account(self) -> Account {
        self.account
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let from_authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let from_legacy = || {
        headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
    };

    from_authorization
        .or_else(from_legacy)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

/// The claim must name the very account being acted upon.
pub fn authorize(claims: &TokenClaim, target: &Account) -> Result<(), AuthError> {
    if claims.account_number != target.number {
        return Err(AuthError::PermissionDenied);
    }
    Ok(())
}

/// Verifies `token` and loads the account it was issued for.
pub async fn authenticate(state: &AppState, token: Option<&str>) -> Result<Session, Error> {
    let token = token.ok_or(AuthError::Unauthenticated)?;
    let claims = state.keys.verify(token).map_err(|e| {
        warn!(error = %e, "Token rejected");
        AuthError::Unauthenticated
    })?;

    let account = match state.db.get_account_by_number(claims.account_number).await {
        Ok(account) => account,
        Err(StoreError::NotFound(_)) => return Err(AuthError::Unauthenticated.into()),
        Err(e) => return Err(e.into()),
    };
    if account.id != claims.account_id {
        warn!(
            account_number = account.number,
            "Token was issued for an earlier holder of this number"
        );
        return Err(AuthError::Unauthenticated.into());
    }

    Ok(Session { account, claims })
}

/// Resolves account `id` and checks that `session` owns it. An id that cannot
/// be loaded is reported as unauthenticated rather than missing.
pub async fn resolve_owned(
    state: &AppState,
    session: &Session,
    id: i32,
) -> Result<Authorized, Error> {
    let target = match state.db.get_account_by_id(id).await {
        Ok(account) => account,
        Err(StoreError::NotFound(_)) => return Err(AuthError::Unauthenticated.into()),
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = authorize(&session.claims, &target) {
        warn!(
            account_number = session.account_number(),
            target_id = id,
            "Session does not own the target account"
        );
        return Err(e.into());
    }

    Ok(Authorized { account: target })
}

pub async fn auth_guard(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = bearer_token(req.headers());
    let session = authenticate(&state, token.as_deref()).await?;
    debug!(
        account_number = session.account_number(),
        uri = %req.uri().path(),
        "Auth guard: session established"
    );

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Must be layered inside [`auth_guard`] on routes with an `{id}` segment.
pub async fn owner_guard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    path: Result<Path<i32>, PathRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let Path(id) = path?;
    let authorized = resolve_owned(&state, &session, id).await?;

    req.extensions_mut().insert(authorized);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn claims_for(number: i32) -> TokenClaim {
        TokenClaim {
            account_number: number,
            account_id: 1,
            iat: 0,
            exp: usize::MAX,
        }
    }

    #[test]
    fn claim_must_match_the_target_account() {
        let target = Account {
            number: 1234,
            ..Default::default()
        };
        assert!(authorize(&claims_for(1234), &target).is_ok());
        assert_eq!(
            authorize(&claims_for(4321), &target),
            Err(AuthError::PermissionDenied)
        );
    }

    #[test]
    fn bearer_header_wins_over_legacy_header() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("legacy"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("legacy"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn blank_or_foreign_schemes_yield_no_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(TOKEN_HEADER, HeaderValue::from_static(""));
        assert_eq!(bearer_token(&headers), None);
    }
}

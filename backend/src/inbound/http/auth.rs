//! Bearer-credential extractors used by HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by concentrating
//! credential checks and identity derivation here. A missing, malformed, or
//! expired token is `401`; a valid token with the wrong role is `403`.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::ports::TokenError;
use crate::domain::{AccountId, Error, Identity, MobileNumber};

use super::state::HttpState;

const BEARER_PREFIX: &str = "bearer ";

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?
        .trim();
    let (scheme, token) = value.split_at_checked(BEARER_PREFIX.len()).unwrap_or(("", ""));
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) || token.trim().is_empty() {
        return Err(Error::unauthorized("malformed authorization header"));
    }
    Ok(token.trim())
}

fn map_token_error(error: &TokenError) -> Error {
    match error {
        TokenError::Expired => Error::unauthorized("token expired"),
        other => {
            debug!(error = %other, "bearer token rejected");
            Error::unauthorized("invalid token")
        }
    }
}

fn resolve_identity(req: &HttpRequest) -> Result<Identity, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
    let token = bearer_token(req)?;
    state
        .tokens
        .verify(token)
        .map_err(|error| map_token_error(&error))
}

/// Any authenticated caller, account or admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Identity);

impl Caller {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_identity(req).map(Self))
    }
}

/// A caller holding an account token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub id: AccountId,
    pub mobile: MobileNumber,
}

impl FromRequest for AuthenticatedAccount {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_identity(req).and_then(|identity| match identity {
            Identity::Account { id, mobile } => Ok(Self { id, mobile }),
            Identity::Admin { .. } => Err(Error::forbidden("account access required")),
        }))
    }
}

/// A caller holding the administrator token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub mobile: MobileNumber,
}

impl FromRequest for AdminIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_identity(req).and_then(|identity| match identity {
            Identity::Admin { mobile } => Ok(Self { mobile }),
            Identity::Account { .. } => Err(Error::forbidden("admin access required")),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::inbound::http::test_utils::{
        ACCOUNT_TOKEN, ADMIN_TOKEN, EXPIRED_TOKEN, StateBuilder, account_identity,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    async fn status_for(path: &str, authorization: Option<&str>) -> StatusCode {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(StateBuilder::default().build()))
                .route(
                    "/any",
                    web::get().to(|caller: Caller| async move {
                        HttpResponse::Ok().body(caller.identity().mobile().to_string())
                    }),
                )
                .route(
                    "/account",
                    web::get().to(|account: AuthenticatedAccount| async move {
                        HttpResponse::Ok().body(account.id.to_string())
                    }),
                )
                .route(
                    "/admin",
                    web::get().to(|_admin: AdminIdentity| async { HttpResponse::Ok() }),
                ),
        )
        .await;

        let mut request = actix_test::TestRequest::get().uri(path);
        if let Some(value) = authorization {
            request = request.insert_header((header::AUTHORIZATION, value.to_owned()));
        }
        actix_test::call_service(&app, request.to_request())
            .await
            .status()
    }

    #[rstest]
    #[case("/any", None, StatusCode::UNAUTHORIZED)]
    #[case("/any", Some("Basic abc"), StatusCode::UNAUTHORIZED)]
    #[case("/any", Some("Bearer "), StatusCode::UNAUTHORIZED)]
    #[case("/any", Some("Bearer garbage"), StatusCode::UNAUTHORIZED)]
    #[case("/any", Some(EXPIRED_TOKEN), StatusCode::UNAUTHORIZED)]
    #[case("/any", Some(ACCOUNT_TOKEN), StatusCode::OK)]
    #[case("/any", Some(ADMIN_TOKEN), StatusCode::OK)]
    #[case("/account", Some(ACCOUNT_TOKEN), StatusCode::OK)]
    #[case("/account", Some(ADMIN_TOKEN), StatusCode::FORBIDDEN)]
    #[case("/admin", Some(ADMIN_TOKEN), StatusCode::OK)]
    #[case("/admin", Some(ACCOUNT_TOKEN), StatusCode::FORBIDDEN)]
    #[case("/admin", None, StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn extractors_enforce_roles(
        #[case] path: &str,
        #[case] authorization: Option<&str>,
        #[case] expected: StatusCode,
    ) {
        assert_eq!(status_for(path, authorization).await, expected);
    }

    #[rstest]
    fn scheme_is_case_insensitive() {
        let req = actix_test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bEaReR token-value"))
            .to_http_request();

        assert_eq!(bearer_token(&req).expect("token"), "token-value");
    }

    #[rstest]
    fn expired_tokens_report_expiry() {
        let err = map_token_error(&TokenError::Expired);

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "token expired");
    }

    #[rstest]
    fn account_identity_fixture_is_an_account() {
        assert!(!account_identity().is_admin());
    }
}

use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::SubjectId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::post()
        .and(warp::path!("user" / "create"))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path!("user" / "login"))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path!("user" / "refresh"))
        .and(with_refresh_token())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path!("user" / "logout"))
        .and(with_bearer())
        .and(with_refresh_token())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let me = warp::get()
        .and(warp::path!("user" / "me"))
        .and(with_verification(server.auth_service.clone()))
        .and_then(handler::me);

    register.or(login).or(refresh).or(logout).or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Raw bearer token from `Authorization`; unverified.
fn with_bearer() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(AUTHORIZATION_HEADER).and_then(
        |header: Option<String>| async move {
            match header.as_deref().and_then(|h| h.strip_prefix("Bearer ")) {
                Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
                _ => Err(reject::custom(ApiRejection::from(
                    ApiErrorCode::InvalidToken,
                ))),
            }
        },
    )
}

fn with_refresh_token() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(REFRESH_TOKEN_HEADER).and_then(
        |header: Option<String>| async move {
            match header {
                Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
                _ => Err(reject::custom(ApiRejection::from(
                    ApiErrorCode::MissingRefreshToken,
                ))),
            }
        },
    )
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (SubjectId,), Error = warp::Rejection> + Clone {
    with_bearer().and_then(move |token: String| {
        let auth_service = auth_service.clone();
        async move {
            let subject_id = auth_service
                .authenticate(&token)
                .await
                .map_err(ApiRejection::from)
                .map_err(reject::custom)?;
            Ok::<_, warp::Rejection>(subject_id)
        }
    })
}

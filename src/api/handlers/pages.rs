//! HTML pages: landing, login, registration and logout.
//!
//! Each handler reads the form, calls one service method and either
//! renders a template or redirects. Session cookies ride on the redirect
//! through [`redirect_with`].

use askama::Template;
use axum::{
    extract::{Extension, State},
    http::{header::LOCATION, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::api::extractors::MaybeUser;
use crate::api::middleware::{auth_middleware, rate_limit_auth_middleware, CurrentUser};
use crate::api::session::redirect_with;
use crate::api::AppState;
use crate::config::{MSG_LOGIN_FAILED, MSG_USER_ALREADY_EXISTS};
use crate::errors::{AppError, AppResult};

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    email: &'a str,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    exceptions: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate<'a> {
    exceptions: Option<&'a str>,
}

/// Email/password form posted by the login and register pages
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

/// Create page routes
pub fn page_routes(state: AppState) -> Router<AppState> {
    let limited = middleware::from_fn_with_state(state.clone(), rate_limit_auth_middleware);

    Router::new()
        .route("/", get(index))
        .route(
            "/my-login",
            get(login_page).merge(post(login_submit).route_layer(limited.clone())),
        )
        .route(
            "/register",
            get(register_page).merge(post(register_submit).route_layer(limited)),
        )
        .route(
            "/logout",
            post(logout).route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
}

fn render<T: Template>(template: T) -> AppResult<Response> {
    Ok(Html(template.render()?).into_response())
}

/// Landing page; anonymous visitors are sent to the login page.
pub async fn index(MaybeUser(current_user): MaybeUser) -> AppResult<Response> {
    match current_user {
        Some(current_user) => render(IndexTemplate {
            email: &current_user.user.email,
        }),
        None => Ok((StatusCode::FOUND, [(LOCATION, "/my-login")]).into_response()),
    }
}

pub async fn login_page(MaybeUser(current_user): MaybeUser) -> AppResult<Response> {
    if current_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    render(LoginTemplate { exceptions: None })
}

pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> AppResult<Response> {
    let user = match state
        .auth_service
        .authenticate(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AppError::InvalidCredentials | AppError::UserNotVerified) => {
            return render(LoginTemplate {
                exceptions: Some(MSG_LOGIN_FAILED),
            });
        }
        Err(e) => return Err(e),
    };

    let token = state.auth_service.login(&user)?;
    state.user_service.on_after_login(&user).await;

    let headers = state.session.login_headers(&token.access_token)?;
    Ok(redirect_with(headers, "/"))
}

pub async fn register_page(MaybeUser(current_user): MaybeUser) -> AppResult<Response> {
    if current_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    render(RegisterTemplate { exceptions: None })
}

pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> AppResult<Response> {
    if !form.email.validate_email() {
        return render(RegisterTemplate {
            exceptions: Some("Invalid email format"),
        });
    }

    match state.user_service.create(&form.email, &form.password).await {
        Ok(_) => render(LoginTemplate { exceptions: None }),
        Err(AppError::UserAlreadyExists) => render(RegisterTemplate {
            exceptions: Some(MSG_USER_ALREADY_EXISTS),
        }),
        Err(AppError::InvalidPassword(message)) => render(RegisterTemplate {
            exceptions: Some(&message),
        }),
        Err(e) => Err(e),
    }
}

pub async fn logout(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    state.auth_service.logout(&current_user.claims).await?;

    let headers = state.session.logout_headers()?;
    Ok(redirect_with(headers, "/my-login"))
}

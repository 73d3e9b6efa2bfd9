//! Page view models. Rendering is left to the client; each page answers
//! with the data it needs and goes through the same session rules a
//! rendered page would.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use mytone_core::error::AppError;
use serde::Serialize;

use crate::{
    dtos::auth::SessionUser,
    middleware::{AdminPage, MaybeSession, SignedInPage},
    models::{Language, NewsItem},
    services::APK_KEY,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct PageView {
    pub page: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormView>,
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub page: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    pub languages: Vec<&'static str>,
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Serialize)]
pub struct AdminView {
    pub page: &'static str,
    pub user: SessionUser,
    pub languages: Vec<&'static str>,
    pub news: Vec<NewsItem>,
    pub apk_available: bool,
}

fn languages() -> Vec<&'static str> {
    Language::ALL.iter().map(Language::code).collect()
}

fn view(page: &'static str, user: Option<SessionUser>) -> Json<PageView> {
    Json(PageView {
        page,
        user,
        form: None,
    })
}

pub async fn home(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<HomeView>, AppError> {
    let news = state.news.list_news().await?;
    Ok(Json(HomeView {
        page: "home",
        user: session.map(|claims| claims.user()),
        languages: languages(),
        news,
    }))
}

pub async fn login_user() -> Json<PageView> {
    Json(PageView {
        page: "login_user",
        user: None,
        form: Some(FormView {
            action: "/auth-login",
            user_type: Some("user"),
        }),
    })
}

pub async fn login_admin(MaybeSession(session): MaybeSession) -> Json<PageView> {
    Json(PageView {
        page: "login_admin",
        user: session.map(|claims| claims.user()),
        form: Some(FormView {
            action: "/auth-login",
            user_type: Some("admin"),
        }),
    })
}

pub async fn signup_page() -> Json<PageView> {
    Json(PageView {
        page: "signup",
        user: None,
        form: Some(FormView {
            action: "/signup",
            user_type: None,
        }),
    })
}

/// Admins have their own panel and are sent there.
pub async fn dashboard(SignedInPage(claims): SignedInPage) -> Response {
    if claims.is_admin() {
        return Redirect::to("/admin").into_response();
    }
    view("dashboard", Some(claims.user())).into_response()
}

pub async fn profile(SignedInPage(claims): SignedInPage) -> Json<PageView> {
    view("profile", Some(claims.user()))
}

pub async fn settings(SignedInPage(claims): SignedInPage) -> Json<PageView> {
    view("settings", Some(claims.user()))
}

pub async fn admin(
    State(state): State<AppState>,
    AdminPage(claims): AdminPage,
) -> Result<Json<AdminView>, AppError> {
    let news = state.news.list_news().await?;
    let apk_available = state.storage.exists(APK_KEY).await?;

    Ok(Json(AdminView {
        page: "admin",
        user: claims.user(),
        languages: languages(),
        news,
        apk_available,
    }))
}

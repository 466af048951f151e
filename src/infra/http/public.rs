//! Read-side `/posts` routes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::{get, post},
};

use crate::application::blog::BlogService;
use crate::application::repos::PostListScope;

use super::client_ip::ClientIp;
use super::error::{ApiError, blog_to_api};
use super::middleware::{enforce_timeout, log_responses, set_request_context};
use super::models::{
    ClickResponse, HeadingView, ImpressionResponse, PostDetailView, PostListItemView,
};

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
}

pub fn build_router(state: HttpState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{slug}", get(post_detail))
        .route("/posts/{slug}/headings", get(post_headings))
        .route("/posts/{slug}/increment_clicks", post(increment_clicks))
        .route(
            "/posts/{slug}/increment_impressions",
            post(increment_impressions),
        )
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            request_timeout,
            enforce_timeout,
        ))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

pub async fn list_posts(
    State(state): State<HttpState>,
) -> Result<Json<Vec<PostListItemView>>, ApiError> {
    let posts = state
        .blog
        .list_posts(PostListScope::Public)
        .await
        .map_err(blog_to_api)?;

    Ok(Json(posts.into_iter().map(PostListItemView::from).collect()))
}

pub async fn post_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    client_ip: ClientIp,
) -> Result<Json<PostDetailView>, ApiError> {
    let detail = state
        .blog
        .view_published_post(&slug, client_ip.as_str())
        .await
        .map_err(blog_to_api)?;

    Ok(Json(PostDetailView::from(detail)))
}

pub async fn post_headings(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<HeadingView>>, ApiError> {
    let headings = state.blog.headings(&slug).await.map_err(blog_to_api)?;

    Ok(Json(headings.into_iter().map(HeadingView::from).collect()))
}

pub async fn increment_clicks(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Json<ClickResponse>, ApiError> {
    let analytics = state
        .blog
        .increment_clicks(&slug)
        .await
        .map_err(blog_to_api)?;

    Ok(Json(ClickResponse::from(analytics)))
}

pub async fn increment_impressions(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Json<ImpressionResponse>, ApiError> {
    let analytics = state
        .blog
        .increment_impressions(&slug)
        .await
        .map_err(blog_to_api)?;

    Ok(Json(ImpressionResponse::from(analytics)))
}

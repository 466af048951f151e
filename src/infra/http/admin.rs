//! Content-management routes served on the admin listener.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use crate::application::blog::BlogService;
use crate::application::content::{AdminCategoryService, AdminPostService};
use crate::application::error::ErrorReport;
use crate::application::repos::{HealthRepo, PostListScope};

use super::error::{ApiError, blog_to_api, content_to_api};
use super::middleware::{enforce_timeout, log_responses, set_request_context};
use super::models::{
    AdminPostListItemView, CategoryView, CreateCategoryRequest, CreateHeadingRequest,
    CreatePostRequest, HeadingView, PostAnalyticsView, PostRecordView, PostViewItem,
    UpdatePostRequest,
};

#[derive(Clone)]
pub struct AdminState {
    pub categories: Arc<AdminCategoryService>,
    pub posts: Arc<AdminPostService>,
    pub blog: Arc<BlogService>,
    pub health: Arc<dyn HealthRepo>,
}

pub fn build_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            "/admin/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/admin/categories/{slug}",
            delete(delete_category),
        )
        .route("/admin/posts", get(list_posts).post(create_post))
        .route(
            "/admin/posts/{slug}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route(
            "/admin/posts/{slug}/headings",
            post(create_heading),
        )
        .route("/admin/posts/{slug}/analytics", get(post_analytics))
        .route("/admin/posts/{slug}/views", get(post_views))
        .route("/_health/db", get(db_health))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            request_timeout,
            enforce_timeout,
        ))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

pub async fn list_categories(
    State(state): State<AdminState>,
) -> Result<Json<Vec<CategoryView>>, ApiError> {
    let categories = state.categories.list().await.map_err(content_to_api)?;
    Ok(Json(categories.into_iter().map(CategoryView::from).collect()))
}

pub async fn create_category(
    State(state): State<AdminState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryView>), ApiError> {
    let category = state
        .categories
        .create(request.into())
        .await
        .map_err(content_to_api)?;
    Ok((StatusCode::CREATED, Json(CategoryView::from(category))))
}

pub async fn delete_category(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .categories
        .delete(&slug)
        .await
        .map_err(content_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_posts(
    State(state): State<AdminState>,
) -> Result<Json<Vec<AdminPostListItemView>>, ApiError> {
    let posts = state
        .blog
        .list_posts(PostListScope::Admin)
        .await
        .map_err(blog_to_api)?;
    Ok(Json(
        posts.into_iter().map(AdminPostListItemView::from).collect(),
    ))
}

pub async fn get_post(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<Json<PostRecordView>, ApiError> {
    let post = state.posts.find(&slug).await.map_err(content_to_api)?;
    Ok(Json(PostRecordView::from(post)))
}

pub async fn create_post(
    State(state): State<AdminState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostRecordView>), ApiError> {
    let post = state
        .posts
        .create(request.into())
        .await
        .map_err(content_to_api)?;
    Ok((StatusCode::CREATED, Json(PostRecordView::from(post))))
}

pub async fn update_post(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<PostRecordView>, ApiError> {
    let post = state
        .posts
        .update(&slug, request.into())
        .await
        .map_err(content_to_api)?;
    Ok(Json(PostRecordView::from(post)))
}

pub async fn delete_post(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.posts.delete(&slug).await.map_err(content_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_heading(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    Json(request): Json<CreateHeadingRequest>,
) -> Result<(StatusCode, Json<HeadingView>), ApiError> {
    let heading = state
        .posts
        .add_heading(&slug, request.into())
        .await
        .map_err(content_to_api)?;
    Ok((StatusCode::CREATED, Json(HeadingView::from(heading))))
}

pub async fn post_analytics(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<Json<PostAnalyticsView>, ApiError> {
    let report = state.posts.analytics(&slug).await.map_err(content_to_api)?;
    Ok(Json(PostAnalyticsView::from(report)))
}

pub async fn post_views(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<PostViewItem>>, ApiError> {
    let views = state.posts.views(&slug).await.map_err(content_to_api)?;
    Ok(Json(views.into_iter().map(PostViewItem::from).collect()))
}

pub async fn db_health(State(state): State<AdminState>) -> Response {
    match state.health.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

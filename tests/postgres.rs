use std::sync::Arc;

use futures::future::join_all;
use sqlx::PgPool;

use lectern::application::analytics::AnalyticsService;
use lectern::application::repos::{
    AnalyticsRepo, CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, CreateHeadingParams,
    CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError, ViewOutcome,
};
use lectern::domain::entities::{CategoryRecord, PostRecord};
use lectern::domain::types::{HeadingLevel, PostStatus};
use lectern::infra::db::PostgresRepositories;

fn category_params(name: &str, parent_id: Option<uuid::Uuid>) -> CreateCategoryParams {
    CreateCategoryParams {
        parent_id,
        name: name.to_string(),
        title: None,
        description: None,
        thumbnail: None,
        slug: name.to_string(),
    }
}

fn post_params(slug: &str, category: &CategoryRecord, status: PostStatus) -> CreatePostParams {
    CreatePostParams {
        title: slug.to_string(),
        description: String::new(),
        content: format!("<p>{slug}</p>"),
        thumbnail: None,
        keywords: String::new(),
        slug: slug.to_string(),
        category_id: category.id,
        status,
    }
}

async fn seed(repos: &PostgresRepositories) -> (CategoryRecord, PostRecord) {
    let category = repos
        .create_category(category_params("tech", None))
        .await
        .expect("create category");
    let post = repos
        .create_post(post_params("hello", &category, PostStatus::Published))
        .await
        .expect("create post");
    (category, post)
}

#[sqlx::test(migrations = "./migrations")]
async fn create_post_creates_zeroed_analytics(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let (_, post) = seed(&repos).await;

    let analytics = repos
        .find_analytics(post.id)
        .await
        .expect("lookup")
        .expect("analytics row");
    assert_eq!(
        (analytics.views, analytics.impressions, analytics.clicks),
        (0, 0, 0)
    );
    assert_eq!(analytics.click_through_rate, 0.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn record_view_suppresses_duplicates(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let (_, post) = seed(&repos).await;

    let first = repos.record_view(post.id, "1.1.1.1").await.expect("first");
    let repeat = repos.record_view(post.id, "1.1.1.1").await.expect("repeat");
    let other = repos.record_view(post.id, "2.2.2.2").await.expect("other");

    assert!(matches!(first, ViewOutcome::Recorded(ref a) if a.views == 1));
    assert_eq!(repeat, ViewOutcome::Duplicate);
    assert!(matches!(other, ViewOutcome::Recorded(ref a) if a.views == 2));
    assert!(repos.has_view(post.id, "1.1.1.1").await.expect("has view"));

    let counts = repos.count_views(&[post.id]).await.expect("count");
    assert_eq!(counts.get(&post.id).copied(), Some(2));
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_views_from_one_ip_count_once(pool: PgPool) {
    let repos = Arc::new(PostgresRepositories::new(pool));
    let (_, post) = seed(&repos).await;
    let analytics = AnalyticsService::new(repos.clone());

    let tasks = (0..16).map(|_| {
        let analytics = analytics.clone();
        let post_id = post.id;
        tokio::spawn(async move { analytics.increment_view(post_id, "203.0.113.9").await })
    });
    for joined in join_all(tasks).await {
        joined.expect("task").expect("increment view");
    }

    let row = repos
        .find_analytics(post.id)
        .await
        .expect("lookup")
        .expect("analytics row");
    assert_eq!(row.views, 1);
    assert_eq!(repos.list_views(post.id).await.expect("views").len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn clicks_and_impressions_update_rate(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let (_, post) = seed(&repos).await;

    for _ in 0..3 {
        repos.increment_clicks(post.id).await.expect("click");
    }
    let analytics = repos.find_analytics(post.id).await.expect("lookup").expect("row");
    assert_eq!(analytics.clicks, 3);
    assert_eq!(analytics.click_through_rate, 0.0);

    repos.increment_impressions(post.id).await.expect("impression");
    let analytics = repos.increment_impressions(post.id).await.expect("impression");
    assert_eq!(analytics.impressions, 2);
    assert!((analytics.click_through_rate - 150.0).abs() < 1e-9);
}

#[sqlx::test(migrations = "./migrations")]
async fn get_or_create_restores_missing_analytics(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let (_, post) = seed(&repos).await;

    sqlx::query("DELETE FROM post_analytics WHERE post_id = $1")
        .bind(post.id)
        .execute(repos.pool())
        .await
        .expect("drop analytics");
    assert!(matches!(
        repos.increment_clicks(post.id).await,
        Err(RepoError::NotFound)
    ));

    let analytics = repos
        .get_or_create_analytics(post.id)
        .await
        .expect("get or create");
    assert_eq!(analytics.clicks, 0);
    let again = repos
        .get_or_create_analytics(post.id)
        .await
        .expect("idempotent");
    assert_eq!(again.id, analytics.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_slugs_surface_constraint(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let (category, _) = seed(&repos).await;

    let err = repos
        .create_post(post_params("hello", &category, PostStatus::Draft))
        .await
        .expect_err("duplicate slug");
    assert!(matches!(err, RepoError::Duplicate { ref constraint } if constraint == "posts_slug_key"));

    let err = repos
        .create_category(category_params("tech", None))
        .await
        .expect_err("duplicate category");
    assert!(matches!(err, RepoError::Duplicate { .. }));
}

#[sqlx::test(migrations = "./migrations")]
async fn category_delete_is_restricted_by_posts(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let (parent, _) = seed(&repos).await;
    let child = repos
        .create_category(category_params("rust", Some(parent.id)))
        .await
        .expect("child category");
    repos
        .create_post(post_params("borrowing", &child, PostStatus::Draft))
        .await
        .expect("child post");

    assert_eq!(
        repos
            .count_posts_in_category(parent.id)
            .await
            .expect("count"),
        2
    );

    let err = repos
        .delete_category(child.id)
        .await
        .expect_err("restricted");
    assert!(matches!(err, RepoError::Integrity { .. }));
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_parent_category_removes_its_children(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let parent = repos
        .create_category(category_params("tech", None))
        .await
        .expect("parent category");
    let child = repos
        .create_category(category_params("rust", Some(parent.id)))
        .await
        .expect("child category");
    assert_eq!(child.parent_id, Some(parent.id));

    repos.delete_category(parent.id).await.expect("delete parent");

    assert!(
        repos
            .find_category_by_id(child.id)
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(repos.list_categories().await.expect("list").is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_clicks_are_not_lost(pool: PgPool) {
    let repos = Arc::new(PostgresRepositories::new(pool));
    let (_, post) = seed(&repos).await;
    let analytics = AnalyticsService::new(repos.clone());

    let tasks = (0..24).map(|_| {
        let analytics = analytics.clone();
        let post_id = post.id;
        tokio::spawn(async move { analytics.increment_click(post_id).await })
    });
    for joined in join_all(tasks).await {
        joined.expect("task").expect("increment click");
    }

    let row = repos
        .find_analytics(post.id)
        .await
        .expect("lookup")
        .expect("analytics row");
    assert_eq!(row.clicks, 24);
    assert_eq!(row.click_through_rate, 0.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn post_delete_cascades(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let (category, post) = seed(&repos).await;
    repos
        .create_heading(CreateHeadingParams {
            post_id: post.id,
            text: "Intro".into(),
            slug: "intro".into(),
            level: HeadingLevel::new(2).expect("level"),
            order: 0,
        })
        .await
        .expect("heading");
    repos.record_view(post.id, "1.1.1.1").await.expect("view");

    repos.delete_post(post.id).await.expect("delete post");

    assert!(repos.list_headings(post.id).await.expect("headings").is_empty());
    assert!(repos.list_views(post.id).await.expect("views").is_empty());
    assert!(repos.find_analytics(post.id).await.expect("lookup").is_none());
    repos
        .delete_category(category.id)
        .await
        .expect("category now free");
}

#[sqlx::test(migrations = "./migrations")]
async fn scopes_filter_and_order_posts(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let (category, _) = seed(&repos).await;
    repos
        .create_post(post_params("draft", &category, PostStatus::Draft))
        .await
        .expect("draft");

    let public = repos.list_posts(PostListScope::Public).await.expect("public");
    assert_eq!(public.len(), 1);
    assert!(public.iter().all(PostRecord::is_published));

    let admin = repos.list_posts(PostListScope::Admin).await.expect("admin");
    assert_eq!(admin.len(), 2);
    assert_eq!(admin[0].status, PostStatus::Draft);

    assert!(
        repos
            .find_by_slug(PostListScope::Public, "draft")
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(
        repos
            .find_by_slug(PostListScope::Admin, "draft")
            .await
            .expect("lookup")
            .is_some()
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn health_check_pings_database(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    repos.health_check().await.expect("ping");
}

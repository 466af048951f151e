use std::sync::Arc;

use futures::future::join_all;

use lectern::application::analytics::AnalyticsService;
use lectern::application::blog::BlogService;
use lectern::application::content::{
    AdminCategoryService, AdminContentError, AdminPostService, CreateCategoryCommand,
    CreatePostCommand,
};
use lectern::application::repos::{AnalyticsRepo, RepoError, ViewOutcome};
use lectern::domain::entities::PostRecord;
use lectern::domain::types::PostStatus;
use lectern::infra::memory::MemoryRepositories;

struct Fixture {
    repos: Arc<MemoryRepositories>,
    analytics: AnalyticsService,
    blog: BlogService,
    categories: AdminCategoryService,
    posts: AdminPostService,
}

fn build_fixture() -> Fixture {
    let repos = Arc::new(MemoryRepositories::new());
    let analytics = AnalyticsService::new(repos.clone());
    let blog = BlogService::new(repos.clone(), repos.clone(), analytics.clone());
    let categories = AdminCategoryService::new(repos.clone(), repos.clone());
    let posts = AdminPostService::new(repos.clone(), repos.clone(), repos.clone(), analytics.clone());

    Fixture {
        repos,
        analytics,
        blog,
        categories,
        posts,
    }
}

async fn seed_hello(fixture: &Fixture) -> PostRecord {
    fixture
        .categories
        .create(CreateCategoryCommand {
            name: "tech".into(),
            slug: Some("tech".into()),
            ..Default::default()
        })
        .await
        .expect("create category");

    fixture
        .posts
        .create(CreatePostCommand {
            title: "Hello".into(),
            content: "<p>Hello, world.</p>".into(),
            slug: Some("hello".into()),
            category: "tech".into(),
            status: PostStatus::Published,
            ..Default::default()
        })
        .await
        .expect("create post")
}

async fn views_of(fixture: &Fixture, post: &PostRecord) -> i64 {
    fixture
        .analytics
        .analytics_for(post.id)
        .await
        .expect("analytics")
        .views
}

#[tokio::test]
async fn new_post_starts_with_zeroed_analytics() {
    let fixture = build_fixture();
    let post = seed_hello(&fixture).await;

    let analytics = fixture.analytics.analytics_for(post.id).await.expect("analytics");
    assert_eq!(analytics.post_id, post.id);
    assert_eq!(
        (analytics.views, analytics.impressions, analytics.clicks),
        (0, 0, 0)
    );
    assert_eq!(analytics.click_through_rate, 0.0);
    assert_eq!(analytics.avg_time_on_page, 0.0);
}

#[tokio::test]
async fn views_count_once_per_origin() {
    let fixture = build_fixture();
    let post = seed_hello(&fixture).await;

    let detail = fixture
        .blog
        .view_published_post("hello", "1.1.1.1")
        .await
        .expect("first view");
    assert_eq!(detail.view_count, 1);
    assert_eq!(views_of(&fixture, &post).await, 1);

    fixture
        .blog
        .view_published_post("hello", "1.1.1.1")
        .await
        .expect("repeat view");
    assert_eq!(views_of(&fixture, &post).await, 1);

    let detail = fixture
        .blog
        .view_published_post("hello", "2.2.2.2")
        .await
        .expect("second origin");
    assert_eq!(detail.view_count, 2);
    assert_eq!(views_of(&fixture, &post).await, 2);
}

#[tokio::test]
async fn repeated_views_report_duplicates() {
    let fixture = build_fixture();
    let post = seed_hello(&fixture).await;

    let first = fixture
        .analytics
        .increment_view(post.id, "10.0.0.1")
        .await
        .expect("first");
    assert!(first.is_recorded());

    for _ in 0..5 {
        let outcome = fixture
            .analytics
            .increment_view(post.id, "10.0.0.1")
            .await
            .expect("repeat");
        assert_eq!(outcome, ViewOutcome::Duplicate);
    }
    assert_eq!(views_of(&fixture, &post).await, 1);
}

#[tokio::test]
async fn ipv4_mapped_addresses_count_as_distinct_origins() {
    let fixture = build_fixture();
    let post = seed_hello(&fixture).await;

    fixture
        .analytics
        .increment_view(post.id, "1.2.3.4")
        .await
        .expect("ipv4");
    fixture
        .analytics
        .increment_view(post.id, "::ffff:1.2.3.4")
        .await
        .expect("mapped");

    assert_eq!(views_of(&fixture, &post).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_views_from_one_origin_count_once() {
    let fixture = build_fixture();
    let post = seed_hello(&fixture).await;

    let tasks = (0..64).map(|_| {
        let analytics = fixture.analytics.clone();
        let post_id = post.id;
        tokio::spawn(async move { analytics.increment_view(post_id, "203.0.113.9").await })
    });
    let outcomes: Vec<ViewOutcome> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task").expect("increment view"))
        .collect();

    let recorded = outcomes.iter().filter(|outcome| outcome.is_recorded()).count();
    assert_eq!(recorded, 1);
    assert_eq!(views_of(&fixture, &post).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_views_from_distinct_origins_are_additive() {
    let fixture = build_fixture();
    let post = seed_hello(&fixture).await;

    let tasks = (0..40).map(|n| {
        let analytics = fixture.analytics.clone();
        let post_id = post.id;
        let ip = format!("10.0.0.{n}");
        tokio::spawn(async move { analytics.increment_view(post_id, &ip).await })
    });
    for joined in join_all(tasks).await {
        joined.expect("task").expect("increment view");
    }

    assert_eq!(views_of(&fixture, &post).await, 40);
}

#[tokio::test]
async fn clicks_without_impressions_keep_rate_at_zero() {
    let fixture = build_fixture();
    seed_hello(&fixture).await;

    let mut last = None;
    for _ in 0..3 {
        last = Some(fixture.blog.increment_clicks("hello").await.expect("click"));
    }

    let analytics = last.expect("three clicks");
    assert_eq!(analytics.clicks, 3);
    assert_eq!(analytics.impressions, 0);
    assert_eq!(analytics.click_through_rate, 0.0);
}

#[tokio::test]
async fn click_through_rate_tracks_clicks_over_impressions() {
    let fixture = build_fixture();
    seed_hello(&fixture).await;

    for _ in 0..4 {
        fixture
            .blog
            .increment_impressions("hello")
            .await
            .expect("impression");
    }
    let analytics = fixture.blog.increment_clicks("hello").await.expect("click");
    assert_eq!(analytics.impressions, 4);
    assert!((analytics.click_through_rate - 25.0).abs() < f64::EPSILON);

    let analytics = fixture
        .blog
        .increment_impressions("hello")
        .await
        .expect("impression");
    assert_eq!(analytics.impressions, 5);
    assert!((analytics.click_through_rate - 20.0).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clicks_are_not_lost() {
    let fixture = build_fixture();
    let post = seed_hello(&fixture).await;

    let tasks = (0..50).map(|_| {
        let analytics = fixture.analytics.clone();
        let post_id = post.id;
        tokio::spawn(async move { analytics.increment_click(post_id).await })
    });
    for joined in join_all(tasks).await {
        joined.expect("task").expect("increment click");
    }

    let analytics = fixture.analytics.analytics_for(post.id).await.expect("analytics");
    assert_eq!(analytics.clicks, 50);
}

#[tokio::test]
async fn drafts_accept_clicks_but_not_public_views() {
    let fixture = build_fixture();
    seed_hello(&fixture).await;
    let draft = fixture
        .posts
        .create(CreatePostCommand {
            title: "Work in progress".into(),
            content: "draft".into(),
            category: "tech".into(),
            status: PostStatus::Draft,
            ..Default::default()
        })
        .await
        .expect("create draft");
    assert_eq!(draft.slug, "work-in-progress");

    assert!(fixture.blog.increment_clicks(&draft.slug).await.is_ok());
    assert!(
        fixture
            .blog
            .view_published_post(&draft.slug, "1.1.1.1")
            .await
            .is_err()
    );
    assert_eq!(views_of(&fixture, &draft).await, 0);
}

#[tokio::test]
async fn deleting_a_post_removes_its_analytics() {
    let fixture = build_fixture();
    let post = seed_hello(&fixture).await;
    fixture
        .analytics
        .increment_view(post.id, "1.1.1.1")
        .await
        .expect("view");

    fixture.posts.delete("hello").await.expect("delete post");

    assert!(fixture.repos.find_analytics(post.id).await.expect("lookup").is_none());
    assert!(matches!(
        fixture.analytics.increment_view(post.id, "2.2.2.2").await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn categories_with_posts_cannot_be_deleted() {
    let fixture = build_fixture();
    seed_hello(&fixture).await;

    let err = fixture
        .categories
        .delete("tech")
        .await
        .expect_err("category in use");
    assert!(matches!(err, AdminContentError::CategoryInUse { count: 1, .. }));

    fixture.posts.delete("hello").await.expect("delete post");
    fixture.categories.delete("tech").await.expect("delete category");
}

#[tokio::test]
async fn posts_in_a_subcategory_block_deleting_the_parent() {
    let fixture = build_fixture();
    fixture
        .categories
        .create(CreateCategoryCommand {
            name: "tech".into(),
            ..Default::default()
        })
        .await
        .expect("create parent");
    let child = fixture
        .categories
        .create(CreateCategoryCommand {
            name: "rust".into(),
            parent: Some("tech".into()),
            ..Default::default()
        })
        .await
        .expect("create child");
    let parent = fixture.categories.find("tech").await.expect("parent");
    assert_eq!(child.parent_id, Some(parent.id));

    fixture
        .posts
        .create(CreatePostCommand {
            title: "Ownership".into(),
            content: "<p>Borrowing.</p>".into(),
            category: "rust".into(),
            status: PostStatus::Published,
            ..Default::default()
        })
        .await
        .expect("create post");

    let err = fixture
        .categories
        .delete("tech")
        .await
        .expect_err("subtree in use");
    assert!(matches!(
        err,
        AdminContentError::CategoryInUse { ref slug, count: 1 } if slug == "tech"
    ));

    fixture.posts.delete("ownership").await.expect("delete post");
    fixture.categories.delete("tech").await.expect("delete parent");

    assert!(fixture.categories.list().await.expect("list").is_empty());
}

#[tokio::test]
async fn unknown_parent_is_a_validation_error() {
    let fixture = build_fixture();

    let err = fixture
        .categories
        .create(CreateCategoryCommand {
            name: "rust".into(),
            parent: Some("missing".into()),
            ..Default::default()
        })
        .await
        .expect_err("missing parent");

    match err {
        AdminContentError::Invalid(err) => assert_eq!(err.field(), "parent"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(fixture.categories.list().await.expect("list").is_empty());
}

use std::{net::SocketAddr, process, sync::Arc};

use lectern::{
    application::{
        analytics::AnalyticsService,
        blog::BlogService,
        content::{AdminCategoryService, AdminPostService},
        error::AppError,
        repos::{
            AnalyticsRepo, CategoriesRepo, CategoriesWriteRepo, HealthRepo, PostsRepo,
            PostsWriteRepo,
        },
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState},
        memory::MemoryRepositories,
        telemetry,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (http_state, admin_state) = match settings.database.url.as_deref() {
        Some(url) => {
            let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
                .await
                .map_err(InfraError::from)?;
            PostgresRepositories::run_migrations(&pool)
                .await
                .map_err(InfraError::from)?;
            info!(target = "lectern::startup", "using postgres store");
            build_application_context(Arc::new(PostgresRepositories::new(pool)))
        }
        None => {
            warn!(
                target = "lectern::startup",
                "database url is not configured; content is kept in memory and lost on exit"
            );
            build_application_context(Arc::new(MemoryRepositories::new()))
        }
    };

    serve_http(&settings, http_state, admin_state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "lectern::migrate", "migrations applied");
    Ok(())
}

fn build_application_context<R>(repositories: Arc<R>) -> (HttpState, AdminState)
where
    R: CategoriesRepo
        + CategoriesWriteRepo
        + PostsRepo
        + PostsWriteRepo
        + AnalyticsRepo
        + HealthRepo
        + 'static,
{
    let categories_repo: Arc<dyn CategoriesRepo> = repositories.clone();
    let categories_write_repo: Arc<dyn CategoriesWriteRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let analytics_repo: Arc<dyn AnalyticsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let analytics = AnalyticsService::new(analytics_repo);
    let blog = Arc::new(BlogService::new(
        posts_repo.clone(),
        categories_repo.clone(),
        analytics.clone(),
    ));
    let categories = Arc::new(AdminCategoryService::new(
        categories_repo.clone(),
        categories_write_repo,
    ));
    let posts = Arc::new(AdminPostService::new(
        posts_repo,
        posts_write_repo,
        categories_repo,
        analytics,
    ));

    let http_state = HttpState { blog: blog.clone() };
    let admin_state = AdminState {
        categories,
        posts,
        blog,
        health: health_repo,
    };

    (http_state, admin_state)
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let timeout = settings.server.request_timeout;
    let public_router = http::build_router(http_state, timeout);
    let admin_router = http::build_admin_router(admin_state, timeout);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(InfraError::from)?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "lectern::startup",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        "listeners bound"
    );

    let public_server = axum::serve(
        public_listener,
        public_router.into_make_service_with_connect_info::<SocketAddr>(),
    );
    let admin_server = axum::serve(
        admin_listener,
        admin_router.into_make_service_with_connect_info::<SocketAddr>(),
    );

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

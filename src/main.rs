use std::{net::SocketAddr, process, sync::Arc};

use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use voce::{
    application::{
        auth::AuthService,
        blog::BlogService,
        category::CategoryService,
        error::AppError,
        featured::FeaturedService,
        repos::{CommentsRepo, PostsRepo, PostsWriteRepo, SessionsRepo, UsersRepo},
        search::SearchService,
        snapshot::SnapshotStore,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiRateLimiter, ApiState, HttpState, RouterState},
        snapshot::FileSnapshotStore,
        telemetry,
    },
};

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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_router_state(repositories, &settings)?;
    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "voce::migrate", "Migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_router_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<RouterState, AppError> {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();

    let snapshots: Arc<dyn SnapshotStore> = Arc::new(
        FileSnapshotStore::new(settings.snapshots.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let blog = Arc::new(BlogService::new(
        posts_repo.clone(),
        posts_write_repo,
        comments_repo,
    ));
    let featured = Arc::new(FeaturedService::new(posts_repo.clone(), snapshots.clone()));
    let categories = Arc::new(CategoryService::new(posts_repo.clone(), snapshots));
    let search = Arc::new(SearchService::new(posts_repo));
    let auth = Arc::new(AuthService::new(users_repo, sessions_repo));

    let rate_limiter = Arc::new(ApiRateLimiter::new(
        settings.api_rate_limit.window,
        settings.api_rate_limit.max_requests.get(),
    ));

    let http_state = HttpState {
        blog: blog.clone(),
        featured: featured.clone(),
        categories,
        auth,
        db: repositories,
    };

    let api_state = ApiState {
        featured,
        search,
        blog,
        rate_limiter,
    };

    Ok(RouterState {
        http: http_state,
        api: api_state,
    })
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let app = http::build_router(state.clone())
        .merge(http::build_api_router(state.clone()))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "voce::serve",
        addr = %settings.server.addr,
        "Listening for connections"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

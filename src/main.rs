use std::{net::SocketAddr, process, sync::Arc};

use piatto::{
    application::{
        admin_menu::AdminMenuService,
        error::AppError,
        menu_query::MenuQueryService,
        repos::MenuRepo,
    },
    cache::{CacheConfig, MenuCache},
    config,
    domain::menu::{assign_missing_ids, validate_document, MenuDocument},
    infra::{
        db::PostgresMenuStore,
        error::InfraError,
        http::{self, AdminState, PublicState, RateLimiter},
        telemetry,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info};
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Seed(args) => run_seed(settings, args).await,
    }
}

async fn init_store(settings: &config::Settings) -> Result<Arc<PostgresMenuStore>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresMenuStore::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresMenuStore::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let store = Arc::new(PostgresMenuStore::new(pool, settings.database.op_timeout));
    store.await_ready(settings.database.ready_timeout).await?;
    Ok(store)
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let admin_token = settings
        .admin
        .token
        .clone()
        .ok_or_else(|| InfraError::configuration("admin.token is not configured"))
        .map_err(AppError::from)?;

    let store = init_store(&settings).await?;

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = Arc::new(MenuCache::from_config(&cache_config).await);

    let repo: Arc<dyn MenuRepo> = store.clone();
    let query = Arc::new(MenuQueryService::new(
        repo.clone(),
        cache.clone(),
        cache_config,
    ));
    let admin = Arc::new(AdminMenuService::new(repo, cache.clone()));

    let rate_limiter = Arc::new(RateLimiter::new(
        std::time::Duration::from_secs(settings.rate_limit.window_seconds.get() as u64),
        settings.rate_limit.max_requests.get(),
    ));

    let public_state = PublicState {
        query,
        db: store.clone(),
        rate_limiter,
    };
    let admin_state = AdminState {
        admin,
        db: store,
        admin_token: Arc::from(admin_token),
    };

    let public_router = http::build_public_router(public_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target: "piatto::serve",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        cache_enabled = cache.is_enabled(),
        "listening",
    );

    let public_server = axum::serve(
        public_listener,
        public_router.into_make_service_with_connect_info::<SocketAddr>(),
    );
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service());

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_seed(settings: config::Settings, args: config::SeedArgs) -> Result<(), AppError> {
    let store = init_store(&settings).await?;

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;
    let mut document: MenuDocument = serde_json::from_str(&raw)
        .map_err(|err| AppError::validation(format!("invalid menu document: {err}")))?;

    assign_missing_ids(&mut document);
    validate_document(&document)?;

    let version = match store.load_menu().await? {
        Some(record) if args.replace => store.replace_menu(&document, record.version).await?,
        Some(_) => {
            return Err(AppError::validation(
                "a menu document already exists; pass --replace to overwrite it",
            ));
        }
        None => store.create_menu(&document).await?,
    };

    info!(
        target: "piatto::seed",
        file = %args.file.display(),
        version,
        categories = document.categories.len(),
        "menu document seeded",
    );
    Ok(())
}

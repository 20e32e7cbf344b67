//! # Blogicum Server
//!
//! Actix-web HTTP server plus the demo management commands.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_actix_web::TracingLogger;

mod config;
mod demo;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::error::AppError;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[derive(Debug, Parser)]
#[command(name = "blogicum-server", version, about = "Blogicum blog backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (the default).
    Serve,
    /// Fill the store with demo users, categories, posts and comments.
    SeedDemo {
        /// Keep existing data instead of clearing it first.
        #[arg(long)]
        keep: bool,
    },
    /// Apply migrations, seed demo data and start the server.
    StartDemo {
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: String,
        /// Leave existing data untouched.
        #[arg(long)]
        keep_data: bool,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = AppState::new(&config).await;
            let addr = format!("{}:{}", config.host, config.port);
            serve(state, &addr).await
        }
        Command::SeedDemo { keep } => {
            let state = AppState::new(&config).await;
            warn_if_ephemeral(&state);
            run_migrations(&state).await?;
            seed(&state, keep).await
        }
        Command::StartDemo { addr, keep_data } => {
            let state = AppState::new(&config).await;
            run_migrations(&state).await?;
            if keep_data {
                tracing::info!("Keeping existing demo data");
            } else {
                seed(&state, false).await?;
            }
            serve(state, &addr).await
        }
    }
}

async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    tracing::info!("Starting Blogicum server on http://{}/", addr);

    HttpServer::new(move || app(state.clone()))
        .bind(addr)
        .with_context(|| format!("binding {addr}"))?
        .run()
        .await?;

    Ok(())
}

/// The request-id middleware is wrapped last so it runs outermost and the
/// `TracingLogger` root span is opened inside the request-id span.
fn app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(TracingLogger::default())
        .wrap(RequestIdMiddleware)
        .app_data(web::Data::new(state))
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
        )
        .configure(handlers::configure_routes)
}

async fn seed(state: &AppState, keep: bool) -> anyhow::Result<()> {
    let fetcher = demo::HttpFetcher::new().context("building HTTP client")?;
    let report = demo::seed_demo(state, &fetcher, keep).await?;

    tracing::info!(
        posts = report.posts,
        comments = report.comments,
        images = report.images,
        accounts = %demo::demo_accounts(),
        "Demo data ready"
    );
    Ok(())
}

#[cfg(feature = "postgres")]
async fn run_migrations(state: &AppState) -> anyhow::Result<()> {
    use migration::{Migrator, MigratorTrait};

    if let Some(db) = &state.db {
        tracing::info!("Applying migrations");
        Migrator::up(&db.main, None)
            .await
            .context("applying migrations")?;
    }
    Ok(())
}

#[cfg(not(feature = "postgres"))]
async fn run_migrations(_state: &AppState) -> anyhow::Result<()> {
    Ok(())
}

/// Seeding the in-memory store from a one-shot command has no lasting effect.
fn warn_if_ephemeral(state: &AppState) {
    #[cfg(feature = "postgres")]
    let persistent = state.db.is_some();
    #[cfg(not(feature = "postgres"))]
    let persistent = {
        let _ = state;
        false
    };

    if !persistent {
        tracing::warn!(
            "No database configured; demo data will be discarded when this command exits. \
             Use start-demo to seed and serve in one process."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use blogicum_infra::{InMemoryStore, JwtConfig};
    use crate::observability::REQUEST_ID_HEADER;
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing::span::{Attributes, Id};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::{LookupSpan, Registry};

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["blogicum-server"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn start_demo_flags() {
        let cli = Cli::try_parse_from([
            "blogicum-server",
            "start-demo",
            "--addr",
            "0.0.0.0:9000",
            "--keep-data",
        ])
        .unwrap();

        match cli.command {
            Some(Command::StartDemo { addr, keep_data }) => {
                assert_eq!(addr, "0.0.0.0:9000");
                assert!(keep_data);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn seed_demo_clears_by_default() {
        let cli = Cli::try_parse_from(["blogicum-server", "seed-demo"]).unwrap();
        assert!(matches!(cli.command, Some(Command::SeedDemo { keep: false })));
    }

    /// Records every new span's name with its parent's name.
    #[derive(Clone, Default)]
    struct SpanTree(Arc<Mutex<Vec<(String, Option<String>)>>>);

    impl<S> Layer<S> for SpanTree
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let parent = ctx
                .span(id)
                .and_then(|span| span.parent())
                .map(|parent| parent.name().to_string());
            self.0
                .lock()
                .unwrap()
                .push((attrs.metadata().name().to_string(), parent));
        }
    }

    fn test_state() -> AppState {
        let jwt = JwtConfig {
            secret: "main-test-secret".to_string(),
            ..JwtConfig::default()
        };
        let root = std::env::temp_dir().join("blogicum-main-tests");
        AppState::with_repositories(
            InMemoryStore::new().repositories(),
            10,
            jwt,
            root.join("media"),
            root.join("static"),
        )
    }

    #[actix_web::test]
    async fn http_span_is_opened_inside_request_id_span() {
        let tree = SpanTree::default();
        let _guard = tracing::subscriber::set_default(Registry::default().with(tree.clone()));

        let app = actix_test::init_service(app(test_state())).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/health")
            .insert_header((REQUEST_ID_HEADER, "trace-me"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-me");

        let spans = tree.0.lock().unwrap().clone();
        let http = spans
            .iter()
            .find(|(name, _)| name == "HTTP request")
            .expect("TracingLogger opens a root span");
        assert_eq!(http.1.as_deref(), Some("request"));
    }
}

//! High-level server API over axum
//!
//! [`Server`] is the explicit, process-wide HTTP server object: constructed
//! once at startup, routes registered against it, then started with a defined
//! shutdown path (Ctrl+C or [`Server::shutdown`], both via a
//! `CancellationToken` driving axum's graceful shutdown).
//!
//! Route registration:
//! - [`Server::add_route`] — JSON endpoint from an async closure
//! - [`Server::add_router`] — mount an axum sub-router
//! - [`Server::add_openapi`] — mount an API router under `/api` with
//!   Swagger UI and the OpenAPI JSON document
//! - [`Server::add_spa`] — serve an embedded single-page client

use axum::routing::get;
use axum::{Json, Router};
use axum_embed::ServeEmbed;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::get_config;

/// Serializable server identity
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub http_port: u16,
}

/// The HTTP server object
pub struct Server {
    name: String,
    base_url: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    shutdown: CancellationToken,
    join_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Create a new server instance
    ///
    /// # Arguments
    ///
    /// * `name` - Server name (for logs)
    /// * `base_url` - Display URL (e.g. "http://localhost:3000")
    /// * `http_port` - HTTP port to listen on
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            shutdown: CancellationToken::new(),
            join_handle: None,
        }
    }

    /// Create a server from the global configuration
    pub fn new_configured() -> Self {
        let config = get_config();
        Self::new("tubegrab", config.base_url(), config.http_port())
    }

    /// Add a JSON route backed by an async closure
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use tubeserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "http://localhost:3000", 3000);
    /// server.add_route("/info", || async {
    ///     serde_json::json!({ "status": "online" })
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler = {
            let f = f.clone();
            move || {
                let f = f.clone();
                async move { Json(f().await) }
            }
        };

        self.merge_at(path, Router::new().route("/", get(handler)))
            .await;
    }

    /// Mount a sub-router
    ///
    /// Merged directly when `path` is "/", nested otherwise.
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        self.merge_at(path, sub_router).await;
    }

    /// Mount an API router under the public `/api` prefix together with its
    /// OpenAPI document
    ///
    /// The document is served at `/api-docs/{name}.json`, the Swagger UI at
    /// `/swagger-ui/{name}`.
    pub async fn add_openapi(
        &mut self,
        api_router: Router,
        openapi: utoipa::openapi::OpenApi,
        name: &str,
    ) {
        let swagger_path: &'static str = Box::leak(format!("/swagger-ui/{name}").into_boxed_str());
        let openapi_json_path: &'static str =
            Box::leak(format!("/api-docs/{name}.json").into_boxed_str());

        let swagger = SwaggerUi::new(swagger_path).url(openapi_json_path, openapi);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r)
            .nest("/api", api_router)
            .merge(swagger);
    }

    /// Serve an embedded single-page client
    ///
    /// Unknown paths fall back to `index.html` so client-side navigation
    /// keeps working.
    pub async fn add_spa<E>(&mut self, path: &str)
    where
        E: RustEmbed + Clone + Send + Sync + 'static,
    {
        let serve = ServeEmbed::<E>::with_parameters(
            Some("index.html".to_string()),
            axum_embed::FallbackBehavior::Ok,
            Some("index.html".to_string()),
        );

        self.merge_at(path, Router::new().fallback_service(serve))
            .await;
    }

    /// Start the HTTP server
    ///
    /// Binds the listening socket, then serves on a background task until
    /// Ctrl+C or [`Server::shutdown`] cancels it. In-flight connections are
    /// drained gracefully.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = TcpListener::bind(addr).await?;
        info!(
            "{} listening on {} ({})",
            self.name,
            listener.local_addr()?,
            self.base_url
        );

        let router = self.router.read().await.clone();
        let token = self.shutdown.clone();

        let ctrl_c_token = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = ctrl_c_token.cancelled() => {}
                result = signal::ctrl_c() => {
                    if result.is_ok() {
                        info!("Ctrl+C received, shutting down");
                    }
                    ctrl_c_token.cancel();
                }
            }
        });

        self.join_handle = Some(tokio::spawn(async move {
            let serve = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!("server error: {e}");
            }
        }));

        Ok(())
    }

    /// Request a graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the server task to finish
    pub async fn wait(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }

    /// Server identity
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            http_port: self.http_port,
        }
    }

    async fn merge_at(&mut self, path: &str, route: Router) {
        let mut r = self.router.write().await;
        *r = if path == "/" {
            std::mem::take(&mut *r).merge(route)
        } else {
            std::mem::take(&mut *r).nest(path, route)
        };
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
}

impl ServerBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
        }
    }

    /// Builder seeded from the global configuration
    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: "tubegrab".to_string(),
            base_url: config.base_url().to_string(),
            http_port: config.http_port(),
        }
    }

    /// Build the server
    pub fn build(self) -> Server {
        Server::new(self.name, self.base_url, self.http_port)
    }
}

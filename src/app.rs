//! Application assembly: controllers, global handlers, hooks and bootstrap.
//!
//! # Data Flow
//! ```text
//! Rester::new(config)
//!     → controller(...)                (route definitions)
//!     → add_handlers(...)              (global chain, default: exception + logger)
//!     → on_startup(...)                (hooks)
//!     → bootstrap()
//!         → run hooks → build HandlerPool (register, init handlers)
//!         → bind every address → serve until shutdown
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::ResterConfig;
use crate::error::{BoxError, StartupError};
use crate::handlers::{CorsHandler, ExceptionHandler, LoggerHandler};
use crate::http::HttpServer;
use crate::lifecycle::{run_hooks, Shutdown, StartupHook};
use crate::net::bind_all;
use crate::pipeline::handler::dedup_handlers;
use crate::pipeline::{Handler, HandlerPool, HandlerSetup};
use crate::routing::{RegisterMode, RouteDefinition, RouteRegistry};

/// A group of routes sharing a path prefix and a handler list.
#[derive(Clone)]
pub struct Controller {
    name: String,
    prefix: String,
    handlers: Vec<Arc<dyn Handler>>,
    routes: Vec<RouteDefinition>,
}

impl Controller {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            handlers: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Path prefix joined in front of every route pattern.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Handler applied to every route of this controller, before route handlers.
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn route(mut self, route: RouteDefinition) -> Self {
        self.routes.push(route);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route definitions with the prefix applied and controller handlers merged.
    pub fn definitions(&self) -> Vec<RouteDefinition> {
        self.routes
            .iter()
            .cloned()
            .map(|mut route| {
                route.pattern = join_prefix(&self.prefix, &route.pattern);
                route.handlers = dedup_handlers(self.handlers.iter().chain(&route.handlers));
                route
            })
            .collect()
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("routes", &self.routes.len())
            .finish()
    }
}

fn join_prefix(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return pattern.to_string();
    }
    let prefix = prefix.trim_start_matches('/');
    let pattern = pattern.trim_start_matches('/');
    if pattern.is_empty() {
        format!("/{}", prefix)
    } else {
        format!("/{}/{}", prefix, pattern)
    }
}

/// Builder and entry point of a server application.
pub struct Rester {
    config: ResterConfig,
    handlers: Vec<Arc<dyn Handler>>,
    controllers: Vec<Controller>,
    hooks: Vec<StartupHook>,
    register_mode: RegisterMode,
}

impl Rester {
    /// New application with the default global chain: exception, then logger.
    pub fn new(config: ResterConfig) -> Self {
        Self {
            config,
            handlers: vec![Arc::new(ExceptionHandler), Arc::new(LoggerHandler)],
            controllers: Vec::new(),
            hooks: Vec::new(),
            register_mode: RegisterMode::Reject,
        }
    }

    pub fn config(&self) -> &ResterConfig {
        &self.config
    }

    /// Clear the global handler list, including the defaults.
    pub fn reset_handlers(mut self) -> Self {
        self.handlers.clear();
        self
    }

    /// Append global handlers; a handler already present is not added twice.
    pub fn add_handlers(mut self, handlers: impl IntoIterator<Item = Arc<dyn Handler>>) -> Self {
        let added: Vec<_> = handlers.into_iter().collect();
        self.handlers = dedup_handlers(self.handlers.iter().chain(&added));
        self
    }

    pub fn add_handler(self, handler: Arc<dyn Handler>) -> Self {
        self.add_handlers([handler])
    }

    /// CORS handler configured from the `[cors]` table.
    pub fn cors_handler(&self) -> Result<Arc<CorsHandler>, StartupError> {
        Ok(Arc::new(CorsHandler::new(&self.config.cors)?))
    }

    pub fn controller(mut self, controller: Controller) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Replace existing routes instead of rejecting duplicates.
    pub fn register_mode(mut self, mode: RegisterMode) -> Self {
        self.register_mode = mode;
        self
    }

    /// Run `f` once before any listener is bound.
    pub fn on_startup<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.hooks.push(StartupHook::new(name, f));
        self
    }

    /// Register every route, initialize every distinct handler once and
    /// freeze the result into a pool.
    pub fn build(&self) -> Result<HandlerPool, StartupError> {
        let mut registry = RouteRegistry::new();
        for controller in &self.controllers {
            for definition in controller.definitions() {
                registry.register_with(definition, self.register_mode)?;
            }
            tracing::debug!(controller = %controller.name, "Controller registered");
        }

        let distinct = dedup_handlers(
            self.handlers
                .iter()
                .chain(registry.routes().iter().flat_map(|r| r.handlers())),
        );
        let global: Vec<_> = self.handlers.iter().map(|h| h.id()).collect();
        for handler in &distinct {
            let mut setup = HandlerSetup::new(&mut registry, &global);
            handler.init(&mut setup)?;
        }

        tracing::info!(
            routes = registry.len(),
            handlers = ?global,
            "Handler pool ready"
        );
        Ok(HandlerPool::new(
            registry,
            self.handlers.clone(),
            self.config.limits.max_body_bytes,
        ))
    }

    /// Run hooks, build the pool and bind every address, then start serving.
    ///
    /// Nothing is bound if a hook or registration fails.
    pub async fn start(self, shutdown: &Shutdown) -> Result<Running, StartupError> {
        run_hooks(&self.hooks).await?;
        let pool = Arc::new(self.build()?);
        let bound = bind_all(&self.config).await?;
        if bound.is_empty() {
            tracing::warn!("No listening addresses configured");
        }

        let server = HttpServer::new(pool, &self.config);
        let mut addresses = Vec::with_capacity(bound.len());
        let mut tasks = JoinSet::new();
        for address in bound {
            addresses.push(address.local_addr);
            tasks.spawn(server.clone().serve(address, shutdown.subscribe()));
        }

        Ok(Running {
            addresses,
            tasks,
            shutdown: shutdown.clone(),
        })
    }

    /// Start and serve until every server instance has stopped.
    pub async fn bootstrap(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        self.start(shutdown).await?.wait().await
    }
}

/// Server instances started by [`Rester::start`].
pub struct Running {
    addresses: Vec<SocketAddr>,
    tasks: JoinSet<Result<(), StartupError>>,
    shutdown: Shutdown,
}

impl Running {
    /// Bound local addresses, in configuration order.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.addresses
    }

    /// Wait for every instance; the first failure stops the others.
    pub async fn wait(mut self) -> Result<(), StartupError> {
        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Server instance failed");
                    self.shutdown.trigger();
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Server task aborted");
                    self.shutdown.trigger();
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

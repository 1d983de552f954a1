//! Startup hooks.
//!
//! Hooks run once, in registration order, before routes are bound to
//! listeners. Typical uses are opening database pools or warming caches.

use futures_util::future::BoxFuture;

use crate::error::{BoxError, StartupError};

type HookFn = Box<dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// A named asynchronous startup task.
pub struct StartupHook {
    name: String,
    run: HookFn,
}

impl StartupHook {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(move || Box::pin(f())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for StartupHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupHook").field("name", &self.name).finish()
    }
}

/// Run every hook in order, stopping at the first failure.
pub async fn run_hooks(hooks: &[StartupHook]) -> Result<(), StartupError> {
    for hook in hooks {
        tracing::info!(hook = %hook.name, "Running startup hook");
        (hook.run)().await.map_err(|source| {
            tracing::error!(hook = %hook.name, error = %source, "Startup hook failed");
            StartupError::Hook {
                name: hook.name.clone(),
                source,
            }
        })?;
    }
    Ok(())
}

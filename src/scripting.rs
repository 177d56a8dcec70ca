//! Process-wide script-engine pool.
//!
//! Script-evaluating modules obtain engines from a global registry of named
//! factories with an optional default. The registry belongs to embedder
//! configuration: the execution path never touches it, and [`reset_engines`]
//! exists so an embedder can reconfigure between runs.

use dashmap::DashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// A script engine instance owned by one module invocation.
pub trait ScriptEngine: Send {
    /// Evaluate a script source.
    fn run(&mut self, source: &str) -> anyhow::Result<()>;
}

/// Creates script engines on demand.
pub trait ScriptEngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn ScriptEngine>;
}

struct Registry {
    factories: DashMap<String, Arc<dyn ScriptEngineFactory>>,
    default_name: Mutex<Option<String>>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry {
        factories: DashMap::new(),
        default_name: Mutex::new(None),
    })
}

/// Register an engine factory under a name, replacing any prior registration.
pub fn register_engine(name: impl Into<String>, factory: Arc<dyn ScriptEngineFactory>) {
    registry().factories.insert(name.into(), factory);
}

/// Look up a registered factory by name.
pub fn engine(name: &str) -> Option<Arc<dyn ScriptEngineFactory>> {
    registry()
        .factories
        .get(name)
        .map(|entry| Arc::clone(entry.value()))
}

/// Set the default engine name.
pub fn set_default_engine(name: impl Into<String>) {
    *registry().default_name.lock().expect("engine registry lock") = Some(name.into());
}

/// The factory registered under the default name, if both exist.
pub fn default_engine() -> Option<Arc<dyn ScriptEngineFactory>> {
    let name = registry()
        .default_name
        .lock()
        .expect("engine registry lock")
        .clone()?;
    engine(&name)
}

/// Clear all registered factories and the default name. Idempotent.
pub fn reset_engines() {
    let registry = registry();
    registry.factories.clear();
    *registry.default_name.lock().expect("engine registry lock") = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopEngine;

    impl ScriptEngine for NoopEngine {
        fn run(&mut self, _source: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct NoopFactory;

    impl ScriptEngineFactory for NoopFactory {
        fn create(&self) -> Box<dyn ScriptEngine> {
            Box::new(NoopEngine)
        }
    }

    // Registry state is process-wide, so exercise the whole lifecycle in one
    // test rather than racing separate tests against each other.
    #[test]
    fn register_default_and_reset_lifecycle() {
        reset_engines();
        assert!(engine("js").is_none());
        assert!(default_engine().is_none());

        register_engine("js", Arc::new(NoopFactory));
        set_default_engine("js");

        assert!(engine("js").is_some());
        let factory = default_engine().expect("default engine");
        factory.create().run("1 + 1").unwrap();

        reset_engines();
        reset_engines(); // idempotent
        assert!(engine("js").is_none());
        assert!(default_engine().is_none());
    }
}

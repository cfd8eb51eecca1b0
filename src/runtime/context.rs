//! Run-scoped evaluation context.
//!
//! One `Context` is constructed per crawl and threaded explicitly through
//! template resolution and the execution loop; nothing about a run lives in
//! global state.

use std::sync::Arc;

use serde_json::Value;

use crate::{common::MemCache, model::RouteName, utils};

const CACHE_SIZE: usize = 1024;

/// Response cache plus environment metadata for one crawl run.
///
/// Responses are written once per route, immediately after that route
/// executes, and are only read by templates of routes scheduled later.
#[derive(Clone)]
pub struct Context {
    run_id: String,
    env: Arc<MemCache<String, String>>,
    responses: Arc<MemCache<RouteName, Value>>,
}

impl Context {
    pub fn new() -> Self {
        let env = Arc::new(MemCache::new(CACHE_SIZE));
        // `$process.env.NAME` references read a snapshot of the process
        // environment taken when the run starts.
        for (key, value) in std::env::vars() {
            env.set(key, value);
        }

        Self {
            run_id: utils::longid(),
            env,
            responses: Arc::new(MemCache::new(CACHE_SIZE)),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn env(&self) -> Arc<MemCache<String, String>> {
        self.env.clone()
    }

    pub fn responses(&self) -> Arc<MemCache<RouteName, Value>> {
        self.responses.clone()
    }

    /// Record the payload a route produced.
    pub fn add_response(
        &self,
        name: RouteName,
        value: Value,
    ) {
        self.responses.set(name, value);
    }

    /// The payload a route produced, if it has executed.
    pub fn response(
        &self,
        name: &str,
    ) -> Option<Value> {
        self.responses.get(&name.to_string())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

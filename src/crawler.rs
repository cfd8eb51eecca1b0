//! The crawler - the main entry point for Apiflow.
//!
//! One `run` drives a full pass over a specification:
//! build the dependency graph, validate it, schedule it, then execute the
//! queue one route at a time, feeding every captured response back into the
//! response cache and the spec's schema definitions. There are no retries
//! and no recovery; the first fatal error aborts the remainder of the queue.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    ApiflowError, Result,
    config::Config,
    graph::{self, DependencyGraph},
    model::{RequestData, SpecModel},
    runtime::{Context, template},
    schema::{self, Definitions, SchemaStore},
    transport::{HttpTransport, Transport, TransportRequest, TransportResponse},
    utils,
};

/// Everything a finished crawl hands back to the caller.
#[derive(Clone, Debug)]
pub struct CrawlReport {
    /// The specification, annotated with every schema inferred during the run.
    pub spec: SpecModel,
    /// Final body-definition map: seeds plus resolved request bodies.
    pub definitions: Definitions,
    /// The dependency graph, for inspection or visualization.
    pub graph: DependencyGraph,
    /// Run start, milliseconds since the epoch.
    pub started_at: i64,
    /// Run finish, milliseconds since the epoch.
    pub finished_at: i64,
}

/// Dependency-ordered API crawler.
///
/// # Example
///
/// ```rust,ignore
/// let crawler = CrawlerBuilder::new()
///     .base_url("http://localhost:3000")
///     .data_path(["data"])
///     .build()?;
///
/// let spec = SpecModel::from_json(&text)?;
/// let report = crawler.run(spec, Definitions::new()).await?;
/// println!("{}", report.spec.to_json()?);
/// ```
pub struct Crawler {
    config: Config,
    transport: Arc<dyn Transport>,
}

impl Crawler {
    /// Create a crawler with the default reqwest-backed transport.
    pub fn new(config: Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.request)?);
        Ok(Self {
            config,
            transport,
        })
    }

    /// Create a crawler that dispatches through a caller-supplied transport.
    pub fn with_transport(
        config: Config,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            transport,
        }
    }

    /// Crawl every named route of `spec` in dependency order.
    ///
    /// `seed` supplies example bodies for definitions not yet known from
    /// documentation; it is merged over examples recovered from the spec's
    /// own definitions section and returned, updated, in the report.
    pub async fn run(
        &self,
        spec: SpecModel,
        seed: Definitions,
    ) -> Result<CrawlReport> {
        let started_at = utils::time::time_millis();
        let mut spec = spec;

        let mut definitions = schema::example_map(spec.definitions());
        definitions.extend(seed);

        let mut graph = graph::build(&spec, &definitions, self.config.mode)?;
        graph::validate(&mut graph)?;
        let queue = graph::topological_sort(&graph)?;

        let ctx = Context::new();
        let mut store = SchemaStore::new();
        store.seed(spec.definitions());

        info!("crawl {} dispatching {} routes in dependency order", ctx.run_id(), queue.len());

        for node in queue {
            let request = graph.get(&node).expect("scheduled node exists in the graph").request.clone();
            self.execute(&mut spec, &mut store, &mut definitions, &ctx, &request).await?;
        }

        info!("crawl {} completed", ctx.run_id());

        Ok(CrawlReport {
            spec,
            definitions,
            graph,
            started_at,
            finished_at: utils::time::time_millis(),
        })
    }

    /// Resolve and dispatch one scheduled route.
    async fn execute(
        &self,
        spec: &mut SpecModel,
        store: &mut SchemaStore,
        definitions: &mut Definitions,
        ctx: &Context,
        request: &RequestData,
    ) -> Result<()> {
        let api_route = template::resolve_route(ctx, &request.api_route)?;
        let body = request.request_body.as_ref().map(|b| template::resolve_value(ctx, b)).transpose()?;

        // Dependents infer against the resolved body even before the round
        // trip completes.
        if request.method.has_body() {
            if let (Some(body), Some(name)) = (&body, &request.definition_name) {
                definitions.insert(name.clone(), body.clone());
            }
        }

        debug!("dispatching {} {}", request.method.as_upper(), api_route);

        let response = match self
            .transport
            .send(TransportRequest {
                method: request.method,
                url: api_route,
                body,
            })
            .await
        {
            Ok(response) => response,
            Err(ApiflowError::Transport { method, url, message, .. }) => {
                return Err(ApiflowError::Transport {
                    node: request.name.clone(),
                    method,
                    url,
                    message,
                });
            }
            Err(other) => return Err(other),
        };

        self.capture(spec, store, ctx, request, response)
    }

    /// Fold one response into the cache, the schema store and the spec.
    fn capture(
        &self,
        spec: &mut SpecModel,
        store: &mut SchemaStore,
        ctx: &Context,
        request: &RequestData,
        response: TransportResponse,
    ) -> Result<()> {
        if self.config.skip_statuses.contains(&response.status) {
            debug!("status {} on node {} excluded from schema inference", response.status, request.name);
            return Ok(());
        }

        let content_type = response.content_type().to_string();
        let reference = match spec.response_ref(&request.original_route, request.method, response.status, &content_type) {
            Some(reference) => reference,
            None => {
                if self.config.mode.is_strict() {
                    return Err(ApiflowError::Response(format!(
                        "response code not documented in spec: {} on {} {}",
                        response.status,
                        request.method.as_upper(),
                        request.original_route
                    )));
                }
                let minted = utils::shortid();
                warn!("response code not documented in spec: {}, minting definition '{}'", response.status, minted);
                spec.patch_response(&request.original_route, request.method, response.status, &content_type, &minted);
                minted
            }
        };

        let mut data = response.data;
        for key in &self.config.data_path {
            data = data
                .get(key)
                .cloned()
                .ok_or_else(|| ApiflowError::Response(format!("data path segment '{}' not present in response for node {}", key, request.name)))?;
        }

        ctx.add_response(request.name.clone(), data.clone());

        let node = store.observe(&reference, &data)?;
        spec.set_definition(&reference, &node)?;

        Ok(())
    }
}

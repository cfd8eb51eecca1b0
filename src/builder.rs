use std::sync::Arc;

use crate::{Config, Crawler, Mode, Result, transport::Transport};

/// Fluent construction of a [`Crawler`].
pub struct CrawlerBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for CrawlerBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            transport: None,
        }
    }
}

impl CrawlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    /// Base URL prepended to relative routes.
    pub fn base_url(
        mut self,
        base_url: impl Into<String>,
    ) -> Self {
        self.config.request.base_url = base_url.into();
        self
    }

    /// Add a default header sent with every request.
    pub fn header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.config.request.headers.insert(key.into(), value.into());
        self
    }

    /// Network timeout in milliseconds.
    pub fn timeout(
        mut self,
        timeout: u64,
    ) -> Self {
        self.config.request.timeout = timeout;
        self
    }

    /// Keys used to unwrap an envelope response down to its payload.
    pub fn data_path<I, S>(
        mut self,
        path: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.data_path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Validation mode.
    pub fn mode(
        mut self,
        mode: Mode,
    ) -> Self {
        self.config.mode = mode;
        self
    }

    /// Status codes excluded from schema inference.
    pub fn skip_statuses(
        mut self,
        statuses: impl IntoIterator<Item = u16>,
    ) -> Self {
        self.config.skip_statuses = statuses.into_iter().collect();
        self
    }

    /// Dispatch through a caller-supplied transport instead of the default
    /// reqwest-backed one.
    pub fn transport(
        mut self,
        transport: Arc<dyn Transport>,
    ) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Crawler> {
        match self.transport {
            Some(transport) => Ok(Crawler::with_transport(self.config, transport)),
            None => Crawler::new(self.config),
        }
    }
}

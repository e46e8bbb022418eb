use std::sync::Arc;

use embedworks_core::HostResolver;
use embedworks_fetcher::Fetcher;

use crate::bot::BotDetector;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    fetcher: Arc<dyn Fetcher>,
    resolver: Arc<HostResolver>,
    bots: BotDetector,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn Fetcher>, resolver: HostResolver, bots: BotDetector) -> Self {
        Self {
            fetcher,
            resolver: Arc::new(resolver),
            bots,
        }
    }

    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    pub fn resolver(&self) -> &HostResolver {
        &self.resolver
    }

    pub fn bots(&self) -> &BotDetector {
        &self.bots
    }
}

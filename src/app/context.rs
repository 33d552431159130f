use std::sync::Arc;

use url::Url;

use crate::app::error::Result;
use crate::config::Config;
use crate::export::RenderSettings;
use crate::fetcher::covers::CoverPool;
use crate::fetcher::http_fetcher::HttpTransport;
use crate::fetcher::paginated::PaginatedFetcher;
use crate::fetcher::Transport;

pub struct AppContext {
    pub config: Config,
    /// Site origin, parsed once.
    pub origin: Url,
    pub fetcher: PaginatedFetcher,
    pub covers: CoverPool,
    /// Origin and PDF font handed to the generators.
    pub settings: RenderSettings,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport + Send + Sync> =
            Arc::new(HttpTransport::new(&config.source)?);
        Self::with_transport(config, transport)
    }

    pub fn with_transport(
        config: Config,
        transport: Arc<dyn Transport + Send + Sync>,
    ) -> Result<Self> {
        let origin = Url::parse(&config.source.origin)?;
        let endpoint = origin.join(&config.source.endpoint)?;
        tracing::debug!("Using endpoint {}", endpoint);

        let fetcher = PaginatedFetcher::new(transport.clone(), endpoint, config.fetch.clone());
        let covers = CoverPool::new(transport, origin.clone());
        let settings = RenderSettings::from_config(&config)?;

        Ok(Self {
            config,
            origin,
            fetcher,
            covers,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ExportError;
    use crate::fetcher::mock::MockTransport;

    #[test]
    fn test_bad_origin_is_rejected() {
        let mut config = Config::default();
        config.source.origin = "not a url".into();
        let result = AppContext::with_transport(config, Arc::new(MockTransport::new()));
        assert!(matches!(result, Err(ExportError::InvalidUrl(_))));
    }

    #[test]
    fn test_default_origin() {
        let ctx = AppContext::with_transport(Config::default(), Arc::new(MockTransport::new()))
            .unwrap();
        assert_eq!(ctx.origin.as_str(), "https://bato.to/");
    }
}

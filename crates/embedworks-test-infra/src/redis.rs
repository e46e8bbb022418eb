use crate::{Result, TestInfraError};
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const REDIS_PORT: u16 = 6379;

#[derive(Debug, TypedBuilder)]
pub struct RedisConfig {
    #[builder(default = "redis".to_string(), setter(into))]
    image: String,
    #[builder(default = "7.4".to_string(), setter(into))]
    tag: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Test fixture for a disposable standalone Redis server.
///
/// The container is stopped when the fixture is dropped.
pub struct RedisServer {
    container: ContainerAsync<GenericImage>,
}

impl RedisServer {
    pub async fn start() -> Result<Self> {
        Self::with_config(RedisConfig::default()).await
    }

    pub async fn with_config(config: RedisConfig) -> Result<Self> {
        let image = format!("{}:{}", config.image, config.tag);
        let container = GenericImage::new(config.image, config.tag)
            .with_exposed_port(REDIS_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .start()
            .await
            .map_err(|source| TestInfraError::Start { image, source })?;
        Ok(Self { container })
    }

    pub async fn host(&self) -> Result<String> {
        let host = self
            .container
            .get_host()
            .await
            .map_err(TestInfraError::Endpoint)?
            .to_string();
        Ok(match host.as_str() {
            "localhost" => String::from("127.0.0.1"),
            _ => host,
        })
    }

    pub async fn port(&self) -> Result<u16> {
        self.container
            .get_host_port_ipv4(REDIS_PORT)
            .await
            .map_err(TestInfraError::Endpoint)
    }

    /// Connection URL of the running server, e.g. `redis://127.0.0.1:32768`.
    pub async fn url(&self) -> Result<String> {
        Ok(format!("redis://{}:{}", self.host().await?, self.port().await?))
    }

    /// Opens a fresh multiplexed connection to the server.
    pub async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let url = self.url().await?;
        let connect = |source| TestInfraError::Connect {
            url: url.clone(),
            source,
        };
        let client = redis::Client::open(url.as_str()).map_err(connect)?;
        client.get_multiplexed_async_connection().await.map_err(connect)
    }

    /// Returns the underlying container reference.
    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }
}

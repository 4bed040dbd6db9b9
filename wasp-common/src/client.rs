use std::sync::Arc;
use url::Url;
use crate::config::{ClientConfig, LogLevel, NetworkMode, WaspBuilder};
use crate::dispatch::{Dispatcher, ServiceContract, ServiceDefinition};
use crate::error::Result;
use crate::parser::Parser;

/// Wasp 客户端
///
/// 持有构建完成的配置，可克隆；每次 `create` 产生一个绑定到服务契约的调度器。
///
/// ```no_run
/// use wasp_common::{Wasp, LogLevel};
///
/// # fn main() -> wasp_common::Result<()> {
/// let wasp = Wasp::builder()
///     .set_endpoint("https://api.example.com")?
///     .set_log_level(LogLevel::FullRestOnly)
///     .build()?;
/// # let _ = wasp;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Wasp {
    config: Arc<ClientConfig>,
}

impl std::fmt::Debug for Wasp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wasp")
            .field("endpoint", &self.config.endpoint.as_str())
            .field("log_level", &self.config.log_level)
            .field("network_mode", &self.config.network_mode)
            .field("interceptors", &self.config.interceptors.len())
            .finish()
    }
}

impl Wasp {
    pub fn builder() -> WaspBuilder {
        WaspBuilder::new()
    }

    pub(crate) fn from_config(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 创建由 `#[service]` 生成的客户端
    pub fn create<S: ServiceContract>(&self) -> Result<S> {
        let dispatcher = Dispatcher::for_contract::<S>(self.config.clone())?;
        Ok(S::from_dispatcher(dispatcher))
    }

    /// 根据运行时模板表创建调度器，所有模板在此处校验
    pub fn create_dynamic(&self, definition: ServiceDefinition) -> Result<Dispatcher> {
        Dispatcher::for_definition(self.config.clone(), definition)
    }

    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    pub fn log_level(&self) -> LogLevel {
        self.config.log_level
    }

    pub fn network_mode(&self) -> NetworkMode {
        self.config.network_mode
    }

    pub fn parser(&self) -> &dyn Parser {
        self.config.parser.as_ref()
    }

    pub fn default_parser(&self) -> &dyn Parser {
        self.config.default_parser.as_ref()
    }
}

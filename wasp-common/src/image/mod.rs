//! 图片加载协作者
//!
//! 只负责获取与缓存原始字节，解码与显示交给调用方。

pub mod cache;

use std::sync::{Arc, OnceLock};
use async_trait::async_trait;
use bytes::Bytes;
use crate::config::LogLevel;
use crate::error::{Error, Result, TransportError, TransportErrorKind};

pub use cache::ImageCache;

/// 图片来源
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// `size` 为期望的宽高，仅作为提示
    async fn fetch(&self, path: &str, size: Option<(u32, u32)>) -> Result<Bytes>;
}

/// 通过 HTTP 获取图片
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, path: &str, _size: Option<(u32, u32)>) -> Result<Bytes> {
        let url = url::Url::parse(path)
            .map_err(|e| Error::configuration(format!("invalid image url `{path}`: {e}")))?;
        let transport_error = |e: reqwest::Error| {
            let kind = if e.is_timeout() {
                TransportErrorKind::Timeout
            } else if e.is_connect() {
                TransportErrorKind::Connect
            } else {
                TransportErrorKind::Io
            };
            Error::Transport(TransportError::new(kind, url.clone(), e.to_string()).with_source(e))
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(transport_error)?;
        response.bytes().await.map_err(transport_error)
    }
}

/// 图片处理器，可显式构造和传递
#[derive(Clone)]
pub struct ImageHandler {
    fetcher: Arc<dyn ImageFetcher>,
    cache: Arc<ImageCache>,
    log_level: LogLevel,
}

impl Default for ImageHandler {
    fn default() -> Self {
        Self::new(HttpImageFetcher::default())
    }
}

impl std::fmt::Debug for ImageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandler")
            .field("cached", &self.cache.len())
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ImageHandler {
    pub fn new(fetcher: impl ImageFetcher + 'static) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            cache: Arc::new(ImageCache::default()),
            log_level: LogLevel::None,
        }
    }

    pub fn with_cache(mut self, cache: ImageCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn load(&self, path: &str) -> Result<ImageRequest> {
        if path.trim().is_empty() {
            return Err(Error::configuration("image path must not be empty"));
        }
        Ok(ImageRequest {
            handler: self.clone(),
            path: path.to_string(),
            size: None,
            placeholder: None,
            error_image: None,
        })
    }

    /// 清空缓存，之后的加载会重新获取
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// 单次图片加载
#[must_use = "an image request does nothing until `fetch` is awaited"]
#[derive(Debug)]
pub struct ImageRequest {
    handler: ImageHandler,
    path: String,
    size: Option<(u32, u32)>,
    placeholder: Option<Bytes>,
    error_image: Option<Bytes>,
}

impl ImageRequest {
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn placeholder(mut self, image: impl Into<Bytes>) -> Self {
        self.placeholder = Some(image.into());
        self
    }

    pub fn error_image(mut self, image: impl Into<Bytes>) -> Self {
        self.error_image = Some(image.into());
        self
    }

    /// 加载完成前可先显示的占位图
    pub fn placeholder_image(&self) -> Option<&Bytes> {
        self.placeholder.as_ref()
    }

    fn cache_key(&self) -> String {
        match self.size {
            Some((width, height)) => format!("{}#{}x{}", self.path, width, height),
            None => self.path.clone(),
        }
    }

    /// 先查缓存，未命中时获取并写入缓存；失败时若设置了错误图则返回错误图
    pub async fn fetch(self) -> Result<Bytes> {
        let key = self.cache_key();
        let log_images = self.handler.log_level.logs_images();

        if let Some(image) = self.handler.cache.get(&key) {
            if log_images {
                log::info!("image {} served from cache ({} bytes)", key, image.len());
            }
            return Ok(image);
        }

        match self.handler.fetcher.fetch(&self.path, self.size).await {
            Ok(image) => {
                if log_images {
                    log::info!("image {} fetched ({} bytes)", key, image.len());
                }
                self.handler.cache.put(key, image.clone());
                Ok(image)
            }
            Err(err) => match self.error_image {
                Some(fallback) => {
                    log::warn!("image {} failed to load, using error image: {}", key, err);
                    Ok(fallback)
                }
                None => Err(err),
            },
        }
    }
}

static GLOBAL: OnceLock<ImageHandler> = OnceLock::new();

/// 进程级的便捷入口，首次使用时惰性初始化
pub struct Image;

impl Image {
    /// 只能在首次使用前调用一次
    pub fn init(handler: ImageHandler) -> Result<()> {
        GLOBAL
            .set(handler)
            .map_err(|_| Error::configuration("the global image handler is already initialized"))
    }

    pub fn load(path: &str) -> Result<ImageRequest> {
        GLOBAL.get_or_init(ImageHandler::default).load(path)
    }

    /// 尚未初始化时什么也不做
    pub fn clear_cache() {
        if let Some(handler) = GLOBAL.get() {
            handler.clear_cache();
        }
    }

    pub fn is_initialized() -> bool {
        GLOBAL.get().is_some()
    }
}

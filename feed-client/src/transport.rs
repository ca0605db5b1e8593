use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};

/// Одна попытка GET-запроса, возвращающая JSON.
///
/// Реализация не обязана ограничивать время ответа и не должна сама
/// повторять запрос: этим занимается [`RetryingTransport`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Выполняет запрос по `url`; ответ вне 2xx считается ошибкой.
    async fn get_json(&self, url: &str) -> FeedResult<Value>;
}

#[derive(Debug, Clone)]
/// `Fetcher` поверх `reqwest`.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Создаёт HTTP-клиент без собственных таймаутов: время попытки
    /// ограничивает только [`RetryingTransport`].
    pub fn new() -> FeedResult<Self> {
        let client = Client::builder().build().map_err(FeedError::Network)?;
        Ok(Self { client })
    }

    /// Оборачивает уже настроенный `reqwest::Client`.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_json(&self, url: &str) -> FeedResult<Value> {
        let response = self
            .client
            .request(Method::GET, url)
            .send()
            .await
            .map_err(FeedError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http {
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(FeedError::from_reqwest)
    }
}

#[derive(Debug, Clone)]
/// Транспорт с жёстким таймаутом на попытку и фиксированной паузой между повторами.
pub struct RetryingTransport<F> {
    fetcher: F,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl<F: Fetcher> RetryingTransport<F> {
    /// Создаёт транспорт с параметрами из конфигурации.
    pub fn new(fetcher: F, config: &FeedConfig) -> Self {
        Self {
            fetcher,
            timeout: config.request_timeout,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    /// Выполняет запрос, делая не более `max_retries + 1` попыток.
    ///
    /// Любая ошибка попытки (таймаут, статус вне 2xx, сеть) ведёт к повтору,
    /// пока бюджет не исчерпан; затем наружу уходит последняя ошибка.
    pub async fn fetch(&self, url: &str) -> FeedResult<Value> {
        let mut attempt = 0;

        loop {
            match self.fetch_with_timeout(url).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(url, attempts = attempt + 1, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        url,
                        error = %err,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = self.retry_delay.as_millis() as u64,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    error!(
                        url,
                        error = %err,
                        attempts = attempt + 1,
                        "request failed after all retry attempts"
                    );
                    return Err(err);
                }
            }
        }
    }

    // Проигравший гонку запрос отбрасывается вместе с future.
    async fn fetch_with_timeout(&self, url: &str) -> FeedResult<Value> {
        match tokio::time::timeout(self.timeout, self.fetcher.get_json(url)).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout(self.timeout)),
        }
    }
}

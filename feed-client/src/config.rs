use std::time::Duration;

/// Базовый URL публичного API с постами.
pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Параметры конвейера загрузки ленты.
///
/// Значение передаётся в конструкторы явно; глобального состояния нет.
pub struct FeedConfig {
    /// Базовый URL API, например `https://dummyjson.com`.
    pub base_url: String,
    /// Жёсткий таймаут одной попытки запроса.
    pub request_timeout: Duration,
    /// Сколько раз повторять запрос после первой неудачи.
    pub max_retries: u32,
    /// Фиксированная пауза перед каждой повторной попыткой.
    pub retry_delay: Duration,
    /// Максимум одновременно загружаемых постов.
    pub max_concurrent: usize,
    /// Время жизни записи в кэше ответов.
    pub cache_ttl: Duration,
    /// Количество постов на странице.
    pub page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(4000),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            max_concurrent: 3,
            cache_ttl: Duration::from_secs(5 * 60),
            page_size: 5,
        }
    }
}

impl FeedConfig {
    /// Создаёт конфигурацию с настройками по умолчанию и указанным базовым URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

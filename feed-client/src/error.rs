use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `feed-client`.
pub enum FeedError {
    /// Таймер истёк раньше, чем пришёл ответ сервера.
    #[error("request timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Сервер ответил статусом вне диапазона 2xx.
    #[error("http status {status}")]
    Http {
        /// HTTP-статус ответа.
        status: u16,
    },

    /// Ошибка сетевого уровня (`reqwest`).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Тело ответа не удалось разобрать в ожидаемую модель.
    #[error("decode error: {0}")]
    Decode(String),

    /// Не удалось загрузить список постов при инициализации ленты.
    #[error("failed to initialize posts: {0}")]
    Initialization(#[source] Box<FeedError>),
}

/// Результат операций `feed-client`.
pub type FeedResult<T> = Result<T, FeedError>;

impl FeedError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Http {
                status: status.as_u16(),
            };
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Network(err)
    }

    pub(crate) fn initialization(cause: FeedError) -> Self {
        Self::Initialization(Box::new(cause))
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

//! Клиентская библиотека для загрузки ленты постов с комментариями.
//!
//! Конвейер состоит из слоёв:
//! - `ResponseCache` — in-memory кэш ответов с TTL;
//! - `RetryingTransport` — таймаут на попытку и фиксированное число повторов;
//! - `FeedApi` — «взять из кэша или загрузить» по URL запроса;
//! - `throttle` — выполнение задач с ограничением одновременно работающих;
//! - `PostFeed` — отсортированная по лайкам лента, отдаваемая постранично.
//!
//! Слой отображения получает от `PostFeed` готовые страницы (`PageResult`)
//! и сам решает, когда запросить следующую.
#![warn(missing_docs)]

mod api;
mod cache;
mod config;
mod error;
mod feed;
mod models;
mod throttle;
mod transport;

pub use api::FeedApi;
pub use cache::ResponseCache;
pub use config::{DEFAULT_BASE_URL, FeedConfig};
pub use error::{FeedError, FeedResult};
pub use feed::PostFeed;
pub use models::{Comment, PageResult, PostDetail, PostSummary, Reactions};
pub use throttle::throttle;
pub use transport::{Fetcher, HttpFetcher, RetryingTransport};

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::models::{Comment, PostDetail, PostSummary};
use crate::transport::{Fetcher, HttpFetcher, RetryingTransport};

#[derive(Debug, Deserialize)]
struct ListPostsResponseDto {
    posts: Vec<PostSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostDetailsDto {
    id: i64,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CommentsResponseDto {
    comments: Vec<CommentDto>,
}

#[derive(Debug, Deserialize)]
struct CommentDto {
    body: String,
    user: CommentUserDto,
}

#[derive(Debug, Deserialize)]
struct CommentUserDto {
    username: String,
}

impl From<CommentDto> for Comment {
    fn from(value: CommentDto) -> Self {
        Self {
            author_username: value.user.username,
            body: value.body,
        }
    }
}

impl PostDetailsDto {
    // Реакции берутся из краткой записи: по ним отсортирована лента.
    pub(crate) fn into_detail(self, summary: &PostSummary, comments: Vec<Comment>) -> PostDetail {
        PostDetail {
            id: self.id,
            title: self.title,
            body: self.body,
            tags: self.tags,
            reactions: summary.reactions,
            views: self.views,
            user_id: self.user_id,
            comments,
            error: false,
        }
    }
}

#[derive(Debug)]
/// Точка входа «взять из кэша или загрузить» для API ленты.
///
/// Ключ кэша — полный URL запроса. Попадание в кэш не обращается к сети;
/// промах идёт в [`RetryingTransport`], и только успешный ответ попадает в кэш.
pub struct FeedApi<F = HttpFetcher> {
    config: FeedConfig,
    cache: Arc<ResponseCache<Value>>,
    transport: RetryingTransport<F>,
}

impl FeedApi<HttpFetcher> {
    /// Создаёт клиент поверх `reqwest` с собственным кэшем.
    pub fn http(config: FeedConfig) -> FeedResult<Self> {
        let cache = Arc::new(ResponseCache::new(config.cache_ttl));
        Ok(Self::new(config, HttpFetcher::new()?, cache))
    }
}

impl<F: Fetcher> FeedApi<F> {
    /// Создаёт клиент с явно переданными транспортом и кэшем.
    pub fn new(config: FeedConfig, fetcher: F, cache: Arc<ResponseCache<Value>>) -> Self {
        let transport = RetryingTransport::new(fetcher, &config);
        Self {
            config,
            cache,
            transport,
        }
    }

    /// Конфигурация клиента.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Общий кэш ответов.
    pub fn cache(&self) -> &Arc<ResponseCache<Value>> {
        &self.cache
    }

    /// Очищает кэш ответов.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Возвращает JSON по `url` из кэша или из сети.
    pub async fn fetch(&self, url: &str) -> FeedResult<Value> {
        if let Some(cached) = self.cache.get(url) {
            debug!(url, "cache hit");
            return Ok(cached);
        }

        debug!(url, "cache miss");
        let value = self.transport.fetch(url).await?;
        self.cache.set(url, value.clone());
        Ok(value)
    }

    /// Загружает полный список постов `GET /posts` в порядке сервера.
    pub async fn fetch_posts(&self) -> FeedResult<Vec<PostSummary>> {
        let dto: ListPostsResponseDto = self.fetch_typed("/posts").await?;
        Ok(dto.posts)
    }

    /// Загружает комментарии поста `GET /comments/post/{id}`.
    pub async fn fetch_post_comments(&self, post_id: i64) -> FeedResult<Vec<Comment>> {
        let dto: CommentsResponseDto = self
            .fetch_typed(&format!("/comments/post/{post_id}"))
            .await?;
        Ok(dto.comments.into_iter().map(Comment::from).collect())
    }

    pub(crate) async fn fetch_post_details(&self, post_id: i64) -> FeedResult<PostDetailsDto> {
        self.fetch_typed(&format!("/posts/{post_id}")).await
    }

    async fn fetch_typed<T: DeserializeOwned>(&self, path: &str) -> FeedResult<T> {
        let url = self.config.endpoint(path);
        let value = self.fetch(&url).await?;
        serde_json::from_value(value).map_err(FeedError::from)
    }
}

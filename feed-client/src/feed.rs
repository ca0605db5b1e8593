use tracing::{error, info};

use crate::api::FeedApi;
use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::models::{PageResult, PostDetail, PostSummary};
use crate::throttle::throttle;
use crate::transport::{Fetcher, HttpFetcher};

#[derive(Debug, Default)]
struct PaginationState {
    sorted_summaries: Vec<PostSummary>,
    next_page_index: usize,
    ready: bool,
}

#[derive(Debug)]
/// Постраничная лента постов, отсортированная по убыванию лайков.
///
/// Один экземпляр обслуживает одну сессию просмотра. Вызовы
/// `load_next_page` должны идти последовательно, что обеспечивает `&mut self`.
pub struct PostFeed<F = HttpFetcher> {
    api: FeedApi<F>,
    state: PaginationState,
}

impl PostFeed<HttpFetcher> {
    /// Создаёт ленту поверх HTTP-клиента с настройками из `config`.
    pub fn http(config: FeedConfig) -> FeedResult<Self> {
        Ok(Self::new(FeedApi::http(config)?))
    }
}

impl<F: Fetcher> PostFeed<F> {
    /// Создаёт неинициализированную ленту.
    pub fn new(api: FeedApi<F>) -> Self {
        Self {
            api,
            state: PaginationState::default(),
        }
    }

    /// Клиент API, через который лента загружает данные.
    pub fn api(&self) -> &FeedApi<F> {
        &self.api
    }

    /// Загружен ли список постов.
    pub fn is_ready(&self) -> bool {
        self.state.ready
    }

    /// Общее количество постов в списке.
    pub fn total_posts(&self) -> usize {
        self.state.sorted_summaries.len()
    }

    /// Сколько страниц уже отдано.
    pub fn loaded_pages(&self) -> usize {
        self.state.next_page_index
    }

    /// Остались ли незагруженные посты.
    pub fn has_more(&self) -> bool {
        self.state.next_page_index * self.api.config().page_size < self.total_posts()
    }

    /// Загружает список постов, сортирует его и возвращает первую страницу.
    ///
    /// При ошибке загрузки списка лента остаётся в сброшенном состоянии, а
    /// ошибка оборачивается в [`FeedError::Initialization`].
    pub async fn initialize(&mut self) -> FeedResult<PageResult> {
        let mut summaries = match self.api.fetch_posts().await {
            Ok(summaries) => summaries,
            Err(err) => {
                self.reset();
                return Err(FeedError::initialization(err));
            }
        };

        // sort_by стабильна: при равных лайках сохраняется порядок сервера.
        summaries.sort_by(|a, b| b.reactions.likes.cmp(&a.reactions.likes));
        info!(total = summaries.len(), "post listing loaded");

        self.state = PaginationState {
            sorted_summaries: summaries,
            next_page_index: 0,
            ready: true,
        };

        Ok(self.load_next_page().await)
    }

    /// Догружает детали и комментарии для следующей страницы.
    ///
    /// За концом списка возвращает пустую страницу с `has_more == false`, не
    /// обращаясь к сети. Ошибка загрузки одного поста не прерывает страницу:
    /// вместо него возвращается деградированная запись.
    pub async fn load_next_page(&mut self) -> PageResult {
        let page_size = self.api.config().page_size;
        let total = self.state.sorted_summaries.len();
        let start = self.state.next_page_index.saturating_mul(page_size);
        if start >= total || page_size == 0 {
            return PageResult::end();
        }
        let end = (start + page_size).min(total);

        let api = &self.api;
        let tasks = self.state.sorted_summaries[start..end]
            .iter()
            .map(|summary| move || hydrate(api, summary));
        let posts = throttle(tasks, api.config().max_concurrent).await;

        self.state.next_page_index += 1;
        let has_more = self.has_more();
        info!(
            page = self.state.next_page_index,
            posts = posts.len(),
            degraded = posts.iter().filter(|post| post.error).count(),
            has_more,
            "page loaded"
        );

        PageResult { posts, has_more }
    }

    /// Сбрасывает ленту к исходному состоянию. Кэш ответов не очищается.
    pub fn reset(&mut self) {
        self.state = PaginationState::default();
    }
}

async fn hydrate<F: Fetcher>(api: &FeedApi<F>, summary: &PostSummary) -> PostDetail {
    // Оба запроса доводятся до конца, даже если один из них упал.
    let fetched = tokio::join!(
        api.fetch_post_details(summary.id),
        api.fetch_post_comments(summary.id)
    );

    match fetched {
        (Ok(details), Ok(comments)) => details.into_detail(summary, comments),
        (Err(err), _) | (_, Err(err)) => {
            error!(post_id = summary.id, error = %err, "failed to load post details");
            PostDetail::degraded(summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::cache::ResponseCache;

    #[derive(Clone, Default)]
    struct FakeApiServer {
        likes: Arc<Mutex<Vec<u64>>>,
        failing: Arc<Mutex<HashSet<String>>>,
        delays: Arc<Mutex<HashMap<String, Duration>>>,
        calls: Arc<Mutex<Vec<String>>>,
        in_flight: Arc<Mutex<(usize, usize)>>,
    }

    impl FakeApiServer {
        fn with_likes(likes: &[u64]) -> Self {
            let server = Self::default();
            *server.likes.lock().expect("likes mutex poisoned") = likes.to_vec();
            server
        }

        fn fail(&self, path: &str) {
            self.failing
                .lock()
                .expect("failing mutex poisoned")
                .insert(format!("http://api{path}"));
        }

        fn delay(&self, path: &str, delay: Duration) {
            self.delays
                .lock()
                .expect("delays mutex poisoned")
                .insert(format!("http://api{path}"), delay);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls mutex poisoned").clone()
        }

        fn peak_in_flight(&self) -> usize {
            self.in_flight.lock().expect("in_flight mutex poisoned").1
        }

        fn respond(&self, url: &str) -> Option<Value> {
            let path = url.strip_prefix("http://api")?;
            let likes = self.likes.lock().expect("likes mutex poisoned").clone();

            if path == "/posts" {
                let posts: Vec<Value> = likes
                    .iter()
                    .enumerate()
                    .map(|(index, likes)| {
                        json!({
                            "id": index + 1,
                            "title": format!("post {}", index + 1),
                            "body": "summary body",
                            "reactions": { "likes": likes, "dislikes": 0 }
                        })
                    })
                    .collect();
                return Some(json!({ "posts": posts }));
            }
            if let Some(id) = path.strip_prefix("/posts/") {
                return Some(json!({
                    "id": id.parse::<i64>().ok()?,
                    "title": format!("post {id}"),
                    "body": "detail body",
                    "reactions": { "likes": 0, "dislikes": 0 }
                }));
            }
            if let Some(id) = path.strip_prefix("/comments/post/") {
                return Some(json!({
                    "comments": [
                        { "id": 1, "body": format!("comment on {id}"), "user": { "id": 1, "username": "reader" } }
                    ]
                }));
            }
            None
        }
    }

    #[async_trait]
    impl Fetcher for FakeApiServer {
        async fn get_json(&self, url: &str) -> FeedResult<Value> {
            self.calls
                .lock()
                .expect("calls mutex poisoned")
                .push(url.to_string());
            let is_detail = url.contains("/posts/");
            if is_detail {
                let mut gauge = self.in_flight.lock().expect("in_flight mutex poisoned");
                gauge.0 += 1;
                gauge.1 = gauge.1.max(gauge.0);
            }

            let delay = self
                .delays
                .lock()
                .expect("delays mutex poisoned")
                .get(url)
                .copied()
                .unwrap_or(Duration::from_millis(10));
            tokio::time::sleep(delay).await;

            if is_detail {
                self.in_flight.lock().expect("in_flight mutex poisoned").0 -= 1;
            }
            if self
                .failing
                .lock()
                .expect("failing mutex poisoned")
                .contains(url)
            {
                return Err(FeedError::Http { status: 500 });
            }
            self.respond(url).ok_or(FeedError::Http { status: 404 })
        }
    }

    fn feed(server: &FakeApiServer, page_size: usize) -> PostFeed<FakeApiServer> {
        feed_with(server, config(page_size))
    }

    fn feed_with(server: &FakeApiServer, config: FeedConfig) -> PostFeed<FakeApiServer> {
        let cache = Arc::new(ResponseCache::new(config.cache_ttl));
        PostFeed::new(FeedApi::new(config, server.clone(), cache))
    }

    fn config(page_size: usize) -> FeedConfig {
        FeedConfig {
            base_url: "http://api".to_string(),
            request_timeout: Duration::from_secs(1),
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            max_concurrent: 3,
            cache_ttl: Duration::from_secs(300),
            page_size,
        }
    }

    fn ids(page: &PageResult) -> HashSet<i64> {
        page.posts.iter().map(|post| post.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn pages_partition_sorted_listing() {
        let server = FakeApiServer::with_likes(&[1, 2, 3, 4, 5, 6, 7]);
        let mut feed = feed(&server, 3);

        let first = feed.initialize().await.expect("initialize must succeed");
        let second = feed.load_next_page().await;
        let third = feed.load_next_page().await;

        assert_eq!(ids(&first), HashSet::from([7, 6, 5]));
        assert_eq!(ids(&second), HashSet::from([4, 3, 2]));
        assert_eq!(ids(&third), HashSet::from([1]));
        assert!(first.has_more);
        assert!(second.has_more);
        assert!(!third.has_more);
        assert_eq!(feed.loaded_pages(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn equal_likes_keep_server_order() {
        let server = FakeApiServer::with_likes(&[3, 5, 1, 5]);
        let mut feed = feed(&server, 1);

        let mut order = Vec::new();
        let mut page = feed.initialize().await.expect("initialize must succeed");
        while !page.posts.is_empty() {
            order.extend(page.posts.iter().map(|post| (post.id, post.reactions.likes)));
            page = feed.load_next_page().await;
        }

        assert_eq!(order, vec![(2, 5), (4, 5), (1, 3), (3, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn past_the_end_returns_empty_page_without_network() {
        let server = FakeApiServer::with_likes(&[1, 2]);
        let mut feed = feed(&server, 5);

        let first = feed.initialize().await.expect("initialize must succeed");
        assert_eq!(first.posts.len(), 2);
        assert!(!first.has_more);

        let calls_before = server.calls().len();
        for _ in 0..3 {
            assert_eq!(feed.load_next_page().await, PageResult::end());
        }
        assert_eq!(server.calls().len(), calls_before);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_comments_degrade_single_post() {
        let server = FakeApiServer::with_likes(&[10, 20, 30, 40, 50, 60, 70]);
        server.fail("/comments/post/7");
        let mut feed = feed(&server, 7);

        let page = feed.initialize().await.expect("initialize must succeed");

        assert_eq!(page.posts.len(), 7);
        let degraded = page
            .posts
            .iter()
            .find(|post| post.id == 7)
            .expect("post 7 must be present");
        assert!(degraded.error);
        assert!(degraded.comments.is_empty());
        assert_eq!(degraded.title, "post 7");
        assert_eq!(degraded.body, "summary body");
        assert_eq!(degraded.reactions.likes, 70);

        let healthy: Vec<_> = page.posts.iter().filter(|post| post.id != 7).collect();
        assert!(healthy.iter().all(|post| !post.error));
        assert!(healthy.iter().all(|post| post.comments.len() == 1));
        assert!(healthy.iter().all(|post| post.body == "detail body"));
    }

    #[tokio::test(start_paused = true)]
    async fn hydrated_posts_keep_summary_likes() {
        let server = FakeApiServer::with_likes(&[42]);
        let mut feed = feed(&server, 5);

        let page = feed.initialize().await.expect("initialize must succeed");

        assert_eq!(page.posts[0].reactions.likes, 42);
        assert_eq!(page.posts[0].comments[0].author_username, "reader");
    }

    #[tokio::test(start_paused = true)]
    async fn listing_failure_is_wrapped_and_leaves_feed_empty() {
        let server = FakeApiServer::with_likes(&[1, 2, 3]);
        server.fail("/posts");
        let mut feed = feed(&server, 2);

        let err = feed.initialize().await.expect_err("listing must fail");

        assert!(matches!(
            &err,
            FeedError::Initialization(cause) if matches!(**cause, FeedError::Http { status: 500 })
        ));
        assert_eq!(err.to_string(), "failed to initialize posts: http status 500");
        assert!(!feed.is_ready());
        assert_eq!(feed.total_posts(), 0);
        assert_eq!(feed.loaded_pages(), 0);
        assert_eq!(feed.load_next_page().await, PageResult::end());
    }

    #[tokio::test(start_paused = true)]
    async fn page_fan_out_respects_concurrency_limit() {
        let server = FakeApiServer::with_likes(&[1; 9]);
        let mut feed = feed(&server, 9);

        let page = feed.initialize().await.expect("initialize must succeed");

        assert_eq!(page.posts.len(), 9);
        assert_eq!(server.peak_in_flight(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_keeps_response_cache() {
        let server = FakeApiServer::with_likes(&[5, 4, 3]);
        let mut feed = feed(&server, 2);

        feed.initialize().await.expect("initialize must succeed");
        let calls_after_first = server.calls().len();

        feed.reset();
        assert!(!feed.is_ready());
        assert_eq!(feed.loaded_pages(), 0);

        let again = feed.initialize().await.expect("initialize must succeed");
        assert_eq!(again.posts.len(), 2);
        assert_eq!(server.calls().len(), calls_after_first);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_comments_do_not_cancel_detail_fetch() {
        let server = FakeApiServer::with_likes(&[7]);
        server.fail("/comments/post/1");
        server.delay("/comments/post/1", Duration::ZERO);
        server.delay("/posts/1", Duration::from_millis(50));
        let mut feed = feed_with(
            &server,
            FeedConfig {
                max_retries: 0,
                ..config(5)
            },
        );

        let page = feed.initialize().await.expect("initialize must succeed");

        assert!(page.posts[0].error);
        assert!(
            feed.api().cache().get("http://api/posts/1").is_some(),
            "detail response must be cached even though comments failed"
        );
        assert!(feed.api().cache().get("http://api/comments/post/1").is_none());
    }
}

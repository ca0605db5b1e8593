use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Счётчики реакций на пост.
pub struct Reactions {
    /// Количество лайков. Ключ сортировки ленты.
    #[serde(default)]
    pub likes: u64,
    /// Количество дизлайков.
    #[serde(default)]
    pub dislikes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Краткая запись поста из общего списка `GET /posts`.
pub struct PostSummary {
    /// Идентификатор поста.
    pub id: i64,
    /// Заголовок.
    pub title: String,
    /// Текст поста.
    #[serde(default)]
    pub body: String,
    /// Теги.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Реакции.
    #[serde(default)]
    pub reactions: Reactions,
    /// Количество просмотров.
    #[serde(default)]
    pub views: u64,
    /// Идентификатор автора.
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Комментарий к посту.
pub struct Comment {
    /// Логин автора комментария.
    pub author_username: String,
    /// Текст комментария.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Полная запись поста вместе с комментариями.
///
/// `reactions` всегда берутся из исходной краткой записи, а не из ответа
/// `GET /posts/{id}`. При `error == true` запись деградированная: детали и
/// комментарии загрузить не удалось, поля заполнены из краткой записи.
pub struct PostDetail {
    /// Идентификатор поста.
    pub id: i64,
    /// Заголовок.
    pub title: String,
    /// Текст поста.
    pub body: String,
    /// Теги.
    pub tags: Vec<String>,
    /// Реакции.
    pub reactions: Reactions,
    /// Количество просмотров.
    pub views: u64,
    /// Идентификатор автора.
    pub user_id: Option<i64>,
    /// Комментарии к посту.
    pub comments: Vec<Comment>,
    /// Признак деградированной записи.
    pub error: bool,
}

impl PostDetail {
    /// Собирает деградированную запись из краткой: без комментариев и с `error = true`.
    pub fn degraded(summary: &PostSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title.clone(),
            body: summary.body.clone(),
            tags: summary.tags.clone(),
            reactions: summary.reactions,
            views: summary.views,
            user_id: summary.user_id,
            comments: Vec::new(),
            error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// Страница ленты, передаваемая слою отображения.
pub struct PageResult {
    /// Посты страницы в порядке завершения загрузки.
    pub posts: Vec<PostDetail>,
    /// Остались ли ещё незагруженные посты после этой страницы.
    pub has_more: bool,
}

impl PageResult {
    /// Маркер конца списка: постов нет, продолжения нет.
    pub fn end() -> Self {
        Self {
            posts: Vec::new(),
            has_more: false,
        }
    }
}

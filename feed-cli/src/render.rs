use std::fmt::Write as _;

use feed_client::{Comment, PageResult, PostDetail};

pub(crate) const SHOW_MORE_PROMPT: &str = "Show more posts? [Y/n] ";

pub(crate) fn render_page(page: &PageResult) -> String {
    let mut out = String::new();
    for post in &page.posts {
        out.push_str(&render_post(post));
        out.push('\n');
    }
    out
}

pub(crate) fn render_post(post: &PostDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {}", post.title);
    let _ = writeln!(out, "♥ {}", post.reactions.likes);
    let _ = writeln!(out, "{}", post.body);
    out.push_str(&render_comments(post));
    out
}

fn render_comments(post: &PostDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Comments ({})", post.comments.len());

    if post.error {
        out.push_str("  ! Failed to load comments\n");
        return out;
    }

    out.push_str(&render_comment_list(&post.comments));
    out
}

pub(crate) fn render_comment_list(comments: &[Comment]) -> String {
    comments
        .iter()
        .map(|comment| format!("  - {}: {}\n", comment.author_username, comment.body))
        .collect()
}

pub(crate) fn render_load_failure(err: &impl std::fmt::Display) -> String {
    format!("Failed to load posts. Please try again later.\nError: {err}")
}

pub(crate) fn wants_more(answer: &str) -> bool {
    let answer = answer.trim();
    answer.is_empty() || answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

use std::io::{self, Write};
use std::process;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use feed_client::{FeedApi, FeedError, PostFeed};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

mod logging;
mod render;
mod settings;

use logging::init_logging;
use render::{
    SHOW_MORE_PROMPT, render_comment_list, render_load_failure, render_page, wants_more,
};
use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "feed-cli", version, about = "CLI для просмотра ленты популярных постов")]
struct Cli {
    /// Базовый URL API (по умолчанию FEED_BASE_URL или https://dummyjson.com).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Количество постов на странице.
    #[arg(long, global = true)]
    page_size: Option<usize>,

    /// Максимум одновременно загружаемых постов.
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Лента постов, отсортированная по количеству лайков.
    Browse {
        /// Сколько страниц загрузить подряд.
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Спрашивать перед загрузкой каждой следующей страницы.
        #[arg(long)]
        interactive: bool,
    },
    /// Комментарии к одному посту.
    Comments {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::from_env()
        .context("некорректная конфигурация окружения")?
        .with_overrides(cli.server, cli.page_size, cli.concurrency)?;
    init_logging(&settings.log_level)?;
    debug!(?settings, "settings loaded");

    match cli.command {
        Command::Browse { pages, interactive } => browse(settings, pages, interactive).await,
        Command::Comments { id } => {
            let api = FeedApi::http(settings.feed).map_err(map_feed_error)?;
            let comments = api
                .fetch_post_comments(id)
                .await
                .map_err(map_feed_error)?;
            println!("Комментарии к посту {id}: {}", comments.len());
            print!("{}", render_comment_list(&comments));
            Ok(())
        }
    }
}

async fn browse(settings: Settings, pages: usize, interactive: bool) -> Result<()> {
    let mut feed = PostFeed::http(settings.feed).map_err(map_feed_error)?;

    let first = feed
        .initialize()
        .await
        .map_err(|err| anyhow!(render_load_failure(&err)))?;
    print!("{}", render_page(&first));

    let mut has_more = first.has_more;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    while has_more {
        if interactive {
            print!("{SHOW_MORE_PROMPT}");
            io::stdout().flush().context("не удалось записать в stdout")?;
            let answer = stdin
                .next_line()
                .await
                .context("не удалось прочитать stdin")?;
            match answer {
                Some(answer) if wants_more(&answer) => {}
                _ => break,
            }
        } else if feed.loaded_pages() >= pages {
            break;
        }

        let page = feed.load_next_page().await;
        print!("{}", render_page(&page));
        has_more = page.has_more;
    }

    if has_more {
        println!(
            "-- показано страниц: {}, всего постов: {} --",
            feed.loaded_pages(),
            feed.total_posts()
        );
    } else {
        println!("-- конец ленты, всего постов: {} --", feed.total_posts());
    }

    Ok(())
}

fn map_feed_error(err: FeedError) -> anyhow::Error {
    let message = match err {
        FeedError::Timeout(timeout) => {
            format!("сервер не ответил за {} мс", timeout.as_millis())
        }
        FeedError::Http { status } => format!("сервер вернул статус {status}"),
        FeedError::Network(err) => format!("ошибка сети: {err}"),
        FeedError::Decode(message) => format!("некорректный ответ сервера: {message}"),
        FeedError::Initialization(cause) => format!("не удалось загрузить ленту: {cause}"),
    };
    anyhow!(message)
}

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

/// Выполняет задачи, держа в работе не больше `limit` одновременно.
///
/// Окно скользящее: как только любая задача завершается, сразу стартует
/// следующая из очереди. Результаты собираются в порядке завершения, а не в
/// порядке передачи. Задачи не должны завершаться ошибкой наружу; функция
/// возвращается только после того, как отработали все задачи.
///
/// Все задачи опрашиваются в текущей задаче tokio, без `spawn`.
/// `limit == 0` трактуется как `1`.
pub async fn throttle<I, F, Fut, T>(tasks: I, limit: usize) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let limit = limit.max(1);
    let mut queued = tasks.into_iter();
    let mut results = Vec::with_capacity(queued.size_hint().0);
    let mut in_flight = FuturesUnordered::new();

    for task in queued.by_ref().take(limit) {
        in_flight.push(task());
    }

    while let Some(result) = in_flight.next().await {
        results.push(result);
        if let Some(task) = queued.next() {
            in_flight.push(task());
        }
    }

    results
}

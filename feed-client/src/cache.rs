use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

#[derive(Debug)]
/// In-memory кэш ответов с временем жизни записи.
///
/// Устаревшие записи не удаляются фоном: `get` просто считает их
/// отсутствующими, а следующий `set` по тому же ключу их перезаписывает.
pub struct ResponseCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Создаёт пустой кэш с заданным TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// TTL записей.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Возвращает значение, если запись есть и ей меньше TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            return Some(entry.value.clone());
        }
        None
    }

    /// Сохраняет значение с текущей отметкой времени, заменяя прежнюю запись.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
        };
        self.lock().insert(key.into(), entry);
    }

    /// Удаляет все записи.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! 角色缓存模块
//!
//! 按 `(分区, id)` 记忆化连接构造的结果,成功与失败都会被缓存:
//! - **单次构造**: 同一个键并发请求时只有一个调用者执行构造,其余调用者阻塞等待同一结果
//! - **键间隔离**: 不同键的构造互不阻塞
//! - **永久缓存**: 条目一旦写入,在缓存的生命周期内不会被替换
//!
//! 实现上,DashMap 只用来取得每个键独立的 `OnceCell`,构造过程在分片锁之外进行。

use crate::common::ConnectionResult;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 缓存分区
///
/// `Resolved` 存放 `get` 选出的连接,与主库/从库分区相互独立。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Master,
    Slave,
    Resolved,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Master => f.write_str("master"),
            Partition::Slave => f.write_str("slave"),
            Partition::Resolved => f.write_str("resolved"),
        }
    }
}

type CacheKey = (Partition, String);

/// 缓存条目: 成功的值或被缓存的错误
pub type CacheEntry<V> = ConnectionResult<V>;

pub struct RoleCache<V: Clone> {
    cells: DashMap<CacheKey, Arc<OnceCell<CacheEntry<V>>>>,
    /// 命中次数(包括等待他人构造完成的调用)
    hits: AtomicU64,
    /// 执行构造的次数
    misses: AtomicU64,
    /// 构造失败并被缓存的次数
    failures: AtomicU64,
}

impl<V: Clone> RoleCache<V> {
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// # Brief
    /// 获取或构造缓存条目
    ///
    /// 已有条目时原样返回,被缓存的错误会再次返回而不会重新调用 `producer`。
    /// 否则调用 `producer` 一次并缓存其结果。
    ///
    /// # Arguments
    /// * `partition` - 缓存分区
    /// * `id` - 连接 id
    /// * `producer` - 构造函数
    pub fn get_or_create<F>(&self, partition: Partition, id: &str, producer: F) -> CacheEntry<V>
    where
        F: FnOnce() -> CacheEntry<V>,
    {
        let cell = self.cell(partition, id);

        if let Some(entry) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.clone();
        }

        let mut produced = false;
        let entry = cell.get_or_init(|| {
            produced = true;
            debug!("Cache miss for {} {}", partition, id);
            producer()
        });

        if produced {
            self.misses.fetch_add(1, Ordering::Relaxed);
            if entry.is_err() {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        entry.clone()
    }

    /// # Brief
    /// 读取已完成的条目,不等待正在进行的构造
    pub fn peek(&self, partition: Partition, id: &str) -> Option<CacheEntry<V>> {
        self.cells
            .get(&(partition, id.to_string()))
            .and_then(|cell| cell.value().get().cloned())
    }

    pub fn contains(&self, partition: Partition, id: &str) -> bool {
        self.peek(partition, id).is_some()
    }

    /// 已写入的条目数
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            failures: self.failures.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn cell(&self, partition: Partition, id: &str) -> Arc<OnceCell<CacheEntry<V>>> {
        self.cells
            .entry((partition, id.to_string()))
            .or_default()
            .clone()
    }
}

impl<V: Clone> Default for RoleCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// 缓存统计信息
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// 命中次数
    pub hits: u64,
    /// 构造次数
    pub misses: u64,
    /// 命中率 (0.0 ~ 1.0)
    pub hit_rate: f64,
    /// 被缓存的失败数
    pub failures: u64,
    /// 已写入的条目数
    pub entries: usize,
}

//! 过期 deal 归档任务
//!
//! 给已过期且未归档的 deal 打上 `archived_at`。可由函数端点、
//! `dealdrop archive-expired` 命令或进程内定时任务触发。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::storage::SeaOrmStorage;

pub struct ArchiveTask {
    storage: Arc<SeaOrmStorage>,
}

impl ArchiveTask {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 执行一次归档，返回归档数量
    pub async fn run_once(&self) -> Result<u64> {
        self.storage.archive_expired_deals(Utc::now()).await
    }

    /// 启动定时归档；间隔为 0 时不启动
    pub fn spawn(self: Arc<Self>, interval_secs: u64) -> Option<JoinHandle<()>> {
        if interval_secs == 0 {
            debug!("Periodic archive disabled");
            return None;
        }

        info!("Periodic archive every {}s", interval_secs);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            // 第一次 tick 立即返回，跳过它
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match self.run_once().await {
                    Ok(count) if count > 0 => info!("Periodic archive: {} deals", count),
                    Ok(_) => debug!("Periodic archive: nothing to do"),
                    Err(e) => error!("Periodic archive failed: {}", e),
                }
            }
        }))
    }
}

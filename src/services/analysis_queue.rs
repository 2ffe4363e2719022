use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};
use uuid::Uuid;

/// 入队结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// 已入队
    Queued,
    /// 队列已满，丢弃本次触发
    Dropped,
    /// 消费端已退出
    Closed,
}

/// 有界的最终分析队列（FIFO，单消费者）
///
/// 入队从不阻塞：队列满时直接丢弃最新的触发并记录日志，不重试。
/// 被丢弃的项目分析记录保持原状态，可由下一次触发重新排队。
#[derive(Debug, Clone)]
pub struct AnalysisQueue {
    sender: mpsc::Sender<Uuid>,
}

/// 队列消费端，只允许一个持有者
#[derive(Debug)]
pub struct AnalysisReceiver {
    receiver: mpsc::Receiver<Uuid>,
}

impl AnalysisQueue {
    /// 创建指定容量的队列
    pub fn bounded(capacity: usize) -> (Self, AnalysisReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, AnalysisReceiver { receiver })
    }

    /// 非阻塞入队
    pub fn enqueue(&self, project_uuid: Uuid) -> EnqueueOutcome {
        match self.sender.try_send(project_uuid) {
            Ok(()) => {
                info!(project = %project_uuid, "已加入最终分析队列");
                EnqueueOutcome::Queued
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    project = %project_uuid,
                    capacity = self.capacity(),
                    "分析队列已满，跳过本次触发"
                );
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                error!(project = %project_uuid, "分析队列已关闭，后台处理器未运行");
                EnqueueOutcome::Closed
            }
        }
    }

    /// 队列总容量
    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// 当前排队数量
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalysisReceiver {
    /// 等待下一个运行标识；所有发送端释放后返回 None
    pub async fn recv(&mut self) -> Option<Uuid> {
        self.receiver.recv().await
    }
}

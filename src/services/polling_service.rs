//! 答案轮询服务 - 业务能力层
//!
//! 针对单个问题句柄反复查询答案状态，直到出现终态或尝试次数耗尽。
//!
//! 状态机：
//!
//! ```text
//! Idle → Querying ─┬─ Pending ──(sleep)──→ Querying
//!                  ├─ Done            (终态)
//!                  ├─ Error           (终态)
//!                  ├─ TransportError  (终态)
//!                  └─ 次数耗尽 → TimedOut (终态)
//! ```
//!
//! 同一会话内查询严格串行，任意时刻最多一个请求在途。
//! 在 `.await` 处丢弃 future 即可取消会话，在途请求的结果会被忽略。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{AnswerStatus, Outcome, QuestionHandle, TransportError};

/// 默认最大查询次数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
/// 默认查询间隔（毫秒）
pub const DEFAULT_INTERVAL_MS: u64 = 1200;

/// 答案状态来源
///
/// 生产环境由 `ApiClient` 实现；测试中可以替换为脚本化的实现。
pub trait AnswerSource: Send + Sync {
    /// 查询一次答案状态，不做任何重试
    fn fetch_status(
        &self,
        handle: &QuestionHandle,
    ) -> impl Future<Output = Result<AnswerStatus, TransportError>> + Send;
}

/// 答案轮询服务
///
/// 职责：
/// - 驱动单个问题的状态查询直到终态
/// - 只重试 `Pending`，传输失败立即结束
/// - 不持有会话之间的任何状态，每次调用都是一个全新的会话
pub struct PollingService<S> {
    source: S,
    max_attempts: u32,
    interval: Duration,
}

impl<S: AnswerSource> PollingService<S> {
    /// 使用配置中的次数和间隔创建
    pub fn new(source: S, config: &Config) -> Self {
        Self::with_settings(source, config.max_attempts, config.poll_interval_ms)
    }

    /// 使用指定的次数和间隔创建，两者至少为 1
    pub fn with_settings(source: S, max_attempts: u32, interval_ms: u64) -> Self {
        Self {
            source,
            max_attempts: max_attempts.max(1),
            interval: Duration::from_millis(interval_ms.max(1)),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 轮询答案直到终态
    ///
    /// # 参数
    /// - `handle`: 问题句柄（调用方保证非空）
    ///
    /// # 返回
    /// 返回唯一的终态，所有失败都体现为 `Outcome` 而不是 `Err`
    pub async fn poll_for_answer(&self, handle: &QuestionHandle) -> Outcome {
        debug!(
            "[问题 {}] 开始轮询，最多 {} 次，间隔 {:?}",
            handle, self.max_attempts, self.interval
        );

        for attempt in 1..=self.max_attempts {
            let status = match self.source.fetch_status(handle).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(
                        "[问题 {}] ❌ 第 {}/{} 次查询传输失败: {}",
                        handle, attempt, self.max_attempts, e
                    );
                    return Outcome::TransportError(e);
                }
            };

            match status {
                AnswerStatus::Pending => {
                    debug!(
                        "[问题 {}] 第 {}/{} 次查询: 仍在处理中",
                        handle, attempt, self.max_attempts
                    );
                    if attempt < self.max_attempts {
                        sleep(self.interval).await;
                    }
                }
                AnswerStatus::Done { answer, references } => {
                    info!(
                        "[问题 {}] ✓ 第 {} 次查询得到答案，{} 个引用片段",
                        handle,
                        attempt,
                        references.len()
                    );
                    return Outcome::Done { answer, references };
                }
                AnswerStatus::Error { message } => {
                    warn!("[问题 {}] ⚠️ 服务端报告失败: {}", handle, message);
                    return Outcome::Error { message };
                }
            }
        }

        warn!(
            "[问题 {}] ⏱️ 已查询 {} 次仍未完成，放弃等待",
            handle, self.max_attempts
        );
        Outcome::TimedOut {
            attempts: self.max_attempts,
        }
    }
}

/// 单次会话的便捷入口
pub async fn poll_for_answer<S: AnswerSource>(
    source: &S,
    handle: &QuestionHandle,
    max_attempts: u32,
    interval_ms: u64,
) -> Outcome {
    PollingService::with_settings(ByRef(source), max_attempts, interval_ms)
        .poll_for_answer(handle)
        .await
}

/// 借用形式的来源，避免为一次会话转移所有权
struct ByRef<'a, S>(&'a S);

impl<S: AnswerSource> AnswerSource for ByRef<'_, S> {
    fn fetch_status(
        &self,
        handle: &QuestionHandle,
    ) -> impl Future<Output = Result<AnswerStatus, TransportError>> + Send {
        self.0.fetch_status(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reference;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// 按脚本依次返回状态的来源，脚本用完后一直返回最后一个状态
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<AnswerStatus, TransportError>>>,
        last: Mutex<Option<Result<AnswerStatus, TransportError>>>,
        starts: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<AnswerStatus, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                starts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.starts.lock().unwrap().len()
        }

        fn gaps(&self) -> Vec<Duration> {
            let starts = self.starts.lock().unwrap();
            starts.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    impl AnswerSource for ScriptedSource {
        async fn fetch_status(
            &self,
            _handle: &QuestionHandle,
        ) -> Result<AnswerStatus, TransportError> {
            self.starts.lock().unwrap().push(Instant::now());
            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = next {
                *last = Some(next);
            }
            last.clone().unwrap_or(Ok(AnswerStatus::Pending))
        }
    }

    fn pending() -> Result<AnswerStatus, TransportError> {
        Ok(AnswerStatus::Pending)
    }

    fn done(answer: &str, refs: &[(i64, &str)]) -> Result<AnswerStatus, TransportError> {
        Ok(AnswerStatus::Done {
            answer: answer.to_string(),
            references: refs
                .iter()
                .map(|(rank, snippet)| Reference {
                    rank: *rank,
                    snippet: snippet.to_string(),
                })
                .collect(),
        })
    }

    fn handle() -> QuestionHandle {
        QuestionHandle::new("q-1")
    }

    #[tokio::test]
    async fn test_done_after_two_pending() {
        let source = ScriptedSource::new(vec![
            pending(),
            pending(),
            done("42", &[(1, "foo")]),
        ]);
        let service = PollingService::with_settings(source, 3, 10);

        let started = std::time::Instant::now();
        let outcome = service.poll_for_answer(&handle()).await;

        assert_eq!(
            outcome,
            Outcome::Done {
                answer: "42".to_string(),
                references: vec![Reference {
                    rank: 1,
                    snippet: "foo".to_string()
                }],
            }
        );
        assert_eq!(service.source().calls(), 3);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_times_out_after_budget() {
        let source = ScriptedSource::new(vec![pending(), pending()]);
        let service = PollingService::with_settings(source, 2, 10);

        let outcome = service.poll_for_answer(&handle()).await;

        assert_eq!(outcome, Outcome::TimedOut { attempts: 2 });
        assert_eq!(service.source().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_budget_waits_between_every_query() {
        let source = ScriptedSource::new(vec![]);
        let service = PollingService::with_settings(source, DEFAULT_MAX_ATTEMPTS, DEFAULT_INTERVAL_MS);

        let outcome = service.poll_for_answer(&handle()).await;

        assert_eq!(
            outcome,
            Outcome::TimedOut {
                attempts: DEFAULT_MAX_ATTEMPTS
            }
        );
        assert_eq!(service.source().calls(), DEFAULT_MAX_ATTEMPTS as usize);
        let gaps = service.source().gaps();
        assert_eq!(gaps.len(), DEFAULT_MAX_ATTEMPTS as usize - 1);
        assert!(gaps
            .iter()
            .all(|gap| *gap >= Duration::from_millis(DEFAULT_INTERVAL_MS)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reported_error_stops_at_that_attempt() {
        for k in 1..=4usize {
            let mut script: Vec<_> = (1..k).map(|_| pending()).collect();
            script.push(Ok(AnswerStatus::Error {
                message: "索引失败".to_string(),
            }));
            let service = PollingService::with_settings(ScriptedSource::new(script), 5, 100);

            let outcome = service.poll_for_answer(&handle()).await;

            assert_eq!(
                outcome,
                Outcome::Error {
                    message: "索引失败".to_string()
                }
            );
            assert_eq!(service.source().calls(), k);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_not_retried() {
        let source = ScriptedSource::new(vec![
            pending(),
            Err(TransportError::http(500, "boom")),
            done("never", &[]),
        ]);
        let service = PollingService::with_settings(source, 10, 100);

        let outcome = service.poll_for_answer(&handle()).await;

        assert_eq!(
            outcome,
            Outcome::TransportError(TransportError::http(500, "boom"))
        );
        assert_eq!(service.source().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_at_first_attempt_does_not_sleep() {
        let source = ScriptedSource::new(vec![done("ok", &[])]);
        let service = PollingService::with_settings(source, 3, 60_000);

        let started = Instant::now();
        let outcome = service.poll_for_answer(&handle()).await;

        assert!(outcome.is_done());
        assert_eq!(service.source().calls(), 1);
        assert!(started.elapsed() < Duration::from_millis(60_000));
    }

    #[tokio::test]
    async fn test_repeated_sessions_return_same_payload() {
        let source = ScriptedSource::new(vec![done("same", &[(1, "a"), (2, "b")])]);

        let first = poll_for_answer(&source, &handle(), 3, 10).await;
        let second = poll_for_answer(&source, &handle(), 3, 10).await;

        assert_eq!(first, second);
        assert!(first.is_done());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_session_stops_queries() {
        let service = PollingService::with_settings(ScriptedSource::new(vec![]), 30, 1000);

        let result =
            tokio::time::timeout(Duration::from_millis(2500), service.poll_for_answer(&handle()))
                .await;
        assert!(result.is_err());
        let calls = service.source().calls();
        assert_eq!(calls, 3);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(service.source().calls(), calls);
    }

    #[test]
    fn test_settings_are_at_least_one() {
        let service = PollingService::with_settings(ScriptedSource::new(vec![]), 0, 0);
        assert_eq!(service.max_attempts(), 1);
        assert_eq!(service.interval(), Duration::from_millis(1));
    }
}

//! Webhook Dispatcher - 领域事件分发器
//!
//! 给定一个事件：解析出订阅了该类型的活跃订阅，对每个订阅独立、
//! 并行地投递（有 worker 上限，出站连接不无界增长）。单个订阅内
//! 的重试是串行的：指数退避，成功立即停止，退避间隔未过绝不发起
//! 下一次尝试。
//!
//! 每次尝试（成功或失败、每次重试）都追加到投递日志，审计轨迹
//! 相对实际发出的请求永不缺失。重试耗尽后事件对该订阅即被放弃：
//! 不排队、不停靠、不延后重试——这是明确的设计限制（没有死信队列），
//! 耗尽时以 warn 日志向运维暴露。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::Semaphore;

use super::signer;
use super::transport::WebhookTransportPort;
use crate::application::ports::{DeliveryAttempt, DeliveryLogPort, DeliveryOutcome};
use crate::application::SubscriptionRegistry;
use crate::domain::{DomainEvent, Subscription, WebhookEnvelope};

/// 分发器配置
#[derive(Debug, Clone)]
pub struct WebhookDispatcherConfig {
    /// 每个订阅每个事件的最大尝试次数
    pub max_attempts: u32,
    /// 首次重试前的退避；之后每次翻倍
    pub base_delay: Duration,
    /// 并行投递的 worker 上限
    pub worker_limit: usize,
    /// 报文中的 source 字段
    pub source: String,
}

impl Default for WebhookDispatcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            worker_limit: 8,
            source: "voxgate".to_string(),
        }
    }
}

/// Webhook 分发器
pub struct WebhookDispatcher {
    registry: Arc<SubscriptionRegistry>,
    transport: Arc<dyn WebhookTransportPort>,
    delivery_log: Arc<dyn DeliveryLogPort>,
    semaphore: Arc<Semaphore>,
    config: WebhookDispatcherConfig,
}

impl WebhookDispatcher {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        transport: Arc<dyn WebhookTransportPort>,
        delivery_log: Arc<dyn DeliveryLogPort>,
        config: WebhookDispatcherConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.worker_limit.max(1)));
        Self {
            registry,
            transport,
            delivery_log,
            semaphore,
            config,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 即发即忘：调用方立即返回，完成情况只能通过投递日志观察
    pub fn dispatch(self: &Arc<Self>, event: DomainEvent) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.deliver(event).await;
        });
    }

    /// 投递一个事件，直到所有订阅的尝试结束或放弃
    pub async fn deliver(&self, event: DomainEvent) {
        let event_type = event.event_type();

        let subscriptions = match self.registry.matching(event_type).await {
            Ok(subs) => subs,
            Err(e) => {
                tracing::error!(
                    event_type,
                    error = %e,
                    "Failed to resolve subscriptions, event not delivered"
                );
                return;
            }
        };

        if subscriptions.is_empty() {
            tracing::debug!(event_type, "No subscribers for event");
            return;
        }

        // 每个事件只序列化一次：所有订阅、所有重试发送同一份字节
        let envelope = WebhookEnvelope::new(event, &self.config.source);
        let body: Arc<Vec<u8>> = match envelope.to_bytes() {
            Ok(bytes) => Arc::new(bytes),
            Err(e) => {
                tracing::error!(event_type, error = %e, "Failed to serialize envelope");
                return;
            }
        };

        tracing::debug!(
            event_type,
            subscribers = subscriptions.len(),
            "Dispatching event"
        );

        let mut handles = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            let transport = self.transport.clone();
            let delivery_log = self.delivery_log.clone();
            let semaphore = self.semaphore.clone();
            let config = self.config.clone();
            let body = body.clone();

            handles.push(tokio::spawn(async move {
                deliver_to_subscription(
                    transport,
                    delivery_log,
                    semaphore,
                    &config,
                    &subscription,
                    event_type,
                    &body,
                )
                .await;
            }));
        }

        join_all(handles).await;
    }
}

/// 单个订阅的投递序列：串行尝试 + 指数退避
///
/// worker permit 只在单次 POST 期间持有，退避睡眠之前释放——
/// 睡着的重试序列不占用 worker 槽位，不挡住其他订阅的首次尝试
async fn deliver_to_subscription(
    transport: Arc<dyn WebhookTransportPort>,
    delivery_log: Arc<dyn DeliveryLogPort>,
    semaphore: Arc<Semaphore>,
    config: &WebhookDispatcherConfig,
    subscription: &Subscription,
    event_type: &str,
    body: &[u8],
) {
    // 签名对传输字节计算，整个重试序列复用
    let signature = subscription
        .secret
        .as_deref()
        .map(|secret| signer::sign(body, secret));

    let mut delay = config.base_delay;

    for attempt_number in 1..=config.max_attempts {
        let result = {
            let _permit = match semaphore.acquire().await {
                Ok(p) => p,
                Err(_) => {
                    tracing::error!(
                        subscription_id = %subscription.id,
                        "Failed to acquire worker permit"
                    );
                    return;
                }
            };

            transport
                .post_json(&subscription.url, body, signature.as_deref())
                .await
        };

        let (status_code, outcome, error_message) = match result {
            Ok(status) if (200..300).contains(&status) => {
                (Some(status), DeliveryOutcome::Success, None)
            }
            Ok(status) => (
                Some(status),
                DeliveryOutcome::Failed,
                Some(format!("HTTP {}", status)),
            ),
            Err(e) => (None, DeliveryOutcome::Failed, Some(e.to_string())),
        };

        let attempt = DeliveryAttempt {
            subscription_id: subscription.id,
            event_type: event_type.to_string(),
            attempt_number,
            status_code,
            outcome,
            error_message,
            occurred_at: Utc::now(),
        };

        if outcome == DeliveryOutcome::Success {
            tracing::info!(
                subscription_id = %subscription.id,
                event_type,
                attempt = attempt_number,
                "Webhook delivered"
            );
            append_best_effort(&delivery_log, &attempt).await;
            return;
        }

        tracing::warn!(
            subscription_id = %subscription.id,
            event_type,
            attempt = attempt_number,
            status = ?status_code,
            "Webhook delivery attempt failed"
        );

        if attempt_number < config.max_attempts {
            // 审计写入与退避计时并行，日志存储不拖慢下一次尝试
            tokio::join!(
                append_best_effort(&delivery_log, &attempt),
                tokio::time::sleep(delay)
            );
            delay *= 2;
        } else {
            append_best_effort(&delivery_log, &attempt).await;
            tracing::warn!(
                subscription_id = %subscription.id,
                event_type,
                attempts = config.max_attempts,
                "Webhook delivery abandoned after exhausting retries (no dead-letter queue)"
            );
        }
    }
}

/// 审计写入失败只记日志，不影响投递序列
async fn append_best_effort(delivery_log: &Arc<dyn DeliveryLogPort>, attempt: &DeliveryAttempt) {
    if let Err(e) = delivery_log.append(attempt).await {
        tracing::error!(
            subscription_id = %attempt.subscription_id,
            error = %e,
            "Failed to append delivery attempt to audit log"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::time::Instant;
    use uuid::Uuid;

    use crate::application::ports::SubscriptionRepositoryPort;
    use crate::infrastructure::persistence::memory::{
        InMemoryDeliveryLog, InMemorySubscriptionRepository,
    };
    use crate::infrastructure::webhook::transport::TransportError;

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        url: String,
        body: Vec<u8>,
        signature: Option<String>,
        at: Instant,
    }

    /// 可录制、可编排响应的传输 Fake
    struct RecordingTransport {
        requests: Mutex<Vec<RecordedRequest>>,
        scripted: Mutex<HashMap<String, VecDeque<u16>>>,
        default_status: u16,
    }

    impl RecordingTransport {
        fn new(default_status: u16) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                scripted: Mutex::new(HashMap::new()),
                default_status,
            }
        }

        /// 按 URL 编排一串响应状态码，用完后回到默认值
        fn respond_with(&self, url: &str, statuses: impl IntoIterator<Item = u16>) {
            self.scripted
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .extend(statuses);
        }

        fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.url == url)
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl WebhookTransportPort for RecordingTransport {
        async fn post_json(
            &self,
            url: &str,
            body: &[u8],
            signature: Option<&str>,
        ) -> Result<u16, TransportError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                url: url.to_string(),
                body: body.to_vec(),
                signature: signature.map(String::from),
                at: Instant::now(),
            });

            let scripted = self
                .scripted
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|queue| queue.pop_front());
            Ok(scripted.unwrap_or(self.default_status))
        }
    }

    struct Harness {
        dispatcher: WebhookDispatcher,
        transport: Arc<RecordingTransport>,
        log: Arc<InMemoryDeliveryLog>,
        repo: Arc<InMemorySubscriptionRepository>,
        registry: Arc<SubscriptionRegistry>,
    }

    async fn harness_with(
        subscriptions: Vec<Subscription>,
        default_status: u16,
        config: WebhookDispatcherConfig,
    ) -> Harness {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        for sub in &subscriptions {
            repo.save(sub).await.unwrap();
        }
        let registry = SubscriptionRegistry::new(repo.clone()).arc();
        let transport = Arc::new(RecordingTransport::new(default_status));
        let log = Arc::new(InMemoryDeliveryLog::new());

        let dispatcher =
            WebhookDispatcher::new(registry.clone(), transport.clone(), log.clone(), config);

        Harness {
            dispatcher,
            transport,
            log,
            repo,
            registry,
        }
    }

    async fn harness(subscriptions: Vec<Subscription>, default_status: u16) -> Harness {
        harness_with(
            subscriptions,
            default_status,
            WebhookDispatcherConfig {
                max_attempts: 3,
                base_delay: Duration::from_millis(30),
                worker_limit: 4,
                source: "voxgate-test".to_string(),
            },
        )
        .await
    }

    fn book_created() -> DomainEvent {
        DomainEvent::BookCreated {
            book_id: Uuid::new_v4(),
            title: "Dune".to_string(),
        }
    }

    #[tokio::test]
    async fn test_retry_bound_on_persistent_failure() {
        let sub = Subscription::new("crm", "https://crm.example.com/hook", ["book.created"]);
        let sub_id = sub.id;
        let h = harness(vec![sub], 500).await;

        h.dispatcher.deliver(book_created()).await;

        let attempts = h.log.find_by_subscription(sub_id).await.unwrap();
        assert_eq!(attempts.len(), 3);
        assert_eq!(
            attempts.iter().map(|a| a.attempt_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(attempts.iter().all(|a| a.outcome == DeliveryOutcome::Failed));
        assert!(attempts.windows(2).all(|w| w[0].occurred_at < w[1].occurred_at));
        // 重试耗尽后不再有请求
        assert_eq!(h.transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_backoff_between_attempts_grows() {
        let sub = Subscription::new("crm", "https://crm.example.com/hook", ["book.created"]);
        let h = harness(vec![sub], 500).await;

        h.dispatcher.deliver(book_created()).await;

        let requests = h.transport.requests();
        assert_eq!(requests.len(), 3);
        let first_gap = requests[1].at - requests[0].at;
        let second_gap = requests[2].at - requests[1].at;
        assert!(first_gap >= Duration::from_millis(30));
        assert!(second_gap >= first_gap);
    }

    #[tokio::test]
    async fn test_retries_stop_on_success() {
        let sub = Subscription::new("crm", "https://crm.example.com/hook", ["book.created"]);
        let sub_id = sub.id;
        let url = sub.url.clone();
        let h = harness(vec![sub], 200).await;
        h.transport.respond_with(&url, [500]);

        h.dispatcher.deliver(book_created()).await;

        let attempts = h.log.find_by_subscription(sub_id).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].outcome, DeliveryOutcome::Failed);
        assert_eq!(attempts[1].outcome, DeliveryOutcome::Success);
        assert_eq!(attempts[1].status_code, Some(200));
        assert_eq!(h.transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_subscriptions_are_independent() {
        let failing =
            Subscription::new("flaky", "https://flaky.example.com/hook", ["book.created"]);
        let healthy =
            Subscription::new("crm", "https://crm.example.com/hook", ["book.created"]);
        let (failing_id, healthy_id) = (failing.id, healthy.id);
        let flaky_url = failing.url.clone();
        let h = harness(vec![failing, healthy], 200).await;
        h.transport.respond_with(&flaky_url, [500, 500, 500]);

        h.dispatcher.deliver(book_created()).await;

        // 失败方重试满额，成功方恰好一次
        assert_eq!(h.log.find_by_subscription(failing_id).await.unwrap().len(), 3);
        let healthy_attempts = h.log.find_by_subscription(healthy_id).await.unwrap();
        assert_eq!(healthy_attempts.len(), 1);
        assert_eq!(healthy_attempts[0].outcome, DeliveryOutcome::Success);
    }

    #[tokio::test]
    async fn test_backoff_does_not_occupy_worker_slot() {
        // 单个 worker 槽位 + 两个持续失败的订阅：
        // 退避睡眠期间槽位必须释放，两个订阅的重试序列交错推进，
        // 而不是第一个订阅睡满全程后第二个才开始
        let first = Subscription::new("flaky-1", "https://one.example.com/hook", ["book.created"]);
        let second =
            Subscription::new("flaky-2", "https://two.example.com/hook", ["book.created"]);
        let h = harness_with(
            vec![first, second],
            500,
            WebhookDispatcherConfig {
                max_attempts: 3,
                base_delay: Duration::from_millis(100),
                worker_limit: 1,
                source: "voxgate-test".to_string(),
            },
        )
        .await;

        h.dispatcher.deliver(book_created()).await;

        let one = h.transport.requests_to("https://one.example.com/hook");
        let two = h.transport.requests_to("https://two.example.com/hook");
        assert_eq!(one.len(), 3);
        assert_eq!(two.len(), 3);

        // 双方的首次尝试都早于任何一方的第二次尝试
        let latest_first_attempt = one[0].at.max(two[0].at);
        let earliest_second_attempt = one[1].at.min(two[1].at);
        assert!(latest_first_attempt < earliest_second_attempt);
    }

    #[tokio::test]
    async fn test_signature_present_iff_secret() {
        let signed = Subscription::new("signed", "https://a.example.com/hook", ["book.created"])
            .with_secret("s3cret");
        let unsigned = Subscription::new("plain", "https://b.example.com/hook", ["book.created"]);
        let h = harness(vec![signed, unsigned], 200).await;

        h.dispatcher.deliver(book_created()).await;

        let signed_reqs = h.transport.requests_to("https://a.example.com/hook");
        assert_eq!(signed_reqs.len(), 1);
        let signature = signed_reqs[0].signature.as_deref().unwrap();
        // 签名对实际传输的字节可验证
        assert!(signer::verify(&signed_reqs[0].body, "s3cret", signature));

        let unsigned_reqs = h.transport.requests_to("https://b.example.com/hook");
        assert_eq!(unsigned_reqs.len(), 1);
        assert!(unsigned_reqs[0].signature.is_none());
    }

    #[tokio::test]
    async fn test_wire_payload_shape() {
        let sub = Subscription::new("crm", "https://crm.example.com/hook", ["book.created"]);
        let h = harness(vec![sub], 200).await;

        h.dispatcher.deliver(book_created()).await;

        let requests = h.transport.requests();
        let value: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(value["event"], "book.created");
        assert_eq!(value["source"], "voxgate-test");
        assert!(value["data"].is_object());
        assert!(value["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_only_matching_subscriptions_receive_event() {
        let books = Subscription::new("books", "https://books.example.com/hook", ["book.created"]);
        let users =
            Subscription::new("users", "https://users.example.com/hook", ["user.registered"]);
        let h = harness(vec![books, users], 200).await;

        h.dispatcher.deliver(book_created()).await;

        assert_eq!(h.transport.requests_to("https://books.example.com/hook").len(), 1);
        assert!(h.transport.requests_to("https://users.example.com/hook").is_empty());
    }

    #[tokio::test]
    async fn test_inactive_subscription_is_skipped() {
        let sub = Subscription::new("off", "https://off.example.com/hook", ["book.created"])
            .deactivated();
        let h = harness(vec![sub], 200).await;

        h.dispatcher.deliver(book_created()).await;

        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_is_fire_and_forget() {
        let sub = Subscription::new("crm", "https://crm.example.com/hook", ["book.created"]);
        let sub_id = sub.id;
        let h = harness(vec![sub], 200).await;
        let dispatcher = h.dispatcher.arc();

        dispatcher.dispatch(book_created());

        // 完成情况只能通过投递日志观察
        let deadline = Instant::now() + Duration::from_secs(1);
        loop {
            if !h.log.find_by_subscription(sub_id).await.unwrap().is_empty() {
                break;
            }
            assert!(Instant::now() < deadline, "delivery never logged");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_registry_edits_visible_after_invalidate() {
        let h = harness(vec![], 200).await;
        h.dispatcher.deliver(book_created()).await;
        assert!(h.transport.requests().is_empty());

        let sub = Subscription::new("late", "https://late.example.com/hook", ["book.created"]);
        h.repo.save(&sub).await.unwrap();
        h.registry.invalidate().await;

        h.dispatcher.deliver(book_created()).await;
        assert_eq!(h.transport.requests().len(), 1);
    }
}

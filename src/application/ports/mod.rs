//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod blob_store;
mod delivery_log;
mod subscriptions;
mod synthesis;

pub use blob_store::{BlobStoreError, BlobStorePort};
pub use delivery_log::{DeliveryAttempt, DeliveryLogError, DeliveryLogPort, DeliveryOutcome};
pub use subscriptions::{RepositoryError, SubscriptionRepositoryPort};
pub use synthesis::{
    SynthesisError, SynthesisPort, SynthesisRequest, SynthesizedAudio, VoiceSettings,
};

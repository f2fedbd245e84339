//! 재시도가 있는 설정 트랜잭션 조정

mod coordinator;
mod error;
pub mod retry;

pub use coordinator::{TransactionCoordinator, UnitOfWork};
pub use error::TransactionError;
pub use retry::{is_retryable, is_retryable_message, RetryPolicy, Retryable, MAX_ATTEMPTS, RETRY_DELAY};

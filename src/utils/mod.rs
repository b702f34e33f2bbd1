mod retry;

pub use retry::{reconnect_backoff, RetryStrategy};

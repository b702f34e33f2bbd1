use std::time::Duration;

/// 重试策略
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// 固定延迟
    Fixed(Duration),
    /// 指数退避
    Exponential {
        initial: Duration,
        multiplier: f64,
        max_delay: Duration,
    },
}

impl RetryStrategy {
    /// 计算第 n 次重试的延迟
    pub fn get_delay(&self, attempt: u32) -> Duration {
        match self {
            RetryStrategy::Fixed(delay) => *delay,
            RetryStrategy::Exponential { initial, multiplier, max_delay } => {
                let delay = initial.as_secs_f64() * multiplier.powf(attempt as f64);
                let delay = Duration::from_secs_f64(delay);
                std::cmp::min(delay, *max_delay)
            }
        }
    }
}

/// SSE 断线重连使用的默认退避
pub fn reconnect_backoff() -> RetryStrategy {
    RetryStrategy::Exponential {
        initial: Duration::from_secs(1),
        multiplier: 2.0,
        max_delay: Duration::from_secs(30),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_delays() {
        let strategy = reconnect_backoff();
        assert_eq!(strategy.get_delay(0), Duration::from_secs(1));
        assert_eq!(strategy.get_delay(1), Duration::from_secs(2));
        assert_eq!(strategy.get_delay(2), Duration::from_secs(4));
        // 封顶
        assert_eq!(strategy.get_delay(10), Duration::from_secs(30));
    }

    #[test]
    fn test_fixed_delay() {
        let strategy = RetryStrategy::Fixed(Duration::from_millis(250));
        assert_eq!(strategy.get_delay(0), strategy.get_delay(5));
    }
}

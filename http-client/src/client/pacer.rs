use crossbeam_channel::{tick, Receiver};
use log::warn;
use std::{
    fmt::Debug,
    time::{Duration, Instant},
};

/// 请求限速接口
///
/// 每次发送请求前都会调用 [`Pacer::wait`]，直到被允许发送才会返回。
/// 同一个实例会被多个线程同时使用。
pub trait Pacer: Debug + Send + Sync {
    /// 阻塞等待，直到允许发送一个请求
    fn wait(&self);
}

/// 基于定时器的请求限速器
///
/// 每个时钟周期允许发送一个请求，多个等待者共享同一个时钟
#[derive(Debug, Clone)]
pub struct Ticker {
    ticks: Receiver<Instant>,
}

impl Ticker {
    /// 创建请求限速器，每隔 `interval` 允许发送一个请求
    #[inline]
    pub fn new(interval: Duration) -> Self {
        Self { ticks: tick(interval) }
    }
}

impl From<Receiver<Instant>> for Ticker {
    #[inline]
    fn from(ticks: Receiver<Instant>) -> Self {
        Self { ticks }
    }
}

impl Pacer for Ticker {
    fn wait(&self) {
        if self.ticks.recv().is_err() {
            warn!("ticker is disconnected, requests are no longer paced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::{sync::Arc, thread};

    #[test]
    fn test_ticker_interval() {
        env_logger::builder().is_test(true).try_init().ok();

        let ticker = Ticker::new(Duration::from_millis(20));
        let begin = Instant::now();
        for _ in 0..3 {
            ticker.wait();
        }
        assert!(begin.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_ticker_one_dispatch_per_tick() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let (tx, rx) = bounded(0);
        let ticker = Arc::new(Ticker::from(rx));
        let waiters = (0..3)
            .map(|_| {
                let ticker = ticker.to_owned();
                thread::spawn(move || ticker.wait())
            })
            .collect::<Vec<_>>();
        for _ in 0..3 {
            tx.send(Instant::now())?;
        }
        for waiter in waiters {
            waiter.join().unwrap();
        }
        drop(tx);
        ticker.wait();
        Ok(())
    }
}

//! Fixed-interval polling loop.
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{error, info};

use crate::pipeline::CycleReport;

/// Source of polling ticks. Returning `false` stops the loop.
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self) -> bool;
}

/// Wall-clock ticker. The first tick fires immediately so the service checks on startup.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        // A slow cycle pushes the schedule back instead of bursting to catch up.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Run `cycle` once per tick until the ticker stops. Returns the number of cycles run.
///
/// A failed cycle is logged and the next tick proceeds normally.
pub async fn run_polling<T, F, Fut>(ticker: &mut T, mut cycle: F) -> u64
where
    T: Ticker + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CycleReport>>,
{
    let mut cycles = 0u64;
    while ticker.tick().await {
        cycles += 1;
        match cycle().await {
            Ok(report) => info!(cycle = cycles, notified = report.notified, "polling cycle done"),
            Err(err) => error!(?err, cycle = cycles, "polling cycle failed"),
        }
    }
    cycles
}

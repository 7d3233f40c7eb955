use std::time::{Duration, Instant};

use crate::config::Config;
use crate::harness::{Driver, Flow, HarnessError};
use crate::stub::{self, StubServer, StubState};

/// 单个流程的总时限
pub const FLOW_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub name: &'static str,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl FlowOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub outcomes: Vec<FlowOutcome>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> Vec<&FlowOutcome> {
        self.outcomes.iter().filter(|o| !o.passed()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(FlowOutcome::passed)
    }
}

/// 使用桩服务端时每个流程都拿到一份新的种子数据
async fn prepare(config: &Config) -> Result<(Config, Option<StubServer>), HarnessError> {
    if !config.use_stub_backend {
        return Ok((config.clone(), None));
    }
    let server = stub::spawn(StubState::seeded(config)?).await?;
    let mut config = config.clone();
    config.api_domain = server.base_url();
    Ok((config, Some(server)))
}

async fn run_one(config: &Config, flow: Flow) -> Result<(), HarnessError> {
    let (config, _server) = prepare(config).await?;
    let mut driver = Driver::new(config).await?;
    match tokio::time::timeout(FLOW_TIMEOUT, (flow.run)(&mut driver)).await {
        Ok(result) => result,
        Err(_) => Err(HarnessError::Timeout(FLOW_TIMEOUT, flow.name.to_string())),
    }
}

/// 依次执行流程，互不共享会话和缓存
pub async fn run(config: &Config, flows: &[Flow]) -> Report {
    let mut report = Report::default();

    for flow in flows {
        let started = Instant::now();
        let result = run_one(config, *flow).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(()) => tracing::info!("✓ {} ({:?})", flow.name, elapsed),
            Err(e) => tracing::error!("✗ {} ({:?}): {}", flow.name, elapsed, e),
        }
        report.outcomes.push(FlowOutcome {
            name: flow.name,
            error: result.err().map(|e| e.to_string()),
            elapsed,
        });
    }

    report
}

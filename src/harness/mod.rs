//! 端到端流程
//!
//! [`Driver`] 以 data-test 选择器驱动无界面应用，[`runner`] 为每个流程
//! 准备独立的会话与缓存（使用桩服务端时还有独立的数据）。

pub mod driver;
pub mod flows;
pub mod runner;

use std::time::Duration;

use thiserror::Error;

use crate::error::ApiError;
use crate::stub::SeedError;
use crate::ui::UiError;

pub use driver::{Driver, Locator};
pub use flows::{Flow, all_flows};
pub use runner::{FlowOutcome, Report, run};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Ui(#[from] UiError),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),

    #[error("client setup failed: {0}")]
    Api(#[from] ApiError),

    #[error("stub backend failed: {0}")]
    Stub(String),
}

impl From<SeedError> for HarnessError {
    fn from(err: SeedError) -> Self {
        HarnessError::Stub(err.to_string())
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::Stub(err.to_string())
    }
}

/// 断言失败时返回 [`HarnessError::Assertion`]
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::harness::HarnessError::Assertion(format!($($arg)+)));
        }
    };
}

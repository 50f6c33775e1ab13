//! Common test utilities

#![allow(dead_code)]

use indigo_mcp_rust::mock::MockHostExecutor;
use indigo_mcp_rust::{BridgeContext, ServerConfig};
use std::path::Path;
use std::sync::Arc;

/// Default configuration pointing the log directory at `log_dir`
pub fn test_config(log_dir: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.logs.directory = log_dir.to_path_buf();
    config
}

/// Context over the sample mock home, with the default log directory
pub fn sample_context() -> (Arc<BridgeContext>, Arc<MockHostExecutor>) {
    context_with(ServerConfig::default(), MockHostExecutor::with_sample_home())
}

pub fn context_with(
    config: ServerConfig,
    executor: MockHostExecutor,
) -> (Arc<BridgeContext>, Arc<MockHostExecutor>) {
    let executor = Arc::new(executor);
    let context = BridgeContext::with_executor(config, executor.clone())
        .expect("test configuration should be valid");
    (Arc::new(context), executor)
}

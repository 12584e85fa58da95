//! `stub`: serve the booking API stub for local runs

use std::net::SocketAddr;

use acceptor::mock::BookingStub;
use acceptor::RunConfig;

use crate::commands::StubArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Parse `host:port` into a socket address
pub fn bind_address(args: &StubArgs) -> CliResult<SocketAddr> {
    let raw = format!("{}:{}", args.host, args.port);
    raw.parse()
        .map_err(|e| CliError::invalid_argument(format!("invalid address {raw}: {e}")))
}

/// Serve until the process is stopped.
///
/// Credentials come from `API_USERNAME` / `API_PASSWORD`, so a suite run
/// with the same environment authenticates against it.
pub async fn execute_stub(config: &CliConfig, args: &StubArgs) -> CliResult<()> {
    let addr = bind_address(args)?;
    let credentials = RunConfig::from_env()?.credentials;
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.info(&format!(
        "booking stub on http://{addr}/ (user {})",
        credentials.username
    ));
    BookingStub::serve(addr, credentials).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let args = StubArgs {
            host: "0.0.0.0".to_string(),
            port: 3001,
        };
        assert_eq!(bind_address(&args).unwrap().port(), 3001);
    }

    #[test]
    fn test_bad_host_rejected() {
        let args = StubArgs {
            host: "not a host".to_string(),
            port: 3001,
        };
        assert!(matches!(
            bind_address(&args),
            Err(CliError::InvalidArgument { .. })
        ));
    }
}

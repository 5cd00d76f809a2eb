// # dnsrec-acc - Record Lifecycle Acceptance Runner
//
// Thin integration layer over dnsrec-core:
// 1. Reading configuration from environment variables
// 2. Registering providers
// 3. Running lifecycle scenarios, or tearing down a persisted run
//
// ## Configuration
//
// ### Command
// - `DNSREC_COMMAND`: `run` executes the configured scenarios (default),
//   `cleanup` destroys whatever an interrupted run left behind
//
// ### Provider
// - `DNSREC_PROVIDER_TYPE`: Provider type (digitalocean, memory)
// - `DIGITALOCEAN_TOKEN` or `DNSREC_PROVIDER_API_TOKEN`: API token
// - `DNSREC_API_BASE`: API base URL override (optional)
//
// ### Run
// - `DNSREC_ZONE`: Zone the scenarios create records in
// - `DNSREC_SCENARIOS`: Comma-separated scenario names (default: all)
// - `DNSREC_DESTROY_CHECK`: Destroy verification mode (strict, loose)
// - `DNSREC_STATE_PATH`: Run-state file used for interrupted runs
// - `DNSREC_LOG_LEVEL`: Log level
//
// ## Example
//
// ```bash
// export DNSREC_PROVIDER_TYPE=digitalocean
// export DIGITALOCEAN_TOKEN=your_token
// export DNSREC_SCENARIOS=basic,updated
//
// dnsrec-acc
// DNSREC_COMMAND=cleanup dnsrec-acc
// ```

use anyhow::{Context, Result};
use dnsrec_core::driver::TestCase;
use dnsrec_core::{
    DestroyCheck, DriverConfig, LifecycleDriver, LifecycleEvent, ProviderConfig,
    ProviderRegistry, RunState, RunStateFile, VerifierConfig, scenarios,
};
use std::env;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes following systemd conventions
#[derive(Debug, Clone, Copy)]
enum AccExitCode {
    /// Every scenario passed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// A scenario or the cleanup failed
    RunFailure = 2,
}

impl From<AccExitCode> for ExitCode {
    fn from(code: AccExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Cleanup,
}

impl std::str::FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "run" => Ok(Command::Run),
            "cleanup" => Ok(Command::Cleanup),
            other => anyhow::bail!(
                "DNSREC_COMMAND '{}' is not valid. Valid commands: run, cleanup",
                other
            ),
        }
    }
}

/// Application configuration
struct Config {
    command: String,
    provider_type: String,
    api_token: Option<String>,
    api_base: Option<String>,
    zone: String,
    scenarios: Vec<String>,
    destroy_check: String,
    state_path: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self {
            command: env::var("DNSREC_COMMAND").unwrap_or_else(|_| "run".to_string()),
            provider_type: env::var("DNSREC_PROVIDER_TYPE")
                .unwrap_or_else(|_| "digitalocean".to_string()),
            api_token: env::var("DIGITALOCEAN_TOKEN")
                .or_else(|_| env::var("DNSREC_PROVIDER_API_TOKEN"))
                .ok(),
            api_base: env::var("DNSREC_API_BASE").ok(),
            zone: env::var("DNSREC_ZONE").unwrap_or_else(|_| scenarios::ZONE.to_string()),
            scenarios: env::var("DNSREC_SCENARIOS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            destroy_check: env::var("DNSREC_DESTROY_CHECK")
                .unwrap_or_else(|_| "strict".to_string()),
            state_path: env::var("DNSREC_STATE_PATH")
                .unwrap_or_else(|_| "dnsrec-run.json".to_string()),
            log_level: env::var("DNSREC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.command()?;
        self.provider_config()?.validate()?;
        self.driver_config()?;
        validate_domain_name(&self.zone)?;

        for name in &self.scenarios {
            if scenarios::by_name(name, &self.zone).is_none() {
                let known: Vec<String> = scenarios::all(&self.zone)
                    .into_iter()
                    .map(|case| case.name)
                    .collect();
                anyhow::bail!(
                    "DNSREC_SCENARIOS entry '{}' is not a known scenario. Known: {}",
                    name,
                    known.join(", ")
                );
            }
        }

        if self.state_path.is_empty() {
            anyhow::bail!("DNSREC_STATE_PATH cannot be empty");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DNSREC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn command(&self) -> Result<Command> {
        self.command.parse()
    }

    fn provider_config(&self) -> Result<ProviderConfig> {
        match self.provider_type.as_str() {
            "digitalocean" => {
                let api_token = self.api_token.clone().unwrap_or_default();
                if api_token.is_empty() {
                    anyhow::bail!(
                        "DIGITALOCEAN_TOKEN is required when DNSREC_PROVIDER_TYPE=digitalocean. \
                        Set it via: export DIGITALOCEAN_TOKEN=your_token"
                    );
                }
                Ok(ProviderConfig::DigitalOcean {
                    api_token,
                    api_base: self.api_base.clone(),
                })
            }
            "memory" => Ok(ProviderConfig::Memory),
            other => anyhow::bail!(
                "DNSREC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: digitalocean, memory",
                other
            ),
        }
    }

    fn driver_config(&self) -> Result<DriverConfig> {
        let destroy_check: DestroyCheck = self.destroy_check.parse()?;
        let config = DriverConfig {
            verifier: VerifierConfig { destroy_check },
            ..DriverConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    fn selected_scenarios(&self) -> Vec<TestCase> {
        if self.scenarios.is_empty() {
            return scenarios::all(&self.zone);
        }
        self.scenarios
            .iter()
            .filter_map(|name| scenarios::by_name(name, &self.zone))
            .collect()
    }
}

/// Basic DNS domain name validation (RFC 1035 lengths, LDH labels)
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("DNSREC_ZONE cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = Config::from_env();
    let command = match config.validate().and_then(|()| config.command()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return AccExitCode::ConfigError.into();
        }
    };

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AccExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AccExitCode::ConfigError.into();
        }
    };

    rt.block_on(async {
        let outcome = match command {
            Command::Run => run_scenarios(&config).await,
            Command::Cleanup => cleanup(&config).await,
        };
        match outcome {
            Ok(()) => AccExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                AccExitCode::RunFailure
            }
        }
    })
    .into()
}

fn build_driver(config: &Config) -> Result<(LifecycleDriver, mpsc::Receiver<LifecycleEvent>)> {
    let registry = ProviderRegistry::with_builtin();

    #[cfg(feature = "digitalocean")]
    {
        info!("Registering DigitalOcean provider");
        dnsrec_provider_digitalocean::register(&registry);
    }

    let provider = registry
        .create_provider(&config.provider_config()?)
        .context("Failed to create provider")?;
    info!("Using provider: {}", provider.provider_name());

    let driver = LifecycleDriver::new(provider, config.driver_config()?)?;
    Ok(driver)
}

/// Forward lifecycle events to the debug log until the driver is dropped
fn log_events(mut rx: mpsc::Receiver<LifecycleEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            debug!("Lifecycle event: {:?}", event);
        }
    })
}

async fn run_scenarios(config: &Config) -> Result<()> {
    let state_file = RunStateFile::new(&config.state_path).await?;
    let leftover = state_file.load().await?;
    if !leftover.is_empty() {
        anyhow::bail!(
            "{} holds {} resource(s) from an earlier run. Run with DNSREC_COMMAND=cleanup first.",
            state_file.path().display(),
            leftover.len()
        );
    }

    let (driver, rx) = build_driver(config)?;
    let events = log_events(rx);

    let cases = config.selected_scenarios();
    info!("Running {} scenario(s) in zone {}", cases.len(), config.zone);

    let mut failures = 0;
    for case in &cases {
        let mut state = RunState::new();
        let outcome = tokio::select! {
            result = driver.run_with_state(case, &mut state) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            Some(Ok(report)) => {
                info!(
                    "PASS {} ({} step(s), {} record(s) verified destroyed)",
                    report.case, report.steps, report.destroyed_records
                );
            }
            Some(Err(e)) => {
                failures += 1;
                error!("FAIL {}: {}", case.name, e);
            }
            None => {
                warn!("Interrupted during {}", case.name);
                state_file.save(&state).await?;
                anyhow::bail!(
                    "Interrupted; {} resource(s) recorded in {}",
                    state.len(),
                    state_file.path().display()
                );
            }
        }

        if !state.is_empty() {
            state_file.save(&state).await?;
            anyhow::bail!(
                "{} left {} resource(s) behind; recorded in {}",
                case.name,
                state.len(),
                state_file.path().display()
            );
        }
    }

    drop(driver);
    if let Err(e) = events.await {
        warn!("Event logger task failed: {}", e);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} scenario(s) failed", failures, cases.len());
    }
    info!("All {} scenario(s) passed", cases.len());
    Ok(())
}

async fn cleanup(config: &Config) -> Result<()> {
    let state_file = RunStateFile::new(&config.state_path).await?;
    let mut state = state_file.load().await?;
    if state.is_empty() {
        info!("Nothing to clean up in {}", state_file.path().display());
        return Ok(());
    }

    info!(
        "Cleaning up {} resource(s) from {}",
        state.len(),
        state_file.path().display()
    );

    let (driver, _rx) = build_driver(config)?;
    match driver.destroy_all(&mut state).await {
        Ok(verified) => {
            state_file.remove().await?;
            info!("Cleanup complete, {} record(s) verified destroyed", verified);
            Ok(())
        }
        Err(e) => {
            state_file.save(&state).await?;
            Err(e).context("Cleanup failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> Config {
        Config {
            command: "run".to_string(),
            provider_type: "memory".to_string(),
            api_token: None,
            api_base: None,
            zone: scenarios::ZONE.to_string(),
            scenarios: vec![],
            destroy_check: "strict".to_string(),
            state_path: "dnsrec-run.json".to_string(),
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_memory_config_is_valid() {
        assert!(memory_config().validate().is_ok());
        assert_eq!(memory_config().selected_scenarios().len(), 5);
    }

    #[test]
    fn test_command_is_parsed() {
        assert_eq!(memory_config().command().unwrap(), Command::Run);

        let cleanup = Config {
            command: "Cleanup".to_string(),
            ..memory_config()
        };
        assert_eq!(cleanup.command().unwrap(), Command::Cleanup);

        let bad = Config {
            command: "destroy".to_string(),
            ..memory_config()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_digitalocean_requires_token() {
        let config = Config {
            provider_type: "digitalocean".to_string(),
            ..memory_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_scenario_is_rejected() {
        let config = Config {
            scenarios: vec!["basic".to_string(), "nope".to_string()],
            ..memory_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_destroy_check_mode_is_parsed() {
        let config = Config {
            destroy_check: "loose".to_string(),
            ..memory_config()
        };
        let driver_config = config.driver_config().unwrap();
        assert_eq!(driver_config.verifier.destroy_check, DestroyCheck::Loose);

        let bad = Config {
            destroy_check: "sloppy".to_string(),
            ..memory_config()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_domain_validation() {
        assert!(validate_domain_name("foobar-test-terraform.com").is_ok());
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("bad..com").is_err());
        assert!(validate_domain_name("-bad.com").is_err());
    }

    #[tokio::test]
    async fn test_memory_run_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("run.json");
        let config = Config {
            state_path: state_path.to_string_lossy().into_owned(),
            ..memory_config()
        };

        run_scenarios(&config).await.unwrap();
        cleanup(&config).await.unwrap();
        assert!(!state_path.exists());
    }
}

//! Host metadata for profiling summaries, behind a mockable probe

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMetadata {
    pub os: String,
    pub runtime: String,
    pub cpu: String,
    pub logical_processors: usize,
}

/// Source of host metadata
pub trait EnvironmentProbe: Send + Sync {
    fn host_metadata(&self) -> HostMetadata;
}

/// Reads the running machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl EnvironmentProbe for SystemProbe {
    fn host_metadata(&self) -> HostMetadata {
        HostMetadata {
            os: os_description(),
            runtime: format!("scriptbox {}", env!("CARGO_PKG_VERSION")),
            cpu: cpu_description(),
            logical_processors: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Always reports the same metadata
#[derive(Debug, Clone)]
pub struct FixedProbe {
    metadata: HostMetadata,
}

impl FixedProbe {
    pub fn new(metadata: HostMetadata) -> Self {
        Self { metadata }
    }
}

impl EnvironmentProbe for FixedProbe {
    fn host_metadata(&self) -> HostMetadata {
        self.metadata.clone()
    }
}

#[cfg(unix)]
fn os_description() -> String {
    match nix::sys::utsname::uname() {
        Ok(uts) => format!(
            "{} {}",
            uts.sysname().to_string_lossy(),
            uts.release().to_string_lossy()
        ),
        Err(e) => {
            log::debug!("uname failed: {}", e);
            std::env::consts::OS.to_string()
        }
    }
}

#[cfg(not(unix))]
fn os_description() -> String {
    std::env::consts::OS.to_string()
}

fn cpu_description() -> String {
    std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|info| {
            info.lines()
                .find(|line| line.starts_with("model name"))
                .and_then(|line| line.split_once(':'))
                .map(|(_, name)| name.trim().to_string())
        })
        .unwrap_or_else(|| std::env::consts::ARCH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_probe_reports_something() {
        let metadata = SystemProbe.host_metadata();
        assert!(!metadata.os.is_empty());
        assert!(!metadata.cpu.is_empty());
        assert!(metadata.logical_processors >= 1);
        assert!(metadata.runtime.starts_with("scriptbox "));
    }

    #[test]
    fn test_fixed_probe() {
        let metadata = HostMetadata {
            os: "TestOS 1.0".to_string(),
            runtime: "test".to_string(),
            cpu: "Imaginary CPU".to_string(),
            logical_processors: 4,
        };
        let probe = FixedProbe::new(metadata.clone());
        assert_eq!(probe.host_metadata(), metadata);
    }
}

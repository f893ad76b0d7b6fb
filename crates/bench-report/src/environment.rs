//! Host detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use sysinfo::{DiskKind, Disks, System};
use tracing::{debug, info};

/// Host facts recorded in `meta.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub os: String,
    pub arch: String,
    pub cpu_count: usize,
}

/// Capture hostname, OS and CPU count.
pub fn detect_system_info() -> SystemInfo {
    SystemInfo {
        hostname: hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string()),
        os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
        arch: std::env::consts::ARCH.to_string(),
        cpu_count: num_cpus::get(),
    }
}

/// Storage class of the disk holding the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskType {
    Ssd,
    Hdd,
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskType::Ssd => write!(f, "SSD"),
            DiskType::Hdd => write!(f, "HDD"),
        }
    }
}

/// Hardware figures the tuning formulas need.
#[derive(Debug, Clone, PartialEq)]
pub struct HostProfile {
    pub vcpus: usize,
    pub physical_cores: usize,
    pub ram_gb: u64,
    pub disk: DiskType,
    pub disk_free_gb: u64,
}

impl HostProfile {
    pub fn summary(&self) -> String {
        format!(
            "{} vCPU ({} cores), {} GB RAM, {}",
            self.vcpus, self.physical_cores, self.ram_gb, self.disk
        )
    }
}

/// Detect CPUs, memory and the disk backing `data_path`.
///
/// Unknown disks are treated as rotational.
pub fn detect_host_profile(data_path: &Path) -> HostProfile {
    let vcpus = num_cpus::get().max(1);
    let physical_cores = num_cpus::get_physical().max(1);

    let sys = System::new_all();
    let ram_gb = (sys.total_memory() / 1024 / 1024 / 1024).max(1);

    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .filter(|d| data_path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| match d.kind() {
            DiskKind::SSD => DiskType::Ssd,
            _ => DiskType::Hdd,
        })
        .unwrap_or(DiskType::Hdd);

    let disk_free_gb = match nix::sys::statfs::statfs(data_path) {
        Ok(stat) => stat.blocks_available() as u64 * stat.block_size() as u64 / 1024 / 1024 / 1024,
        Err(e) => {
            debug!("statfs({}) failed: {}", data_path.display(), e);
            100
        }
    };

    let profile = HostProfile {
        vcpus,
        physical_cores,
        ram_gb,
        disk,
        disk_free_gb,
    };
    info!("Detected: {}", profile.summary());
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_system_info() {
        let info = detect_system_info();
        assert!(info.cpu_count >= 1);
        assert!(!info.arch.is_empty());
    }

    #[test]
    fn test_detect_host_profile() {
        let profile = detect_host_profile(Path::new("/"));
        assert!(profile.vcpus >= 1);
        assert!(profile.ram_gb >= 1);
    }

    #[test]
    fn test_summary() {
        let profile = HostProfile {
            vcpus: 16,
            physical_cores: 8,
            ram_gb: 64,
            disk: DiskType::Ssd,
            disk_free_gb: 500,
        };
        assert_eq!(profile.summary(), "16 vCPU (8 cores), 64 GB RAM, SSD");
    }
}

//! PostgreSQL settings for analytic benchmark runs.

use std::path::Path;

use crate::environment::{DiskType, HostProfile};

/// One `key = value` line of the generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub section: &'static str,
    pub key: &'static str,
    pub value: String,
    pub comment: String,
}

/// Render a size in GB the way `postgresql.conf` expects it.
pub fn format_size(gb: f64) -> String {
    if gb >= 1.0 {
        format!("{}GB", gb as u64)
    } else {
        format!("{}MB", ((gb * 1024.0) as u64).max(1))
    }
}

/// Derive settings from the host profile.
pub fn calculate(profile: &HostProfile) -> Vec<Setting> {
    let ram = profile.ram_gb as f64;
    let cores = profile.physical_cores;
    let mut settings = Vec::new();
    let mut add = |section, key, value: String, comment: &str| {
        settings.push(Setting {
            section,
            key,
            value,
            comment: comment.to_string(),
        })
    };

    add("Memory", "shared_buffers", format_size(ram * 0.25), "25% of RAM");
    add("Memory", "effective_cache_size", format_size(ram * 0.75), "75% of RAM");
    add(
        "Memory",
        "work_mem",
        format_size((ram / 32.0).min(2.0)),
        "RAM/32, each parallel worker gets this",
    );
    add(
        "Memory",
        "maintenance_work_mem",
        format_size((ram / 16.0).min(4.0)),
        "for CREATE INDEX, VACUUM",
    );

    add(
        "Parallelism",
        "max_worker_processes",
        profile.vcpus.to_string(),
        &format!("{} vCPUs", profile.vcpus),
    );
    add(
        "Parallelism",
        "max_parallel_workers",
        cores.to_string(),
        &format!("{cores} physical cores"),
    );
    add(
        "Parallelism",
        "max_parallel_workers_per_gather",
        (cores / 4).clamp(2, 8).to_string(),
        "per-query parallelism",
    );
    add(
        "Parallelism",
        "max_parallel_maintenance_workers",
        (cores / 8).clamp(2, 4).to_string(),
        "parallel index builds",
    );

    match profile.disk {
        DiskType::Ssd => {
            add("Planner", "random_page_cost", "1.1".to_string(), "SSD");
            add("Planner", "effective_io_concurrency", "200".to_string(), "SSD");
        }
        DiskType::Hdd => {
            add("Planner", "random_page_cost", "4.0".to_string(), "HDD");
            add("Planner", "effective_io_concurrency", "2".to_string(), "HDD");
        }
    }

    add(
        "WAL",
        "max_wal_size",
        format_size((profile.disk_free_gb / 10).clamp(2, 40) as f64),
        "avoid frequent checkpoints during benchmark",
    );
    add("WAL", "checkpoint_timeout", "'30min'".to_string(), "");
    add(
        "WAL",
        "checkpoint_completion_target",
        "0.9".to_string(),
        "spread checkpoint writes",
    );

    add(
        "Misc",
        "huge_pages",
        "'try'".to_string(),
        "'on' for best performance (requires OS huge pages setup)",
    );
    add("Misc", "jit", "off".to_string(), "JIT overhead > benefit for TPC-DS");

    settings
}

/// Render settings as an include file for `postgresql.conf`.
pub fn render(
    settings: &[Setting],
    profile: &HostProfile,
    output_path: &Path,
    pg_data_dir: Option<&Path>,
    generated_on: &str,
) -> String {
    let mut lines = vec![
        "# TPC-DS PostgreSQL Benchmark Configuration".to_string(),
        format!("# Generated by tpcds-bench on {generated_on}"),
        format!("# Hardware: {}", profile.summary()),
        "#".to_string(),
        "# To apply, add this line to postgresql.conf:".to_string(),
        format!("#   include = '{}'", output_path.display()),
    ];
    match pg_data_dir {
        Some(dir) => {
            lines.push("# Then restart PostgreSQL:".to_string());
            lines.push(format!("#   pg_ctl restart -D {}", dir.display()));
        }
        None => lines.push("# Then restart PostgreSQL.".to_string()),
    }
    lines.push(String::new());

    let mut section = None;
    for setting in settings {
        if section != Some(setting.section) {
            if section.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("# --- {} ---", setting.section));
            section = Some(setting.section);
        }
        let entry = format!("{} = {}", setting.key, setting.value);
        if setting.comment.is_empty() {
            lines.push(entry);
        } else {
            lines.push(format!("{:<45} # {}", entry, setting.comment));
        }
    }
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(disk: DiskType) -> HostProfile {
        HostProfile {
            vcpus: 32,
            physical_cores: 16,
            ram_gb: 128,
            disk,
            disk_free_gb: 900,
        }
    }

    fn value<'a>(settings: &'a [Setting], key: &str) -> &'a str {
        &settings.iter().find(|s| s.key == key).unwrap().value
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(32.0), "32GB");
        assert_eq!(format_size(1.9), "1GB");
        assert_eq!(format_size(0.5), "512MB");
        assert_eq!(format_size(0.0001), "1MB");
    }

    #[test]
    fn test_large_ssd_host() {
        let settings = calculate(&profile(DiskType::Ssd));
        assert_eq!(value(&settings, "shared_buffers"), "32GB");
        assert_eq!(value(&settings, "effective_cache_size"), "96GB");
        assert_eq!(value(&settings, "work_mem"), "2GB");
        assert_eq!(value(&settings, "maintenance_work_mem"), "4GB");
        assert_eq!(value(&settings, "max_worker_processes"), "32");
        assert_eq!(value(&settings, "max_parallel_workers"), "16");
        assert_eq!(value(&settings, "max_parallel_workers_per_gather"), "4");
        assert_eq!(value(&settings, "max_parallel_maintenance_workers"), "2");
        assert_eq!(value(&settings, "random_page_cost"), "1.1");
        assert_eq!(value(&settings, "max_wal_size"), "40GB");
    }

    #[test]
    fn test_small_hdd_host() {
        let small = HostProfile {
            vcpus: 2,
            physical_cores: 1,
            ram_gb: 4,
            disk: DiskType::Hdd,
            disk_free_gb: 5,
        };
        let settings = calculate(&small);
        assert_eq!(value(&settings, "shared_buffers"), "1GB");
        assert_eq!(value(&settings, "work_mem"), "128MB");
        assert_eq!(value(&settings, "maintenance_work_mem"), "256MB");
        assert_eq!(value(&settings, "max_parallel_workers_per_gather"), "2");
        assert_eq!(value(&settings, "random_page_cost"), "4.0");
        assert_eq!(value(&settings, "effective_io_concurrency"), "2");
        assert_eq!(value(&settings, "max_wal_size"), "2GB");
    }

    #[test]
    fn test_render_sections() {
        let p = profile(DiskType::Ssd);
        let text = render(
            &calculate(&p),
            &p,
            Path::new("/etc/postgresql/tpcds_postgres.conf"),
            None,
            "2026-02-28",
        );
        assert!(text.contains("#   include = '/etc/postgresql/tpcds_postgres.conf'"));
        assert!(text.contains("# --- Memory ---\nshared_buffers = 32GB"));
        assert!(text.contains("\n\n# --- WAL ---\n"));
        assert!(text.contains("checkpoint_timeout = '30min'\n"));
        assert!(text.lines().any(|l| l.starts_with("jit = off") && l.ends_with("# JIT overhead > benefit for TPC-DS")));
    }
}

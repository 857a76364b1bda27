//! Per-OS statistics probes.
//!
//! Every method returns raw snapshot bytes; the collector feeds them to
//! the pool without interpreting their layout. `None` / an empty list
//! means the statistic is unavailable on this host, which the collector
//! logs and skips (or escalates under strict checks).

/// Structured OS snapshots consumed by fast and slow polls.
pub trait OsStats: Send {
    /// Process-fixed startup snapshot; added to the pool once per process.
    fn startup_info(&mut self) -> Option<Vec<u8>>;

    /// Identifiers of the current process, thread, and their parents.
    fn process_ids(&mut self) -> Vec<u64>;

    /// Window-system / session identifiers.
    fn window_system_ids(&mut self) -> Option<Vec<u8>>;

    /// Pointer, caret, and clipboard state where the platform has them.
    fn pointer_state(&mut self) -> Option<Vec<u8>>;

    /// System memory-status snapshot.
    fn memory_status(&mut self) -> Option<Vec<u8>>;

    /// Process and thread CPU-time counters.
    fn cpu_times(&mut self) -> Option<Vec<u8>>;

    /// Working-set / resident-size figures for the current process.
    fn working_set(&mut self) -> Option<Vec<u8>>;

    /// I/O statistics for the physical drive at `index`; `None` once the
    /// index runs past the last accessible drive.
    fn disk_stats(&mut self, index: usize) -> Option<Vec<u8>>;

    /// Kernel performance, processor, and interrupt statistics.
    fn kernel_stats(&mut self) -> Vec<Vec<u8>>;

    /// TCP and IP extended statistics.
    fn net_proto_stats(&mut self) -> Vec<Vec<u8>>;

    /// Network service statistics.
    fn net_service_stats(&mut self) -> Option<Vec<u8>>;

    /// Hardware telemetry (sensor) snapshots, when present.
    fn hw_telemetry(&mut self) -> Vec<Vec<u8>>;
}

/// The statistics provider for this platform.
pub fn platform_default() -> Box<dyn OsStats> {
    #[cfg(target_os = "linux")]
    {
        Box::new(LinuxOsStats::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(PortableOsStats)
    }
}

#[cfg(target_os = "linux")]
pub use linux::LinuxOsStats;

#[cfg(target_os = "linux")]
mod linux {
    use super::OsStats;
    use std::fs;

    fn read(path: &str) -> Option<Vec<u8>> {
        match fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => None,
            Err(e) => {
                log::debug!("os stats: {path}: {e}");
                None
            }
        }
    }

    /// `/proc` and `/sys` backed statistics.
    pub struct LinuxOsStats {
        disk_lines: Option<Vec<Vec<u8>>>,
    }

    impl LinuxOsStats {
        pub fn new() -> Self {
            LinuxOsStats { disk_lines: None }
        }
    }

    impl Default for LinuxOsStats {
        fn default() -> Self {
            Self::new()
        }
    }

    impl OsStats for LinuxOsStats {
        fn startup_info(&mut self) -> Option<Vec<u8>> {
            let mut snap = read("/proc/self/stat")?;
            if let Some(cmdline) = read("/proc/self/cmdline") {
                snap.extend_from_slice(&cmdline);
            }
            Some(snap)
        }

        fn process_ids(&mut self) -> Vec<u64> {
            vec![
                std::process::id() as u64,
                unsafe { libc::gettid() } as u64,
                unsafe { libc::getppid() } as u64,
                unsafe { libc::getsid(0) } as u64,
            ]
        }

        fn window_system_ids(&mut self) -> Option<Vec<u8>> {
            let mut out = Vec::new();
            for var in ["DISPLAY", "WAYLAND_DISPLAY", "XDG_SESSION_ID"] {
                if let Some(val) = std::env::var_os(var) {
                    out.extend_from_slice(val.to_string_lossy().as_bytes());
                }
            }
            if out.is_empty() {
                None
            } else {
                Some(out)
            }
        }

        fn pointer_state(&mut self) -> Option<Vec<u8>> {
            // No session-independent pointer/clipboard interface on Linux.
            None
        }

        fn memory_status(&mut self) -> Option<Vec<u8>> {
            read("/proc/meminfo")
        }

        fn cpu_times(&mut self) -> Option<Vec<u8>> {
            let mut snap = read("/proc/self/stat")?;
            if let Some(thread) = read("/proc/thread-self/stat") {
                snap.extend_from_slice(&thread);
            }
            Some(snap)
        }

        fn working_set(&mut self) -> Option<Vec<u8>> {
            read("/proc/self/statm")
        }

        fn disk_stats(&mut self, index: usize) -> Option<Vec<u8>> {
            let lines = self.disk_lines.get_or_insert_with(|| {
                read("/proc/diskstats")
                    .map(|raw| {
                        raw.split(|&b| b == b'\n')
                            .filter(|l| !l.is_empty())
                            .map(|l| l.to_vec())
                            .collect()
                    })
                    .unwrap_or_default()
            });
            // Re-read on the next pass once the walk completes.
            if index >= lines.len() {
                self.disk_lines = None;
                return None;
            }
            Some(lines[index].clone())
        }

        fn kernel_stats(&mut self) -> Vec<Vec<u8>> {
            ["/proc/stat", "/proc/interrupts", "/proc/softirqs", "/proc/vmstat"]
                .iter()
                .filter_map(|p| read(p))
                .collect()
        }

        fn net_proto_stats(&mut self) -> Vec<Vec<u8>> {
            ["/proc/net/snmp", "/proc/net/netstat"]
                .iter()
                .filter_map(|p| read(p))
                .collect()
        }

        fn net_service_stats(&mut self) -> Option<Vec<u8>> {
            read("/proc/net/dev")
        }

        fn hw_telemetry(&mut self) -> Vec<Vec<u8>> {
            let mut snaps = Vec::new();
            let Ok(hwmon) = std::fs::read_dir("/sys/class/hwmon") else {
                return snaps;
            };
            for chip in hwmon.flatten() {
                let Ok(entries) = std::fs::read_dir(chip.path()) else {
                    continue;
                };
                for entry in entries.flatten() {
                    let name = entry.file_name();
                    let name = name.to_string_lossy();
                    if (name.starts_with("temp") || name.starts_with("fan"))
                        && name.ends_with("_input")
                    {
                        if let Ok(bytes) = std::fs::read(entry.path()) {
                            snaps.push(bytes);
                        }
                    }
                }
            }
            snaps
        }
    }
}

/// Fallback provider for platforms without a dedicated implementation:
/// only process identifiers are available.
pub struct PortableOsStats;

impl OsStats for PortableOsStats {
    fn startup_info(&mut self) -> Option<Vec<u8>> {
        let args: Vec<u8> = std::env::args_os()
            .flat_map(|a| a.to_string_lossy().into_owned().into_bytes())
            .collect();
        if args.is_empty() {
            None
        } else {
            Some(args)
        }
    }

    fn process_ids(&mut self) -> Vec<u64> {
        vec![std::process::id() as u64]
    }

    fn window_system_ids(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn pointer_state(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn memory_status(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn cpu_times(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn working_set(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn disk_stats(&mut self, _index: usize) -> Option<Vec<u8>> {
        None
    }

    fn kernel_stats(&mut self) -> Vec<Vec<u8>> {
        Vec::new()
    }

    fn net_proto_stats(&mut self) -> Vec<Vec<u8>> {
        Vec::new()
    }

    fn net_service_stats(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn hw_telemetry(&mut self) -> Vec<Vec<u8>> {
        Vec::new()
    }
}

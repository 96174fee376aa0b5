use crate::types::{CpuStats, DiskStats, MemoryStats, NetworkStats, SwapStats, SystemStats};
use chrono::Utc;
use sysinfo::{CpuRefreshKind, Disks, Networks, RefreshKind, System};

/// Snapshot CPU/memory/swap/disk/network, the in-process analogue of
/// `psutil`-backed sampling in `fallback.py`/`performance_monitor.py`.
pub fn get_system_stats() -> SystemStats {
    let mut system = System::new_with_specifics(
        RefreshKind::everything().with_cpu(CpuRefreshKind::everything()),
    );
    system.refresh_cpu_usage();
    system.refresh_memory();

    let cpu = CpuStats {
        usage_percent: system.global_cpu_usage(),
        count: system.cpus().len(),
        frequency_mhz: system.cpus().first().map(|c| c.frequency()),
    };

    let total_memory = system.total_memory();
    let used_memory = system.used_memory();
    let memory = MemoryStats {
        total: total_memory,
        available: system.available_memory(),
        used: used_memory,
        used_percent: if total_memory > 0 { 100.0 * used_memory as f64 / total_memory as f64 } else { 0.0 },
        free: system.free_memory(),
    };

    let swap = SwapStats { total: system.total_swap(), used: system.used_swap(), free: system.free_swap() };

    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .iter()
        .map(|d| {
            let total = d.total_space();
            let free = d.available_space();
            let used = total.saturating_sub(free);
            DiskStats {
                mount: d.mount_point().to_string_lossy().to_string(),
                total,
                used,
                free,
                used_percent: if total > 0 { 100.0 * used as f64 / total as f64 } else { 0.0 },
            }
        })
        .collect();

    let networks = Networks::new_with_refreshed_list();
    let network = networks.iter().fold(
        NetworkStats { bytes_sent: 0, bytes_recv: 0, packets_sent: 0, packets_recv: 0 },
        |mut acc, (_, data)| {
            acc.bytes_sent += data.total_transmitted();
            acc.bytes_recv += data.total_received();
            acc.packets_sent += data.total_packets_transmitted();
            acc.packets_recv += data.total_packets_received();
            acc
        },
    );

    SystemStats { timestamp: Utc::now(), cpu, memory, swap, disk, network }
}

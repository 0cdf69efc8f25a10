use core_affinity::CoreId;
use tracing::{info, warn};

/// Ids of the CPU cores threads can be pinned to
pub fn available_cores() -> Vec<usize> {
    core_affinity::get_core_ids()
        .unwrap_or_default()
        .into_iter()
        .map(|core| core.id)
        .collect()
}

/// Pin the calling thread to `core`. Unknown cores are logged and ignored.
pub fn pin_current_thread(core: usize) -> bool {
    let cores = available_cores();
    if !cores.contains(&core) {
        warn!("Core {} not available (found {:?}), not pinning", core, cores);
        return false;
    }

    let pinned = core_affinity::set_for_current(CoreId { id: core });
    if pinned {
        info!(
            "Pinned {} thread to core {}",
            std::thread::current().name().unwrap_or("unnamed"),
            core
        );
    } else {
        warn!("Failed to pin thread to core {}", core);
    }
    pinned
}

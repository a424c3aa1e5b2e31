//! Host capability probe.
//!
//! The probe is computed once per process and cached. It never fails:
//! a feature the host lacks simply reads `false`.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();

/// Fixed-shape feature flags describing the execution host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// A background execution context (thread) can be spawned.
    pub has_worker_support: bool,
    /// Files can be read directly from a filesystem.
    pub has_modern_file_read: bool,
    /// Memory can be shared between the caller and a worker.
    pub has_shared_memory: bool,
    /// The host runs threads under cross-origin isolation (web builds).
    pub is_cross_origin_isolated: bool,
    /// Logical CPUs reported by the host (1 when unknown).
    pub logical_cpus: usize,
}

/// Probe the host, caching the answer for the life of the process.
pub fn detect() -> Capabilities {
    *CAPABILITIES.get_or_init(probe)
}

fn probe() -> Capabilities {
    let wasm = cfg!(target_family = "wasm");
    let atomics = cfg!(target_feature = "atomics");
    let threads = !wasm || atomics;

    let logical_cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let caps = Capabilities {
        has_worker_support: threads,
        has_modern_file_read: !cfg!(target_os = "unknown"),
        has_shared_memory: threads,
        is_cross_origin_isolated: wasm && atomics,
        logical_cpus,
    };
    debug!(?caps, "Probed host capabilities");
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_is_idempotent() {
        assert_eq!(detect(), detect());
    }

    #[cfg(not(target_family = "wasm"))]
    #[test]
    fn test_native_host_has_workers() {
        let caps = detect();
        assert!(caps.has_worker_support);
        assert!(caps.has_shared_memory);
        assert!(!caps.is_cross_origin_isolated);
        assert!(caps.logical_cpus >= 1);
    }
}

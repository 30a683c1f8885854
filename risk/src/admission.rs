//! Admission-control resource sampler backing the runtime supervisor's `full` flag
//! (spec §4.4.4): scaled 5-minute load average and free memory, sampled every 1 s
//! by the supervisor, with hysteresis between the set and clear thresholds.

use sysinfo::System;

/// Set when scaled load exceeds 12 or free memory drops below 10 MiB.
pub const LOAD_FULL_THRESHOLD: f64 = 12.0;
pub const FREE_MEM_FULL_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;

/// Cleared only once scaled load is at or below 12 *and* free memory exceeds 12 MiB.
pub const LOAD_CLEAR_THRESHOLD: f64 = 12.0;
pub const FREE_MEM_CLEAR_THRESHOLD_BYTES: u64 = 12 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub scaled_load5: f64,
    pub free_mem_bytes: u64,
}

/// Wraps `sysinfo::System` to produce a [`ResourceSample`] each tick.
pub struct ResourceSampler {
    system: System,
    num_cpus: usize,
}

impl ResourceSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        let num_cpus = system.cpus().len().max(1);
        Self { system, num_cpus }
    }

    pub fn sample(&mut self) -> ResourceSample {
        self.system.refresh_memory();
        let load = System::load_average();
        ResourceSample {
            scaled_load5: load.five / self.num_cpus as f64,
            free_mem_bytes: self.system.free_memory(),
        }
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Given the sampler's current reading and whether the system is presently
/// flagged `full`, computes the next `full` value under hysteresis.
pub fn next_full_state(sample: ResourceSample, currently_full: bool) -> bool {
    let should_set = sample.scaled_load5 > LOAD_FULL_THRESHOLD
        || sample.free_mem_bytes < FREE_MEM_FULL_THRESHOLD_BYTES;
    let should_clear = sample.scaled_load5 <= LOAD_CLEAR_THRESHOLD
        && sample.free_mem_bytes > FREE_MEM_CLEAR_THRESHOLD_BYTES;

    if should_set {
        true
    } else if should_clear {
        false
    } else {
        currently_full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(load: f64, free_mb: u64) -> ResourceSample {
        ResourceSample { scaled_load5: load, free_mem_bytes: free_mb * 1024 * 1024 }
    }

    #[test]
    fn sets_full_on_high_load() {
        assert!(next_full_state(sample(13.0, 100), false));
    }

    #[test]
    fn sets_full_on_low_memory() {
        assert!(next_full_state(sample(1.0, 5), false));
    }

    #[test]
    fn clears_full_once_both_recover() {
        assert!(!next_full_state(sample(5.0, 50), true));
    }

    #[test]
    fn stays_full_in_the_hysteresis_band() {
        // load has recovered below 12 but memory hasn't cleared 12 MiB yet
        assert!(next_full_state(sample(5.0, 11), true));
    }

    #[test]
    fn stays_clear_while_nothing_crosses_the_set_threshold() {
        assert!(!next_full_state(sample(5.0, 50), false));
    }
}

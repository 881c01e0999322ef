use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Controller-wide counters, cheap to clone and share
#[derive(Debug, Clone)]
pub struct ControllerMetrics {
    pub reports_received: Arc<AtomicU64>,
    pub reports_ignored: Arc<AtomicU64>,
    pub neighbour_results_skipped: Arc<AtomicU64>,
    pub evaluations: Arc<AtomicU64>,
    pub handovers_commanded: Arc<AtomicU64>,
    pub serving_assignments: Arc<AtomicU64>,
    pub terminals_released: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Default for ControllerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self {
            reports_received: Arc::new(AtomicU64::new(0)),
            reports_ignored: Arc::new(AtomicU64::new(0)),
            neighbour_results_skipped: Arc::new(AtomicU64::new(0)),
            evaluations: Arc::new(AtomicU64::new(0)),
            handovers_commanded: Arc::new(AtomicU64::new(0)),
            serving_assignments: Arc::new(AtomicU64::new(0)),
            terminals_released: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record_report(&self) {
        self.reports_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored_report(&self) {
        self.reports_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_neighbour(&self) {
        self.neighbour_results_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evaluation(&self, handover: bool) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        if handover {
            self.handovers_commanded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_serving_assignment(&self) {
        self.serving_assignments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_release(&self) {
        self.terminals_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ControllerStats {
        ControllerStats {
            reports_received: self.reports_received.load(Ordering::Relaxed),
            reports_ignored: self.reports_ignored.load(Ordering::Relaxed),
            neighbour_results_skipped: self.neighbour_results_skipped.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            handovers_commanded: self.handovers_commanded.load(Ordering::Relaxed),
            serving_assignments: self.serving_assignments.load(Ordering::Relaxed),
            terminals_released: self.terminals_released.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStats {
    pub reports_received: u64,
    pub reports_ignored: u64,
    pub neighbour_results_skipped: u64,
    pub evaluations: u64,
    pub handovers_commanded: u64,
    pub serving_assignments: u64,
    pub terminals_released: u64,
    pub uptime_secs: u64,
}

impl ControllerStats {
    /// Share of evaluations that ended in a handover command, in percent
    pub fn handover_rate(&self) -> f64 {
        if self.evaluations == 0 {
            0.0
        } else {
            self.handovers_commanded as f64 * 100.0 / self.evaluations as f64
        }
    }

    pub fn print_summary(&self) {
        println!("╔═══════════════════════════════════════╗");
        println!("║      Handover Controller Statistics   ║");
        println!("╠═══════════════════════════════════════╣");
        println!("║ Uptime: {} seconds", self.uptime_secs);
        println!("║ Reports Received: {}", self.reports_received);
        println!("║ Reports Ignored: {}", self.reports_ignored);
        println!("║ Neighbour Results Skipped: {}", self.neighbour_results_skipped);
        println!("║ Serving Assignments: {}", self.serving_assignments);
        println!("║ Evaluations: {}", self.evaluations);
        println!(
            "║ Handovers Commanded: {} ({:.1}%)",
            self.handovers_commanded,
            self.handover_rate()
        );
        println!("║ Terminals Released: {}", self.terminals_released);
        println!("╚═══════════════════════════════════════╝");
    }
}

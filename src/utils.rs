use std::io::Write;

/// Running count of records matched by a pass, redrawn on stderr every
/// `interval` records.
pub struct ProgressCounter {
    label: &'static str,
    interval: u64,
    count: u64,
}

impl ProgressCounter {
    pub fn new(label: &'static str, interval: u64) -> Self {
        let counter = Self {
            label,
            interval: interval.max(1),
            count: 0,
        };
        counter.print();
        counter
    }

    pub fn inc(&mut self, delta: u64) {
        let prev = self.count;
        self.count += delta;
        // Print if we crossed an interval boundary
        if prev / self.interval < self.count / self.interval {
            self.print();
        }
    }

    pub fn finish(self) -> u64 {
        self.print();
        eprintln!();
        self.count
    }

    fn print(&self) {
        eprint!("\r{}: {}", self.label, self.count);
        let _ = std::io::stderr().flush();
    }
}

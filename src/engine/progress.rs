//! Batch-wide progress aggregation.
//!
//! Each file owns `100 / files` of the total and each of its steps an equal
//! slice of that. Forwarded values never decrease, stay within [0, 100] and
//! repeated values are not re-emitted. 100 itself is only forwarded when the
//! last file closes successfully.

/// Aggregates per-step progress of a sequential batch into one percentage
#[derive(Debug, Clone)]
pub struct ProgressManager {
    files: usize,
    steps: usize,
    /// Steps finished by successful files
    completed_units: usize,
    /// 1-based step of the current file
    step: usize,
    last: Option<f64>,
    failed: usize,
}

impl ProgressManager {
    pub fn new(files: usize, steps: usize) -> Self {
        Self {
            files: files.max(1),
            steps: steps.max(1),
            completed_units: 0,
            step: 1,
            last: None,
            failed: 0,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Current 1-based step within the file
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    /// Share of the whole batch owned by one file
    pub fn file_share(&self) -> f64 {
        100.0 / self.files as f64
    }

    /// Share of the whole batch owned by one step
    pub fn step_share(&self) -> f64 {
        self.file_share() / self.steps as f64
    }

    /// Overall value for `pct` percent of the current step
    pub fn overall(&self, pct: f64) -> f64 {
        let pct = if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) };
        let units = self.completed_units as f64 + (self.step - 1) as f64 + pct / 100.0;
        let total = (self.files * self.steps) as f64;
        (units * 100.0 / total).clamp(0.0, 100.0)
    }

    /// Record progress within the current step. Returns the value to forward,
    /// or `None` when it would not move the aggregate forward.
    pub fn update(&mut self, pct: f64) -> Option<f64> {
        let value = self.overall(pct);
        if value >= 100.0 {
            return None;
        }
        self.emit(value)
    }

    fn emit(&mut self, value: f64) -> Option<f64> {
        match self.last {
            Some(last) if value <= last => None,
            _ => {
                self.last = Some(value);
                Some(value)
            }
        }
    }

    /// Report 100% for the current step and move to the next one.
    pub fn next_step(&mut self) -> Option<f64> {
        let emitted = self.update(100.0);
        if self.step < self.steps {
            self.step += 1;
        }
        emitted
    }

    /// Close the current file as successful. Any step the worker left
    /// unfinished counts as done.
    pub fn finish_file(&mut self) -> Option<f64> {
        self.step = self.steps;
        let emitted = self.emit(self.overall(100.0));
        self.completed_units += self.steps;
        self.step = 1;
        emitted
    }

    /// Close the current file as failed; its share is never credited, so
    /// the batch cannot reach 100.
    pub fn fail_file(&mut self) {
        self.failed += 1;
        self.step = 1;
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

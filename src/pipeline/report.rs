/// A confirmed merge, as seen by a reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeEvent<'a> {
    pub parent: &'a str,
    pub child: &'a str,
    pub root: &'a str,
}

/// Progress and event sink injected into the scan. All methods default to no-ops.
pub trait Reporter {
    fn start(&mut self, _total_pairs: u64) {}

    /// `pairs` more (parent, child) slots have been visited, skipped ones included.
    fn advance(&mut self, _pairs: u64) {}

    fn merged(&mut self, _event: &MergeEvent<'_>) {}

    fn finish(&mut self) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

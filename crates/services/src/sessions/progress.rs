/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub locked: usize,
    pub local_correct: usize,
    pub position: usize,
    pub elapsed_seconds: u64,
}

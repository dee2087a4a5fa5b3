use pageaudit_core::{AuditLog, AuditResult};
use serde_json::{Map, Value};

const FULL_MARKS: i64 = 100;

/// Accumulates checks into a 0..=100 score, log entries and details.
///
/// Every check starts from full marks; warnings and errors deduct their
/// penalty. The status is left to the log entries.
#[derive(Debug, Default)]
pub struct Scorecard {
    deductions: i64,
    log: AuditLog,
    details: Map<String, Value>,
}

impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        self.log.info(message);
    }

    pub fn warn(&mut self, penalty: i64, message: impl Into<String>) {
        self.deductions += penalty;
        self.log.warn(message);
    }

    pub fn fail(&mut self, penalty: i64, message: impl Into<String>) {
        self.deductions += penalty;
        self.log.error(message);
    }

    /// Record a measured value under `details`.
    pub fn detail(&mut self, key: &str, value: impl Into<Value>) {
        self.details.insert(key.to_string(), value.into());
    }

    pub fn score(&self) -> i64 {
        (FULL_MARKS - self.deductions).clamp(0, FULL_MARKS)
    }

    /// Finish with `details.score` set to `score`.
    pub fn finish_with_score(mut self, key: &str, name: &str, score: i64) -> AuditResult {
        self.details
            .insert("score".to_string(), Value::from(score.clamp(0, FULL_MARKS)));
        AuditResult::from_log(key, name, Value::Object(self.details), self.log)
    }

    pub fn finish(self, key: &str, name: &str) -> AuditResult {
        let score = self.score();
        self.finish_with_score(key, name, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageaudit_core::AuditStatus;

    #[test]
    fn test_penalties_clamp_at_zero() {
        let mut card = Scorecard::new();
        card.fail(70, "a");
        card.fail(70, "b");
        assert_eq!(card.score(), 0);
        let result = card.finish("security", "Security");
        assert_eq!(result.status, AuditStatus::Fail);
        assert_eq!(result.score(), Some(0.0));
    }

    #[test]
    fn test_details_carry_measurements() {
        let mut card = Scorecard::new();
        card.pass("fine");
        card.warn(15, "meh");
        card.detail("responseTimeMs", 420);
        let result = card.finish("perf", "Performance");
        assert_eq!(result.status, AuditStatus::Warn);
        assert_eq!(result.details["score"], 85);
        assert_eq!(result.details["responseTimeMs"], 420);
        assert_eq!(result.logs.len(), 2);
    }
}

use crate::prelude::SeverityRule;
use crate::telemetry::log::LogManager;
use crate::trajectory::{AnomalyFlag, AnomalySegment};

/// Merges per-index flags into contiguous anomaly segments.
///
/// Flags whose indices are within `adjacency_gap` of the previous run are
/// folded into the same segment; a gap of 0 merges only strictly adjacent
/// or duplicate indices. Output segments are ordered by start index and
/// never overlap.
pub struct Aggregator {
    adjacency_gap: usize,
    severity_rule: SeverityRule,
    logger: LogManager,
}

impl Aggregator {
    pub fn new(adjacency_gap: usize, severity_rule: SeverityRule) -> Self {
        Self {
            adjacency_gap,
            severity_rule,
            logger: LogManager::new(),
        }
    }

    pub fn aggregate(&self, mut flags: Vec<AnomalyFlag>) -> Vec<AnomalySegment> {
        if flags.is_empty() {
            return Vec::new();
        }
        flags.sort_by_key(|flag| flag.index);

        let mut segments: Vec<AnomalySegment> = Vec::new();
        let mut current: Vec<AnomalyFlag> = vec![flags.remove(0)];

        for flag in flags {
            let last_index = current.last().map(|f| f.index).unwrap_or(flag.index);
            if flag.index <= last_index + self.adjacency_gap + 1 {
                current.push(flag);
            } else {
                segments.push(self.seal(std::mem::take(&mut current)));
                current.push(flag);
            }
        }
        segments.push(self.seal(current));

        self.logger.record(&format!(
            "Aggregator produced {} segments from flagged windows",
            segments.len()
        ));
        segments
    }

    fn seal(&self, flags: Vec<AnomalyFlag>) -> AnomalySegment {
        let start_index = flags.first().map(|f| f.index).unwrap_or(0);
        let end_index = flags.last().map(|f| f.index).unwrap_or(start_index);
        let aggregate_severity = match self.severity_rule {
            SeverityRule::Max => flags.iter().map(|f| f.severity).fold(0.0, f64::max),
            SeverityRule::CountWeighted => flags.iter().map(|f| f.severity).sum(),
        };

        AnomalySegment {
            start_index,
            end_index,
            contributing_flags: flags,
            aggregate_severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_flag(index: usize, severity: f64) -> AnomalyFlag {
        AnomalyFlag::rule(index, "test violation", severity)
    }

    #[test]
    fn adjacent_flags_merge_into_one_segment() {
        let aggregator = Aggregator::new(0, SeverityRule::Max);
        let segments = aggregator.aggregate(vec![rule_flag(3, 1.5), rule_flag(4, 2.0)]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_index, 3);
        assert_eq!(segments[0].end_index, 4);
        assert_eq!(segments[0].aggregate_severity, 2.0);
    }

    #[test]
    fn distant_flags_stay_separate() {
        let aggregator = Aggregator::new(0, SeverityRule::Max);
        let segments = aggregator.aggregate(vec![rule_flag(3, 1.0), rule_flag(6, 1.0)]);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_index, 3);
        assert_eq!(segments[1].start_index, 6);
    }

    #[test]
    fn gap_bridges_nearby_flags() {
        let aggregator = Aggregator::new(2, SeverityRule::Max);
        let segments = aggregator.aggregate(vec![rule_flag(3, 1.0), rule_flag(6, 1.0)]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_index, 3);
        assert_eq!(segments[0].end_index, 6);
    }

    #[test]
    fn duplicate_indices_merge_not_duplicate() {
        let aggregator = Aggregator::new(0, SeverityRule::Max);
        let segments = aggregator.aggregate(vec![
            rule_flag(5, 1.0),
            AnomalyFlag::model(5, 0.8),
            rule_flag(6, 1.2),
        ]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].contributing_flags.len(), 3);
        assert_eq!(segments[0].span(), 2);
    }

    #[test]
    fn segments_come_out_ordered_even_from_unsorted_flags() {
        let aggregator = Aggregator::new(0, SeverityRule::Max);
        let segments =
            aggregator.aggregate(vec![rule_flag(9, 1.0), rule_flag(1, 1.0), rule_flag(2, 1.0)]);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_index, 1);
        assert_eq!(segments[0].end_index, 2);
        assert_eq!(segments[1].start_index, 9);
    }

    #[test]
    fn count_weighted_severity_sums_contributions() {
        let aggregator = Aggregator::new(0, SeverityRule::CountWeighted);
        let segments = aggregator.aggregate(vec![rule_flag(3, 1.5), rule_flag(4, 2.0)]);
        assert_eq!(segments[0].aggregate_severity, 3.5);
    }

    #[test]
    fn no_flags_yield_no_segments() {
        let aggregator = Aggregator::new(0, SeverityRule::Max);
        assert!(aggregator.aggregate(Vec::new()).is_empty());
    }
}

/// Pipeline stage definitions
///
/// One (domain, crawler) unit of work moves through these stages. The
/// extract/evaluate pair repeats once per extractor.
use crate::BenchError;
use std::fmt;

/// Represents where a unit of work is in the benchmark pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Scheduled but not started
    Pending,

    /// Backend is fetching pages
    Crawling,

    /// Crawl output is being cleaned and capped
    Parsing,

    /// An extractor is running (or its cached output is being loaded)
    Extracting,

    /// Extracted features are being scored
    Evaluating,

    /// Every extractor has produced a result for this unit
    Done,
}

impl Stage {
    /// Returns true if no further work is expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks whether moving from `self` to `next` is allowed
    ///
    /// Pending may jump straight to Parsing when a cached crawl is reused, or
    /// to Done when a cache-only run finds nothing. Extracting may repeat when
    /// an extractor fails before evaluation.
    pub fn can_transition_to(&self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Pending, Crawling)
                | (Pending, Parsing)
                | (Pending, Done)
                | (Crawling, Parsing)
                | (Crawling, Done)
                | (Parsing, Extracting)
                | (Parsing, Done)
                | (Extracting, Evaluating)
                | (Extracting, Extracting)
                | (Extracting, Done)
                | (Evaluating, Extracting)
                | (Evaluating, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Crawling => "crawling",
            Self::Parsing => "parsing",
            Self::Extracting => "extracting",
            Self::Evaluating => "evaluating",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the stage of one (domain, crawler) unit and rejects illegal moves
#[derive(Debug, Clone)]
pub struct StageTracker {
    domain: String,
    crawler: String,
    stage: Stage,
}

impl StageTracker {
    pub fn new(domain: &str, crawler: &str) -> Self {
        Self {
            domain: domain.to_string(),
            crawler: crawler.to_string(),
            stage: Stage::Pending,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves to `next`, or returns `InvalidTransition` leaving the stage unchanged
    pub fn advance(&mut self, next: Stage) -> Result<(), BenchError> {
        if !self.stage.can_transition_to(next) {
            return Err(BenchError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        tracing::trace!(
            domain = %self.domain,
            crawler = %self.crawler,
            "stage {} -> {}",
            self.stage,
            next
        );
        self.stage = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(Stage::Done.is_terminal());
        assert!(!Stage::Pending.is_terminal());
        assert!(!Stage::Extracting.is_terminal());
    }

    #[test]
    fn test_live_path() {
        let mut tracker = StageTracker::new("example.com", "jina");
        for next in [
            Stage::Crawling,
            Stage::Parsing,
            Stage::Extracting,
            Stage::Evaluating,
            Stage::Extracting,
            Stage::Evaluating,
            Stage::Done,
        ] {
            tracker.advance(next).unwrap();
        }
        assert_eq!(tracker.stage(), Stage::Done);
    }

    #[test]
    fn test_cached_path_skips_crawling() {
        let mut tracker = StageTracker::new("example.com", "jina");
        tracker.advance(Stage::Parsing).unwrap();
        tracker.advance(Stage::Extracting).unwrap();
        tracker.advance(Stage::Done).unwrap();
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut tracker = StageTracker::new("example.com", "jina");
        let err = tracker.advance(Stage::Evaluating).unwrap_err();
        assert!(matches!(
            err,
            BenchError::InvalidTransition {
                from: Stage::Pending,
                to: Stage::Evaluating
            }
        ));
        assert_eq!(tracker.stage(), Stage::Pending);
    }

    #[test]
    fn test_done_is_final() {
        let mut tracker = StageTracker::new("example.com", "jina");
        tracker.advance(Stage::Done).unwrap();
        assert!(tracker.advance(Stage::Crawling).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Stage::Pending), "pending");
        assert_eq!(format!("{}", Stage::Evaluating), "evaluating");
    }
}

//! Result Aggregator — orders a batch of scores for display.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::screening::ScoreResult;

/// Scores ordered by `final_score` descending. Ties keep their upload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedResultSet(Vec<ScoreResult>);

impl RankedResultSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoreResult> {
        self.0.iter()
    }
}

/// Ranks results in upload order. `sort_by` is stable, so equal scores are not reordered.
pub fn aggregate(mut results: Vec<ScoreResult>) -> RankedResultSet {
    results.sort_by(|a, b| by_score_desc(a, b));
    RankedResultSet(results)
}

fn by_score_desc(a: &ScoreResult, b: &ScoreResult) -> Ordering {
    b.final_score.total_cmp(&a.final_score)
}

use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::MatchConfig;
use crate::filters::eligible_modes;
use crate::request::Request;
use crate::scoring::{score_modes, ScoreTerms};

/// One ranked catalog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Row index in the catalog the recommendation was computed against
    pub index: usize,
    pub instrument: String,
    pub score: f64,
    pub terms: ScoreTerms,
}

#[derive(Debug, Clone)]
pub struct ScoreStats {
    pub count: usize,
    pub best: f64,
    pub worst: f64,
    pub mean: f64,
}

impl ScoreStats {
    pub fn log(&self, note: &str) {
        log::info!(
            "{}: count={}, best={:.2}, worst={:.2}, mean={:.2}",
            note,
            self.count,
            self.best,
            self.worst,
            self.mean
        );
    }
}

pub fn calculate_score_stats(recommendations: &[Recommendation]) -> Option<ScoreStats> {
    if recommendations.is_empty() {
        return None;
    }

    let count = recommendations.len();
    let best = recommendations
        .iter()
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let worst = recommendations
        .iter()
        .map(|r| r.score)
        .fold(f64::INFINITY, f64::min);
    let mean = recommendations.iter().map(|r| r.score).sum::<f64>() / count as f64;

    Some(ScoreStats {
        count,
        best,
        worst,
        mean,
    })
}

/// Sort by descending score.
///
/// The sort is stable, so rows with identical scores keep their input
/// (catalog) order. With `drop_non_positive` set, rows scoring zero or
/// less are removed first.
pub fn rank(mut recommendations: Vec<Recommendation>, config: &MatchConfig) -> Vec<Recommendation> {
    if config.drop_non_positive {
        recommendations.retain(|r| {
            let keep = r.score > 0.0;
            if !keep {
                log::debug!(
                    "Dropping non-positive score: row={}, instrument={}, score={:.3}",
                    r.index,
                    r.instrument,
                    r.score
                );
            }
            keep
        });
    }

    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
    recommendations
}

/// Filter, score and rank `catalog` for `request`.
///
/// An empty result means nothing in the catalog satisfies the request.
pub fn recommend(catalog: &Catalog, request: &Request, config: &MatchConfig) -> Vec<Recommendation> {
    let eligible = eligible_modes(catalog, request, config);

    let scored: Vec<Recommendation> = score_modes(catalog, &eligible, request, config)
        .into_iter()
        .filter_map(|(index, terms)| {
            let record = catalog.get(index)?;
            Some(Recommendation {
                index,
                instrument: record.instrument.clone(),
                score: terms.total(),
                terms,
            })
        })
        .collect();

    let ranked = rank(scored, config);
    if let Some(stats) = calculate_score_stats(&ranked) {
        stats.log("Ranked recommendations");
    }
    ranked
}

use crate::error::GateError;
use crate::evaluation::SampleRecord;
use crate::strategy::{USE_CASE_ACCURACY, USE_CASE_BALANCED, USE_CASE_COST, USE_CASE_PERFORMANCE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Per-variant aggregate metrics and derived scores, as emitted in the
/// strategy document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantScore {
    pub model_id: String,
    pub mean_latency: f64,
    pub mean_similarity: f64,
    pub mean_cost: f64,
    pub latency_score: f64,
    pub similarity_score: f64,
    pub cost_score: f64,
    pub performance_score: f64,
    pub accuracy_score: f64,
    pub balanced_score: f64,
    pub cost_weighted_score: f64,
}

/// The persisted selection policy consumed by the routing handlers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionStrategy {
    pub primary_model: String,
    pub fallback_models: Vec<String>,
    pub use_case_models: BTreeMap<String, String>,
    pub model_scores: Vec<VariantScore>,
}

struct Aggregate {
    model_id: String,
    latency: f64,
    similarity: f64,
    cost: f64,
}

/// Derive the selection strategy from evaluation samples.
///
/// Error samples are ignored; variants with no successful samples are
/// excluded entirely. Errors when nothing remains.
pub fn derive_strategy(samples: &[SampleRecord]) -> Result<SelectionStrategy, GateError> {
    let aggregates = aggregate_by_variant(samples)?;

    let (lat_min, lat_max) = min_max(aggregates.iter().map(|a| a.latency));
    let (sim_min, sim_max) = min_max(aggregates.iter().map(|a| a.similarity));
    let (cost_min, cost_max) = min_max(aggregates.iter().map(|a| a.cost));

    let mut scores: Vec<VariantScore> = aggregates
        .into_iter()
        .map(|a| {
            let latency_score = normalize_lower_better(a.latency, lat_min, lat_max);
            let similarity_score = normalize_higher_better(a.similarity, sim_min, sim_max);
            let cost_score = normalize_lower_better(a.cost, cost_min, cost_max);
            VariantScore {
                model_id: a.model_id,
                mean_latency: a.latency,
                mean_similarity: a.similarity,
                mean_cost: a.cost,
                latency_score,
                similarity_score,
                cost_score,
                performance_score: 0.8 * latency_score + 0.2 * similarity_score,
                accuracy_score: 0.2 * latency_score + 0.8 * similarity_score,
                balanced_score: 0.5 * latency_score + 0.5 * similarity_score,
                cost_weighted_score: 0.7 * cost_score + 0.3 * similarity_score,
            }
        })
        .collect();

    scores.sort_by(|a, b| b.balanced_score.total_cmp(&a.balanced_score));

    let best_performance = argmax(&scores, |s| s.performance_score);
    let best_accuracy = argmax(&scores, |s| s.accuracy_score);
    let best_balanced = scores[0].model_id.clone();
    let best_cost = argmax(&scores, |s| s.cost_weighted_score);

    let fallback_models = scores
        .iter()
        .skip(1)
        .map(|s| s.model_id.clone())
        .collect();

    let use_case_models = BTreeMap::from([
        (USE_CASE_PERFORMANCE.to_string(), best_performance),
        (USE_CASE_ACCURACY.to_string(), best_accuracy),
        (USE_CASE_BALANCED.to_string(), best_balanced.clone()),
        (USE_CASE_COST.to_string(), best_cost),
    ]);

    info!(primary = %best_balanced, variants = scores.len(), "strategy derived");

    Ok(SelectionStrategy {
        primary_model: best_balanced,
        fallback_models,
        use_case_models,
        model_scores: scores,
    })
}

fn aggregate_by_variant(samples: &[SampleRecord]) -> Result<Vec<Aggregate>, GateError> {
    let mut grouped: BTreeMap<&str, Vec<&SampleRecord>> = BTreeMap::new();
    for sample in samples {
        if sample.is_success() {
            grouped.entry(&sample.variant).or_default().push(sample);
        } else {
            warn!(variant = %sample.variant, "skipping error sample");
        }
    }
    if grouped.is_empty() {
        return Err(GateError::EmptyEvaluation);
    }

    Ok(grouped
        .into_iter()
        .map(|(variant, rows)| {
            let n = rows.len() as f64;
            Aggregate {
                model_id: variant.to_string(),
                latency: rows.iter().map(|s| s.latency_secs).sum::<f64>() / n,
                similarity: rows.iter().filter_map(|s| s.similarity).sum::<f64>() / n,
                cost: rows.iter().filter_map(|s| s.cost).sum::<f64>() / n,
            }
        })
        .collect())
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

/// Min-max score where smaller raw values are better. A degenerate
/// range (all variants identical) scores 1.0 instead of dividing by
/// zero.
fn normalize_lower_better(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range <= f64::EPSILON {
        1.0
    } else {
        (max - value) / range
    }
}

/// Min-max score where larger raw values are better.
fn normalize_higher_better(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range <= f64::EPSILON {
        1.0
    } else {
        (value - min) / range
    }
}

/// First variant (in current order) with the maximal score; ties keep
/// the earlier entry.
fn argmax(scores: &[VariantScore], key: impl Fn(&VariantScore) -> f64) -> String {
    let mut best = &scores[0];
    for s in &scores[1..] {
        if key(s) > key(best) {
            best = s;
        }
    }
    best.model_id.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::select::select_model;

    fn sample(variant: &str, latency: f64, similarity: f64, cost: f64) -> SampleRecord {
        SampleRecord {
            variant: variant.to_string(),
            question: "q".to_string(),
            context: "c".to_string(),
            output: Some("a".to_string()),
            latency_secs: latency,
            input_tokens: Some(100),
            output_tokens: Some(50),
            cost: Some(cost),
            similarity: Some(similarity),
            error: None,
        }
    }

    fn error_sample(variant: &str) -> SampleRecord {
        SampleRecord {
            variant: variant.to_string(),
            question: "q".to_string(),
            context: "c".to_string(),
            output: None,
            latency_secs: 1.0,
            input_tokens: None,
            output_tokens: None,
            cost: None,
            similarity: None,
            error: Some("boom".to_string()),
        }
    }

    // micro: fastest, cheapest, weakest answers. pro: slowest, priciest,
    // best answers. lite sits in between on every axis.
    fn three_variants() -> Vec<SampleRecord> {
        vec![
            sample("micro", 0.4, 0.70, 0.0001),
            sample("micro", 0.6, 0.74, 0.0001),
            sample("lite", 1.0, 0.80, 0.002),
            sample("lite", 1.2, 0.84, 0.002),
            sample("pro", 2.8, 0.90, 0.0040),
            sample("pro", 3.2, 0.94, 0.0040),
        ]
    }

    #[test]
    fn means_and_normalization() {
        let strategy = derive_strategy(&three_variants()).expect("derives");
        let micro = strategy
            .model_scores
            .iter()
            .find(|s| s.model_id == "micro")
            .expect("micro present");
        assert!((micro.mean_latency - 0.5).abs() < 1e-12);
        assert!((micro.mean_similarity - 0.72).abs() < 1e-12);
        // fastest and cheapest normalize to 1.0, weakest similarity to 0.0
        assert!((micro.latency_score - 1.0).abs() < 1e-12);
        assert!((micro.cost_score - 1.0).abs() < 1e-12);
        assert!(micro.similarity_score.abs() < 1e-12);

        let pro = strategy
            .model_scores
            .iter()
            .find(|s| s.model_id == "pro")
            .expect("pro present");
        assert!(pro.latency_score.abs() < 1e-12);
        assert!((pro.similarity_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn use_case_winners_follow_the_weights() {
        let strategy = derive_strategy(&three_variants()).expect("derives");
        // 0.8*latency favors micro; 0.8*similarity favors pro.
        assert_eq!(strategy.use_case_models[USE_CASE_PERFORMANCE], "micro");
        assert_eq!(strategy.use_case_models[USE_CASE_ACCURACY], "pro");
        assert_eq!(strategy.use_case_models[USE_CASE_COST], "micro");
        assert_eq!(
            strategy.use_case_models[USE_CASE_BALANCED],
            strategy.primary_model
        );
    }

    #[test]
    fn fallbacks_are_remaining_variants_in_balanced_order() {
        let strategy = derive_strategy(&three_variants()).expect("derives");
        assert_eq!(strategy.fallback_models.len(), 2);
        assert!(!strategy.fallback_models.contains(&strategy.primary_model));
        let balanced: Vec<f64> = strategy
            .model_scores
            .iter()
            .map(|s| s.balanced_score)
            .collect();
        assert!(balanced.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn error_samples_are_excluded_from_aggregates() {
        let mut samples = three_variants();
        samples.push(error_sample("micro"));
        samples.push(error_sample("broken-variant"));
        let strategy = derive_strategy(&samples).expect("derives");
        // broken-variant had only error samples and must not appear
        assert!(
            strategy
                .model_scores
                .iter()
                .all(|s| s.model_id != "broken-variant")
        );
        // micro's mean is unchanged by its error sample
        let micro = strategy
            .model_scores
            .iter()
            .find(|s| s.model_id == "micro")
            .expect("micro present");
        assert!((micro.mean_latency - 0.5).abs() < 1e-12);
    }

    #[test]
    fn single_variant_scores_one_everywhere() {
        let samples = vec![sample("solo", 1.0, 0.8, 0.001)];
        let strategy = derive_strategy(&samples).expect("derives");
        assert_eq!(strategy.primary_model, "solo");
        assert!(strategy.fallback_models.is_empty());
        let solo = &strategy.model_scores[0];
        assert_eq!(solo.latency_score, 1.0);
        assert_eq!(solo.similarity_score, 1.0);
        assert_eq!(solo.cost_score, 1.0);
        assert_eq!(solo.balanced_score, 1.0);
    }

    #[test]
    fn all_errors_is_an_error() {
        let samples = vec![error_sample("a"), error_sample("b")];
        assert!(matches!(
            derive_strategy(&samples),
            Err(GateError::EmptyEvaluation)
        ));
    }

    #[test]
    fn document_round_trips_through_json() {
        let strategy = derive_strategy(&three_variants()).expect("derives");
        let doc = serde_json::to_string(&strategy).expect("serializes");
        assert!(!doc.contains("NaN"));
        let parsed: SelectionStrategy = serde_json::from_str(&doc).expect("parses");
        assert_eq!(parsed, strategy);
        assert_eq!(select_model(&parsed, "general"), parsed.primary_model);
    }
}

use crate::domain::{Candidate, QualityScore};
use crate::quality;
use std::collections::HashMap;
use tracing::{debug, info};

/// Relative difference below which two numeric field values count as equal.
const NUMERIC_EQ_TOLERANCE: f64 = 0.005;

/// A candidate together with the score computed from its own field set,
/// used only to order conflicting-value tie-breaks during merge.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: QualityScore,
}

/// Group candidates by normalized slug and merge each group into one
/// candidate, then score the merged field set fresh.
///
/// Field resolution is first-wins per field over the group ordered by
/// (quality score desc, source_id asc): a low-scored record can still
/// contribute the only known value of a field, while a conflict always
/// resolves to the higher-scored constituent, deterministically. Constituent
/// scores are never reused for the merged record because merging can change
/// plausibility of the combined field set.
///
/// The slug accumulator map lives only inside this call; it is the one
/// mutable shared structure of the pipeline and nothing else ever sees it.
pub fn merge(scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut groups: HashMap<String, Vec<ScoredCandidate>> = HashMap::new();
    for entry in scored {
        groups.entry(entry.candidate.slug.clone()).or_default().push(entry);
    }

    let mut merged: Vec<ScoredCandidate> = groups
        .into_values()
        .map(|mut group| {
            group.sort_by(|a, b| {
                b.score
                    .total
                    .cmp(&a.score.total)
                    .then_with(|| a.candidate.source_id.cmp(&b.candidate.source_id))
            });
            if group.len() > 1 {
                info!(
                    "merge: {} candidates share slug '{}'",
                    group.len(),
                    group[0].candidate.slug
                );
            }
            let mut iter = group.into_iter();
            let first = iter.next().expect("groups are never empty");
            let mut accumulator = first.candidate;
            for other in iter {
                fill_from(&mut accumulator, &other.candidate);
            }
            let score = quality::score(&accumulator);
            ScoredCandidate { candidate: accumulator, score }
        })
        .collect();

    // Deterministic output order regardless of hash-map iteration.
    merged.sort_by(|a, b| a.candidate.slug.cmp(&b.candidate.slug));
    merged
}

/// Copy every field the accumulator is missing from a lower-priority
/// contributor. Conflicting values lose to the already-kept one and are
/// logged rather than silently dropped.
fn fill_from(accumulator: &mut Candidate, other: &Candidate) {
    fill_string(&mut accumulator.description, &other.description, other, "description");
    fill_string(&mut accumulator.format, &other.format, other, "format");
    if accumulator.source_date.is_none() {
        accumulator.source_date = other.source_date;
    }
    for photo in &other.photos {
        if !accumulator.photos.contains(photo) {
            accumulator.photos.push(photo.clone());
        }
    }

    fill_number(&mut accumulator.price, other.price, other, "price");
    fill_number(&mut accumulator.area, other.area, other, "area");
    fill_number(&mut accumulator.price_per_m2, other.price_per_m2, other, "price_per_m2");
    fill_number(&mut accumulator.roi_percent, other.roi_percent, other, "roi_percent");
    fill_number(
        &mut accumulator.occupancy_percent,
        other.occupancy_percent,
        other,
        "occupancy_percent",
    );
    fill_number(&mut accumulator.adr, other.adr, other, "adr");
    fill_number(&mut accumulator.payback_years, other.payback_years, other, "payback_years");
    fill_number(
        &mut accumulator.rev_per_m2_month,
        other.rev_per_m2_month,
        other,
        "rev_per_m2_month",
    );
    fill_number(
        &mut accumulator.season_low_percent,
        other.season_low_percent,
        other,
        "season_low_percent",
    );
    fill_number(
        &mut accumulator.season_high_percent,
        other.season_high_percent,
        other,
        "season_high_percent",
    );
}

fn fill_number(slot: &mut Option<f64>, value: Option<f64>, contributor: &Candidate, field: &str) {
    match (*slot, value) {
        (None, Some(v)) => *slot = Some(v),
        (Some(kept), Some(v)) => {
            if (kept - v).abs() / kept.abs().max(f64::MIN_POSITIVE) > NUMERIC_EQ_TOLERANCE {
                debug!(
                    "merge: discarding conflicting {} value {} from {} (kept {})",
                    field, v, contributor.source_id, kept
                );
            }
        }
        _ => {}
    }
}

fn fill_string(
    slot: &mut Option<String>,
    value: &Option<String>,
    contributor: &Candidate,
    field: &str,
) {
    if slot.is_none() {
        if let Some(v) = value {
            *slot = Some(v.clone());
        }
        return;
    }
    if let (Some(kept), Some(v)) = (slot.as_deref(), value.as_deref()) {
        if kept != v {
            debug!(
                "merge: discarding conflicting {} from {} (kept existing)",
                field, contributor.source_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProjectStatus;

    fn candidate(source_id: &str, slug: &str) -> Candidate {
        Candidate {
            source_id: source_id.to_string(),
            source_date: None,
            slug: slug.to_string(),
            title: "Апарт-отель Чайка".to_string(),
            city: "Сочи".to_string(),
            format: None,
            status: ProjectStatus::Active,
            description: None,
            photos: Vec::new(),
            price: None,
            area: None,
            price_per_m2: None,
            roi_percent: None,
            occupancy_percent: None,
            adr: None,
            payback_years: None,
            rev_per_m2_month: None,
            season_low_percent: None,
            season_high_percent: None,
        }
    }

    fn scored(candidate: Candidate) -> ScoredCandidate {
        let score = quality::score(&candidate);
        ScoredCandidate { candidate, score }
    }

    #[test]
    fn test_merges_complementary_fields() {
        let mut a = candidate("message_export:2", "chayka");
        a.occupancy_percent = Some(71.0);
        let mut b = candidate("sheet:1", "chayka");
        b.price = Some(5_200_000.0);
        b.area = Some(28.0);

        let merged = merge(vec![scored(a), scored(b)]);
        assert_eq!(merged.len(), 1);
        let c = &merged[0].candidate;
        assert_eq!(c.occupancy_percent, Some(71.0));
        assert_eq!(c.price, Some(5_200_000.0));
        assert_eq!(c.area, Some(28.0));
    }

    #[test]
    fn test_conflict_resolves_to_higher_scored() {
        let mut weak = candidate("message_export:9", "chayka");
        weak.price = Some(4_000_000.0);
        let mut strong = candidate("json_dump:chayka", "chayka");
        strong.price = Some(5_200_000.0);
        strong.area = Some(28.0);
        strong.roi_percent = Some(12.0);
        strong.photos.push("1.jpg".to_string());

        let merged = merge(vec![scored(weak), scored(strong)]);
        assert_eq!(merged[0].candidate.price, Some(5_200_000.0));
    }

    #[test]
    fn test_field_completeness_is_order_independent() {
        let mut a = candidate("sheet:1", "chayka");
        a.price = Some(5_200_000.0);
        let mut b = candidate("message_export:2", "chayka");
        b.occupancy_percent = Some(71.0);
        let mut c = candidate("json_dump:chayka", "chayka");
        c.adr = Some(4_200.0);

        let populated = |merged: &[ScoredCandidate]| {
            let m = &merged[0].candidate;
            (m.price, m.occupancy_percent, m.adr)
        };

        let forward = merge(vec![scored(a.clone()), scored(b.clone()), scored(c.clone())]);
        let backward = merge(vec![scored(c), scored(b), scored(a)]);
        assert_eq!(populated(&forward), populated(&backward));
    }

    #[test]
    fn test_merged_score_recomputed() {
        let mut a = candidate("message_export:2", "chayka");
        a.price = Some(5_200_000.0);
        let mut b = candidate("sheet:1", "chayka");
        b.area = Some(28.0);

        let scored_a = scored(a);
        let scored_b = scored(b);
        let best_constituent = scored_a.score.total.max(scored_b.score.total);

        let merged = merge(vec![scored_a, scored_b]);
        // price + area together outscore any single constituent.
        assert!(merged[0].score.total > best_constituent);
    }

    #[test]
    fn test_distinct_slugs_stay_separate() {
        let merged = merge(vec![
            scored(candidate("sheet:1", "chayka")),
            scored(candidate("sheet:2", "briz")),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].candidate.slug, "briz");
        assert_eq!(merged[1].candidate.slug, "chayka");
    }

    #[test]
    fn test_photos_are_unioned() {
        let mut a = candidate("sheet:1", "chayka");
        a.photos.push("1.jpg".to_string());
        let mut b = candidate("sheet:2", "chayka");
        b.photos.push("1.jpg".to_string());
        b.photos.push("2.jpg".to_string());

        let merged = merge(vec![scored(a), scored(b)]);
        assert_eq!(merged[0].candidate.photos.len(), 2);
    }
}

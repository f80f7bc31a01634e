use crate::classify::{self, Classification};
use crate::constants::{DEFAULT_COUNTRY, DEFAULT_FORMAT};
use crate::domain::{Candidate, CanonicalProject, ProjectStatus};
use crate::reconcile::ReconciledMetrics;
use chrono::{DateTime, Utc};

/// Assemble the canonical catalog entity from a merged candidate, its
/// reconciled metrics and its classification. This is the last stage that
/// sees pipeline-internal shapes; the result is handed downstream by value.
pub fn build_project(
    candidate: &Candidate,
    metrics: ReconciledMetrics,
    classification: Classification,
    updated_at: DateTime<Utc>,
) -> CanonicalProject {
    let mut derived = metrics.derived.clone();
    if classification.synthesized {
        derived.push("seasonality".to_string());
    }

    let assumed_yield = derived.iter().any(|d| d == "assumed-yield");
    let summary = summary_text(candidate, &metrics, assumed_yield);
    let why = why_bullets(&metrics);
    let risks = risk_bullets(candidate, assumed_yield);

    CanonicalProject {
        slug: candidate.slug.clone(),
        title: candidate.title.clone(),
        city: candidate.city.clone(),
        country: DEFAULT_COUNTRY.to_string(),
        format: candidate
            .format
            .clone()
            .unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
        status: candidate.status,
        price: metrics.price,
        area: metrics.area,
        price_per_m2: metrics.price_per_m2,
        rev_per_m2_month: metrics.rev_per_m2_month,
        noi_year: metrics.noi_year,
        payback_years: metrics.payback_years,
        occupancy: metrics.occupancy,
        adr: metrics.adr,
        risk_level: classification.risk_level,
        summary,
        why,
        risks,
        seasonality: classification.seasonality,
        derived,
        updated_at,
    }
}

/// Catalog card text: the source description when one survived, otherwise a
/// short generated line. Records priced off the yield assumption say so
/// instead of presenting the numbers as measured.
fn summary_text(candidate: &Candidate, metrics: &ReconciledMetrics, assumed_yield: bool) -> String {
    let mut summary = match candidate.description.as_deref() {
        Some(description) => truncate(description, 280),
        None => {
            let mut generated = format!("{} ({})", candidate.title, candidate.city);
            if let Some(area) = metrics.area {
                generated.push_str(&format!(", {:.0} м²", area));
            }
            generated.push_str(&format!(
                ", доходность {:.1}% годовых",
                metrics.noi_year / metrics.price * 100.0
            ));
            generated
        }
    };
    if assumed_yield {
        summary.push_str(" Доходность рассчитана по модельной ставке, а не по отчётным данным.");
    }
    summary
}

fn why_bullets(metrics: &ReconciledMetrics) -> Vec<String> {
    let mut why = Vec::new();
    let yield_percent = metrics.noi_year / metrics.price * 100.0;
    if yield_percent >= 6.0 {
        why.push(format!("Доходность {:.1}% годовых", yield_percent));
    }
    if metrics.payback_years <= 15.0 {
        why.push(format!("Окупаемость {:.1} лет", metrics.payback_years));
    }
    if let Some(occupancy) = metrics.occupancy {
        if occupancy >= 60.0 {
            why.push(format!("Загрузка {:.0}%", occupancy));
        }
    }
    if let Some(rate) = metrics.price_per_m2 {
        why.push(format!("Цена {:.0} тыс. ₽ за м²", rate / 1000.0));
    }
    why
}

fn risk_bullets(candidate: &Candidate, assumed_yield: bool) -> Vec<String> {
    let mut risks = Vec::new();
    match candidate.status {
        ProjectStatus::Construction => {
            risks.push("Объект на стадии строительства, срок сдачи может сдвигаться".to_string());
        }
        ProjectStatus::Planning => {
            risks.push("Проект на стадии планирования, параметры могут измениться".to_string());
        }
        ProjectStatus::Active => {}
    }
    if classify::is_resort(&candidate.city) {
        risks.push("Сезонный спрос: доход зависит от загрузки в высокий сезон".to_string());
    }
    if assumed_yield {
        risks.push("Доходность оценочная, операционные данные не подтверждены".to_string());
    }
    risks
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars - 1).collect();
    format!("{}…", cut.trim_end())
}

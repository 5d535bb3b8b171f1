use crate::aggregate::aggregate_by_route;
use crate::classify::{build_comparison, inconsistencies};
use crate::config::AuditConfig;
use crate::decode::decode_units;
use crate::divergence::find_divergences;
use crate::error::AuditError;
use crate::merge::merge_periods;
use crate::model::{AnalysisResult, DivergenceEntry, Period, RecurringOccurrence, RouteUnitSummary, UnitRecord};
use crate::narrative::{build_brief, NarrativeBrief};
use crate::recurrence::find_recurring;
use crate::summary::route_unit_summary;

/// Decode both period exports and compare them with default settings.
pub fn compare(current_text: &str, previous_text: &str) -> Result<AnalysisResult, AuditError> {
    compare_with(current_text, previous_text, &AuditConfig::default())
}

/// Decode both period exports and compare them. The first decoder failure is
/// returned, tagged with its period; no partial result is produced.
pub fn compare_with(
    current_text: &str,
    previous_text: &str,
    config: &AuditConfig,
) -> Result<AnalysisResult, AuditError> {
    let current = decode_units(current_text, &config.columns).map_err(|e| e.in_period(Period::Current))?;
    let previous = decode_units(previous_text, &config.columns).map_err(|e| e.in_period(Period::Previous))?;
    log::info!(
        "decoded {} current and {} previous unit row(s)",
        current.len(),
        previous.len()
    );
    Ok(analyze(current, previous, config))
}

/// Run the comparison on already-decoded records.
pub fn analyze(current: Vec<UnitRecord>, previous: Vec<UnitRecord>, config: &AuditConfig) -> AnalysisResult {
    let current_month = merge_periods(&current, &previous, config.lookup.duplicates);

    let current_totals = aggregate_by_route(&current);
    let previous_totals = aggregate_by_route(&previous);
    let comparison = build_comparison(
        &current_totals,
        &previous_totals,
        &current,
        &previous,
        config.thresholds.critical_variance_pct,
    );
    let inconsistencies = inconsistencies(&comparison);

    log::info!(
        "{} route(s) compared, {} inconsistent",
        comparison.len(),
        inconsistencies.len()
    );

    AnalysisResult {
        current_month,
        previous_month: previous,
        comparison,
        inconsistencies,
    }
}

impl AnalysisResult {
    /// Current-period records without the merge enrichment.
    pub fn current_units(&self) -> impl Iterator<Item = &UnitRecord> + '_ {
        self.current_month.iter().map(|e| &e.unit)
    }

    pub fn divergences(&self, config: &AuditConfig) -> Vec<DivergenceEntry> {
        find_divergences(self.current_units(), &self.previous_month, config.lookup.duplicates)
    }

    pub fn recurring(&self, config: &AuditConfig) -> Vec<RecurringOccurrence> {
        find_recurring(self.current_units(), &self.previous_month, config)
    }

    pub fn route_summary(&self) -> Vec<RouteUnitSummary> {
        route_unit_summary(self.current_units(), &self.previous_month)
    }

    pub fn brief(&self, config: &AuditConfig) -> NarrativeBrief {
        build_brief(self, &config.thresholds)
    }

    pub fn has_inconsistencies(&self) -> bool {
        !self.inconsistencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnomalyTag;

    const CURRENT: &str = "CodigoUC;ConsumidorNome;CodigoRota;Rota;Quantidade;ConsumoMes;ConsumoMes1\n\
                           U1;Ana;10;Centro;1;120;100\n\
                           U2;Bruno;10;Centro;1;80;0\n\
                           U5;Eva;30;Sul;1;40;0\n";
    const PREVIOUS: &str = "CodigoUC;ConsumidorNome;CodigoRota;Rota;Quantidade;ConsumoMes;ConsumoMes1\n\
                            U1;Ana;10;Centro;1;100;90\n\
                            U2;Bruno;10;Centro;1;60;50\n\
                            U3;Caio;20;Norte;2;10;10\n";

    #[test]
    fn end_to_end_comparison() {
        let result = compare(CURRENT, PREVIOUS).unwrap();

        assert_eq!(result.current_month.len(), 3);
        assert_eq!(result.previous_month.len(), 3);
        let u2 = &result.current_month[1];
        assert_eq!(u2.prior_consumption_resolved, 60.0);

        let labels: Vec<_> = result.comparison.iter().map(|r| r.route_label.as_str()).collect();
        assert_eq!(labels, vec!["Centro", "Sul", "Norte"]);
        assert_eq!(result.comparison[1].anomaly_tag, Some(AnomalyTag::NewRoute));
        assert_eq!(result.comparison[2].anomaly_tag, Some(AnomalyTag::DiscontinuedRoute));
        assert_eq!(result.inconsistencies.len(), 2);
        assert!(result.has_inconsistencies());
    }

    #[test]
    fn decoder_errors_carry_their_period() {
        let err = compare(CURRENT, "CodigoUC\n").unwrap_err();
        assert!(matches!(err, AuditError::InPeriod { period: Period::Previous, .. }));
        assert!(matches!(err.root(), AuditError::EmptyOrMalformedFile));

        let err = compare("CodigoUC;Rota\nU1;Centro\n", PREVIOUS).unwrap_err();
        assert!(matches!(err, AuditError::InPeriod { period: Period::Current, .. }));
        assert!(matches!(err.root(), AuditError::MissingRequiredColumn { .. }));
    }

    #[test]
    fn derived_views_use_stored_periods() {
        let config = AuditConfig::default();
        let result = compare(CURRENT, PREVIOUS).unwrap();

        let summary = result.route_summary();
        assert_eq!(summary[0].route, "10");
        assert_eq!(summary[0].total_current, 2);

        // Route 20 is previous-only, so U3 is not a divergence.
        let divergences = result.divergences(&config);
        assert_eq!(divergences.len(), 1);
        assert_eq!(divergences[0].unit_code, "U5");

        let recurring = result.recurring(&config);
        assert_eq!(recurring.len(), 2);
    }
}

use serde::Deserialize;

use crate::columns::ColumnRole;
use crate::error::AuditError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine tuning. Every section is optional; an empty TOML document yields
/// the same behavior as `AuditConfig::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
    #[serde(default)]
    pub columns: ColumnOverrides,
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Route variance (absolute percent) above which a route is tagged critical.
    #[serde(default = "default_critical")]
    pub critical_variance_pct: f64,
    /// Route variance above which an active route is highlighted in the brief.
    #[serde(default = "default_attention")]
    pub attention_variance_pct: f64,
    #[serde(default = "default_top_n")]
    pub attention_top_n: usize,
}

fn default_critical() -> f64 {
    50.0
}

fn default_attention() -> f64 {
    15.0
}

fn default_top_n() -> usize {
    10
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            critical_variance_pct: default_critical(),
            attention_variance_pct: default_attention(),
            attention_top_n: default_top_n(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Which record a unit-code lookup keeps when a code repeats within a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    LastWins,
    FirstWins,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecurrenceConfig {
    /// Skip units whose reason is the read-successfully sentinel in both periods.
    #[serde(default)]
    pub ignore_successful_reads: bool,
}

// ---------------------------------------------------------------------------
// Column overrides
// ---------------------------------------------------------------------------

/// Explicit header names per role, tried before the heuristic rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnOverrides {
    pub unit_code: Option<String>,
    pub consumer_name: Option<String>,
    pub route_code: Option<String>,
    pub route_label: Option<String>,
    pub quantity: Option<String>,
    pub current_consumption: Option<String>,
    pub prior_consumption: Option<String>,
    pub injected_generation: Option<String>,
    pub micro_generation: Option<String>,
    pub non_read_reason: Option<String>,
    pub connection_status: Option<String>,
    pub address: Option<String>,
}

impl ColumnOverrides {
    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        let name = match role {
            ColumnRole::UnitCode => &self.unit_code,
            ColumnRole::ConsumerName => &self.consumer_name,
            ColumnRole::RouteCode => &self.route_code,
            ColumnRole::RouteLabel => &self.route_label,
            ColumnRole::Quantity => &self.quantity,
            ColumnRole::CurrentConsumption => &self.current_consumption,
            ColumnRole::PriorConsumption => &self.prior_consumption,
            ColumnRole::InjectedGeneration => &self.injected_generation,
            ColumnRole::MicroGeneration => &self.micro_generation,
            ColumnRole::NonReadReason => &self.non_read_reason,
            ColumnRole::ConnectionStatus => &self.connection_status,
            ColumnRole::Address => &self.address,
        };
        name.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl AuditConfig {
    pub fn from_toml(input: &str) -> Result<Self, AuditError> {
        let config: AuditConfig =
            toml::from_str(input).map_err(|e| AuditError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        let t = &self.thresholds;
        for (name, value) in [
            ("critical_variance_pct", t.critical_variance_pct),
            ("attention_variance_pct", t.attention_variance_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AuditError::ConfigValidation(format!(
                    "thresholds.{name} must be a non-negative number, got {value}"
                )));
            }
        }

        for role in ColumnRole::ALL {
            if let Some(name) = self.columns.get(role) {
                if name.trim().is_empty() {
                    return Err(AuditError::ConfigValidation(format!(
                        "columns.{}: header name must not be empty",
                        role.key()
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AuditConfig::from_toml("").unwrap();
        assert_eq!(config.thresholds.critical_variance_pct, 50.0);
        assert_eq!(config.thresholds.attention_variance_pct, 15.0);
        assert_eq!(config.thresholds.attention_top_n, 10);
        assert_eq!(config.lookup.duplicates, DuplicatePolicy::LastWins);
        assert!(!config.recurrence.ignore_successful_reads);
        assert!(config.columns.get(ColumnRole::Quantity).is_none());
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
[thresholds]
critical_variance_pct = 30
attention_variance_pct = 5.5
attention_top_n = 3

[lookup]
duplicates = "first_wins"

[recurrence]
ignore_successful_reads = true

[columns]
quantity = "Qtde Faturada"
unit_code = "Matricula"
"#;
        let config = AuditConfig::from_toml(input).unwrap();
        assert_eq!(config.thresholds.critical_variance_pct, 30.0);
        assert_eq!(config.thresholds.attention_variance_pct, 5.5);
        assert_eq!(config.thresholds.attention_top_n, 3);
        assert_eq!(config.lookup.duplicates, DuplicatePolicy::FirstWins);
        assert!(config.recurrence.ignore_successful_reads);
        assert_eq!(config.columns.get(ColumnRole::Quantity), Some("Qtde Faturada"));
        assert_eq!(config.columns.get(ColumnRole::UnitCode), Some("Matricula"));
    }

    #[test]
    fn reject_negative_threshold() {
        let err = AuditConfig::from_toml("[thresholds]\ncritical_variance_pct = -1\n").unwrap_err();
        assert!(err.to_string().contains("critical_variance_pct"));
    }

    #[test]
    fn reject_unknown_policy() {
        let err = AuditConfig::from_toml("[lookup]\nduplicates = \"newest\"\n");
        assert!(matches!(err, Err(AuditError::ConfigParse(_))));
    }

    #[test]
    fn reject_empty_override() {
        let err = AuditConfig::from_toml("[columns]\naddress = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("columns.address"));
    }

    #[test]
    fn reject_unknown_section_key() {
        let err = AuditConfig::from_toml("[thresholds]\ncritical = 10\n");
        assert!(err.is_err(), "typo in threshold key should fail deserialization");
    }
}

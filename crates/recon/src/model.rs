use serde::Serialize;

// ---------------------------------------------------------------------------
// Sentinels
// ---------------------------------------------------------------------------

/// Unit code / consumer name when the column is absent or the cell is empty.
pub const MISSING_TEXT: &str = "-";
/// Route label when neither a route nor a route-code column yields a value.
pub const MISSING_ROUTE: &str = "N/A";
/// Non-read reason for a unit that was read successfully.
pub const READ_SUCCESSFULLY: &str = "Leitura Realizada";
/// Connection status / address when not informed.
pub const NOT_INFORMED: &str = "N/I";
/// Connection status shown on a divergence entry whose status cell was empty.
pub const STATUS_UNAVAILABLE: &str = "N/A";
/// Route key used by the divergence and summary views when a unit has neither
/// route code nor route label.
pub const UNSPECIFIED_ROUTE: &str = "Não Informada";

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// P1, the billing period being audited.
    Current,
    /// P2, the period it is compared against.
    Previous,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Previous => write!(f, "previous"),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit records
// ---------------------------------------------------------------------------

/// Distributed-generation status of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MicroGeneration {
    /// Unit has its own GD installation.
    #[serde(rename = "S")]
    Generator,
    /// Participant in a shared GD arrangement.
    #[serde(rename = "P")]
    Participant,
    /// Linked to another unit's generation.
    #[serde(rename = "X")]
    Linked,
    #[default]
    #[serde(rename = "N")]
    Normal,
}

impl MicroGeneration {
    /// Parse a raw flag cell. Anything other than S/P/X is a normal unit.
    pub fn from_flag(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "S" => Self::Generator,
            "P" => Self::Participant,
            "X" => Self::Linked,
            _ => Self::Normal,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Self::Generator => 'S',
            Self::Participant => 'P',
            Self::Linked => 'X',
            Self::Normal => 'N',
        }
    }

    /// Display label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generator => "GD",
            Self::Participant => "Participante",
            Self::Linked => "Vinculada",
            Self::Normal => "Normal",
        }
    }

    pub fn has_generation(&self) -> bool {
        matches!(self, Self::Generator)
    }
}

impl std::fmt::Display for MicroGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One billed unit in one period, normalized from a CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    pub route_label: String,
    pub unit_code: String,
    pub consumer_name: String,
    pub route_code: String,
    pub current_consumption: f64,
    pub prior_consumption: f64,
    pub injected_generation: f64,
    pub micro_generation_flag: MicroGeneration,
    pub billed_quantity: i64,
    pub non_read_reason: String,
    pub connection_status: String,
    pub address: String,
}

impl UnitRecord {
    /// Route key for per-route unit views: route code, else route label,
    /// else the unspecified-route sentinel.
    pub fn route_key(&self) -> &str {
        if !self.route_code.is_empty() {
            &self.route_code
        } else if !self.route_label.is_empty() {
            &self.route_label
        } else {
            UNSPECIFIED_ROUTE
        }
    }
}

/// Current-period record joined against the previous period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedUnitRecord {
    #[serde(flatten)]
    pub unit: UnitRecord,
    pub injected_current: f64,
    pub injected_prior: f64,
    pub prior_consumption_resolved: f64,
    pub consumption_variance_pct: f64,
    pub injection_variance_pct: f64,
}

// ---------------------------------------------------------------------------
// Route comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyTag {
    NewRoute,
    DiscontinuedRoute,
    CriticalVariance,
}

impl std::fmt::Display for AnomalyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewRoute => write!(f, "new_route"),
            Self::DiscontinuedRoute => write!(f, "discontinued_route"),
            Self::CriticalVariance => write!(f, "critical_variance"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteComparisonRow {
    pub route_label: String,
    pub count_prior: i64,
    pub count_current: i64,
    pub difference: i64,
    pub percent_variance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_tag: Option<AnomalyTag>,
}

// ---------------------------------------------------------------------------
// Divergence + recurrence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceStatus {
    /// Billed last period, absent this period, on a route still being read.
    Missing,
    /// Billed this period, absent last period on the same route.
    New,
}

impl std::fmt::Display for DivergenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::New => write!(f, "new"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceEntry {
    pub unit_code: String,
    pub consumer_name: String,
    pub address: String,
    pub route_code: String,
    pub connection_status: String,
    pub micro_generation_flag: MicroGeneration,
    pub status: DivergenceStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DivergenceTotals {
    pub missing: usize,
    pub new: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringOccurrence {
    pub unit_code: String,
    pub consumer_name: String,
    pub route_code: String,
    pub reason_text: String,
}

// ---------------------------------------------------------------------------
// Route unit summary
// ---------------------------------------------------------------------------

/// Unit-row counts for one route active in the current period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteUnitSummary {
    pub route: String,
    pub total_previous: i64,
    pub total_current: i64,
    pub diff: i64,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Result of one comparison run. Divergence and recurrence are computed on
/// demand from `current_month` / `previous_month`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub current_month: Vec<EnrichedUnitRecord>,
    pub previous_month: Vec<UnitRecord>,
    pub comparison: Vec<RouteComparisonRow>,
    pub inconsistencies: Vec<RouteComparisonRow>,
}

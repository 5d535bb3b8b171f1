//! Header-to-role inference.
//!
//! Each role owns an ordered rule set. A role resolves to the first header
//! index for which any of its rules holds; roles are resolved independently,
//! so two roles may land on the same column.

use crate::config::ColumnOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    UnitCode,
    ConsumerName,
    RouteCode,
    RouteLabel,
    Quantity,
    CurrentConsumption,
    PriorConsumption,
    InjectedGeneration,
    MicroGeneration,
    NonReadReason,
    ConnectionStatus,
    Address,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 12] = [
        Self::UnitCode,
        Self::ConsumerName,
        Self::RouteCode,
        Self::RouteLabel,
        Self::Quantity,
        Self::CurrentConsumption,
        Self::PriorConsumption,
        Self::InjectedGeneration,
        Self::MicroGeneration,
        Self::NonReadReason,
        Self::ConnectionStatus,
        Self::Address,
    ];

    /// Config key / display name.
    pub fn key(&self) -> &'static str {
        match self {
            Self::UnitCode => "unit_code",
            Self::ConsumerName => "consumer_name",
            Self::RouteCode => "route_code",
            Self::RouteLabel => "route_label",
            Self::Quantity => "quantity",
            Self::CurrentConsumption => "current_consumption",
            Self::PriorConsumption => "prior_consumption",
            Self::InjectedGeneration => "injected_generation",
            Self::MicroGeneration => "micro_generation",
            Self::NonReadReason => "non_read_reason",
            Self::ConnectionStatus => "connection_status",
            Self::Address => "address",
        }
    }

    pub fn rules(&self) -> &'static [HeaderRule] {
        use HeaderRule::*;
        match self {
            Self::UnitCode => &[Exact("codigouc"), Contains("uc")],
            Self::ConsumerName => &[Exact("consumidornome"), Contains("consumidor")],
            Self::RouteCode => &[
                Exact("codigorota"),
                Exact("codigo rota"),
                ContainsAll(&["rota", "cod"]),
            ],
            Self::RouteLabel => &[Exact("rota"), ContainsExcept("rota", "cod")],
            Self::Quantity => &[Contains("quant"), Contains("qtd"), Exact("valor")],
            Self::CurrentConsumption => &[Exact("consumomes"), Contains("consumo atual")],
            Self::PriorConsumption => &[Exact("consumomes1"), Contains("consumo anterior")],
            Self::InjectedGeneration => &[Exact("consumomg"), Contains("injetada")],
            Self::MicroGeneration => &[Exact("microgeracao"), Exact("gd"), Contains("microger")],
            Self::NonReadReason => &[
                Exact("descricaonaoleitura"),
                Contains("nao leitura"),
                Contains("não leitura"),
            ],
            Self::ConnectionStatus => &[
                Exact("ligado"),
                Exact("status"),
                Contains("ligado"),
                Contains("situação"),
            ],
            Self::Address => &[Exact("endereco"), Exact("endereço"), Contains("logradouro")],
        }
    }

    /// Whether a normalized header satisfies any of this role's rules.
    pub fn accepts(&self, header: &str) -> bool {
        self.rules().iter().any(|rule| rule.matches(header))
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A single predicate over a normalized (lower-cased, trimmed) header.
#[derive(Debug, Clone, Copy)]
pub enum HeaderRule {
    Exact(&'static str),
    Contains(&'static str),
    ContainsAll(&'static [&'static str]),
    /// Contains the first needle but not the second.
    ContainsExcept(&'static str, &'static str),
}

impl HeaderRule {
    pub fn matches(&self, header: &str) -> bool {
        match self {
            Self::Exact(s) => header == *s,
            Self::Contains(s) => header.contains(s),
            Self::ContainsAll(needles) => needles.iter().all(|n| header.contains(n)),
            Self::ContainsExcept(needle, excluded) => {
                header.contains(needle) && !header.contains(excluded)
            }
        }
    }
}

/// Resolved column index per role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; 12],
}

impl ColumnMap {
    /// Resolve every role against normalized headers. An override that names
    /// a present header wins; otherwise the heuristic rules apply.
    pub fn infer(headers: &[String], overrides: &ColumnOverrides) -> Self {
        let mut map = ColumnMap::default();
        for (slot, role) in ColumnRole::ALL.iter().enumerate() {
            let explicit = overrides.get(*role).and_then(|name| {
                let wanted = normalize_header(name);
                headers.iter().position(|h| *h == wanted)
            });
            map.indices[slot] = explicit.or_else(|| headers.iter().position(|h| role.accepts(h)));
        }
        map
    }

    pub fn index(&self, role: ColumnRole) -> Option<usize> {
        let slot = ColumnRole::ALL.iter().position(|r| *r == role)?;
        self.indices[slot]
    }
}

/// Lower-case, trim and de-quote one header cell.
pub fn normalize_header(raw: &str) -> String {
    strip_quotes(raw.trim()).trim().to_lowercase()
}

/// Remove one leading and one trailing quote character (`"` or `'`).
pub fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    s.strip_suffix(['"', '\'']).unwrap_or(s)
}

//! Research tree: definitions, affordability, purchases and the loader for
//! research definition files.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::ledger::{covers, Ledger, LedgerError};
use crate::resource::{ResourceKind, ResourceMap};

pub type CostMap = BTreeMap<ResourceKind, f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Progression {
    OneTime,
    Repeatable {
        boosts: CostMap,
        max_level: u32,
        level: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Research {
    name: String,
    costs: CostMap,
    completed: bool,
    progression: Progression,
    discovers: Vec<ResourceKind>,
}

impl Research {
    pub fn one_time(name: impl Into<String>, costs: CostMap) -> Self {
        Self {
            name: name.into(),
            costs,
            completed: false,
            progression: Progression::OneTime,
            discovers: Vec::new(),
        }
    }

    pub fn repeatable(
        name: impl Into<String>,
        costs: CostMap,
        boosts: CostMap,
        max_level: u32,
    ) -> Self {
        Self {
            name: name.into(),
            costs,
            completed: max_level == 0,
            progression: Progression::Repeatable {
                boosts,
                max_level,
                level: 0,
            },
            discovers: Vec::new(),
        }
    }

    pub fn with_discoveries(mut self, kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        self.discovers.extend(kinds);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn costs(&self) -> &CostMap {
        &self.costs
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_repeatable(&self) -> bool {
        matches!(self.progression, Progression::Repeatable { .. })
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn level(&self) -> Option<u32> {
        match self.progression {
            Progression::Repeatable { level, .. } => Some(level),
            Progression::OneTime => None,
        }
    }

    pub fn discovers(&self) -> &[ResourceKind] {
        &self.discovers
    }

    pub fn is_available_with(&self, totals: &ResourceMap<f64>) -> bool {
        !self.completed && covers(totals, &self.costs)
    }

    /// Moves the research one step along after its cost has been paid.
    fn advance(&mut self) {
        match &mut self.progression {
            Progression::OneTime => self.completed = true,
            Progression::Repeatable {
                boosts,
                max_level,
                level,
            } => {
                *level += 1;
                if *level >= *max_level {
                    self.completed = true;
                    return;
                }
                // Every cost grows by the single strongest boost.
                let factor = boosts.values().copied().fold(1.0_f64, f64::max);
                for cost in self.costs.values_mut() {
                    *cost *= factor;
                }
            }
        }
    }
}

/// What a successful purchase unlocked.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub name: String,
    pub paid: CostMap,
    pub level: Option<u32>,
    pub completed: bool,
    pub discovers: Vec<ResourceKind>,
    pub boosts: CostMap,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PurchaseRejected {
    #[error("no research named '{0}'")]
    Unknown(String),
    #[error("research '{0}' is already complete")]
    Completed(String),
    #[error(transparent)]
    Unaffordable(#[from] LedgerError),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResearchCatalog {
    researches: Vec<Research>,
}

impl ResearchCatalog {
    pub fn new(researches: Vec<Research>) -> Self {
        Self { researches }
    }

    pub fn len(&self) -> usize {
        self.researches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.researches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Research> {
        self.researches.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Research> {
        self.researches.iter().find(|r| r.name == name)
    }

    /// Unfinished researches whose cost `totals` covers, in catalog order.
    pub fn available(&self, totals: &ResourceMap<f64>) -> Vec<&Research> {
        self.researches
            .iter()
            .filter(|r| r.is_available_with(totals))
            .collect()
    }

    /// Buys `name` out of the spendable ledger. Affordability is checked again
    /// here, so a stale availability list cannot overdraw the ledger. Nothing
    /// changes when the purchase is rejected.
    pub fn purchase(
        &mut self,
        name: &str,
        ledger: &mut Ledger,
    ) -> Result<Purchase, PurchaseRejected> {
        let research = self
            .researches
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| PurchaseRejected::Unknown(name.to_string()))?;
        if research.completed {
            return Err(PurchaseRejected::Completed(research.name.clone()));
        }
        ledger.spend(&research.costs)?;
        let paid = research.costs.clone();
        research.advance();

        let boosts = match &research.progression {
            Progression::Repeatable { boosts, .. } => boosts.clone(),
            Progression::OneTime => CostMap::new(),
        };
        Ok(Purchase {
            name: research.name.clone(),
            paid,
            level: research.level(),
            completed: research.completed,
            discovers: research.discovers.clone(),
            boosts,
        })
    }
}

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("research document is not a list of entries: {0}")]
    Document(#[source] serde_yaml::Error),
    #[error("research entry {index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("research '{name}': {reason}")]
    Invalid { name: String, reason: String },
    #[error("research '{0}' is defined more than once")]
    Duplicate(String),
}

/// One entry of a research definition file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResearchRecord {
    name: String,
    costs: CostMap,
    #[serde(default)]
    repeatable: bool,
    #[serde(default)]
    complete: bool,
    #[serde(default)]
    boosts: Option<CostMap>,
    #[serde(default, alias = "max_level")]
    max_level: Option<u32>,
    #[serde(default, alias = "current_level")]
    current_level: u32,
    #[serde(default)]
    discovers: Vec<ResourceKind>,
}

impl TryFrom<ResearchRecord> for Research {
    type Error = ResearchError;

    fn try_from(record: ResearchRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| ResearchError::Invalid {
            name: record.name.clone(),
            reason: reason.to_string(),
        };
        if record.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if record.costs.values().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(invalid("costs must be finite and non-negative"));
        }

        let progression = if record.repeatable {
            let boosts = record
                .boosts
                .clone()
                .ok_or_else(|| invalid("repeatable research needs boosts"))?;
            if boosts.is_empty() || boosts.values().any(|b| !b.is_finite() || *b < 1.0) {
                return Err(invalid("boosts must be a non-empty map of numbers no lower than 1"));
            }
            let max_level = record
                .max_level
                .ok_or_else(|| invalid("repeatable research needs maxLevel"))?;
            if max_level == 0 {
                return Err(invalid("maxLevel must be at least 1"));
            }
            if record.current_level > max_level {
                return Err(invalid("currentLevel exceeds maxLevel"));
            }
            Progression::Repeatable {
                boosts,
                max_level,
                level: record.current_level,
            }
        } else {
            Progression::OneTime
        };

        let completed = match &progression {
            Progression::Repeatable {
                max_level, level, ..
            } => record.complete || level >= max_level,
            Progression::OneTime => record.complete,
        };
        Ok(Research {
            name: record.name,
            costs: record.costs,
            completed,
            progression,
            discovers: record.discovers,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResearchDocument {
    List(Vec<serde_yaml::Value>),
    Keyed { researches: Vec<serde_yaml::Value> },
}

/// Loaded catalog plus the entries that were skipped.
#[derive(Debug, Default)]
pub struct CatalogLoad {
    pub catalog: ResearchCatalog,
    pub warnings: Vec<ResearchError>,
}

/// Parses a YAML or JSON research document. A broken document is an error;
/// broken entries are skipped, logged and reported in `warnings`.
pub fn load_research_str(text: &str) -> Result<CatalogLoad, ResearchError> {
    let document: ResearchDocument =
        serde_yaml::from_str(text).map_err(ResearchError::Document)?;
    let entries = match document {
        ResearchDocument::List(entries) | ResearchDocument::Keyed { researches: entries } => {
            entries
        }
    };

    let mut researches = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();
    let mut names = HashSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let parsed = serde_yaml::from_value::<ResearchRecord>(entry)
            .map_err(|source| ResearchError::Malformed { index, source })
            .and_then(Research::try_from)
            .and_then(|research| {
                if names.insert(research.name.clone()) {
                    Ok(research)
                } else {
                    Err(ResearchError::Duplicate(research.name))
                }
            });
        match parsed {
            Ok(research) => researches.push(research),
            Err(err) => {
                warn!(error = %err, "skipping research entry");
                warnings.push(err);
            }
        }
    }

    Ok(CatalogLoad {
        catalog: ResearchCatalog::new(researches),
        warnings,
    })
}

pub fn load_research_file(path: impl AsRef<Path>) -> Result<CatalogLoad> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read research file {}", path.display()))?;
    let load = load_research_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(load)
}

//! Sport and team registry
//!
//! Handlers are registered at startup from a fixed table plus configuration and
//! looked up by `"{sport}-{team}"`, lower-cased.

use crate::config::DepthChartConfig;
use crate::error::{DepthChartError, Result};
use crate::period::ChartPeriod;
use crate::service::{DepthChartOps, DepthChartService, SportProfile};
use crate::store::ChartStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Builds a handler for one sport
pub type HandlerFactory = fn(SportProfile, Arc<dyn ChartStore>) -> Arc<dyn DepthChartOps>;

/// One sport and the teams its handler serves
#[derive(Clone)]
pub struct SportRegistration {
    pub sport_code: String,
    pub team_codes: Vec<String>,
    pub period: ChartPeriod,
    pub factory: HandlerFactory,
}

impl std::fmt::Debug for SportRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SportRegistration")
            .field("sport_code", &self.sport_code)
            .field("team_codes", &self.team_codes)
            .field("period", &self.period)
            .finish()
    }
}

impl SportRegistration {
    /// Registration using the standard depth chart handler
    pub fn standard(sport_code: &str, team_codes: &[&str], period: ChartPeriod) -> Self {
        Self {
            sport_code: sport_code.to_string(),
            team_codes: team_codes.iter().map(|t| t.to_string()).collect(),
            period,
            factory: standard_handler,
        }
    }

    fn profile(&self) -> SportProfile {
        SportProfile {
            sport_code: self.sport_code.clone(),
            team_codes: self.team_codes.clone(),
            period: self.period,
        }
    }
}

fn standard_handler(profile: SportProfile, store: Arc<dyn ChartStore>) -> Arc<dyn DepthChartOps> {
    Arc::new(DepthChartService::new(profile, store))
}

/// Sports served out of the box
pub fn builtin_registrations(period: ChartPeriod) -> Vec<SportRegistration> {
    vec![SportRegistration::standard("NFL", &["TampaBayBuccaneers"], period)]
}

fn registry_key(sport_code: &str, team_code: &str) -> String {
    format!("{}-{}", sport_code.trim(), team_code.trim()).to_lowercase()
}

/// Lookup table from sport+team to handler
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    handlers: HashMap<String, Arc<dyn DepthChartOps>>,
}

impl ServiceRegistry {
    /// Build the table, creating one handler per registration
    pub fn new(registrations: Vec<SportRegistration>, store: Arc<dyn ChartStore>) -> Result<Self> {
        let mut handlers: HashMap<String, Arc<dyn DepthChartOps>> = HashMap::new();

        for registration in registrations {
            let handler = (registration.factory)(registration.profile(), store.clone());

            for team_code in &registration.team_codes {
                let key = registry_key(&registration.sport_code, team_code);
                if handlers.contains_key(&key) {
                    return Err(DepthChartError::InvalidConfig(format!(
                        "{} / {} registered more than once",
                        registration.sport_code, team_code
                    )));
                }
                info!(
                    "Registered {} / {} ({} store)",
                    registration.sport_code,
                    team_code,
                    store.backend_name()
                );
                handlers.insert(key, handler.clone());
            }
        }

        Ok(Self { handlers })
    }

    /// Built-in registrations plus the sports listed in `config`
    pub fn from_config(config: &DepthChartConfig, store: Arc<dyn ChartStore>) -> Result<Self> {
        let default_period = ChartPeriod::weekly(config.week_starts_on);
        let mut registrations = builtin_registrations(default_period);

        for sport in &config.sports {
            let period = sport.week_starts_on.map(ChartPeriod::weekly).unwrap_or(default_period);
            let teams: Vec<&str> = sport.team_codes.iter().map(String::as_str).collect();
            registrations.push(SportRegistration::standard(&sport.sport_code, &teams, period));
        }

        Self::new(registrations, store)
    }

    /// Handler for `sport_code` / `team_code`
    pub fn resolve(&self, sport_code: &str, team_code: &str) -> Result<Arc<dyn DepthChartOps>> {
        if sport_code.trim().is_empty() {
            return Err(DepthChartError::MissingArgument("sportCode"));
        }
        if team_code.trim().is_empty() {
            return Err(DepthChartError::MissingArgument("teamCode"));
        }

        self.handlers.get(&registry_key(sport_code, team_code)).cloned().ok_or_else(|| {
            DepthChartError::UnconfiguredTeam {
                sport_code: sport_code.to_string(),
                team_code: team_code.to_string(),
            }
        })
    }

    /// Number of registered sport+team pairs
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

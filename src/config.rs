use crate::engine::EngineError;
use crate::limits::*;

/// Layout, gates and pricing for a lot. Every lot created by a
/// `LotManager` shares one config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotConfig {
    pub zones: u32,
    pub spots_per_zone: u32,
    /// The first N indices of every zone are Electric.
    pub electric_per_zone: u32,
    pub gates: Vec<String>,
    /// Fee per time unit used by `Engine::check_out_default`.
    pub hourly_rate: u64,
}

impl Default for LotConfig {
    fn default() -> Self {
        Self {
            zones: 3,
            spots_per_zone: 20,
            electric_per_zone: 5,
            gates: vec!["Gate1".into(), "Gate2".into(), "Gate3".into()],
            hourly_rate: 100,
        }
    }
}

impl LotConfig {
    /// Read `PARKLINE_*` variables. Missing or unparsable values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let zones: u32 = lookup("PARKLINE_ZONES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.zones);
        let spots_per_zone: u32 = lookup("PARKLINE_SPOTS_PER_ZONE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.spots_per_zone);
        let electric_per_zone: u32 = lookup("PARKLINE_ELECTRIC_PER_ZONE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.electric_per_zone);
        let hourly_rate: u64 = lookup("PARKLINE_HOURLY_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.hourly_rate);
        let gates = lookup("PARKLINE_GATES")
            .map(|s| {
                s.split(',')
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|g| !g.is_empty())
            .unwrap_or(defaults.gates);

        Self {
            zones,
            spots_per_zone,
            electric_per_zone,
            gates,
            hourly_rate,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.zones == 0 || self.zones > MAX_ZONES {
            return Err(EngineError::InvalidConfig("zone count out of range"));
        }
        if self.spots_per_zone == 0 || self.spots_per_zone > MAX_SPOTS_PER_ZONE {
            return Err(EngineError::InvalidConfig("spots per zone out of range"));
        }
        if self.electric_per_zone > self.spots_per_zone {
            return Err(EngineError::InvalidConfig(
                "more electric spots than spots per zone",
            ));
        }
        validate_gates(&self.gates)
    }
}

pub(crate) fn validate_gates(gates: &[String]) -> Result<(), EngineError> {
    if gates.is_empty() {
        return Err(EngineError::InvalidConfig("at least one gate required"));
    }
    if gates.len() > MAX_GATES {
        return Err(EngineError::InvalidConfig("too many gates"));
    }
    for (i, gate) in gates.iter().enumerate() {
        if gate.is_empty() || gate.len() > MAX_GATE_NAME_LEN {
            return Err(EngineError::InvalidConfig("gate name empty or too long"));
        }
        if gates[..i].contains(gate) {
            return Err(EngineError::InvalidConfig("duplicate gate name"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_three_floor_lot() {
        let cfg = LotConfig::default();
        assert_eq!(cfg.zones * cfg.spots_per_zone, 60);
        assert_eq!(cfg.gates.len(), 3);
        assert_eq!(cfg.hourly_rate, 100);
        cfg.validate().unwrap();
    }

    #[test]
    fn env_overrides_and_fallbacks() {
        let cfg = LotConfig::from_lookup(lookup(&[
            ("PARKLINE_ZONES", "2"),
            ("PARKLINE_SPOTS_PER_ZONE", "not-a-number"),
            ("PARKLINE_GATES", "North, South ,,East"),
            ("PARKLINE_HOURLY_RATE", "250"),
        ]));
        assert_eq!(cfg.zones, 2);
        assert_eq!(cfg.spots_per_zone, 20);
        assert_eq!(cfg.gates, vec!["North", "South", "East"]);
        assert_eq!(cfg.hourly_rate, 250);
    }

    #[test]
    fn blank_gate_list_falls_back() {
        let cfg = LotConfig::from_lookup(lookup(&[("PARKLINE_GATES", " , ")]));
        assert_eq!(cfg.gates, LotConfig::default().gates);
    }

    #[test]
    fn validate_rejects_bad_layouts() {
        let mut cfg = LotConfig {
            electric_per_zone: 21,
            ..LotConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));

        cfg.electric_per_zone = 0;
        cfg.zones = 0;
        assert!(cfg.validate().is_err());

        cfg.zones = 1;
        cfg.gates = vec!["A".into(), "A".into()];
        assert!(cfg.validate().is_err());

        cfg.gates.clear();
        assert!(cfg.validate().is_err());
    }
}

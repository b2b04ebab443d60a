use std::collections::HashMap;

use crate::model::*;

use super::EngineError;

/// All spots of a lot in layout order, with an id index. Ground truth for
/// spot existence and status.
#[derive(Debug, Default, Clone)]
pub struct SpotPool {
    spots: Vec<Spot>,
    index: HashMap<SpotId, usize>,
}

impl SpotPool {
    pub fn new(spots: Vec<Spot>) -> Result<Self, EngineError> {
        let mut index = HashMap::with_capacity(spots.len());
        for (pos, spot) in spots.iter().enumerate() {
            if index.insert(spot.id.clone(), pos).is_some() {
                return Err(EngineError::DuplicateSpot(spot.id.clone()));
            }
        }
        Ok(Self { spots, index })
    }

    /// Deterministic layout: zones `1..=zones`, indices `1..=per_zone`; the
    /// first `electric_per_zone` indices of every zone are Electric.
    pub fn layout(zones: u32, per_zone: u32, electric_per_zone: u32) -> Self {
        let mut spots = Vec::with_capacity((zones * per_zone) as usize);
        for zone in 1..=zones {
            for i in 1..=per_zone {
                let class = if i <= electric_per_zone {
                    SpotClass::Electric
                } else {
                    SpotClass::Standard
                };
                spots.push(Spot::new(SpotId::from_layout(zone, i), zone, class));
            }
        }
        let index = spots
            .iter()
            .enumerate()
            .map(|(pos, s)| (s.id.clone(), pos))
            .collect();
        Self { spots, index }
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    pub fn get(&self, id: &SpotId) -> Option<&Spot> {
        self.index.get(id).map(|&pos| &self.spots[pos])
    }

    pub fn status(&self, id: &SpotId) -> Option<SpotStatus> {
        self.get(id).map(|s| s.status)
    }

    pub(crate) fn set_status(&mut self, id: &SpotId, status: SpotStatus) {
        if let Some(&pos) = self.index.get(id) {
            self.spots[pos].status = status;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spot> {
        self.spots.iter()
    }

    pub fn free_counts(&self) -> FreeCounts {
        let mut counts = FreeCounts::default();
        for spot in self.spots.iter().filter(|s| s.status == SpotStatus::Free) {
            counts.bump(spot.class);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_assigns_scarce_class_to_first_indices() {
        let pool = SpotPool::layout(2, 4, 1);
        assert_eq!(pool.len(), 8);
        let classes: Vec<_> = pool.iter().map(|s| (s.id.as_str().to_string(), s.class)).collect();
        assert_eq!(classes[0], ("F1-001".to_string(), SpotClass::Electric));
        assert_eq!(classes[1].1, SpotClass::Standard);
        assert_eq!(classes[4], ("F2-001".to_string(), SpotClass::Electric));
        assert!(pool.iter().all(|s| s.status == SpotStatus::Free));
    }

    #[test]
    fn lookup_and_status_update() {
        let mut pool = SpotPool::layout(1, 3, 0);
        let id = SpotId::new("F1-002");
        assert_eq!(pool.get(&id).unwrap().zone, 1);
        pool.set_status(&id, SpotStatus::Held);
        assert_eq!(pool.status(&id), Some(SpotStatus::Held));
        assert_eq!(pool.status(&SpotId::new("F9-001")), None);
        assert_eq!(pool.free_counts().standard, 2);
    }

    #[test]
    fn duplicate_spot_ids_rejected() {
        let spots = vec![
            Spot::new(SpotId::new("S-1"), 1, SpotClass::Standard),
            Spot::new(SpotId::new("S-1"), 1, SpotClass::Standard),
        ];
        assert!(matches!(
            SpotPool::new(spots),
            Err(EngineError::DuplicateSpot(_))
        ));
    }
}

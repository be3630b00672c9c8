use std::fmt::Display;
use std::ops::Index;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::utils::vectors::{Vec3, Vec4};

/// Reading and writing datasets and histograms on disk.
pub mod io;

/// A single Monte Carlo particle record
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// The PDG code identifying the particle species
    pub pdg: i32,
    /// The three-momentum (GeV)
    pub momentum: Vec3,
    /// The rest mass (GeV)
    pub mass: f64,
}

impl Particle {
    /// Create a new [`Particle`] from a PDG code, a three-momentum, and a rest mass
    pub const fn new(pdg: i32, momentum: Vec3, mass: f64) -> Self {
        Self {
            pdg,
            momentum,
            mass,
        }
    }

    /// The energy computed from the momentum and rest mass
    pub fn energy(&self) -> f64 {
        (self.momentum.mag2() + self.mass.powi(2)).sqrt()
    }

    /// The four-momentum of this particle
    pub fn p4(&self) -> Vec4 {
        self.momentum.with_mass(self.mass)
    }
}

/// An event that can be used to test the kinematics methods
///
/// This event contains a photon, a muon, and an anti-muon.
pub fn test_event() -> EventData {
    EventData {
        particles: vec![
            Particle::new(22, Vec3::new(0.0, 0.0, 1.2), 0.0), // photon
            Particle::new(13, Vec3::new(3.0, 0.0, 0.0), 0.105), // muon
            Particle::new(-13, Vec3::new(-3.0, 0.0, 0.0), 0.105), // anti-muon
        ],
        weight: 0.48,
    }
}

/// A dataset that can be used to test the accumulation methods
///
/// This dataset contains a single event generated from [`test_event`].
pub fn test_dataset() -> Dataset {
    Dataset::from_events(vec![test_event()])
}

/// An event consisting of the particles produced in a single simulated collision
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// The list of particle records in the event
    pub particles: Vec<Particle>,
    /// The weight given to the event
    pub weight: f64,
}

impl Display for EventData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Event:")?;
        writeln!(f, "  particles:")?;
        for particle in &self.particles {
            writeln!(
                f,
                "    pdg={} p4={}",
                particle.pdg,
                particle.p4().to_p4_string()
            )?;
        }
        writeln!(f, "  weight:")?;
        writeln!(f, "    {}", self.weight)?;
        Ok(())
    }
}

impl EventData {
    /// Create a new unit-weight [`EventData`] from a list of particles
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            particles,
            weight: 1.0,
        }
    }

    /// Set the weight of the event
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A collection of [`EventData`]
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    /// The events in the dataset
    pub events: Vec<Arc<EventData>>,
}

impl Index<usize> for Dataset {
    type Output = EventData;

    fn index(&self, index: usize) -> &Self::Output {
        &self.events[index]
    }
}

impl Dataset {
    /// Create a new empty [`Dataset`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`Dataset`] from a list of events
    pub fn from_events(events: Vec<EventData>) -> Self {
        Self {
            events: events.into_iter().map(Arc::new).collect(),
        }
    }

    /// The number of events in the dataset
    pub fn n_events(&self) -> usize {
        self.events.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// An iterator over the events in the dataset
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EventData>> {
        self.events.iter()
    }

    /// The weights of all events in the dataset
    pub fn weights(&self) -> Vec<f64> {
        self.events.iter().map(|event| event.weight).collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_particle_energy() {
        let muon = Particle::new(13, Vec3::new(3.0, 0.0, 0.0), 0.105);
        assert_relative_eq!(muon.energy(), (9.0_f64 + 0.105 * 0.105).sqrt());
        assert_relative_eq!(muon.p4().e(), muon.energy());
    }

    #[test]
    fn test_event_weight() {
        let event = EventData::new(vec![]);
        assert_relative_eq!(event.weight, 1.0);
        let event = event.with_weight(0.48);
        assert_relative_eq!(event.weight, 0.48);
    }

    #[test]
    fn test_dataset_access() {
        let dataset = test_dataset();
        assert_eq!(dataset.n_events(), 1);
        assert!(!dataset.is_empty());
        assert_eq!(dataset[0].particles.len(), 3);
        assert_relative_eq!(dataset.weights()[0], 0.48);
    }

    #[test]
    fn test_event_display() {
        let event = test_event();
        let rendered = format!("{}", event);
        assert!(rendered.starts_with("Event:"));
        assert!(rendered.contains("pdg=13"));
        assert!(rendered.contains("pdg=-13"));
    }
}

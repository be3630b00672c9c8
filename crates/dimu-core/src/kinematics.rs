use crate::data::Particle;

/// The PDG code of the muon
pub const MUON_PDG: i32 = 13;
/// The PDG code of the anti-muon
pub const ANTIMUON_PDG: i32 = -13;

/// Compute the invariant mass of the leading muon/anti-muon pair in an event
///
/// The leading pair consists of the most energetic muon and the most energetic anti-muon in the
/// particle list. Candidates tied in energy resolve to the one appearing first. Returns `None`
/// when the event is missing either pair member.
pub fn leading_pair_mass(particles: &[Particle]) -> Option<f64> {
    let mut best_muon: Option<&Particle> = None;
    let mut best_muon_energy = f64::NEG_INFINITY;
    let mut best_antimuon: Option<&Particle> = None;
    let mut best_antimuon_energy = f64::NEG_INFINITY;

    for particle in particles {
        match particle.pdg {
            MUON_PDG => {
                let energy = particle.energy();
                if energy > best_muon_energy {
                    best_muon_energy = energy;
                    best_muon = Some(particle);
                }
            }
            ANTIMUON_PDG => {
                let energy = particle.energy();
                if energy > best_antimuon_energy {
                    best_antimuon_energy = energy;
                    best_antimuon = Some(particle);
                }
            }
            _ => {}
        }
    }

    Some((best_muon?.p4() + best_antimuon?.p4()).m())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::data::test_event;
    use crate::utils::vectors::Vec3;

    fn muon(px: f64, py: f64, pz: f64) -> Particle {
        Particle::new(MUON_PDG, Vec3::new(px, py, pz), 0.105)
    }

    fn antimuon(px: f64, py: f64, pz: f64) -> Particle {
        Particle::new(ANTIMUON_PDG, Vec3::new(px, py, pz), 0.105)
    }

    #[test]
    fn test_no_pair() {
        assert_eq!(leading_pair_mass(&[]), None);
        assert_eq!(leading_pair_mass(&[muon(1.0, 0.0, 0.0)]), None);
        assert_eq!(leading_pair_mass(&[antimuon(1.0, 0.0, 0.0)]), None);
        let photon = Particle::new(22, Vec3::new(0.0, 0.0, 1.2), 0.0);
        assert_eq!(leading_pair_mass(&[photon]), None);
    }

    #[test]
    fn test_pair_mass() {
        let event = test_event();
        let mass = leading_pair_mass(&event.particles).unwrap();
        assert_relative_eq!(mass, 2.0 * (9.0_f64 + 0.105 * 0.105).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_closed_form() {
        let mu = muon(1.0, 2.0, 3.0);
        let antimu = antimuon(-0.5, 0.25, 1.0);
        let mass = leading_pair_mass(&[mu, antimu]).unwrap();
        let e_sum = mu.energy() + antimu.energy();
        let p_sum = mu.momentum + antimu.momentum;
        assert_relative_eq!(mass, (e_sum.powi(2) - p_sum.mag2()).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_leading_selection() {
        // muon energies 5, 7, 3 via E = sqrt(p^2 + m^2) with p chosen to hit those energies
        let m2 = 0.105_f64 * 0.105;
        let mu_5 = muon((25.0 - m2).sqrt(), 0.0, 0.0);
        let mu_7 = muon(0.0, (49.0 - m2).sqrt(), 0.0);
        let mu_3 = muon(0.0, 0.0, (9.0 - m2).sqrt());
        let antimu = antimuon(0.0, 0.0, -(36.0_f64 - m2).sqrt());
        let mass = leading_pair_mass(&[mu_5, mu_7, mu_3, antimu]).unwrap();
        let expected = leading_pair_mass(&[mu_7, antimu]).unwrap();
        assert_relative_eq!(mass, expected);
    }

    #[test]
    fn test_tie_break_first_wins() {
        // two muons with identical energy but different directions
        let mu_a = muon(2.0, 0.0, 0.0);
        let mu_b = muon(0.0, 2.0, 0.0);
        let antimu = antimuon(-1.0, 0.0, 0.0);
        let mass_ab = leading_pair_mass(&[mu_a, mu_b, antimu]).unwrap();
        let mass_a = leading_pair_mass(&[mu_a, antimu]).unwrap();
        let mass_b = leading_pair_mass(&[mu_b, antimu]).unwrap();
        assert_relative_eq!(mass_ab, mass_a);
        assert!((mass_ab - mass_b).abs() > 1e-6);
    }

    #[test]
    fn test_idempotence() {
        let event = test_event();
        let first = leading_pair_mass(&event.particles).unwrap();
        let second = leading_pair_mass(&event.particles).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }
}

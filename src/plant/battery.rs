//! Battery storage with lossless charge and discharge-side efficiency.

use crate::error::InvariantViolation;
use crate::plant::site::{Site, SiteId};

/// Relative slack allowed before a state-of-charge excursion counts as a defect.
const SOC_TOLERANCE: f64 = 1e-9;

/// Energy drawn from storage to cover a deficit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discharge {
    /// Power reaching the grid (GW).
    pub delivered_gw: f64,
    /// Energy withdrawn from storage before the efficiency loss (GWh).
    pub drawn_gwh: f64,
}

/// Battery energy store of one plant, stepped in one-hour increments.
///
/// Charging is lossless: surplus power is stored one-for-one up to the
/// remaining headroom. The round-trip efficiency is applied entirely on
/// discharge, so delivering `x` GW withdraws `x / efficiency` GWh.
///
/// Power and energy share a scale since every step lasts one hour.
#[derive(Debug, Clone)]
pub struct Battery {
    site: SiteId,
    /// Energy capacity (GWh).
    pub capacity_gwh: f64,
    /// Round-trip efficiency (0.0 < eff <= 1.0).
    pub efficiency: f64,
    soc_gwh: f64,
}

impl Battery {
    /// Creates the battery of `site` at its configured initial state of charge.
    pub fn for_site(site: &Site) -> Self {
        Self {
            site: site.id,
            capacity_gwh: site.params.battery_gwh,
            efficiency: site.params.efficiency,
            soc_gwh: site.initial_soc_gwh(),
        }
    }

    /// Stored energy (GWh).
    pub fn soc_gwh(&self) -> f64 {
        self.soc_gwh
    }

    /// Remaining room before the battery is full (GWh).
    pub fn headroom_gwh(&self) -> f64 {
        (self.capacity_gwh - self.soc_gwh).max(0.0)
    }

    /// Stores as much of `surplus_gw` as headroom allows and returns the stored amount.
    pub fn charge(&mut self, surplus_gw: f64) -> f64 {
        let stored = surplus_gw.max(0.0).min(self.headroom_gwh());
        self.soc_gwh += stored;
        stored
    }

    /// Discharges toward `deficit_gw` and returns what was delivered and withdrawn.
    ///
    /// Delivery is capped at `soc * efficiency`. When the cap binds the battery
    /// is emptied exactly rather than through `delivered / efficiency`, which
    /// would leave rounding residue.
    pub fn discharge(&mut self, deficit_gw: f64) -> Discharge {
        let deficit_gw = deficit_gw.max(0.0);
        let available_gw = self.soc_gwh * self.efficiency;

        let result = if deficit_gw <= available_gw {
            Discharge {
                delivered_gw: deficit_gw,
                drawn_gwh: deficit_gw / self.efficiency,
            }
        } else {
            Discharge {
                delivered_gw: available_gw,
                drawn_gwh: self.soc_gwh,
            }
        };

        self.soc_gwh -= result.drawn_gwh;
        result
    }

    /// Clamps floating point drift back into `[0, capacity]`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] when the state of charge is not finite
    /// or lies beyond the envelope by more than rounding slack.
    pub fn settle(&mut self, hour: usize) -> Result<f64, InvariantViolation> {
        let slack = SOC_TOLERANCE * self.capacity_gwh.max(1.0);
        let soc = self.soc_gwh;
        if !soc.is_finite() || soc < -slack || soc > self.capacity_gwh + slack {
            return Err(InvariantViolation {
                site: self.site,
                hour,
                soc_gwh: soc,
                capacity_gwh: self.capacity_gwh,
            });
        }
        self.soc_gwh = soc.clamp(0.0, self.capacity_gwh);
        Ok(self.soc_gwh)
    }
}

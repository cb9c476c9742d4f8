use serde::{Deserialize, Serialize};

/// Standard EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    /// Band edges in Hz, inclusive on both ends for bin selection
    pub fn range_hz(&self) -> (f64, f64) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 50.0),
        }
    }

    /// Center frequency used by the display correction
    pub fn center_hz(&self) -> f64 {
        match self {
            Band::Delta => 2.25,
            Band::Theta => 6.0,
            Band::Alpha => 10.5,
            Band::Beta => 21.5,
            Band::Gamma => 40.0,
        }
    }

    /// Band width in Hz used by the display correction
    pub fn bandwidth_hz(&self) -> f64 {
        match self {
            Band::Delta => 3.5,
            Band::Theta => 4.0,
            Band::Alpha => 5.0,
            Band::Beta => 17.0,
            Band::Gamma => 20.0,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Band::Delta => 0,
            Band::Theta => 1,
            Band::Alpha => 2,
            Band::Beta => 3,
            Band::Gamma => 4,
        }
    }
}

/// Relative power per band. Values are non-negative and sum to ~1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBands {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl FrequencyBands {
    /// The neutral fallback distribution
    pub fn uniform() -> Self {
        Self {
            delta: 0.2,
            theta: 0.2,
            alpha: 0.2,
            beta: 0.2,
            gamma: 0.2,
        }
    }

    pub fn zeroed() -> Self {
        Self {
            delta: 0.0,
            theta: 0.0,
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Band) -> f64) -> Self {
        Self {
            delta: f(Band::Delta),
            theta: f(Band::Theta),
            alpha: f(Band::Alpha),
            beta: f(Band::Beta),
            gamma: f(Band::Gamma),
        }
    }

    pub fn get(&self, band: Band) -> f64 {
        match band {
            Band::Delta => self.delta,
            Band::Theta => self.theta,
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
            Band::Gamma => self.gamma,
        }
    }

    pub fn set(&mut self, band: Band, value: f64) {
        match band {
            Band::Delta => self.delta = value,
            Band::Theta => self.theta = value,
            Band::Alpha => self.alpha = value,
            Band::Beta => self.beta = value,
            Band::Gamma => self.gamma = value,
        }
    }

    pub fn sum(&self) -> f64 {
        self.delta + self.theta + self.alpha + self.beta + self.gamma
    }

    pub fn is_finite(&self) -> bool {
        Band::ALL.iter().all(|&b| self.get(b).is_finite())
    }

    /// Scale so the five values sum to 1.0. A degenerate total (zero,
    /// negative, or non-finite) falls back to the uniform distribution.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if !total.is_finite() || total <= 0.0 {
            return Self::uniform();
        }
        Self::from_fn(|b| self.get(b) / total)
    }
}

impl Default for FrequencyBands {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Thresholds for the ordered decision list over raw per-window bands.
///
/// Calibrated against a single meditation recording; heuristic, not clinical.
/// Kept as configuration so deployments can retune without code changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StateThresholds {
    pub deep_delta: f64,
    pub meditation_alpha: f64,
    pub deep_meditation_alpha: f64,
    pub deep_meditation_theta: f64,
    pub relaxed_theta: f64,
    pub relaxed_alpha: f64,
    pub focused_beta: f64,
    pub focused_gamma: f64,
    pub fallback_delta: f64,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            deep_delta: 0.55,
            meditation_alpha: 0.35,
            deep_meditation_alpha: 0.28,
            deep_meditation_theta: 0.18,
            relaxed_theta: 0.30,
            relaxed_alpha: 0.22,
            focused_beta: 0.17,
            focused_gamma: 0.10,
            fallback_delta: 0.38,
        }
    }
}

/// Thresholds for classifying smoothed bands. Historically distinct from
/// `StateThresholds`; the two tables are deliberately not merged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmoothedThresholds {
    pub meditation_alpha: f64,
    pub focused_beta_gamma: f64,
    pub relaxed_theta: f64,
    pub insight_gamma: f64,
    pub deep_delta: f64,
}

impl Default for SmoothedThresholds {
    fn default() -> Self {
        Self {
            meditation_alpha: 0.5,
            focused_beta_gamma: 0.6,
            relaxed_theta: 0.4,
            insight_gamma: 0.3,
            deep_delta: 0.4,
        }
    }
}

use crate::timing::Second;

/// How aggressively timing windows and whammy are exploited. Fractions are
/// in [0, 1]; the lag and delay knobs are in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqueezeSettings {
    pub squeeze: f64,
    pub early_whammy: f64,
    pub lazy_whammy: Second,
    pub whammy_delay: Second,
    pub video_lag: Second,
}

impl SqueezeSettings {
    pub fn default_settings() -> Self {
        Self {
            squeeze: 1.0,
            early_whammy: 1.0,
            lazy_whammy: Second(0.0),
            whammy_delay: Second(0.0),
            video_lag: Second(0.0),
        }
    }
}

impl Default for SqueezeSettings {
    fn default() -> Self {
        Self::default_settings()
    }
}

/// Which drum notes count towards scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrumSettings {
    pub enable_double_kick: bool,
    pub disable_kick: bool,
    pub pro_drums: bool,
    pub enable_dynamics: bool,
}

impl DrumSettings {
    pub fn default_settings() -> Self {
        Self {
            enable_double_kick: true,
            disable_kick: false,
            pro_drums: true,
            enable_dynamics: false,
        }
    }
}

impl Default for DrumSettings {
    fn default() -> Self {
        Self::default_settings()
    }
}

use crate::error::{FeverError, Result};
use crate::fmt_temp;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE: &str = "fever_tracker.xlsx";

/// A labeled temperature interval used to shade the chart.
/// `lower: None` means the band runs down to the bottom of the axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Band {
    pub label: String,
    #[serde(default)]
    pub lower: Option<f64>,
    pub upper: f64,
    /// rgb
    pub color: [u8; 3],
}

impl Band {
    pub fn new(label: &str, lower: Option<f64>, upper: f64, color: [u8; 3]) -> Band {
        Band {
            label: label.to_string(),
            lower,
            upper,
            color,
        }
    }

    /// closed interval, an unbounded lower side accepts everything below `upper`
    pub fn contains(&self, t: f64) -> bool {
        self.lower.map_or(true, |l| t >= l) && t <= self.upper
    }

    pub fn legend_label(&self) -> String {
        match self.lower {
            Some(l) => format!(
                "{} ({}°F - {}°F)",
                self.label,
                fmt_temp(l),
                fmt_temp(self.upper)
            ),
            None => format!("{} (< {}°F)", self.label, fmt_temp(self.upper)),
        }
    }
}

/// What to do with readings outside [y_min, y_max].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AxisPolicy {
    Extend,
    Clip,
}

/// Settings shared by the recorder and the chart renderer.
/// Bands are listed in legend order, highest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeverConfig {
    pub store_path: PathBuf,
    pub bands: Vec<Band>,
    pub y_min: f64,
    pub y_max: f64,
    pub axis_policy: AxisPolicy,
}

impl Default for FeverConfig {
    fn default() -> Self {
        FeverConfig {
            store_path: PathBuf::from(DEFAULT_STORE),
            bands: vec![
                Band::new("High-Grade", Some(102.4), 105.8, [216, 56, 53]),
                Band::new("Moderate-Grade", Some(100.6), 102.2, [230, 147, 45]),
                Band::new("Low-Grade", Some(99.1), 100.4, [241, 231, 39]),
                Band::new("Normal", None, 99.1, [75, 218, 23]),
            ],
            y_min: 97.0,
            y_max: 106.0,
            axis_policy: AxisPolicy::Extend,
        }
    }
}

impl FeverConfig {
    /// Defaults, then the optional toml file, then `FEVER_*` environment variables.
    /// A given file must exist as named.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(FeverConfig::default()));
        if let Some(p) = path {
            if !p.is_file() {
                return Err(FeverError::ConfigNotFound(p.to_path_buf()));
            }
            // absolute, so that figment does not look in parent directories
            let p = p.canonicalize()?;
            tracing::info!(path = %p.display(), "loading config file");
            figment = figment.merge(Toml::file(p));
        }
        let config: FeverConfig = figment
            .merge(Env::prefixed("FEVER_"))
            .extract()
            .map_err(Box::new)?;
        Ok(config)
    }

    pub fn with_store_path(mut self, store_path: PathBuf) -> Self {
        self.store_path = store_path;
        self
    }

    /// Finds the band of a reading, checking from the highest band down
    /// so that a shared boundary belongs to the higher band.
    /// Readings in the gaps between bands, or above the top band, have none.
    pub fn classify(&self, t: f64) -> Option<&Band> {
        let mut bands: Vec<&Band> = self.bands.iter().collect();
        bands.sort_by(|a, b| b.upper.total_cmp(&a.upper));
        bands.into_iter().find(|b| b.contains(t))
    }
}

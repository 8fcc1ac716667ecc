use serde::{Deserialize, Serialize};

/// Thresholds for tiering and response-time bucketing.
///
/// Loaded from `data/reputation.json` by the runner; tests use `Default`,
/// which carries the same values as the shipped file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Successful transactions required for Gold.
    pub gold_min_successful: u32,
    /// Minimum average rating for Gold.
    pub gold_min_rating: f64,
    /// Successful transactions required for Silver.
    pub silver_min_successful: u32,
    /// Minimum average rating for Silver.
    pub silver_min_rating: f64,
    /// Average reply latency (hours) at or below which a seller is Excellent.
    pub excellent_max_hours: f64,
    /// Average reply latency (hours) at or below which a seller is Good.
    pub good_max_hours: f64,
    /// Number of slots in a rendered star rating.
    pub star_slots: usize,
    /// Reject profiles that break range invariants instead of tiering them.
    #[serde(default = "default_validate")]
    pub validate_on_evaluate: bool,
}

fn default_validate() -> bool {
    true
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            gold_min_successful:   50,
            gold_min_rating:       4.5,
            silver_min_successful: 20,
            silver_min_rating:     4.0,
            excellent_max_hours:   2.0,
            good_max_hours:        24.0,
            star_slots:            5,
            validate_on_evaluate:  true,
        }
    }
}

impl ReputationConfig {
    /// Load from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ReputationConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.check()?;
        log::debug!("loaded reputation config from {path}");
        Ok(config)
    }

    /// Reject NaN, infinite or negative thresholds, and orderings that make
    /// Silver harder to reach than Gold.
    pub fn check(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("gold_min_rating", self.gold_min_rating),
            ("silver_min_rating", self.silver_min_rating),
            ("excellent_max_hours", self.excellent_max_hours),
            ("good_max_hours", self.good_max_hours),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("{name} must be a finite, non-negative number, got {value}");
            }
        }
        if self.silver_min_successful > self.gold_min_successful {
            anyhow::bail!(
                "silver_min_successful ({}) exceeds gold_min_successful ({})",
                self.silver_min_successful,
                self.gold_min_successful
            );
        }
        if self.silver_min_rating > self.gold_min_rating {
            anyhow::bail!(
                "silver_min_rating ({}) exceeds gold_min_rating ({})",
                self.silver_min_rating,
                self.gold_min_rating
            );
        }
        if self.excellent_max_hours > self.good_max_hours {
            anyhow::bail!(
                "excellent_max_hours ({}) exceeds good_max_hours ({})",
                self.excellent_max_hours,
                self.good_max_hours
            );
        }
        if self.star_slots == 0 {
            anyhow::bail!("star_slots must be at least 1");
        }
        Ok(())
    }
}

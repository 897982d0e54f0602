//! Mate-preference rules and the closing-time rule.
//!
//! Each side of a date computes a one-sided acceptance probability for the
//! other agent. The probability that the pair mates is the product of the two
//! sides' (independently drawn) decisions.
//!
//! - **Maximizing**: `(other / max) ^ choosiness`, the more attractive the
//!   partner, the likelier the acceptance.
//! - **Matching**: `((max − |own − other|) / max) ^ choosiness`, the closer
//!   the partner is to one's own attractiveness, the likelier.
//!
//! The closing-time rule then relaxes the probability as an agent's date
//! count approaches `max_dates`:
//!
//! ```
//! use gridsim_logic::preference::closing_time;
//!
//! // No limit configured: unchanged.
//! assert_eq!(closing_time(0.25, 10, 0), 0.25);
//! // Half-way to the limit: square root.
//! assert!((closing_time(0.25, 5, 10) - 0.5).abs() < 1e-12);
//! // Past the limit: always accept.
//! assert_eq!(closing_time(0.25, 11, 10), 1.0);
//! ```

use serde::{Deserialize, Serialize};

/// Which preference rule agents use to judge a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferenceRule {
    /// Prefer the most attractive partner available.
    #[default]
    Maximizing,
    /// Prefer the partner closest in attractiveness to oneself.
    Matching,
}

/// One-sided probability that an agent with attractiveness `own` accepts a
/// partner with attractiveness `other`.
///
/// The result is clamped into `[0, 1]`. A non-positive `max_attractiveness`
/// yields 0.
pub fn acceptance_probability(
    rule: PreferenceRule,
    own: f64,
    other: f64,
    max_attractiveness: f64,
    choosiness: f64,
) -> f64 {
    if max_attractiveness <= 0.0 {
        return 0.0;
    }
    let criterion = match rule {
        PreferenceRule::Maximizing => other / max_attractiveness,
        PreferenceRule::Matching => (max_attractiveness - (own - other).abs()) / max_attractiveness,
    };
    criterion.clamp(0.0, 1.0).powf(choosiness)
}

/// Apply the closing-time rule to a base acceptance probability.
///
/// `max_dates == 0` disables the rule. Once `dates` exceeds `max_dates` the
/// agent accepts anyone; before that the probability is raised to
/// `(max_dates − dates) / max_dates`, which shrinks toward zero as the date
/// count grows, so the adjusted probability never decreases.
pub fn closing_time(probability: f64, dates: u32, max_dates: u32) -> f64 {
    if max_dates == 0 {
        return probability;
    }
    if dates > max_dates {
        return 1.0;
    }
    let exponent = (max_dates - dates) as f64 / max_dates as f64;
    probability.powf(exponent)
}

use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeConfig {
    /// Deadline armed for every request.
    pub timeout: Duration,
    /// The responder replies when its roll lands above this value.
    pub reply_threshold: f64,
    /// Hold replies back this long before sending them.
    pub reply_delay: Option<Duration>,
    pub rounds: usize,
    pub event_capacity: usize,
    pub report_json: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            reply_threshold: 0.5,
            reply_delay: None,
            rounds: 1,
            event_capacity: 64,
            report_json: false,
        }
    }
}

impl ExchangeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing or unparseable values keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(timeout) = lookup("EXCHANGE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                config.timeout = Duration::from_millis(ms);
            }
        }

        if let Some(threshold) = lookup("REPLY_THRESHOLD") {
            if let Ok(t) = threshold.parse::<f64>() {
                if t.is_finite() {
                    config.reply_threshold = t.clamp(0.0, 1.0);
                }
            }
        }

        if let Some(delay) = lookup("REPLY_DELAY_MS") {
            if let Ok(ms) = delay.parse::<u64>() {
                config.reply_delay = (ms > 0).then(|| Duration::from_millis(ms));
            }
        }

        if let Some(rounds) = lookup("EXCHANGE_ROUNDS") {
            if let Ok(r) = rounds.parse::<usize>() {
                config.rounds = r.max(1);
            }
        }

        if let Some(capacity) = lookup("EVENT_BUS_CAPACITY") {
            if let Ok(c) = capacity.parse::<usize>() {
                config.event_capacity = c.max(1);
            }
        }

        if let Some(json) = lookup("REPORT_JSON") {
            config.report_json = json.parse::<bool>().unwrap_or(false);
        }

        config
    }
}

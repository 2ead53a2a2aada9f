//! Runtime configuration from the process environment
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file by the binary. Numbers that fail to parse fall back to their default
//! with a warning; only the access token and the two group ids are required.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use shared::GroupRef;
use crate::error::{InviterError, InviterResult};
use crate::types::{FilterSettings, RangeFilter, ValueFilter};

/// Inclusive bounds of a randomised wait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    /// Builds a range, swapping the bounds when they are given inverted
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn fixed(duration: Duration) -> Self {
        Self { min: duration, max: duration }
    }

    /// Uniformly random duration within the bounds, millisecond resolution
    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if min >= max {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Fixed waits around VK calls
#[derive(Debug, Clone, PartialEq)]
pub struct Pacing {
    /// Before every `groups.getById`
    pub resolve_delay: Duration,
    /// Before every `groups.getMembers` page
    pub page_delay: Duration,
    /// After a page when another one follows
    pub between_pages: Duration,
    /// Before every `groups.isMember`
    pub membership_check_delay: Duration,
    /// Random wait right before `groups.invite`
    pub invite_jitter: DelayRange,
    /// Captcha while listing members
    pub fetch_cooldown: Duration,
    /// Captcha while checking membership
    pub membership_cooldown: Duration,
    /// Captcha while inviting
    pub dispatch_cooldown: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            resolve_delay: Duration::from_secs(1),
            page_delay: Duration::from_secs(1),
            between_pages: Duration::from_secs(2),
            membership_check_delay: Duration::from_millis(500),
            invite_jitter: DelayRange::new(Duration::from_secs(1), Duration::from_secs(3)),
            fetch_cooldown: Duration::from_secs(15 * 60),
            membership_cooldown: Duration::from_secs(10 * 60),
            dispatch_cooldown: Duration::from_secs(15 * 60),
        }
    }
}

impl Pacing {
    /// No waits at all
    pub fn immediate() -> Self {
        Self {
            resolve_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            between_pages: Duration::ZERO,
            membership_check_delay: Duration::ZERO,
            invite_jitter: DelayRange::fixed(Duration::ZERO),
            fetch_cooldown: Duration::ZERO,
            membership_cooldown: Duration::ZERO,
            dispatch_cooldown: Duration::ZERO,
        }
    }
}

/// Complete agent configuration
#[derive(Debug, Clone, PartialEq)]
pub struct InviterConfig {
    pub access_token: String,
    /// Community whose members are read
    pub target_group: GroupRef,
    /// Community the invitations are for
    pub destination_group: GroupRef,
    pub max_invites_per_day: u32,
    /// Ceiling on invitations in one cycle
    pub invites_per_run: u32,
    pub invite_delay: DelayRange,
    pub filters: FilterSettings,
    pub stats_file: PathBuf,
    pub fetch_cap: usize,
    pub shuffle_members: bool,
    pub cycle_interval: DelayRange,
    pub api_url: String,
    pub api_version: String,
    pub pacing: Pacing,
}

impl InviterConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.vk.com";
    pub const DEFAULT_API_VERSION: &'static str = "5.131";

    /// Configuration with defaults for everything but the required values
    pub fn new(access_token: impl Into<String>, target_group: GroupRef, destination_group: GroupRef) -> Self {
        Self {
            access_token: access_token.into(),
            target_group,
            destination_group,
            max_invites_per_day: 20,
            invites_per_run: 10,
            invite_delay: DelayRange::new(Duration::from_secs(120), Duration::from_secs(240)),
            filters: FilterSettings::default(),
            stats_file: PathBuf::from("stats.json"),
            fetch_cap: 1000,
            shuffle_members: true,
            cycle_interval: DelayRange::new(Duration::from_secs(4 * HOUR), Duration::from_secs(6 * HOUR)),
            api_url: Self::DEFAULT_API_URL.to_string(),
            api_version: Self::DEFAULT_API_VERSION.to_string(),
            pacing: Pacing::default(),
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> InviterResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> InviterResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let access_token = env.required("VK_ACCESS_TOKEN")?;
        let target_group = env.group("TARGET_GROUP_ID")?;
        let destination_group = env.group("YOUR_GROUP_ID")?;

        let mut config = Self::new(access_token, target_group, destination_group);
        let defaults = config.clone();

        config.max_invites_per_day = env.number("MAX_INVITES_PER_DAY", defaults.max_invites_per_day);
        config.invites_per_run = env.number("INVITES_PER_RUN", defaults.invites_per_run);
        config.invite_delay = DelayRange::new(
            Duration::from_secs(env.number("MIN_DELAY", defaults.invite_delay.min.as_secs())),
            Duration::from_secs(env.number("MAX_DELAY", defaults.invite_delay.max.as_secs())),
        );

        let filter_defaults = FilterSettings::default();
        config.filters = FilterSettings {
            age: RangeFilter {
                enabled: env.flag("FILTER_AGE_ENABLED", filter_defaults.age.enabled),
                min: env.number("FILTER_AGE_MIN", filter_defaults.age.min),
                max: env.number("FILTER_AGE_MAX", filter_defaults.age.max),
            },
            sex: ValueFilter {
                enabled: env.flag("FILTER_SEX_ENABLED", filter_defaults.sex.enabled),
                value: env.number("FILTER_SEX_VALUE", filter_defaults.sex.value),
            },
            city_id: ValueFilter {
                enabled: env.flag("FILTER_CITY_ENABLED", filter_defaults.city_id.enabled),
                value: env.number("FILTER_CITY_VALUE", filter_defaults.city_id.value),
            },
            has_photo: env.flag("FILTER_PHOTO_ENABLED", filter_defaults.has_photo),
            last_seen_days: ValueFilter {
                enabled: env.flag("FILTER_LAST_SEEN_ENABLED", filter_defaults.last_seen_days.enabled),
                value: env.number("FILTER_LAST_SEEN_DAYS", filter_defaults.last_seen_days.value),
            },
        };

        if let Some(path) = env.optional("STATS_FILE") {
            config.stats_file = PathBuf::from(path);
        }
        config.fetch_cap = env.number("MEMBERS_FETCH_CAP", defaults.fetch_cap);
        config.shuffle_members = env.flag("SHUFFLE_MEMBERS", defaults.shuffle_members);
        config.cycle_interval = DelayRange::new(
            env.hours("CYCLE_MIN_HOURS", defaults.cycle_interval.min),
            env.hours("CYCLE_MAX_HOURS", defaults.cycle_interval.max),
        );
        if let Some(url) = env.optional("VK_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(version) = env.optional("VK_API_VERSION") {
            config.api_version = version;
        }

        Ok(config)
    }
}

const HOUR: u64 = 60 * 60;

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> InviterResult<String> {
        self.optional(key).ok_or_else(|| InviterError::ConfigError {
            message: format!("{key} is not set"),
        })
    }

    fn group(&self, key: &str) -> InviterResult<GroupRef> {
        let raw = self.required(key)?;
        raw.parse::<GroupRef>().map_err(|e| InviterError::ConfigError {
            message: format!("{key}: {e}"),
        })
    }

    /// Only a case-insensitive `true` enables a flag
    fn flag(&self, key: &str, default: bool) -> bool {
        match self.optional(key) {
            Some(value) => value.eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    /// Fractional hours; negative values clamp to zero, values that do not
    /// fit a `Duration` fall back to `default`
    fn hours(&self, key: &str, default: Duration) -> Duration {
        let value = self.number(key, default.as_secs_f64() / HOUR as f64);
        if !value.is_finite() {
            warn!("{}={} is not a finite number of hours, using default", key, value);
            return default;
        }
        Duration::try_from_secs_f64(value.max(0.0) * HOUR as f64).unwrap_or_else(|_| {
            warn!("{}={} hours is out of range, using default", key, value);
            default
        })
    }

    fn number<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        match self.optional(key) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!("Cannot parse {}={:?} as a number, using default {}", key, value, default);
                default
            }),
            None => default,
        }
    }
}

use std::env;

use tracing::warn;

const DEFAULT_SKILLS_WEIGHT: f64 = 0.4;
const DEFAULT_WORKLOAD_WEIGHT: f64 = 0.3;
const DEFAULT_AVAILABILITY_WEIGHT: f64 = 0.3;
const DEFAULT_AUTO_ASSIGN_THRESHOLD: f64 = 0.8;
const DEFAULT_AUTO_ASSIGN_ENABLED: bool = true;
const DEFAULT_MAX_SUGGESTIONS: usize = 5;
const DEFAULT_CAPACITY_ACCEPT_THRESHOLD: f64 = 0.9;
const DEFAULT_CAPACITY_COMFORTABLE_THRESHOLD: f64 = 0.7;
const DEFAULT_OVERLOAD_THRESHOLD: f64 = 0.8;
const DEFAULT_UNDERLOAD_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct AssignmentConfig {
    pub skills_weight: f64,
    pub workload_weight: f64,
    pub availability_weight: f64,
    pub auto_assign_threshold: f64,
    pub auto_assign_enabled: bool,
    pub max_suggestions: usize,
    pub capacity_accept_threshold: f64,
    pub capacity_comfortable_threshold: f64,
    pub overload_threshold: f64,
    pub underload_threshold: f64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            skills_weight: DEFAULT_SKILLS_WEIGHT,
            workload_weight: DEFAULT_WORKLOAD_WEIGHT,
            availability_weight: DEFAULT_AVAILABILITY_WEIGHT,
            auto_assign_threshold: DEFAULT_AUTO_ASSIGN_THRESHOLD,
            auto_assign_enabled: DEFAULT_AUTO_ASSIGN_ENABLED,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            capacity_accept_threshold: DEFAULT_CAPACITY_ACCEPT_THRESHOLD,
            capacity_comfortable_threshold: DEFAULT_CAPACITY_COMFORTABLE_THRESHOLD,
            overload_threshold: DEFAULT_OVERLOAD_THRESHOLD,
            underload_threshold: DEFAULT_UNDERLOAD_THRESHOLD,
        }
    }
}

impl AssignmentConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|name| env::var(name).ok())
    }

    fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            skills_weight: clamp_ratio(read_env_f64(
                "TD_ASSIGN_SKILLS_WEIGHT",
                defaults.skills_weight,
                &get_env,
            )),
            workload_weight: clamp_ratio(read_env_f64(
                "TD_ASSIGN_WORKLOAD_WEIGHT",
                defaults.workload_weight,
                &get_env,
            )),
            availability_weight: clamp_ratio(read_env_f64(
                "TD_ASSIGN_AVAILABILITY_WEIGHT",
                defaults.availability_weight,
                &get_env,
            )),
            auto_assign_threshold: clamp_ratio(read_env_f64(
                "TD_AUTO_ASSIGN_THRESHOLD",
                defaults.auto_assign_threshold,
                &get_env,
            )),
            auto_assign_enabled: read_env_bool(
                "TD_AUTO_ASSIGN_ENABLED",
                defaults.auto_assign_enabled,
                &get_env,
            ),
            max_suggestions: normalize_max(
                read_env_usize("TD_MAX_SUGGESTIONS", defaults.max_suggestions, &get_env),
                "TD_MAX_SUGGESTIONS",
                defaults.max_suggestions,
            ),
            capacity_accept_threshold: read_env_f64(
                "TD_CAPACITY_ACCEPT_THRESHOLD",
                defaults.capacity_accept_threshold,
                &get_env,
            ),
            capacity_comfortable_threshold: read_env_f64(
                "TD_CAPACITY_COMFORTABLE_THRESHOLD",
                defaults.capacity_comfortable_threshold,
                &get_env,
            ),
            overload_threshold: read_env_f64(
                "TD_OVERLOAD_THRESHOLD",
                defaults.overload_threshold,
                &get_env,
            ),
            underload_threshold: read_env_f64(
                "TD_UNDERLOAD_THRESHOLD",
                defaults.underload_threshold,
                &get_env,
            ),
        }
    }
}

fn read_env_f64<F>(name: &str, default: f64, get_env: &F) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.parse::<f64>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Invalid {name}='{value}': {err}. Using default {default}.");
                default
            }
        },
        None => default,
    }
}

fn read_env_usize<F>(name: &str, default: usize, get_env: &F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.parse::<usize>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Invalid {name}='{value}': {err}. Using default {default}.");
                default
            }
        },
        None => default,
    }
}

fn read_env_bool<F>(name: &str, default: bool, get_env: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.parse::<bool>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Invalid {name}='{value}': {err}. Using default {default}.");
                default
            }
        },
        None => default,
    }
}

fn normalize_max(value: usize, name: &str, default: usize) -> usize {
    if value == 0 {
        warn!("{name} set to 0. Using minimum value 1 instead of default {default}.");
        1
    } else {
        value
    }
}

fn clamp_ratio(value: f64) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        warn!("Assignment ratio out of range ({value}); clamping to 0.0-1.0.");
    }
    value.clamp(0.0, 1.0)
}

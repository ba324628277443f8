//! Default value functions for configuration.

pub fn default_true() -> bool {
    true
}

pub fn default_database_path() -> String {
    "restrictd.db".to_string()
}

pub fn default_sweep_interval() -> u64 {
    30
}

pub fn default_adapter_timeout() -> u64 {
    10
}

pub fn default_metrics_port() -> u16 {
    9090
}

use serde::{Deserialize, Serialize};

/// 失敗したいいね操作の楽観的な値をどう扱うか
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToggleFailurePolicy {
    /// 楽観的な値をそのまま残す
    #[default]
    Retain,
    /// 逆方向の効果を適用して元に戻す
    Rollback,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub mutations: MutationConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 同時に保持するビュー（クエリキー）の上限
    pub max_views: usize,
    /// 変更通知チャネルのバッファ長
    pub event_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    pub toggle_failure_policy: ToggleFailurePolicy,
    /// ジャーナルに残す完了済み記録の上限
    pub journal_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// インメモリサーバーの1ページあたりの件数
    pub page_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_views: 32,
            event_capacity: 64,
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            toggle_failure_policy: ToggleFailurePolicy::default(),
            journal_capacity: 64,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FEED_CACHE_MAX_VIEWS") {
            if let Some(value) = parse_usize(&v) {
                cfg.cache.max_views = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FEED_CACHE_EVENT_CAPACITY") {
            if let Some(value) = parse_usize(&v) {
                cfg.cache.event_capacity = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FEED_ROLLBACK_ON_FAILURE") {
            let rollback = parse_bool(
                &v,
                cfg.mutations.toggle_failure_policy == ToggleFailurePolicy::Rollback,
            );
            cfg.mutations.toggle_failure_policy = if rollback {
                ToggleFailurePolicy::Rollback
            } else {
                ToggleFailurePolicy::Retain
            };
        }
        if let Ok(v) = std::env::var("FEED_JOURNAL_CAPACITY") {
            if let Some(value) = parse_usize(&v) {
                cfg.mutations.journal_capacity = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FEED_REMOTE_PAGE_SIZE") {
            if let Some(value) = parse_usize(&v) {
                cfg.remote.page_size = value.clamp(1, 100);
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cache.max_views == 0 {
            return Err("Cache max_views must be greater than 0".to_string());
        }
        if self.cache.event_capacity == 0 {
            return Err("Cache event_capacity must be greater than 0".to_string());
        }
        if self.mutations.journal_capacity == 0 {
            return Err("Mutation journal_capacity must be greater than 0".to_string());
        }
        if self.remote.page_size == 0 {
            return Err("Remote page_size must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(
            cfg.mutations.toggle_failure_policy,
            ToggleFailurePolicy::Retain
        );
    }

    #[test]
    fn zero_max_views_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.cache.max_views = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_journal_capacity_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.mutations.journal_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parse_bool_falls_back_on_garbage() {
        assert!(parse_bool("YES", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("maybe", true));
    }

    #[test]
    fn policy_serializes_as_snake_case() {
        let json = serde_json::to_string(&ToggleFailurePolicy::Rollback).unwrap();
        assert_eq!(json, "\"rollback\"");
    }
}

use std::time::Duration;
use syn::LitStr;
use crate::types::http::HttpMethod;

/// 重试策略配置
///
/// 由实时传输层执行，核心调度器本身从不重试。
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 最大尝试次数（包含首次请求）
    pub max_attempts: u32,
    /// 基础延迟时间（毫秒）
    pub base_delay_ms: u64,
    /// 最大延迟时间（毫秒）
    pub max_delay_ms: u64,
    /// 指数底数
    pub exponential_base: f64,
    /// 随机抖动比例 (0.0-1.0)
    pub jitter_ratio: f64,
    /// 仅对幂等方法重试
    pub idempotent_only: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 30000,
            exponential_base: 2.0,
            jitter_ratio: 0.1,
            idempotent_only: true,
        }
    }
}

impl RetryPolicy {
    /// 创建指数重试策略
    pub fn exponential(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            ..Default::default()
        }
    }

    /// 创建固定延迟重试策略
    pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            exponential_base: 1.0,
            jitter_ratio: 0.0,
            idempotent_only: true,
        }
    }

    /// 计算第 `attempt` 次重试前的延迟
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        // base_delay * exponential_base^(attempt-1)
        let exponential_delay =
            self.base_delay_ms as f64 * self.exponential_base.powi((attempt - 1) as i32);
        let capped_delay = exponential_delay.min(self.max_delay_ms as f64);

        let jitter = if self.jitter_ratio > 0.0 {
            fastrand::f64() * capped_delay * self.jitter_ratio
        } else {
            0.0
        };

        Duration::from_millis((capped_delay + jitter) as u64)
    }

    /// 判断HTTP状态码是否应该重试
    pub fn should_retry_status(&self, status: u16) -> bool {
        matches!(status, 500..=599 | 429 | 408)
    }

    /// 该策略是否允许对给定方法重试
    pub fn allows(&self, method: &HttpMethod) -> bool {
        !self.idempotent_only || method.is_idempotent()
    }

    /// 从字符串解析重试策略
    ///
    /// 支持格式:
    /// - "exponential(max_attempts=3, base_delay=100ms)"
    /// - "fixed(max_attempts=5, delay=200ms)"
    /// - "exponential(3, 100ms)" // 简化格式
    pub fn parse_str(config: &str) -> Result<Self, String> {
        let config = config.trim();

        if let Some(params) = strip_call(config, "exponential") {
            parse_params(params, RetryPolicy::default(), &["max_attempts", "base_delay"])
        } else if let Some(params) = strip_call(config, "fixed") {
            let base = RetryPolicy::fixed(RetryPolicy::default().max_attempts, 100);
            parse_params(params, base, &["max_attempts", "delay"])
        } else {
            Err(format!("Unsupported retry config format: {}", config))
        }
    }
}

fn strip_call<'a>(config: &'a str, name: &str) -> Option<&'a str> {
    config
        .strip_prefix(name)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
}

fn parse_params(
    params: &str,
    mut policy: RetryPolicy,
    positional: &[&str],
) -> Result<RetryPolicy, String> {
    if params.trim().is_empty() {
        return Ok(policy);
    }

    let mut named_seen = false;
    for (index, param) in params.split(',').map(str::trim).enumerate() {
        if param.is_empty() {
            return Err(format!("Empty retry parameter in: {}", params));
        }

        let (key, value) = match param.split_once('=') {
            Some((key, value)) => {
                named_seen = true;
                (key.trim(), value.trim())
            }
            None if !named_seen && index < positional.len() => (positional[index], param),
            None => return Err(format!("Unexpected positional parameter: {}", param)),
        };

        apply_param(&mut policy, key, value)?;
    }

    Ok(policy)
}

fn apply_param(policy: &mut RetryPolicy, key: &str, value: &str) -> Result<(), String> {
    match key {
        "max_attempts" => {
            policy.max_attempts = value
                .parse()
                .map_err(|_| format!("Invalid max_attempts: {}", value))?;
        }
        "base_delay" => policy.base_delay_ms = parse_duration(value)?,
        "max_delay" => policy.max_delay_ms = parse_duration(value)?,
        "delay" => {
            let delay = parse_duration(value)?;
            policy.base_delay_ms = delay;
            policy.max_delay_ms = delay;
        }
        "exponential_base" => {
            policy.exponential_base = value
                .parse()
                .map_err(|_| format!("Invalid exponential_base: {}", value))?;
        }
        "jitter_ratio" => {
            policy.jitter_ratio = value
                .parse()
                .map_err(|_| format!("Invalid jitter_ratio: {}", value))?;
        }
        "idempotent_only" => {
            policy.idempotent_only = value
                .parse()
                .map_err(|_| format!("Invalid idempotent_only: {}", value))?;
        }
        _ => return Err(format!("Unknown parameter: {}", key)),
    }
    Ok(())
}

/// 解析时长，`ms`/`s` 后缀，无后缀按毫秒处理
pub(crate) fn parse_duration(duration_str: &str) -> Result<u64, String> {
    let duration_str = duration_str.trim();

    if let Some(millis) = duration_str.strip_suffix("ms") {
        millis
            .trim()
            .parse()
            .map_err(|_| format!("Invalid milliseconds: {}", duration_str))
    } else if let Some(seconds) = duration_str.strip_suffix('s') {
        let seconds: u64 = seconds
            .trim()
            .parse()
            .map_err(|_| format!("Invalid seconds: {}", duration_str))?;
        Ok(seconds * 1000)
    } else {
        duration_str
            .parse()
            .map_err(|_| format!("Invalid duration (expected ms or s suffix): {}", duration_str))
    }
}

/// 宏属性中的重试配置解析结果
#[derive(Clone)]
pub struct RetryConfig {
    pub policy: RetryPolicy,
    pub raw_config: LitStr,
}

impl std::fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("policy", &self.policy)
            .field("raw_config", &self.raw_config.value())
            .finish()
    }
}

impl RetryConfig {
    pub fn parse(config_str: &LitStr) -> Result<Self, syn::Error> {
        let policy = RetryPolicy::parse_str(&config_str.value())
            .map_err(|msg| syn::Error::new(config_str.span(), msg))?;

        Ok(RetryConfig {
            policy,
            raw_config: config_str.clone(),
        })
    }
}


#[path = "retry_test.rs"]
#[cfg(test)]
mod comprehensive_tests;

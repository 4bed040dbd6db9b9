use super::*;
use syn::{LitStr, parse_quote};
use std::time::Duration;

/// 测试重试策略的核心算法
mod retry_policy_tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_calculation() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 10000,
            exponential_base: 2.0,
            jitter_ratio: 0.0, // 无抖动便于测试
            idempotent_only: true,
        };

        assert_eq!(policy.calculate_delay(0), Duration::from_millis(0));
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(400));
        assert_eq!(policy.calculate_delay(4), Duration::from_millis(800));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
            exponential_base: 2.0,
            jitter_ratio: 0.0,
            idempotent_only: true,
        };

        // 1000 * 2^5 = 32000ms，被限制在5000ms
        assert_eq!(policy.calculate_delay(6), Duration::from_millis(5000));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10000,
            exponential_base: 2.0,
            jitter_ratio: 0.5,
            idempotent_only: true,
        };

        for _ in 0..10 {
            let delay_ms = policy.calculate_delay(2).as_millis();
            assert!((2000..=3000).contains(&delay_ms));
        }
    }

    #[test]
    fn test_fixed_delay_policy() {
        let policy = RetryPolicy::fixed(4, 500);

        assert_eq!(policy.calculate_delay(1), Duration::from_millis(500));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(500));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(500));
    }

    #[test]
    fn test_retry_status_conditions() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry_status(500));
        assert!(policy.should_retry_status(503));
        assert!(policy.should_retry_status(599));
        assert!(policy.should_retry_status(429));
        assert!(policy.should_retry_status(408));

        assert!(!policy.should_retry_status(200));
        assert!(!policy.should_retry_status(404));
        assert!(!policy.should_retry_status(409));
        assert!(!policy.should_retry_status(600));
    }

    #[test]
    fn test_allows_respects_idempotency() {
        let policy = RetryPolicy::default();
        assert!(policy.allows(&HttpMethod::Get));
        assert!(policy.allows(&HttpMethod::Delete));
        assert!(!policy.allows(&HttpMethod::Post));

        let relaxed = RetryPolicy {
            idempotent_only: false,
            ..Default::default()
        };
        assert!(relaxed.allows(&HttpMethod::Post));
    }
}

/// 测试重试配置解析
mod retry_config_parsing_tests {
    use super::*;

    #[test]
    fn test_parse_detailed_exponential() {
        let config: LitStr = parse_quote! {
            "exponential(max_attempts=7, base_delay=250ms, max_delay=30s, exponential_base=1.5, jitter_ratio=0.3)"
        };
        let result = RetryConfig::parse(&config).unwrap();

        assert_eq!(result.policy.max_attempts, 7);
        assert_eq!(result.policy.base_delay_ms, 250);
        assert_eq!(result.policy.max_delay_ms, 30000);
        assert_eq!(result.policy.exponential_base, 1.5);
        assert_eq!(result.policy.jitter_ratio, 0.3);
    }

    #[test]
    fn test_parse_fixed_delay() {
        let result = RetryPolicy::parse_str("fixed(max_attempts=5, delay=2s)").unwrap();

        assert_eq!(result.max_attempts, 5);
        assert_eq!(result.base_delay_ms, 2000);
        assert_eq!(result.max_delay_ms, 2000);
        assert_eq!(result.exponential_base, 1.0);
    }

    #[test]
    fn test_parse_with_non_idempotent() {
        let result =
            RetryPolicy::parse_str("exponential(max_attempts=3, base_delay=100ms, idempotent_only=false)")
                .unwrap();
        assert!(!result.idempotent_only);
    }

    #[test]
    fn test_mixed_parameter_formats() {
        let result =
            RetryPolicy::parse_str("exponential(5, 200ms, max_delay=30s, jitter_ratio=0.15)").unwrap();

        assert_eq!(result.max_attempts, 5);
        assert_eq!(result.base_delay_ms, 200);
        assert_eq!(result.max_delay_ms, 30000);
        assert_eq!(result.jitter_ratio, 0.15);
    }

    #[test]
    fn test_whitespace_handling() {
        for config in [
            "exponential(3, 100ms)",
            "exponential( 3 , 100ms )",
            "exponential (3 ,100ms )",
        ] {
            let result = RetryPolicy::parse_str(config);
            assert_eq!(result.map(|p| p.max_attempts), Ok(3), "Failed to parse: {}", config);
        }
    }

    #[test]
    fn test_malformed_configs() {
        for config in [
            "invalid_format",
            "exponential(",
            "exponential)",
            "exponential(,)",
            "exponential(3,)",
            "exponential(max_attempts)",
            "exponential(max_attempts=abc)",
            "exponential(max_attempts=3, 100ms)",
            "exponential(3, 100x)",
            "unknown_strategy(3, 100ms)",
        ] {
            assert!(RetryPolicy::parse_str(config).is_err(), "Should fail for: {}", config);
        }
    }

    #[test]
    fn test_lit_span_error() {
        let config: LitStr = parse_quote! { "sometimes(3)" };
        let err = RetryConfig::parse(&config).unwrap_err();
        assert!(err.to_string().contains("Unsupported retry config format"));
    }
}

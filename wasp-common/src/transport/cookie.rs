use std::sync::Arc;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use url::Url;

/// Cookie 接受策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookiePolicy {
    #[default]
    AcceptAll,
    AcceptNone,
    /// 只接受来自原始服务器的 Cookie：`Domain` 缺省，或与请求主机域匹配
    AcceptOriginalServer,
}

/// Cookie 存储与策略
#[derive(Debug, Clone)]
pub struct CookieHandler {
    pub jar: Arc<Jar>,
    pub policy: CookiePolicy,
}

impl CookieHandler {
    pub fn new(policy: CookiePolicy) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            policy,
        }
    }

    pub fn with_jar(jar: Arc<Jar>, policy: CookiePolicy) -> Self {
        Self { jar, policy }
    }
}

/// 按策略过滤后再写入 `Jar`
#[derive(Debug)]
pub struct PolicyCookieStore {
    handler: CookieHandler,
}

impl PolicyCookieStore {
    pub fn new(handler: CookieHandler) -> Self {
        Self { handler }
    }

    fn accepts(&self, header: &HeaderValue, url: &Url) -> bool {
        match self.handler.policy {
            CookiePolicy::AcceptAll => true,
            CookiePolicy::AcceptNone => false,
            CookiePolicy::AcceptOriginalServer => {
                let Some(host) = url.host_str() else {
                    return false;
                };
                match header.to_str().ok().and_then(cookie_domain) {
                    Some(domain) => domain_matches(domain, host),
                    None => true,
                }
            }
        }
    }
}

impl CookieStore for PolicyCookieStore {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut accepted = cookie_headers.filter(|header| {
            let keep = self.accepts(header, url);
            if !keep {
                log::debug!("cookie from {} rejected by {:?}", url, self.handler.policy);
            }
            keep
        });
        self.handler.jar.set_cookies(&mut accepted, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.handler.jar.cookies(url)
    }
}

/// `Set-Cookie` 中的 `Domain` 属性，保留前导点
fn cookie_domain(set_cookie: &str) -> Option<&str> {
    set_cookie
        .split(';')
        .skip(1)
        .filter_map(|attr| attr.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("domain"))
        .map(|(_, value)| value.trim())
        .filter(|domain| !domain.is_empty())
}

/// 主机与 `Domain` 属性的域匹配
///
/// 主机等于域，或域以 `.` 开头且主机去掉该域后的前缀不含 `.`；
/// 域本身必须含有内嵌的点（`.local` 除外）。
fn domain_matches(domain: &str, host: &str) -> bool {
    let is_local = domain.eq_ignore_ascii_case(".local");
    let embedded_dot = match domain.strip_prefix('.') {
        Some(rest) => rest.find('.').map(|i| i + 1),
        None => domain.find('.'),
    };
    if !is_local && embedded_dot.is_none_or(|i| i == domain.len() - 1) {
        return false;
    }

    if !host.contains('.') {
        let local_host = format!("{host}.local");
        if is_local || domain.eq_ignore_ascii_case(&local_host) {
            return true;
        }
    }

    if host.len() == domain.len() {
        return host.eq_ignore_ascii_case(domain);
    }
    if host.len() > domain.len() {
        let split = host.len() - domain.len();
        let (Some(prefix), Some(suffix)) = (host.get(..split), host.get(split..)) else {
            return false;
        };
        return !prefix.contains('.') && suffix.eq_ignore_ascii_case(domain);
    }
    host.len() + 1 == domain.len()
        && domain.starts_with('.')
        && host.eq_ignore_ascii_case(&domain[1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://api.example.com/login").unwrap()
    }

    fn store(policy: CookiePolicy) -> PolicyCookieStore {
        PolicyCookieStore::new(CookieHandler::new(policy))
    }

    fn set(store: &PolicyCookieStore, header: &'static str) {
        let header = HeaderValue::from_static(header);
        store.set_cookies(&mut std::iter::once(&header), &url());
    }

    #[test]
    fn test_cookie_domain() {
        assert_eq!(cookie_domain("a=1; Path=/; Domain=.example.com"), Some(".example.com"));
        assert_eq!(cookie_domain("a=1; Path=/"), None);
        assert_eq!(cookie_domain("domain=x"), None);
    }

    #[test]
    fn test_accept_all() {
        let store = store(CookiePolicy::AcceptAll);
        set(&store, "session=abc; Path=/");
        assert_eq!(store.cookies(&url()).unwrap(), "session=abc");
    }

    #[test]
    fn test_accept_none() {
        let store = store(CookiePolicy::AcceptNone);
        set(&store, "session=abc; Path=/");
        assert!(store.cookies(&url()).is_none());
    }

    #[test]
    fn test_domain_matches() {
        assert!(domain_matches(".example.test", "api.example.test"));
        assert!(domain_matches("api.example.test", "api.example.test"));
        assert!(domain_matches(".example.test", "example.test"));
        assert!(domain_matches(".local", "printer"));
        assert!(domain_matches("printer.local", "printer"));

        assert!(!domain_matches("example.test", "api.example.test"));
        assert!(!domain_matches(".example.test", "a.b.example.test"));
        assert!(!domain_matches(".test", "example.test"));
        assert!(!domain_matches("example.", "example."));
        assert!(!domain_matches(".other.test", "api.example.test"));
    }

    #[test]
    fn test_accept_original_server_parent_domain() {
        let store = store(CookiePolicy::AcceptOriginalServer);
        let url = Url::parse("http://api.example.test/login").unwrap();
        let header = HeaderValue::from_static("sid=1; Path=/; Domain=.example.test");
        store.set_cookies(&mut std::iter::once(&header), &url);

        assert_eq!(store.cookies(&url).unwrap(), "sid=1");
    }

    #[test]
    fn test_accept_original_server() {
        let store = store(CookiePolicy::AcceptOriginalServer);
        set(&store, "wide=1; Path=/; Domain=example.com");
        set(&store, "own=2; Path=/");
        set(&store, "exact=3; Path=/; Domain=api.example.com");

        let cookies = store.cookies(&url()).unwrap();
        let cookies = cookies.to_str().unwrap();
        assert!(cookies.contains("own=2"));
        assert!(cookies.contains("exact=3"));
        assert!(!cookies.contains("wide=1"));
    }
}

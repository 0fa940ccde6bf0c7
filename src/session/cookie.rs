//! Cookie carrying the session id between client and server.

use chrono::{DateTime, Duration, Utc};

const EXPIRES_FORMAT: &str = "%a, %d-%b-%Y %H:%M:%S GMT";

/// Attribute defaults applied whenever a session id is assigned.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub key: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub httponly: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            key: "cask.session.id".to_string(),
            domain: None,
            // Root scope so every route shares one session
            path: Some("/".to_string()),
            secure: false,
            httponly: false,
        }
    }
}

/// One cookie, scoped to the configured key: the inbound value (if the
/// request carried one) plus the outbound attributes.
///
/// Attribute setters flip `attr_changed`; assigning a value resets the
/// attributes to their configured defaults and clears the flag, so only
/// changes made after that point count as modifications.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    config: CookieConfig,
    value: Option<String>,
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    httponly: bool,
    expires: Option<DateTime<Utc>>,
    attr_changed: bool,
}

impl SessionCookie {
    /// Extracts this cookie's value from a request `Cookie` header.
    pub fn parse(cookie_header: Option<&str>, config: CookieConfig) -> Self {
        let value = cookie_header.and_then(|header| find_cookie(header, &config.key));
        Self {
            config,
            value,
            domain: None,
            path: None,
            secure: false,
            httponly: false,
            expires: None,
            attr_changed: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.config.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn attr_changed(&self) -> bool {
        self.attr_changed
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// Assigns a session id and resets attributes to the configured defaults.
    pub fn set_value(&mut self, value: String) {
        self.value = Some(value);
        self.domain = self.config.domain.clone();
        self.path = self.config.path.clone();
        self.secure = self.config.secure;
        self.httponly = self.config.httponly;
        self.expires = None;
        self.attr_changed = false;
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = Some(domain.into());
        self.attr_changed = true;
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
        self.attr_changed = true;
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
        self.attr_changed = true;
    }

    pub fn set_httponly(&mut self, httponly: bool) {
        self.httponly = httponly;
        self.attr_changed = true;
    }

    pub fn set_expires(&mut self, expires: DateTime<Utc>) {
        self.expires = Some(expires);
        self.attr_changed = true;
    }

    /// Dates the cookie a year into the past so the client drops it.
    pub fn expire_now(&mut self) {
        self.set_expires(Utc::now() - Duration::days(365));
    }

    /// Renders the `Set-Cookie` header value.
    pub fn render(&self) -> String {
        let mut out = format!("{}={}", self.config.key, self.value.as_deref().unwrap_or(""));
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(expires) = self.expires {
            out.push_str("; Expires=");
            out.push_str(&expires.format(EXPIRES_FORMAT).to_string());
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.httponly {
            out.push_str("; HttpOnly");
        }
        out
    }
}

fn find_cookie(header: &str, key: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header() {
        let cookie = SessionCookie::parse(
            Some("other=x; cask.session.id=0123abcd; more=y"),
            CookieConfig::default(),
        );
        assert_eq!(cookie.value(), Some("0123abcd"));
        assert!(!cookie.attr_changed());
    }

    #[test]
    fn test_parse_without_header() {
        let cookie = SessionCookie::parse(None, CookieConfig::default());
        assert_eq!(cookie.value(), None);
    }

    #[test]
    fn test_set_value_applies_default_attrs() {
        let mut cookie = SessionCookie::parse(None, CookieConfig::default());
        cookie.set_value("deadbeef".to_string());

        let rendered = cookie.render();
        assert!(rendered.starts_with("cask.session.id=deadbeef"));
        assert!(rendered.contains("Path=/"));
        assert!(!rendered.contains("Expires"));
        // defaults never count as a modification
        assert!(!cookie.attr_changed());
    }

    #[test]
    fn test_attr_setters_flag_change() {
        let mut cookie = SessionCookie::parse(None, CookieConfig::default());
        cookie.set_value("deadbeef".to_string());
        cookie.set_path("/other");

        assert!(cookie.attr_changed());
        assert!(cookie.render().contains("Path=/other"));
    }

    #[test]
    fn test_expire_now_renders_past_date() {
        let mut cookie = SessionCookie::parse(
            Some("cask.session.id=deadbeef"),
            CookieConfig::default(),
        );
        cookie.expire_now();

        assert!(cookie.attr_changed());
        let rendered = cookie.render();
        assert!(rendered.contains("deadbeef"));
        assert!(rendered.contains("Expires="));
        assert!(cookie.expires().is_some_and(|e| e < Utc::now()));
    }

    #[test]
    fn test_render_secure_httponly() {
        let config = CookieConfig {
            secure: true,
            httponly: true,
            ..CookieConfig::default()
        };
        let mut cookie = SessionCookie::parse(None, config);
        cookie.set_value("deadbeef".to_string());

        let rendered = cookie.render();
        assert!(rendered.contains("; Secure"));
        assert!(rendered.contains("; HttpOnly"));
    }
}

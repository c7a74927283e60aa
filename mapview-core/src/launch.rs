use percent_encoding::percent_decode_str;

/// Options read from the page query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// `embed=true` or `hideUI=true`: no chrome, sidebar closed, no sound.
    pub embedded: bool,
}

impl LaunchOptions {
    pub fn from_query(search: &str) -> Self {
        let flag = |name: &str| query_param(search, name).as_deref() == Some("true");
        LaunchOptions {
            embedded: flag("embed") || flag("hideUI"),
        }
    }
}

/// First value of `name` in a `?a=b&c=d` string, percent-decoded.
pub fn query_param(search: &str, name: &str) -> Option<String> {
    let query = search.strip_prefix('?').unwrap_or(search);
    for pair in query.split('&') {
        let mut kv = pair.splitn(2, '=');
        let key = kv.next().unwrap_or_default();
        let value = kv.next().unwrap_or_default();
        if decode(key) == name {
            return Some(decode(value));
        }
    }
    None
}

fn decode(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_decode_str(&s).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_flags() {
        assert!(LaunchOptions::from_query("?embed=true").embedded);
        assert!(LaunchOptions::from_query("?x=1&hideUI=true").embedded);
        assert!(!LaunchOptions::from_query("?embed=false").embedded);
        assert!(!LaunchOptions::from_query("").embedded);
    }

    #[test]
    fn params_are_decoded() {
        assert_eq!(query_param("?map=north%20reach", "map").as_deref(), Some("north reach"));
        assert_eq!(query_param("?q=a+b", "q").as_deref(), Some("a b"));
        assert_eq!(query_param("?flag", "flag").as_deref(), Some(""));
        assert_eq!(query_param("?a=1", "b"), None);
    }
}

//! Request URI construction.
//!
//! Every request is `https://<root><call path><query>` followed by the
//! `callingApp` marker. TLS is forced regardless of the scheme the caller
//! supplied.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::endpoints::CallType;

static SCHEME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*https?://").expect("Invalid scheme regex"));

static SECRET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(c_comdef_admin_password=)[^&]*").expect("Invalid secret regex")
});

/// Characters allowed unescaped in a root URI besides ASCII alphanumerics.
const URI_ALLOWED: &str = "!$&'()*+,-./:;=?@_~";

/// Normalizes a root server URI to `https://host/path` without a trailing
/// slash, percent-encoding anything outside the query-safe set.
pub fn clean_uri(root: &str) -> String {
    let stripped = SCHEME_REGEX.replace(root.trim(), "");
    let mut cleaned = String::from("https://");
    for c in stripped.trim_end_matches('/').chars() {
        if c.is_ascii_alphanumeric() || URI_ALLOWED.contains(c) {
            cleaned.push(c);
        } else {
            cleaned.push_str(&urlencoding::encode(c.encode_utf8(&mut [0; 4])));
        }
    }
    cleaned
}

/// Encoded query parameters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    parts: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key=value`, percent-encoding the value.
    pub fn param(mut self, key: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        self.parts
            .push(format!("{}={}", key, urlencoding::encode(&value)));
        self
    }

    /// Adds `key=value` only when `value` is present.
    pub fn param_opt<V: fmt::Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Adds one `meeting_field[]=key,value` pair for a save.
    pub fn meeting_field(mut self, key: &str, value: &str) -> Self {
        self.parts.push(format!(
            "meeting_field[]={},{}",
            urlencoding::encode(key),
            urlencoding::encode(value)
        ));
        self
    }

    /// Appends a pre-built suffix verbatim (e.g. search criteria).
    pub fn raw(mut self, suffix: &str) -> Self {
        let suffix = suffix.trim_start_matches(['&', '?']);
        if !suffix.is_empty() {
            self.parts.push(suffix.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn joined(&self) -> String {
        self.parts.join("&")
    }
}

/// Builds the full request URI for a call.
pub fn request_uri(root: &str, call: CallType, query: &Query, calling_app: &str) -> String {
    let mut uri = clean_uri(root);
    uri.push_str(call.path());
    if !query.is_empty() {
        uri.push(if uri.contains('?') { '&' } else { '?' });
        uri.push_str(&query.joined());
    }
    append_calling_app(&uri, calling_app)
}

/// Appends the `callingApp` marker and escapes `<`.
///
/// The marker starts the query (`?`) when the URI ends in `.php`, and extends
/// it (`&`) otherwise.
pub fn append_calling_app(uri: &str, calling_app: &str) -> String {
    let separator = if uri.to_ascii_lowercase().ends_with(".php") {
        '?'
    } else {
        '&'
    };
    format!(
        "{}{}callingApp={}",
        uri.replace('<', "%3C"),
        separator,
        urlencoding::encode(calling_app)
    )
}

/// Masks credentials in a URI before it is logged.
pub fn redact_secrets(uri: &str) -> Cow<'_, str> {
    SECRET_REGEX.replace_all(uri, "${1}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_uri_forces_https() {
        assert_eq!(clean_uri("http://example.org/main_server/"), "https://example.org/main_server");
        assert_eq!(clean_uri("HTTPS://example.org"), "https://example.org");
        assert_eq!(clean_uri(" example.org/root "), "https://example.org/root");
    }

    #[test]
    fn clean_uri_encodes_unsafe_characters() {
        assert_eq!(
            clean_uri("example.org/my server/<main>"),
            "https://example.org/my%20server/%3Cmain%3E"
        );
        assert_eq!(clean_uri("example.org/a|b^c"), "https://example.org/a%7Cb%5Ec");
        assert_eq!(clean_uri("example.org/ünï"), "https://example.org/%C3%BCn%C3%AF");
        assert_eq!(
            clean_uri("https://user@example.org:8443/root;x=1"),
            "https://user@example.org:8443/root;x=1"
        );
    }

    #[test]
    fn calling_app_separator_depends_on_php_suffix() {
        let langs = request_uri("example.org", CallType::Languages, &Query::new(), "bmlt-rs");
        assert_eq!(
            langs,
            "https://example.org/client_interface/json/GetLangs.php?callingApp=bmlt-rs"
        );

        let test = request_uri("example.org", CallType::ServerTest, &Query::new(), "bmlt-rs");
        assert!(test.ends_with("?switcher=GetServerInfo&callingApp=bmlt-rs"));
    }

    #[test]
    fn contact_form_query_starts_with_question_mark() {
        let query = Query::new()
            .param("meeting_id", 12)
            .param("message", "hi there & bye");
        let uri = request_uri("example.org", CallType::SendMessage, &query, "app");
        insta::assert_snapshot!(
            uri,
            @"https://example.org/client_interface/contact.php?meeting_id=12&message=hi%20there%20%26%20bye&callingApp=app"
        );
    }

    #[test]
    fn meeting_fields_and_raw_suffix() {
        let query = Query::new()
            .param("meeting_id", 7)
            .meeting_field("meeting_name", "A, B")
            .raw("&weekdays[]=2");
        let uri = request_uri("example.org", CallType::AdminSaveMeeting, &query, "app");
        assert!(uri.contains("&meeting_id=7&meeting_field[]=meeting_name,A%2C%20B&weekdays[]=2&"));
    }

    #[test]
    fn angle_brackets_escaped_and_passwords_redacted() {
        let uri = append_calling_app("https://x.org/a?b=<c>", "app");
        assert_eq!(uri, "https://x.org/a?b=%3Cc>&callingApp=app");

        let login = "https://x.org/json.php?admin_action=login&c_comdef_admin_login=jo&c_comdef_admin_password=s3cret&callingApp=a";
        assert_eq!(
            redact_secrets(login),
            "https://x.org/json.php?admin_action=login&c_comdef_admin_login=jo&c_comdef_admin_password=***&callingApp=a"
        );
    }
}

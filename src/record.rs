use std::borrow::Cow;
use std::fmt;

/// Log level tag written into the `Severity` field.
///
/// The tag is opaque: nothing checks its width or contents, so custom levels
/// can be built with [`Severity::custom`]. The predefined levels are all four
/// characters wide so that aligned output stays aligned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Severity(Cow<'static, str>);

impl Severity {
    pub const INFO: Severity = Severity(Cow::Borrowed("INFO"));
    pub const DEBUG: Severity = Severity(Cow::Borrowed("DEBG"));
    pub const WARN: Severity = Severity(Cow::Borrowed("WARN"));
    pub const ERROR: Severity = Severity(Cow::Borrowed("ERR "));
    pub const CRITICAL: Severity = Severity(Cow::Borrowed("CRIT"));

    /// Builds a severity from an arbitrary tag.
    ///
    /// ```
    /// # use jsonline_logger::Severity;
    /// let audit = Severity::custom("AUDT");
    /// assert_eq!(audit.as_str(), "AUDT");
    /// ```
    pub fn custom(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A name/value pair attached to a record under `Dtls`.
///
/// Details keep the order they are passed in and names are not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail<'a> {
    name: Cow<'a, str>,
    value: Cow<'a, str>,
}

impl<'a> Detail<'a> {
    pub fn new(name: impl Into<Cow<'a, str>>, value: impl Into<Cow<'a, str>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl<'a, K, V> From<(K, V)> for Detail<'a>
where
    K: Into<Cow<'a, str>>,
    V: Into<Cow<'a, str>>,
{
    fn from((name, value): (K, V)) -> Self {
        Detail::new(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_tags() {
        let tags: Vec<_> = [
            Severity::INFO,
            Severity::DEBUG,
            Severity::WARN,
            Severity::ERROR,
            Severity::CRITICAL,
        ]
        .iter()
        .map(|s| s.as_str().to_owned())
        .collect();
        assert_eq!(tags, ["INFO", "DEBG", "WARN", "ERR ", "CRIT"]);
        assert!(tags.iter().all(|t| t.len() == 4));
    }

    #[test]
    fn test_custom_severity_is_not_validated() {
        let sev = Severity::custom(String::from("much too long"));
        assert_eq!(sev.to_string(), "much too long");
        assert_eq!(Severity::custom("").as_str(), "");
    }

    #[test]
    fn test_detail_from_tuple() {
        let owned = String::from("3");
        let d: Detail = ("retries", owned.as_str()).into();
        assert_eq!(d.name(), "retries");
        assert_eq!(d.value(), "3");
        assert_eq!(d, Detail::new("retries", String::from("3")));
    }
}

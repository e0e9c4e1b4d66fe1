//! Shared logging configuration.
//!
//! A [`Config`] holds the default streams, the timestamp settings and the
//! caller-name policy behind a single mutex. Every accessor takes the lock
//! only long enough to read or replace a field; stack inspection and writes
//! always happen after it is released.

use std::fmt;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use tracing::trace;

use crate::caller::{self, BacktraceResolver, CallerResolver, UNAVAILABLE};
use crate::error::{LogError, Result};

/// `2006-01-02T15:04:05 MST` in strftime terms.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S %Z";

/// Caller-name length that keeps the whole name.
pub const ENTIRE_CALLER_NAME: i64 = -1;

/// A stream shared between threads.
///
/// The mutex belongs to the stream, not to the configuration: it only makes
/// each single `write` call exclusive.
pub type SharedSink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Wraps a writer so it can be installed as a default stream.
pub fn shared_sink<W: Write + Send + 'static>(writer: W) -> SharedSink {
    Arc::new(Mutex::new(Box::new(writer)))
}

/// Timezone used to render the `Time` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timezone {
    #[default]
    Utc,
    Local,
    Fixed(FixedOffset),
    /// An IANA zone such as `Europe/Berlin`, daylight saving included.
    Named(Tz),
}

impl Timezone {
    /// Renders `now` in this timezone with a strftime pattern.
    ///
    /// Patterns are not validated. Rendering stops at the first specifier
    /// chrono rejects and whatever was produced up to then is returned.
    pub fn render(&self, now: DateTime<Utc>, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 16);
        let _ = match self {
            Timezone::Utc => write!(out, "{}", now.format(pattern)),
            Timezone::Local => write!(out, "{}", now.with_timezone(&Local).format(pattern)),
            Timezone::Fixed(offset) => write!(out, "{}", now.with_timezone(offset).format(pattern)),
            Timezone::Named(tz) => write!(out, "{}", now.with_timezone(tz).format(pattern)),
        };
        out
    }
}

impl FromStr for Timezone {
    type Err = LogError;

    /// Accepts `UTC`/`Z`, `Local`, an offset such as `+05:30` / `-0800`, or
    /// an IANA zone name such as `America/New_York`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || LogError::InvalidTimezone(s.to_owned());
        if trimmed.is_empty() {
            return Err(invalid());
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(Timezone::Utc);
        }
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(Timezone::Local);
        }
        if trimmed.starts_with(['+', '-']) {
            return parse_offset(trimmed).map(Timezone::Fixed).ok_or_else(invalid);
        }
        trimmed.parse::<Tz>().map(Timezone::Named).map_err(|_| invalid())
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    if !rest.is_ascii() {
        return None;
    }
    // HH:MM or HHMM, nothing else
    let (hh, mm) = match rest.len() {
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        4 => (&rest[..2], &rest[2..]),
        _ => return None,
    };
    if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hh.parse().ok()?;
    let minutes: i32 = mm.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

struct Settings {
    out: SharedSink,
    err: SharedSink,
    timezone: Timezone,
    date_format: String,
    caller_name_length: i64,
    escaping: bool,
    resolver: Arc<dyn CallerResolver>,
}

/// The configuration store behind a [`Logger`](crate::Logger).
///
/// All fields sit behind one lock. Two accessors called in a row during a
/// single emission may observe a setter running in between; records are
/// never torn, but the timestamp and caller name of one record can come
/// from different configuration generations.
pub struct Config {
    settings: Mutex<Settings>,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.settings.lock();
        f.debug_struct("Config")
            .field("timezone", &s.timezone)
            .field("date_format", &s.date_format)
            .field("caller_name_length", &s.caller_name_length)
            .field("escaping", &s.escaping)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Sets the caller-name policy: `< 0` full name, `0` omit, `> 0` truncate.
    pub fn set_caller_name_length(&self, length: i64) {
        self.settings.lock().caller_name_length = length;
        trace!(length, "caller name length updated");
    }

    /// Leaves `Func` empty on every following record.
    pub fn exclude_caller_name(&self) {
        self.set_caller_name_length(0);
    }

    /// Parses and installs a timezone. On error the current one is kept.
    pub fn set_timezone(&self, timezone: &str) -> Result<()> {
        let parsed: Timezone = timezone.parse()?;
        self.set_timezone_value(parsed);
        Ok(())
    }

    pub fn set_timezone_offset(&self, offset: FixedOffset) {
        self.set_timezone_value(Timezone::Fixed(offset));
    }

    pub fn set_timezone_value(&self, timezone: Timezone) {
        self.settings.lock().timezone = timezone;
        trace!(?timezone, "timezone updated");
    }

    /// Replaces the strftime pattern used for the `Time` field.
    pub fn set_date_format(&self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        trace!(%pattern, "date format updated");
        self.settings.lock().date_format = pattern;
    }

    pub fn set_out_stream<W: Write + Send + 'static>(&self, writer: W) {
        self.set_out_sink(shared_sink(writer));
    }

    pub fn set_err_stream<W: Write + Send + 'static>(&self, writer: W) {
        self.set_err_sink(shared_sink(writer));
    }

    /// Installs an already shared stream, e.g. one the caller also reads.
    pub fn set_out_sink(&self, sink: SharedSink) {
        self.settings.lock().out = sink;
        trace!("out stream replaced");
    }

    pub fn set_err_sink(&self, sink: SharedSink) {
        self.settings.lock().err = sink;
        trace!("err stream replaced");
    }

    /// Turns JSON string escaping of text fields on or off.
    pub fn set_escaping(&self, enabled: bool) {
        self.settings.lock().escaping = enabled;
        trace!(enabled, "escaping updated");
    }

    pub fn set_caller_resolver<R: CallerResolver + 'static>(&self, resolver: R) {
        self.settings.lock().resolver = Arc::new(resolver);
        trace!("caller resolver replaced");
    }

    pub fn caller_name_length(&self) -> i64 {
        self.settings.lock().caller_name_length
    }

    pub fn timezone(&self) -> Timezone {
        self.settings.lock().timezone
    }

    pub fn date_format(&self) -> String {
        self.settings.lock().date_format.clone()
    }

    pub fn escaping(&self) -> bool {
        self.settings.lock().escaping
    }

    pub fn current_out_stream(&self) -> SharedSink {
        Arc::clone(&self.settings.lock().out)
    }

    pub fn current_err_stream(&self) -> SharedSink {
        Arc::clone(&self.settings.lock().err)
    }

    /// Formats the current time with the configured timezone and pattern.
    pub fn current_timestamp(&self) -> String {
        let (timezone, pattern) = {
            let s = self.settings.lock();
            (s.timezone, s.date_format.clone())
        };
        timezone.render(Utc::now(), &pattern)
    }

    /// Resolves the name of the frame `skip_frames` above this method's
    /// caller and applies the length policy.
    ///
    /// The lock is released before the resolver runs.
    #[inline(never)]
    pub fn current_caller_name(&self, skip_frames: usize) -> String {
        let (max_len, resolver) = {
            let s = self.settings.lock();
            (s.caller_name_length, Arc::clone(&s.resolver))
        };
        if max_len == 0 {
            return String::new();
        }
        let resolved = resolver.caller_name(skip_frames + 1);
        let name = resolved
            .as_deref()
            .map(caller::short_name)
            .unwrap_or(UNAVAILABLE);
        caller::apply_length_policy(name, max_len).to_owned()
    }
}

/// Builds a [`Config`] with explicit initial values.
///
/// Unset fields keep the defaults: no-op streams, UTC, the
/// `2006-01-02T15:04:05 MST` layout, full caller names, escaping on and a
/// backtrace-based resolver.
pub struct ConfigBuilder {
    settings: Settings,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            settings: Settings {
                out: shared_sink(io::sink()),
                err: shared_sink(io::sink()),
                timezone: Timezone::Utc,
                date_format: DEFAULT_DATE_FORMAT.to_owned(),
                caller_name_length: ENTIRE_CALLER_NAME,
                escaping: true,
                resolver: Arc::new(BacktraceResolver),
            },
        }
    }
}

impl ConfigBuilder {
    pub fn out_stream<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.settings.out = shared_sink(writer);
        self
    }

    pub fn err_stream<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.settings.err = shared_sink(writer);
        self
    }

    pub fn out_sink(mut self, sink: SharedSink) -> Self {
        self.settings.out = sink;
        self
    }

    pub fn err_sink(mut self, sink: SharedSink) -> Self {
        self.settings.err = sink;
        self
    }

    pub fn timezone(mut self, timezone: Timezone) -> Self {
        self.settings.timezone = timezone;
        self
    }

    pub fn date_format(mut self, pattern: impl Into<String>) -> Self {
        self.settings.date_format = pattern.into();
        self
    }

    pub fn caller_name_length(mut self, length: i64) -> Self {
        self.settings.caller_name_length = length;
        self
    }

    pub fn escaping(mut self, enabled: bool) -> Self {
        self.settings.escaping = enabled;
        self
    }

    pub fn caller_resolver<R: CallerResolver + 'static>(mut self, resolver: R) -> Self {
        self.settings.resolver = Arc::new(resolver);
        self
    }

    pub fn build(self) -> Config {
        Config {
            settings: Mutex::new(self.settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::{FixedCaller, Unavailable};
    use chrono::TimeZone;

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap()
    }

    #[test]
    fn test_default_layout() {
        let rendered = Timezone::Utc.render(fixed_instant(), DEFAULT_DATE_FORMAT);
        assert_eq!(rendered, "2024-03-09T17:04:05 UTC");
    }

    #[test]
    fn test_fixed_offset_render() {
        let tz: Timezone = "+05:30".parse().unwrap();
        assert_eq!(tz.render(fixed_instant(), "%H:%M"), "22:34");
        let tz: Timezone = "-0800".parse().unwrap();
        assert_eq!(tz.render(fixed_instant(), "%d %H"), "09 09");
    }

    #[test]
    fn test_timezone_parse() {
        assert_eq!("UTC".parse::<Timezone>().unwrap(), Timezone::Utc);
        assert_eq!("local".parse::<Timezone>().unwrap(), Timezone::Local);
        assert!(matches!("".parse::<Timezone>(), Err(LogError::InvalidTimezone(_))));
        assert!("   ".parse::<Timezone>().is_err());
        assert!("Mars/Olympus".parse::<Timezone>().is_err());
        assert!("+25:00".parse::<Timezone>().is_err());
        assert!("+01:75".parse::<Timezone>().is_err());
        assert!("+1:234".parse::<Timezone>().is_err());
        assert!("+12::34".parse::<Timezone>().is_err());
        assert!("+1234:".parse::<Timezone>().is_err());
        assert!("+123".parse::<Timezone>().is_err());
        assert!("+1é2".parse::<Timezone>().is_err());
        assert_eq!(
            "+1234".parse::<Timezone>().unwrap(),
            "+12:34".parse::<Timezone>().unwrap()
        );
        assert_eq!(
            "America/New_York".parse::<Timezone>().unwrap(),
            Timezone::Named(chrono_tz::America::New_York)
        );
    }

    #[test]
    fn test_named_zone_follows_daylight_saving() {
        let berlin: Timezone = "Europe/Berlin".parse().unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(berlin.render(winter, "%H:%M %:z"), "13:00 +01:00");
        assert_eq!(berlin.render(summer, "%H:%M %:z"), "14:00 +02:00");
    }

    #[test]
    fn test_set_named_timezone() {
        let config = Config::default();
        config.set_timezone("Europe/Berlin").unwrap();
        assert_eq!(config.timezone(), Timezone::Named(chrono_tz::Europe::Berlin));
    }

    #[test]
    fn test_invalid_timezone_keeps_previous() {
        let config = Config::default();
        config.set_timezone("+02:00").unwrap();
        let before = config.timezone();
        assert!(config.set_timezone("").is_err());
        assert_eq!(config.timezone(), before);
    }

    #[test]
    fn test_caller_name_policy() {
        let config = Config::builder()
            .caller_resolver(FixedCaller::new("service::ingest::process_batch"))
            .build();
        assert_eq!(config.current_caller_name(0), "ingest::process_batch");

        config.set_caller_name_length(6);
        assert_eq!(config.current_caller_name(0), "ingest");

        config.exclude_caller_name();
        assert_eq!(config.current_caller_name(0), "");

        config.set_caller_name_length(ENTIRE_CALLER_NAME);
        config.set_caller_resolver(Unavailable);
        assert_eq!(config.current_caller_name(0), UNAVAILABLE);
    }

    #[test]
    fn test_date_format_is_not_validated() {
        let config = Config::default();
        config.set_date_format("%Y-%Q");
        // no panic, whatever comes out is used as is
        let _ = config.current_timestamp();
        assert_eq!(config.date_format(), "%Y-%Q");
    }
}

//! Caller identity lookup.
//!
//! Rust has no cheap "who called me" primitive, so the logger treats caller
//! identity as a pluggable capability. [`BacktraceResolver`] walks the stack
//! with `std::backtrace`; hosts where that is unavailable (stripped binaries,
//! `panic = "abort"` builds without unwind tables) fall back to the
//! `unavailable` placeholder.
//!
//! A name is only reported when every frame between the resolver and the
//! target carries source information. Builds without debuginfo cannot show
//! inlined frames, so counting there could land on the wrong function; they
//! get the placeholder instead. Keep `debug = "line-tables-only"` (or more) in
//! release profiles to get caller names there.
//!
//! # Frame counting
//!
//! `skip_frames` is always relative to the function that calls
//! [`CallerResolver::caller_name`]: `0` names that function, `1` its caller,
//! and so on. Each layer between the resolver and the user adds one. The
//! layers are marked `#[inline(never)]` so the count holds in optimised
//! builds too.

use std::backtrace::Backtrace;

/// Placeholder used when the caller cannot be determined.
pub const UNAVAILABLE: &str = "unavailable";

/// Source of the function name written into the `Func` field.
pub trait CallerResolver: Send + Sync {
    /// Returns the fully qualified name of the frame `skip_frames` above the
    /// function that invoked this method, or `None` when it cannot be found.
    fn caller_name(&self, skip_frames: usize) -> Option<String>;
}

/// Resolves callers from a captured stack trace.
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceResolver;

impl CallerResolver for BacktraceResolver {
    #[inline(never)]
    fn caller_name(&self, skip_frames: usize) -> Option<String> {
        let frames = capture_frames();
        select_caller(&frames, skip_frames).map(str::to_owned)
    }
}

/// Never finds a caller; every record gets the placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl CallerResolver for Unavailable {
    fn caller_name(&self, _skip_frames: usize) -> Option<String> {
        None
    }
}

/// Always reports the same name, whatever the stack looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedCaller(pub String);

impl FixedCaller {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl CallerResolver for FixedCaller {
    fn caller_name(&self, _skip_frames: usize) -> Option<String> {
        Some(self.0.clone())
    }
}

const ANCHOR_SUFFIX: &str = "caller::capture_frames";

/// One logical stack frame as printed by `Backtrace`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    symbol: String,
    located: bool,
}

/// Captures the current stack, innermost frame first. Inlined symbols count
/// as frames of their own.
#[inline(never)]
fn capture_frames() -> Vec<Frame> {
    let rendered = format!("{:#}", Backtrace::force_capture());
    parse_frames(&rendered)
}

/// Extracts frames from the full (`{:#}`) rendering of a `Backtrace`.
///
/// Numbered lines (`  12: name`) start a frame, unnumbered symbol lines are
/// inlined callees of the same frame, and an `at file:line` line marks the
/// frame before it as located.
fn parse_frames(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for line in rendered.lines().map(str::trim_start) {
        if line.is_empty() {
            continue;
        }
        if line.starts_with("at ") {
            if let Some(last) = frames.last_mut() {
                last.located = true;
            }
            continue;
        }
        let symbol = match line.split_once(": ") {
            Some((index, name)) if index.bytes().all(|b| b.is_ascii_digit()) => name,
            _ => line,
        };
        frames.push(Frame {
            symbol: symbol.to_owned(),
            located: false,
        });
    }
    frames
}

/// Picks the frame `skip_frames` above the resolver's caller.
///
/// Returns `None` when the anchor is missing or any frame on the way lacks
/// source information, since inlined frames may then be missing.
fn select_caller(frames: &[Frame], skip_frames: usize) -> Option<&str> {
    let anchor = frames
        .iter()
        .position(|f| clean_symbol(&f.symbol).ends_with(ANCHOR_SUFFIX))?;
    // anchor + 1 is the resolver method, anchor + 2 the function that called it
    let target = anchor + 2 + skip_frames;
    let path = frames.get(anchor + 1..=target)?;
    if !path.iter().all(|f| f.located) {
        return None;
    }
    Some(clean_symbol(&frames[target].symbol))
}

/// Drops the symbol hash (`::h0123456789abcdef`) and trailing closure
/// segments so the name ends at the enclosing function.
fn clean_symbol(name: &str) -> &str {
    let mut name = name.trim();
    if let Some((head, hash)) = name.rsplit_once("::h") {
        if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            name = head;
        }
    }
    while let Some(head) = name.strip_suffix("::{{closure}}") {
        name = head;
    }
    name
}

/// Strips the leading crate path segment, keeping everything after the first
/// `::`. Names without a separator are returned unchanged.
pub fn short_name(qualified: &str) -> &str {
    match qualified.find("::") {
        Some(idx) => &qualified[idx + 2..],
        None => qualified,
    }
}

/// Applies the caller-name length policy: negative keeps the whole name,
/// zero empties it, positive keeps at most that many characters.
pub fn apply_length_policy(name: &str, max_len: i64) -> &str {
    if max_len < 0 {
        return name;
    }
    let max_len = usize::try_from(max_len).unwrap_or(usize::MAX);
    match name.char_indices().nth(max_len) {
        Some((cut, _)) => &name[..cut],
        None => name,
    }
}

//! Indexer-safe rewriting of compiler command lines
//!
//! The source indexer replays command lines out of context, so everything
//! path-like is anchored to the invocation's working directory and everything
//! that would write build artifacts (outputs, dependency files) is removed.
//! Response files are expanded inline.

use crate::classify::is_source_file;
use pear_common::paths::{absolutize, absolutize_str};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Placeholder flag emitted in place of an unreadable response file
pub const SCRUB_ERROR_FLAG: &str = "-rtags-scrub-error";

/// Options whose value is the next token when written on their own.
const SPLIT_FLAGS: &[(&str, FlagKind)] = &[
    ("--sysroot", FlagKind::Sysroot),
    ("-isystem", FlagKind::IncludePath),
    ("-o", FlagKind::Artifact),
    ("-I", FlagKind::IncludePath),
    ("-M", FlagKind::DependencyMode),
    ("-MD", FlagKind::DependencyMode),
    ("-MG", FlagKind::DependencyMode),
    ("-MM", FlagKind::DependencyMode),
    ("-MMD", FlagKind::DependencyMode),
    ("-MP", FlagKind::DependencyMode),
    ("-MF", FlagKind::Artifact),
    ("-MQ", FlagKind::Artifact),
    ("-MT", FlagKind::Artifact),
];

/// Options accepting their value glued to the flag.
const COMPOUND_FLAGS: &[(&str, FlagKind)] = &[
    ("--sysroot=", FlagKind::Sysroot),
    ("-isystem", FlagKind::IncludePath),
    ("-I", FlagKind::IncludePath),
    ("-o", FlagKind::Artifact),
    ("-MF", FlagKind::Artifact),
    ("-MQ", FlagKind::Artifact),
    ("-MT", FlagKind::Artifact),
];

/// Code generation options the indexer rejects
const DROPPED_PREFIXES: &[&str] = &[
    "-fvar-tracking-assignments",
    "-fdebug-prefix-map",
    "-falign-functions",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubResult {
    /// The invocation is a preprocessing pass and must not be logged
    Suppressed,
    Scrubbed(Vec<String>),
}

impl ScrubResult {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, ScrubResult::Suppressed)
    }

    /// Scrubbed arguments, `None` when suppressed.
    pub fn into_args(self) -> Option<Vec<String>> {
        match self {
            ScrubResult::Suppressed => None,
            ScrubResult::Scrubbed(args) => Some(args),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    DropNext,
    MakeAbsolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagKind {
    Sysroot,
    IncludePath,
    /// Names a file the compiler writes
    Artifact,
    /// Dependency generation switches without a value
    DependencyMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Preprocess,
    Split(&'static str, FlagKind),
    Compound(&'static str, FlagKind, &'a str),
    Source(&'a str),
    ResponseFile(&'a str),
    Dropped,
    Other,
}

#[derive(Debug, PartialEq, Eq)]
enum Action<'a> {
    Suppress,
    Keep,
    Drop,
    Replace(Vec<String>),
    Expand(&'a str),
}

fn classify_token(arg: &str) -> Token<'_> {
    if arg == "-E" {
        return Token::Preprocess;
    }
    if let Some(&(flag, kind)) = SPLIT_FLAGS.iter().find(|(flag, _)| *flag == arg) {
        return Token::Split(flag, kind);
    }
    for &(flag, kind) in COMPOUND_FLAGS {
        if let Some(value) = arg.strip_prefix(flag).filter(|value| !value.is_empty()) {
            return Token::Compound(flag, kind, value);
        }
    }
    if is_source_file(arg) {
        return Token::Source(arg);
    }
    if let Some(path) = arg.strip_prefix('@').filter(|path| !path.is_empty()) {
        return Token::ResponseFile(path);
    }
    if DROPPED_PREFIXES.iter().any(|prefix| arg.starts_with(prefix)) {
        return Token::Dropped;
    }
    Token::Other
}

/// What a token read in the `Initial` state turns into, and the state the
/// next token is read in.
fn transition<'a>(arg: &'a str, working_dir: &str) -> (Action<'a>, State) {
    match classify_token(arg) {
        Token::Preprocess => (Action::Suppress, State::Initial),
        Token::Split(_, FlagKind::IncludePath) => (Action::Keep, State::MakeAbsolute),
        Token::Split(_, FlagKind::Artifact) => (Action::Drop, State::DropNext),
        Token::Split(_, FlagKind::DependencyMode) => (Action::Drop, State::Initial),
        // The sysroot path that follows is left to the next iteration.
        Token::Split(_, FlagKind::Sysroot) => {
            (Action::Replace(vec!["-isysroot".to_string()]), State::Initial)
        }
        Token::Compound(flag, FlagKind::IncludePath, value) => (
            Action::Replace(vec![format!("{flag}{}", absolutize_str(working_dir, value))]),
            State::Initial,
        ),
        Token::Compound(_, FlagKind::Sysroot, value) => (
            Action::Replace(vec![
                "-isysroot".to_string(),
                absolutize_str(working_dir, value),
            ]),
            State::Initial,
        ),
        Token::Compound(_, FlagKind::Artifact | FlagKind::DependencyMode, _) => {
            (Action::Drop, State::Initial)
        }
        Token::Source(path) => (
            Action::Replace(vec![absolutize_str(working_dir, path)]),
            State::Initial,
        ),
        Token::ResponseFile(path) => (Action::Expand(path), State::Initial),
        Token::Dropped => (Action::Drop, State::Initial),
        Token::Other => (Action::Keep, State::Initial),
    }
}

/// Rewrites argument vectors relative to one working directory.
#[derive(Debug, Clone)]
pub struct Scrubber {
    working_dir: String,
}

impl Scrubber {
    pub fn new(working_dir: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn scrub(&self, args: &[String]) -> ScrubResult {
        let mut scrubbed = Vec::with_capacity(args.len());
        let mut state = State::Initial;

        for arg in args {
            match state {
                State::DropNext => {
                    state = State::Initial;
                    continue;
                }
                State::MakeAbsolute => {
                    scrubbed.push(absolutize_str(&self.working_dir, arg));
                    state = State::Initial;
                    continue;
                }
                State::Initial => {}
            }

            let (action, next) = transition(arg, &self.working_dir);
            state = next;
            match action {
                Action::Suppress => {
                    debug!("preprocessing pass, indexer log suppressed");
                    return ScrubResult::Suppressed;
                }
                Action::Keep => scrubbed.push(arg.clone()),
                Action::Drop => {}
                Action::Replace(tokens) => scrubbed.extend(tokens),
                Action::Expand(path) => scrubbed.extend(self.expand_response_file(path)),
            }
        }

        ScrubResult::Scrubbed(scrubbed)
    }

    /// Scrubbed contents of a response file. A nested preprocessing flag
    /// contributes nothing; an unreadable file becomes a placeholder token.
    fn expand_response_file(&self, path: &str) -> Vec<String> {
        let location = absolutize(Path::new(&self.working_dir), Path::new(path));
        match fs::read(&location) {
            Ok(contents) => {
                let args: Vec<String> = String::from_utf8_lossy(&contents)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                debug!(path, count = args.len(), "expanding response file");
                self.scrub(&args).into_args().unwrap_or_default()
            }
            Err(err) => {
                warn!(path, %err, "failed to read response file");
                vec![format!(
                    "{SCRUB_ERROR_FLAG} \"failed to read {path}: {err}\""
                )]
            }
        }
    }
}

/// Undo escaped quotes in a serialized command line.
pub fn unescape_quotes(line: &str) -> String {
    line.replace("\\\"", "\"")
}

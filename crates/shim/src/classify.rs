//! Input/output inference for compiler command lines
//!
//! A deliberately small model of compiler-driver behaviour, just enough to
//! name log files after the translation unit or the artifact they describe.
//! Only single-source invocations resolve an input.

use once_cell::sync::Lazy;
use regex::Regex;

/// A bare file name with one of the source extensions a compiler driver
/// recognizes.
static SOURCE_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^-].*\.(c|i|ii|cc|cp|cxx|cpp|c\+\+|C|f|F|r|s|S)$")
        .expect("source file pattern is valid")
});

pub(crate) fn is_source_file(arg: &str) -> bool {
    SOURCE_FILE.is_match(arg)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub input: Option<String>,
    pub output: Option<String>,
}

pub fn classify(args: &[String]) -> Classification {
    let mut sources: Vec<&str> = Vec::new();
    let mut output: Option<String> = None;
    let mut compile_only = false;
    let mut output_is_next = false;

    for arg in args {
        if output_is_next {
            output = Some(arg.clone());
            output_is_next = false;
            continue;
        }

        match arg.as_str() {
            "-o" => output_is_next = true,
            "-c" => compile_only = true,
            _ => {
                if let Some(path) = arg.strip_prefix("-o").filter(|path| !path.is_empty()) {
                    output = Some(path.to_string());
                } else if is_source_file(arg) {
                    sources.push(arg);
                }
            }
        }
    }

    let input = match sources.as_slice() {
        [single] => Some(single.to_string()),
        _ => None,
    };
    if output.is_none() && compile_only {
        output = input.as_ref().map(|input| format!("{input}.o"));
    }

    Classification { input, output }
}

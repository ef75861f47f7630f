//! Configuration file loading
//!
//! The file is YAML with two recognized top-level sections:
//!
//! ```yaml
//! environment:
//!   TOOLS: /opt/toolchain
//!   LOGDIR: ../logs
//!   LOGS: "@(LOGDIR)"
//! command:
//!   - name: [gcc, g++]
//!     exec: $(TOOLS)/bin/$(.arg0)
//!     append: -fdiagnostics-color
//!     filter-out: [-Werror]
//!     logfile: $(LOGS)/$(.output).cmd
//!     rtags-logfile: $(LOGS)/rtags/$(.sha1).cmd
//! ```
//!
//! Sections are applied in document order and may repeat, so a command name
//! only sees the variables defined above it.
//!
//! Lines starting with `//` are treated as comments in addition to YAML `#`
//! comments. Any unknown section or key is rejected with the location of the
//! offending entry.

use crate::command::Command;
use crate::environment::Environment;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{origin}: {error}")]
    Parse {
        origin: String,
        error: serde_yaml::Error,
    },
    #[error("command '{0}' has not been configured")]
    UnknownCommand(String),
}

impl ConfigError {
    /// 1-based line of a parse error, as numbered in the file on disk.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { error, .. } => error.location().map(|location| location.line()),
            _ => None,
        }
    }
}

/// A configuration value given either as one string or as a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringOrList {
    Scalar(String),
    List(Vec<String>),
}

impl StringOrList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::List(values) => values,
        }
    }
}

impl Default for StringOrList {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl<'de> Deserialize<'de> for StringOrList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringOrListVisitor;

        impl<'de> Visitor<'de> for StringOrListVisitor {
            type Value = StringOrList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or a list of strings")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(StringOrList::Scalar(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(StringOrList::Scalar(value))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<String>()? {
                    values.push(value);
                }
                Ok(StringOrList::List(values))
            }
        }

        deserializer.deserialize_any(StringOrListVisitor)
    }
}

/// Top-level sections in document order. A section may appear more than
/// once; each is applied before the next one is read.
#[derive(Debug)]
struct ConfigFile {
    sections: Vec<Section>,
}

#[derive(Debug)]
enum Section {
    Environment(Vec<(String, String)>),
    Command(Vec<CommandEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(field_identifier, rename_all = "lowercase")]
enum SectionName {
    Environment,
    Command,
}

#[derive(Debug, Deserialize)]
struct EnvironmentSection(#[serde(deserialize_with = "ordered_pairs")] Vec<(String, String)>);

impl<'de> Deserialize<'de> for ConfigFile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SectionsVisitor;

        impl<'de> Visitor<'de> for SectionsVisitor {
            type Value = ConfigFile;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of `environment` and `command` sections")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut sections = Vec::new();
                while let Some(name) = map.next_key::<SectionName>()? {
                    let section = match name {
                        SectionName::Environment => Section::Environment(
                            map.next_value::<Option<EnvironmentSection>>()?
                                .map(|section| section.0)
                                .unwrap_or_default(),
                        ),
                        SectionName::Command => Section::Command(
                            map.next_value::<Option<Vec<CommandEntry>>>()?
                                .unwrap_or_default(),
                        ),
                    };
                    sections.push(section);
                }
                Ok(ConfigFile { sections })
            }
        }

        deserializer.deserialize_map(SectionsVisitor)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct CommandEntry {
    name: StringOrList,
    #[serde(default)]
    exec: String,
    #[serde(default)]
    logfile: String,
    #[serde(default)]
    rtags_logfile: String,
    #[serde(default)]
    append: StringOrList,
    #[serde(default)]
    prepend: StringOrList,
    #[serde(default)]
    filter_out: StringOrList,
}

/// Environment entries in document order; later entries may reference
/// earlier ones.
fn ordered_pairs<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of variable names to strings")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut pairs = Vec::new();
            while let Some(pair) = map.next_entry::<String, String>()? {
                pairs.push(pair);
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(PairsVisitor)
}

/// Environment plus the command table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Config {
    env: Environment,
    commands: HashMap<String, Command>,
}

impl Config {
    /// Start from an environment already holding the derived variables.
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            commands: HashMap::new(),
        }
    }

    pub fn read_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_with_origin(&text, &path.display().to_string())
    }

    pub fn parse(&mut self, text: &str) -> Result<(), ConfigError> {
        self.parse_with_origin(text, "<config>")
    }

    fn parse_with_origin(&mut self, text: &str, origin: &str) -> Result<(), ConfigError> {
        let text = strip_comments(text);
        if text.trim().is_empty() {
            return Ok(());
        }

        let file: Option<ConfigFile> =
            serde_yaml::from_str(&text).map_err(|error| ConfigError::Parse {
                origin: origin.to_string(),
                error,
            })?;
        let Some(file) = file else {
            return Ok(());
        };

        for section in file.sections {
            match section {
                Section::Environment(pairs) => {
                    for (name, value) in pairs {
                        self.env.set_expanded(name, &value);
                    }
                }
                Section::Command(entries) => {
                    for entry in entries {
                        self.add_command(entry);
                    }
                }
            }
        }
        debug!(commands = self.commands.len(), "loaded configuration from {origin}");
        Ok(())
    }

    fn add_command(&mut self, entry: CommandEntry) {
        let definition = Command {
            name: String::new(),
            exec: entry.exec,
            logfile: entry.logfile,
            rtags_logfile: entry.rtags_logfile,
            prepend: entry.prepend.into_vec(),
            append: entry.append.into_vec(),
            filter_out: entry.filter_out.into_vec(),
        };

        for name in entry.name.into_vec() {
            let name = self.env.expand(&name);
            self.commands
                .entry(name.clone())
                .or_insert_with(|| Command::new(name))
                .merge(&definition);
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn command(&self, name: &str) -> Result<&Command, ConfigError> {
        self.commands
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCommand(name.to_string()))
    }
}

/// Blank out `//` comment lines so YAML error locations still match the
/// file as written.
fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| if line.starts_with("//") { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

//! Command lines declared from classes, parsed with clap.
//!
//! Every configurable trait of every registered class becomes a
//! `--Class.trait` option. Container traits take one value per
//! occurrence, or a fixed number of values when their `multiplicity`
//! metadata says so. Aliases and flags become options too. Tokens no
//! option claims are handed to [`KeyValueConfigLoader`].

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use indexmap::IndexMap;

use crate::config::defaults::{MULTIPLICITY, MULTIPLICITY_KEY};
use crate::config::error::ConfigError;
use crate::config::tree::Config;
use crate::has_traits::Class;
use crate::trait_types::{ContainerKind, TraitType};
use crate::value::Value;

use super::kv::{DictItem, Flag, KeyValueConfigLoader, LoadedArgs, Rhs, exec_config_str};

/// How many values an option takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    /// No values.
    Flag,
    /// One value per occurrence, collected across occurrences.
    Append,
    /// Between `min` and `max` values; the last occurrence wins.
    Range { min: usize, max: Option<usize> },
}

impl Arity {
    const ONE: Self = Self::Range { min: 1, max: Some(1) };

    const fn max_values(self) -> usize {
        match self {
            Self::Flag => 0,
            Self::Append => 1,
            Self::Range { max: Some(max), .. } => max,
            Self::Range { max: None, .. } => usize::MAX,
        }
    }
}

/// How the values of an option become a config value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Scalar,
    Container,
    /// Dict trait, with its name for error messages.
    Dict(String),
}

#[derive(Debug, Clone)]
enum Role {
    Assign { dest: String, shape: Shape },
    Flag(Config),
    /// A flag with no values, an assignment otherwise.
    FlagOrAssign { dest: String, shape: Shape, flag: Config },
}

#[derive(Debug, Clone)]
struct Declared {
    id: String,
    long: String,
    short: Option<char>,
    arity: Arity,
    role: Role,
}

/// What the command line asked for, in command-line order.
enum Occurrence {
    Assign { dest: String, shape: Shape, append: bool, values: Vec<String> },
    Flag(Config),
}

/// Parses command lines with options declared from classes, aliases and
/// flags.
#[derive(Debug, Clone, Default)]
pub struct ArgParseConfigLoader {
    classes: Vec<Class>,
    aliases: IndexMap<String, String>,
    flags: IndexMap<String, Flag>,
}

impl ArgParseConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `--Class.trait` options for the class's configurable traits.
    #[must_use]
    pub fn class(mut self, class: &Class) -> Self {
        self.classes.push(class.clone());
        self
    }

    /// Lets `--name` (and `-n` for one-letter names) set `target`, a
    /// `Class.trait` path.
    #[must_use]
    pub fn alias(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), target.into());
        self
    }

    /// Registers `--name` to apply `config`.
    #[must_use]
    pub fn flag(mut self, name: impl Into<String>, config: Config, help: impl Into<String>) -> Self {
        self.flags.insert(name.into(), Flag::new(config, help));
        self
    }

    /// Parses `argv`, which excludes the program name.
    ///
    /// Declared options are applied first, then flags, then whatever the
    /// key=value loader makes of the remaining tokens, which wins over
    /// both.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Argument`] for bad declarations, values
    /// clap rejects, malformed dict items, and anything the key=value
    /// loader rejects.
    pub fn load_config<S: AsRef<str>>(&self, argv: &[S]) -> Result<LoadedArgs, ConfigError> {
        let declared = self.declare()?;
        let (known, leftover) = partition(&declared, argv);
        let matches = build_command(&declared)
            .try_get_matches_from(&known)
            .map_err(|e| ConfigError::argument(e.to_string().trim_end()))?;

        let mut config = Config::new();
        let mut flags = Vec::new();
        for (dest, (shape, values)) in collect_assignments(&declared, &matches, &mut flags) {
            exec_config_str(&mut config, &dest, rhs_for(&shape, values)?)?;
        }
        for flag in &flags {
            config.update_sections(flag)?;
        }

        let mut extra_args = Vec::new();
        if !leftover.is_empty() {
            let rest = KeyValueConfigLoader::new().load_config(&leftover)?;
            let mut merged = rest.config;
            merged.merge(&config);
            config = merged;
            extra_args = rest.extra_args;
        }
        tracing::debug!(
            options = known.len(),
            leftover = leftover.len(),
            "Command line parsed"
        );
        Ok(LoadedArgs { config, extra_args })
    }

    fn declare(&self) -> Result<Vec<Declared>, ConfigError> {
        let mut declared = Vec::new();
        let mut shapes: IndexMap<String, (Shape, Arity)> = IndexMap::new();
        for class in &self.classes {
            for (name, t) in class.configurable_traits() {
                let path = format!("{}.{name}", class.name());
                let (shape, arity) = option_shape(&name, &t)?;
                shapes.insert(path.clone(), (shape.clone(), arity));
                declared.push(Declared {
                    id: path.clone(),
                    long: path.clone(),
                    short: None,
                    arity,
                    role: Role::Assign { dest: path, shape },
                });
            }
        }

        let mut alias_flags: IndexMap<&str, &Config> = IndexMap::new();
        for (key, flag) in &self.flags {
            if let Some(target) = self.aliases.get(key) {
                alias_flags.insert(target, &flag.config);
                continue;
            }
            declared.push(Declared {
                id: format!("flag:{key}"),
                long: key.clone(),
                short: single_char(key),
                arity: Arity::Flag,
                role: Role::Flag(flag.config.clone()),
            });
        }

        for (key, target) in &self.aliases {
            let (shape, mut arity) = shapes
                .get(target)
                .cloned()
                .unwrap_or((Shape::Scalar, Arity::ONE));
            let role = match alias_flags.get(target.as_str()) {
                Some(_) if arity == Arity::Append => {
                    return Err(ConfigError::argument(format!(
                        "The alias `{key}` for the 'append' sequence config-trait `{target}` cannot be also a flag!"
                    )));
                }
                Some(flag) => {
                    if arity == Arity::ONE {
                        arity = Arity::Range { min: 0, max: Some(1) };
                    }
                    Role::FlagOrAssign {
                        dest: target.clone(),
                        shape,
                        flag: (*flag).clone(),
                    }
                }
                None => Role::Assign {
                    dest: target.clone(),
                    shape,
                },
            };
            declared.push(Declared {
                id: format!("alias:{key}"),
                long: key.clone(),
                short: single_char(key),
                arity,
                role,
            });
        }
        Ok(declared)
    }
}

fn single_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Shape and arity of the option for a configurable trait.
fn option_shape(name: &str, t: &TraitType) -> Result<(Shape, Arity), ConfigError> {
    let shape = match t.container() {
        None => return Ok((Shape::Scalar, Arity::ONE)),
        Some(ContainerKind::Dict) => Shape::Dict(name.to_owned()),
        Some(_) => Shape::Container,
    };
    let arity = match t.metadata(MULTIPLICITY_KEY) {
        None => Arity::Append,
        Some(Value::Str(s)) if s == MULTIPLICITY => Arity::Append,
        Some(Value::Str(s)) if s == "+" => Arity::Range { min: 1, max: None },
        Some(Value::Str(s)) if s == "*" => Arity::Range { min: 0, max: None },
        Some(Value::Int(n)) if *n > 0 => {
            let n = usize::try_from(*n).unwrap_or(usize::MAX);
            Arity::Range { min: n, max: Some(n) }
        }
        Some(other) => {
            return Err(ConfigError::argument(format!(
                "Invalid multiplicity {other} for config-trait '{name}'"
            )));
        }
    };
    Ok((shape, arity))
}

fn build_command(declared: &[Declared]) -> Command {
    let mut command = Command::new(env!("CARGO_PKG_NAME"))
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true);
    for d in declared {
        let mut arg = Arg::new(d.id.clone()).long(d.long.clone());
        if let Some(c) = d.short {
            arg = arg.short(c);
        }
        arg = match d.arity {
            Arity::Flag => arg.action(ArgAction::SetTrue),
            Arity::Append => arg.num_args(1).action(ArgAction::Append),
            Arity::Range { min, max: Some(max) } => arg.num_args(min..=max).action(ArgAction::Set),
            Arity::Range { min, max: None } => arg.num_args(min..).action(ArgAction::Set),
        };
        if d.arity != Arity::Flag {
            arg = arg.allow_negative_numbers(true);
        }
        command = command.arg(arg);
    }
    command
}

fn looks_negative(token: &str) -> bool {
    token
        .strip_prefix('-')
        .is_some_and(|rest| rest.parse::<f64>().is_ok())
}

/// Splits `argv` into tokens for declared options and everything else.
/// Option values follow their option, up to its arity.
fn partition<S: AsRef<str>>(declared: &[Declared], argv: &[S]) -> (Vec<String>, Vec<String>) {
    let mut known = Vec::new();
    let mut leftover = Vec::new();
    let mut tokens = argv.iter().map(AsRef::as_ref).peekable();
    while let Some(token) = tokens.next() {
        if token == "--" {
            leftover.push(token.to_owned());
            leftover.extend(tokens.by_ref().map(str::to_owned));
            break;
        }
        let (name, inline) = token.split_once('=').map_or((token, false), |(n, _)| (n, true));
        let option = if let Some(long) = name.strip_prefix("--") {
            declared.iter().find(|d| d.long == long)
        } else if let Some(short) = name.strip_prefix('-').and_then(single_char) {
            declared.iter().find(|d| d.short == Some(short))
        } else {
            None
        };
        let Some(option) = option else {
            leftover.push(token.to_owned());
            continue;
        };
        known.push(token.to_owned());
        if inline {
            continue;
        }
        let mut taken = 0;
        while taken < option.arity.max_values() {
            match tokens.peek() {
                Some(&next) if next != "--" && (!next.starts_with('-') || looks_negative(next)) => {
                    known.push(next.to_owned());
                    tokens.next();
                    taken += 1;
                }
                _ => break,
            }
        }
    }
    (known, leftover)
}

fn given(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Turns parsed options into assignments per destination, in the order
/// they were given, and pushes triggered flags onto `flags`. For a
/// destination set through several options, appended values accumulate
/// and otherwise the last one wins.
fn collect_assignments(
    declared: &[Declared],
    matches: &ArgMatches,
    flags: &mut Vec<Config>,
) -> IndexMap<String, (Shape, Vec<String>)> {
    let mut occurrences: Vec<(usize, Occurrence)> = Vec::new();
    for d in declared.iter().filter(|d| given(matches, &d.id)) {
        let first_index = matches.index_of(&d.id).unwrap_or(0);
        let (dest, shape, flag) = match &d.role {
            Role::Flag(flag) => {
                occurrences.push((first_index, Occurrence::Flag(flag.clone())));
                continue;
            }
            Role::Assign { dest, shape } => (dest, shape, None),
            Role::FlagOrAssign { dest, shape, flag } => (dest, shape, Some(flag)),
        };
        let values: Vec<String> = matches
            .get_many::<String>(&d.id)
            .map(|v| v.cloned().collect())
            .unwrap_or_default();
        if values.is_empty() {
            if let Some(flag) = flag {
                occurrences.push((first_index, Occurrence::Flag(flag.clone())));
                continue;
            }
        }
        if d.arity == Arity::Append {
            let indices: Vec<usize> = matches.indices_of(&d.id).map(Iterator::collect).unwrap_or_default();
            for (i, value) in values.into_iter().enumerate() {
                let index = indices.get(i).copied().unwrap_or(first_index);
                occurrences.push((
                    index,
                    Occurrence::Assign { dest: dest.clone(), shape: shape.clone(), append: true, values: vec![value] },
                ));
            }
        } else {
            occurrences.push((
                first_index,
                Occurrence::Assign { dest: dest.clone(), shape: shape.clone(), append: false, values },
            ));
        }
    }
    occurrences.sort_by_key(|(index, _)| *index);

    let mut assignments: IndexMap<String, (Shape, Vec<String>)> = IndexMap::new();
    for (_, occurrence) in occurrences {
        match occurrence {
            Occurrence::Flag(flag) => flags.push(flag),
            Occurrence::Assign { dest, shape, append, values } => {
                let slot = assignments.entry(dest).or_insert_with(|| (shape, Vec::new()));
                if !append {
                    slot.1.clear();
                }
                slot.1.extend(values);
            }
        }
    }
    assignments
}

/// Splits a dict option value into a pair, or keeps a whole `{...}`
/// literal.
fn dict_item(trait_name: &str, value: &str) -> Result<DictItem, ConfigError> {
    if value.starts_with('{') && value.ends_with('}') && value.contains(':') {
        return Ok(DictItem::Literal(value.to_owned()));
    }
    match value.split_once('=') {
        Some((key, item)) if !key.is_empty() => Ok(DictItem::Pair(key.to_owned(), item.to_owned())),
        _ => Err(ConfigError::argument(format!(
            "Expecting <key>=<value> for Dict-trait '{trait_name}', got {value:?}!"
        ))),
    }
}

fn rhs_for(shape: &Shape, values: Vec<String>) -> Result<Rhs, ConfigError> {
    Ok(match shape {
        Shape::Scalar => match <[String; 1]>::try_from(values) {
            Ok([single]) => Rhs::Single(single),
            Err(values) => Rhs::Items(values),
        },
        Shape::Container => Rhs::Items(values),
        Shape::Dict(name) => Rhs::Dict(
            values
                .iter()
                .map(|value| dict_item(name, value))
                .collect::<Result<_, _>>()?,
        ),
    })
}

#[cfg(test)]
#[path = "argparse_tests.rs"]
mod tests;

//! Option schema declaration and validation.
//!
//! Hosts declare options through the kind-specific builders returned by
//! [`string`], [`boolean`], [`number`] and [`positional`], collect them into
//! an [`OptionSet`], and attach the set to a command. Builder misuse is
//! recorded silently at the offending call and surfaced as a composition
//! error when the owning command is built, so declaration code stays fluent.

use serde::Serialize;

use crate::error::{Result, TrellisError};
use crate::token;
use crate::value::OptionValue;

/// The four shapes an option can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    String,
    Boolean,
    Number,
    Positional,
}

/// A validated, immutable option descriptor.
///
/// Produced from builder state by command construction; `name` and `aliases`
/// are already dash-normalized for flag options. Handlers and event consumers
/// receive clones of this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionConfig {
    pub name: String,
    pub aliases: Vec<String>,
    pub kind: OptionKind,
    pub description: Option<String>,
    pub default: OptionValue,
    pub hidden: bool,
    pub required: bool,
    pub int: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub choices: Option<Vec<String>>,
}

impl OptionConfig {
    /// True when `name_part` equals this option's name or one of its aliases.
    pub(crate) fn matches_token(&self, name_part: &str) -> bool {
        self.name == name_part || self.aliases.iter().any(|a| a == name_part)
    }

    /// The option's name followed by its aliases, in declaration order.
    pub(crate) fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Dash-normalizes a flag name: single character names get `-`, longer names
/// get `--`, already-dashed names pass through untouched.
fn generate_prefix(name: &str) -> String {
    if name.starts_with('-') {
        name.to_string()
    } else if name.chars().count() > 1 {
        format!("--{}", name)
    } else {
        format!("-{}", name)
    }
}

/// Builder state shared by all option kinds.
#[derive(Debug, Clone)]
pub(crate) struct RawOption {
    pub(crate) kind: OptionKind,
    pub(crate) name: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) default: OptionValue,
    pub(crate) hidden: bool,
    pub(crate) required: bool,
    pub(crate) int: bool,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) choices: Option<Vec<String>>,
    used: Vec<&'static str>,
    defect: Option<String>,
}

impl RawOption {
    fn new(kind: OptionKind) -> Self {
        RawOption {
            kind,
            name: None,
            aliases: Vec::new(),
            description: None,
            default: OptionValue::Undefined,
            hidden: false,
            required: false,
            int: false,
            min: None,
            max: None,
            choices: None,
            used: Vec::new(),
            defect: None,
        }
    }

    /// Records the first defect; later defects on the same option are dropped.
    fn fail(&mut self, message: String) {
        if self.defect.is_none() {
            self.defect = Some(message);
        }
    }

    /// Registers a refinement call, recording a defect on repeat invocation.
    fn mark(&mut self, refinement: &'static str) {
        if self.used.contains(&refinement) {
            self.fail(format!("refinement '{}' was applied twice", refinement));
        } else {
            self.used.push(refinement);
        }
    }

    fn set_name(&mut self, name: String) {
        self.mark("name");
        self.name = Some(name);
    }

    fn set_desc(&mut self, description: String) {
        self.mark("desc");
        self.description = Some(description);
    }

    fn set_hidden(&mut self) {
        self.mark("hidden");
        self.hidden = true;
    }

    fn set_required(&mut self) {
        self.mark("required");
        if self.used.contains(&"default_value") {
            self.fail("'required' cannot be combined with 'default_value'".to_string());
        }
        self.required = true;
    }

    fn set_default(&mut self, value: OptionValue) {
        self.mark("default_value");
        if self.used.contains(&"required") {
            self.fail("'default_value' cannot be combined with 'required'".to_string());
        }
        if let (Some(choices), OptionValue::Str(s)) = (&self.choices, &value) {
            if !choices.iter().any(|c| c == s) {
                self.fail(format!("default value '{}' is not one of the allowed values", s));
            }
        }
        self.default = value;
    }

    fn set_choices(&mut self, values: Vec<String>) {
        self.mark("choices");
        if let OptionValue::Str(s) = &self.default {
            if !values.iter().any(|c| c == s) {
                self.fail(format!("default value '{}' is not one of the allowed values", s));
            }
        }
        self.choices = Some(values);
    }

    fn set_min(&mut self, value: f64) {
        self.mark("min");
        if let Some(max) = self.max {
            if value > max {
                self.fail("min value cannot exceed max value".to_string());
            }
        }
        self.min = Some(value);
    }

    fn set_max(&mut self, value: f64) {
        self.mark("max");
        if let Some(min) = self.min {
            if value < min {
                self.fail("max value cannot be below min value".to_string());
            }
        }
        self.max = Some(value);
    }

    fn set_int(&mut self) {
        self.mark("int");
        self.int = true;
    }
}

/// Starts a string option declaration.
pub fn string() -> StringOpt {
    StringOpt {
        raw: RawOption::new(OptionKind::String),
    }
}

/// Starts a boolean flag declaration.
pub fn boolean() -> BoolOpt {
    BoolOpt {
        raw: RawOption::new(OptionKind::Boolean),
    }
}

/// Starts a number option declaration.
pub fn number() -> NumberOpt {
    NumberOpt {
        raw: RawOption::new(OptionKind::Number),
    }
}

/// Starts a positional argument declaration.
pub fn positional() -> PositionalOpt {
    PositionalOpt {
        raw: RawOption::new(OptionKind::Positional),
    }
}

/// Builder for string options.
#[derive(Debug, Clone)]
pub struct StringOpt {
    raw: RawOption,
}

impl StringOpt {
    /// Overrides the flag name derived from the declaration key.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.raw.set_name(name.into());
        self
    }

    /// Adds an alias; may be called once per alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.raw.aliases.push(alias.into());
        self
    }

    pub fn desc(mut self, description: impl Into<String>) -> Self {
        self.raw.set_desc(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.raw.set_hidden();
        self
    }

    pub fn required(mut self) -> Self {
        self.raw.set_required();
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.raw.set_default(OptionValue::Str(value.into()));
        self
    }

    /// Restricts accepted values to the given set.
    pub fn choices<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw.set_choices(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Builder for boolean flags.
#[derive(Debug, Clone)]
pub struct BoolOpt {
    raw: RawOption,
}

impl BoolOpt {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.raw.set_name(name.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.raw.aliases.push(alias.into());
        self
    }

    pub fn desc(mut self, description: impl Into<String>) -> Self {
        self.raw.set_desc(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.raw.set_hidden();
        self
    }

    pub fn required(mut self) -> Self {
        self.raw.set_required();
        self
    }

    pub fn default_value(mut self, value: bool) -> Self {
        self.raw.set_default(OptionValue::Bool(value));
        self
    }
}

/// Builder for number options.
#[derive(Debug, Clone)]
pub struct NumberOpt {
    raw: RawOption,
}

impl NumberOpt {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.raw.set_name(name.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.raw.aliases.push(alias.into());
        self
    }

    pub fn desc(mut self, description: impl Into<String>) -> Self {
        self.raw.set_desc(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.raw.set_hidden();
        self
    }

    pub fn required(mut self) -> Self {
        self.raw.set_required();
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.raw.set_default(OptionValue::Num(value));
        self
    }

    /// Rejects parsed values below `value`.
    pub fn min(mut self, value: f64) -> Self {
        self.raw.set_min(value);
        self
    }

    /// Rejects parsed values above `value`.
    pub fn max(mut self, value: f64) -> Self {
        self.raw.set_max(value);
        self
    }

    /// Requires the parsed value to be a whole number.
    pub fn int(mut self) -> Self {
        self.raw.set_int();
        self
    }
}

/// Builder for positional arguments.
///
/// Positionals are matched by position rather than name, so they carry no
/// aliases and their names skip dash normalization.
#[derive(Debug, Clone)]
pub struct PositionalOpt {
    raw: RawOption,
}

impl PositionalOpt {
    /// Overrides the display label derived from the declaration key.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.raw.set_name(name.into());
        self
    }

    pub fn desc(mut self, description: impl Into<String>) -> Self {
        self.raw.set_desc(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.raw.set_hidden();
        self
    }

    pub fn required(mut self) -> Self {
        self.raw.set_required();
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.raw.set_default(OptionValue::Str(value.into()));
        self
    }

    pub fn choices<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw.set_choices(values.into_iter().map(Into::into).collect());
        self
    }
}

/// A finished option declaration, accepted by [`OptionSet::add`].
#[derive(Debug, Clone)]
pub struct OptionDecl(pub(crate) RawOption);

impl From<StringOpt> for OptionDecl {
    fn from(builder: StringOpt) -> Self {
        OptionDecl(builder.raw)
    }
}

impl From<BoolOpt> for OptionDecl {
    fn from(builder: BoolOpt) -> Self {
        OptionDecl(builder.raw)
    }
}

impl From<NumberOpt> for OptionDecl {
    fn from(builder: NumberOpt) -> Self {
        OptionDecl(builder.raw)
    }
}

impl From<PositionalOpt> for OptionDecl {
    fn from(builder: PositionalOpt) -> Self {
        OptionDecl(builder.raw)
    }
}

/// An ordered collection of option declarations keyed by output name.
///
/// The key becomes the entry name in the parsed bag and, unless overridden
/// with `.name()`, the flag name before dash normalization.
#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    pub(crate) entries: Vec<(String, RawOption)>,
}

impl OptionSet {
    pub fn new() -> Self {
        OptionSet::default()
    }

    pub fn add(mut self, key: impl Into<String>, option: impl Into<OptionDecl>) -> Self {
        self.entries.push((key.into(), option.into().0));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validates a declared option set into immutable descriptors.
///
/// Surfaces deferred builder defects, defaults missing names from keys,
/// rejects `=` in flag names, dash-normalizes flag names and aliases, and
/// enforces reserved-name and uniqueness rules across the set. Positionals
/// keep their names verbatim and skip the flag-name rules.
pub(crate) fn validate_options(set: &OptionSet) -> Result<Vec<(String, OptionConfig)>> {
    let mut configs: Vec<(String, OptionConfig)> = Vec::new();
    let mut seen_keys: Vec<&str> = Vec::new();

    for (key, raw) in &set.entries {
        let name = raw.name.clone().unwrap_or_else(|| key.clone());
        let display = if raw.kind == OptionKind::Positional {
            name.clone()
        } else {
            generate_prefix(&name)
        };

        if let Some(defect) = &raw.defect {
            return Err(TrellisError::option(&display, defect));
        }

        if seen_keys.contains(&key.as_str()) {
            return Err(TrellisError::option(
                &display,
                format!("duplicate option key '{}'", key),
            ));
        }
        seen_keys.push(key.as_str());

        if raw.kind == OptionKind::Positional {
            configs.push((key.clone(), OptionConfig {
                name,
                aliases: Vec::new(),
                kind: raw.kind,
                description: raw.description.clone(),
                default: raw.default.clone(),
                hidden: raw.hidden,
                required: raw.required,
                int: false,
                min: None,
                max: None,
                choices: raw.choices.clone(),
            }));
            continue;
        }

        if name.contains('=') {
            return Err(TrellisError::option(
                &display,
                "option names and aliases cannot contain '='",
            ));
        }
        for alias in &raw.aliases {
            if alias.contains('=') {
                return Err(TrellisError::option(
                    &display,
                    "option names and aliases cannot contain '='",
                ));
            }
        }

        configs.push((key.clone(), OptionConfig {
            name: generate_prefix(&name),
            aliases: raw.aliases.iter().map(|a| generate_prefix(a)).collect(),
            kind: raw.kind,
            description: raw.description.clone(),
            default: raw.default.clone(),
            hidden: raw.hidden,
            required: raw.required,
            int: raw.int,
            min: raw.min,
            max: raw.max,
            choices: raw.choices.clone(),
        }));
    }

    // Uniqueness and reserved-name checks run on normalized names.
    let mut stored_names: Vec<Vec<String>> = Vec::new();

    for (_, cfg) in &configs {
        if cfg.kind == OptionKind::Positional {
            continue;
        }

        for name in cfg.all_names() {
            if token::is_reserved_flag(name) {
                return Err(TrellisError::option(
                    &cfg.name,
                    format!("name '{}' is reserved", name),
                ));
            }
        }

        for storage in &stored_names {
            if storage.iter().any(|e| *e == cfg.name) {
                return Err(TrellisError::option(
                    &cfg.name,
                    format!("name is already in use by option '{}'", storage[0]),
                ));
            }
        }

        for alias in &cfg.aliases {
            for storage in &stored_names {
                if storage.iter().any(|e| e == alias) {
                    return Err(TrellisError::option(
                        &cfg.name,
                        format!("alias '{}' is already in use by option '{}'", alias, storage[0]),
                    ));
                }
            }
        }

        let current: Vec<String> = cfg.all_names().map(str::to_string).collect();

        for (idx, name) in current.iter().enumerate() {
            if current.iter().position(|e| e == name) != Some(idx) {
                return Err(TrellisError::option(
                    &cfg.name,
                    format!("duplicate alias '{}'", name),
                ));
            }
        }

        stored_names.push(current);
    }

    Ok(configs)
}

//! Code settings consumed by every stage of the pipeline.
//!
//! Settings are plain data with the defaults the minifier ships with. The
//! list-valued options are only reachable through validating setters, so a
//! malformed option is rejected with a [`ConfigurationError`] before it can
//! reach the scanner, analyzer or renamer.

use std::collections::{BTreeMap, BTreeSet};

use bitflags::bitflags;
use core_types::{ConfigurationError, DiagnosticFilter, ErrorCode};
use serde::{Deserialize, Serialize};

use crate::lexer::is_valid_identifier;

bitflags! {
    /// Individually switchable tree modifications.
    ///
    /// A bit set in [`CodeSettings::kill_switch`] disables that modification.
    /// The full set of names is accepted so settings files written for other
    /// tools still load; bits documented as reserved have no effect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TreeModifications: u64 {
        /// Keep `/*! ... */` comments
        const PRESERVE_IMPORTANT_COMMENTS = 1 << 0;
        /// `a["b"]` to `a.b`
        const BRACKET_MEMBER_TO_DOT_MEMBER = 1 << 1;
        /// `new Object()` to `{}`
        const NEW_OBJECT_TO_OBJECT_LITERAL = 1 << 2;
        /// `new Array()` to `[]`
        const NEW_ARRAY_TO_ARRAY_LITERAL = 1 << 3;
        /// Drop an empty `default:` clause
        const REMOVE_EMPTY_DEFAULT_CASE = 1 << 4;
        /// Drop empty cases when there is no default clause
        ///
        /// Reserved; no pass reads this bit yet.
        const REMOVE_EMPTY_CASE_WHEN_NO_DEFAULT = 1 << 5;
        /// Drop the trailing `break` of the last case
        const REMOVE_BREAK_FROM_LAST_CASE_BLOCK = 1 << 6;
        /// Drop an empty `finally` block
        const REMOVE_EMPTY_FINALLY = 1 << 7;
        /// Drop repeated `var` declarations without initializers
        ///
        /// Reserved; no pass reads this bit yet.
        const REMOVE_DUPLICATE_VAR = 1 << 8;
        /// Merge adjacent `var` statements
        const COMBINE_VAR_STATEMENTS = 1 << 9;
        /// Move a preceding `var` into a `for` initializer
        ///
        /// Reserved; no pass reads this bit yet.
        const MOVE_VAR_INTO_FOR = 1 << 10;
        /// `var a=x;return a` to `return x`
        ///
        /// Reserved; no pass reads this bit yet.
        const VAR_INITIALIZE_RETURN_TO_RETURN_INITIALIZER = 1 << 11;
        /// `if(a);` to `a`
        const IF_EMPTY_TO_EXPRESSION = 1 << 12;
        /// `if(a)b()` to `a&&b()`
        const IF_CONDITION_CALL_TO_CONDITION_AND_CALL = 1 << 13;
        /// `if(a)return b;else return c` to `return a?b:c`
        const IF_ELSE_RETURN_TO_RETURN_CONDITIONAL = 1 << 14;
        /// `if(a)return` at the end of a function to `a`
        ///
        /// Reserved; no pass reads this bit yet.
        const IF_CONDITION_RETURN_TO_CONDITION = 1 << 15;
        /// `if(a)b;else c` with an empty true branch to `if(!a)c`
        ///
        /// Reserved; no pass reads this bit yet.
        const IF_CONDITION_FALSE_TO_IF_NOT_CONDITION_TRUE = 1 << 16;
        /// `"a"+"b"` to `"ab"`
        const COMBINE_ADJACENT_STRING_LITERALS = 1 << 17;
        /// `+1` to `1`
        const REMOVE_UNARY_PLUS_ON_NUMERIC_LITERAL = 1 << 18;
        /// `-(1)` to the literal `-1`
        const APPLY_UNARY_MINUS_TO_NUMERIC_LITERAL = 1 << 19;
        /// Pick the shortest string delimiter
        ///
        /// Reserved; no pass reads this bit yet.
        const MINIFY_STRING_LITERALS = 1 << 20;
        /// Shortest numeric literal form
        const MINIFY_NUMERIC_LITERALS = 1 << 21;
        /// Drop unreferenced trailing parameters
        ///
        /// Reserved; no pass reads this bit yet.
        const REMOVE_UNUSED_PARAMETERS = 1 << 22;
        /// Remove debugger statements and debug lookups
        const STRIP_DEBUG_STATEMENTS = 1 << 23;
        /// Rename local fields
        const LOCAL_RENAMING = 1 << 24;
        /// Remove unreferenced function expression names
        const REMOVE_FUNCTION_EXPRESSION_NAMES = 1 << 25;
        /// Remove labels no statement refers to
        ///
        /// Reserved; no pass reads this bit yet.
        const REMOVE_UNNECESSARY_LABELS = 1 << 26;
        /// Emit `@cc_on` only once
        const REMOVE_UNNECESSARY_CC_ON_STATEMENTS = 1 << 27;
        /// `new Date().getTime()` to `+new Date`
        const DATE_GET_TIME_TO_UNARY_PLUS = 1 << 28;
        /// Fold constant numeric expressions
        const EVALUATE_NUMERIC_EXPRESSIONS = 1 << 29;
        /// `Number(x)` to `+x` where safe
        ///
        /// Reserved; no pass reads this bit yet.
        const SIMPLIFY_STRING_TO_NUMERIC_CONVERSION = 1 << 30;
        /// Apply manual rename pairs to property names
        const PROPERTY_RENAMING = 1 << 31;
        /// Honor `///#IFDEF` style directives
        const PREPROCESSOR_DEFINES = 1 << 32;
        /// `{"a":1}` to `{a:1}`
        const REMOVE_QUOTES_FROM_OBJECT_LITERAL_NAMES = 1 << 33;
        /// `true` to `!0`, `false` to `!1`
        const BOOLEAN_LITERALS_TO_NOT_OPERATORS = 1 << 34;
        /// `if(a)b;else c` with expression branches to `a?b:c`
        const IF_EXPRESSIONS_TO_EXPRESSION = 1 << 35;
        /// `a();b()` to `a(),b()`
        const COMBINE_ADJACENT_EXPRESSION_STATEMENTS = 1 << 36;
        /// `===` to `==` when both operand types are known and equal
        ///
        /// Reserved; no pass reads this bit yet.
        const REDUCE_STRICT_OPERATOR_IF_TYPES_ARE_SAME = 1 << 37;
        /// `===` to constant when both operand types are known and differ
        ///
        /// Reserved; no pass reads this bit yet.
        const REDUCE_STRICT_OPERATOR_IF_TYPES_ARE_DIFFERENT = 1 << 38;
        /// Hoist function declarations to the top of their scope
        ///
        /// Reserved; no pass reads this bit yet.
        const MOVE_FUNCTION_TO_TOP_OF_SCOPE = 1 << 39;
        /// Hoist `var` statements to the top of their scope
        ///
        /// Reserved; no pass reads this bit yet.
        const COMBINE_VAR_STATEMENTS_TO_TOP_OF_SCOPE = 1 << 40;
        /// `if(!a)b;else c` to `if(a)c;else b`
        ///
        /// Reserved; no pass reads this bit yet.
        const IF_NOT_TRUE_FALSE_TO_IF_FALSE_TRUE = 1 << 41;
        /// Move a preceding expression into a `for` initializer
        ///
        /// Reserved; no pass reads this bit yet.
        const MOVE_IN_EXPRESSIONS_INTO_FOR_STATEMENT = 1 << 42;
        /// `if(a){...;return}` to `if(!a)...`
        ///
        /// Reserved; no pass reads this bit yet.
        const INVERT_IF_RETURN = 1 << 43;
        /// `if(a)if(b)c` to `if(a&&b)c`
        ///
        /// Reserved; no pass reads this bit yet.
        const COMBINE_NESTED_IFS = 1 << 44;
        /// Merge equivalent `if` returns
        ///
        /// Reserved; no pass reads this bit yet.
        const COMBINE_EQUIVALENT_IF_RETURNS = 1 << 45;
        /// `while(a)` to `for(;a;)`
        ///
        /// Reserved; no pass reads this bit yet.
        const CHANGE_WHILE_TO_FOR = 1 << 46;
        /// `if(a){...;continue}` to `if(!a)...`
        ///
        /// Reserved; no pass reads this bit yet.
        const INVERT_IF_CONTINUE = 1 << 47;
    }
}

/// How calls to `eval` affect analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvalTreatment {
    /// Assume `eval` never touches local names
    #[default]
    Ignore,
    /// The scope containing the call is unknown at compile time
    MakeImmediateSafe,
    /// Every scope on the chain is unknown at compile time
    MakeAllSafe,
}

/// Which local fields may be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocalRenaming {
    /// Never rename
    KeepAll,
    /// Rename everything except names starting with `L_`
    KeepLocalizationVars,
    /// Rename every eligible local
    #[default]
    CrunchAll,
}

/// Shape of the emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Everything on as few lines as possible
    #[default]
    SingleLine,
    /// Indented, one statement per line
    MultipleLines,
    /// A single JSON value
    Json,
}

/// Grammar used for the top level of each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceMode {
    /// Classic script
    #[default]
    Script,
    /// ES module with its own module scope
    Module,
}

/// All options the pipeline honors.
///
/// # Examples
///
/// ```
/// use parser::settings::{CodeSettings, TreeModifications};
///
/// let mut settings = CodeSettings::default();
/// settings.set_rename_pairs("jQuery=$,longName=n").unwrap();
/// assert_eq!(settings.rename_target("longName"), Some("n"));
///
/// settings.kill_switch = TreeModifications::LOCAL_RENAMING;
/// assert!(!settings.is_modification_allowed(TreeModifications::LOCAL_RENAMING));
/// assert!(settings.set_rename_pairs("a=1b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSettings {
    /// Collapse `new Array()`/`new Object()` into literals
    pub collapse_to_literal: bool,
    /// Fold constant expressions
    pub eval_literal_expressions: bool,
    /// How `eval` calls affect renaming
    pub eval_treatment: EvalTreatment,
    /// Treat `/*@ ... @*/` as ordinary comments
    pub ignore_conditional_compilation: bool,
    /// Spaces per indent level in multi-line output
    pub indent_size: usize,
    /// Escape `</` inside string literals
    pub inline_safe_strings: bool,
    /// Disabled tree modifications
    #[serde(with = "kill_switch_bits")]
    pub kill_switch: TreeModifications,
    /// Which locals may be renamed
    pub local_renaming: LocalRenaming,
    /// Always terminate `throw` statements with a semicolon
    pub mac_safari_quirks: bool,
    /// Apply rename pairs to property names too
    pub manual_renames_properties: bool,
    /// Run the transform passes at all
    pub minify_code: bool,
    /// Output shape
    pub output_mode: OutputFormat,
    /// Never rename function names
    pub preserve_function_names: bool,
    /// Keep `/*! ... */` comments
    pub preserve_important_comments: bool,
    /// Drop names of function expressions nothing refers to
    pub remove_function_expression_names: bool,
    /// Remove unreachable and unreferenced code
    pub remove_unneeded_code: bool,
    /// Script or module grammar
    pub source_mode: SourceMode,
    /// Treat all code as strict
    pub strict_mode: bool,
    /// Remove debugger statements and debug-only calls
    pub strip_debug_statements: bool,
    /// Always end the output with a semicolon
    pub term_semicolons: bool,
    /// Record output-to-source position mappings
    pub generate_source_map: bool,
    /// Highest warning severity a host should show
    pub warning_level: u8,
    /// Codes a host should not show as warnings
    pub ignore_errors: Vec<ErrorCode>,

    rename_pairs: BTreeMap<String, String>,
    no_auto_rename: BTreeSet<String>,
    known_global_names: BTreeSet<String>,
    debug_lookups: Vec<String>,
    preprocessor_defines: BTreeMap<String, String>,
    replacement_tokens: BTreeMap<String, String>,
    replacement_fallbacks: BTreeMap<String, String>,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            collapse_to_literal: true,
            eval_literal_expressions: true,
            eval_treatment: EvalTreatment::Ignore,
            ignore_conditional_compilation: false,
            indent_size: 4,
            inline_safe_strings: true,
            kill_switch: TreeModifications::empty(),
            local_renaming: LocalRenaming::CrunchAll,
            mac_safari_quirks: true,
            manual_renames_properties: true,
            minify_code: true,
            output_mode: OutputFormat::SingleLine,
            preserve_function_names: false,
            preserve_important_comments: true,
            remove_function_expression_names: true,
            remove_unneeded_code: true,
            source_mode: SourceMode::Script,
            strict_mode: false,
            strip_debug_statements: true,
            term_semicolons: false,
            generate_source_map: false,
            warning_level: 0,
            ignore_errors: Vec::new(),
            rename_pairs: BTreeMap::new(),
            no_auto_rename: ["$super".to_string()].into_iter().collect(),
            known_global_names: BTreeSet::new(),
            debug_lookups: ["Debug", "$Debug", "WAssert", "Msn.Debug", "Web.Debug"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preprocessor_defines: BTreeMap::new(),
            replacement_tokens: BTreeMap::new(),
            replacement_fallbacks: BTreeMap::new(),
        }
    }
}

impl CodeSettings {
    /// Deserializes settings from JSON and validates every list option.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let settings: CodeSettings = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the list options of settings built without the setters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (from, to) in &self.rename_pairs {
            check_identifier(from)?;
            check_identifier(to)?;
        }
        for name in self.no_auto_rename.iter().chain(&self.known_global_names) {
            check_identifier(name)?;
        }
        for lookup in &self.debug_lookups {
            check_member_chain(lookup)?;
        }
        Ok(())
    }

    /// Whether the kill switch leaves `modification` enabled.
    pub fn is_modification_allowed(&self, modification: TreeModifications) -> bool {
        !self.kill_switch.intersects(modification)
    }

    /// Whether local renaming will run.
    pub fn is_local_renaming_enabled(&self) -> bool {
        self.minify_code
            && self.local_renaming != LocalRenaming::KeepAll
            && self.is_modification_allowed(TreeModifications::LOCAL_RENAMING)
    }

    /// The severity filter described by `warning_level` and `ignore_errors`.
    pub fn diagnostic_filter(&self) -> DiagnosticFilter {
        let mut filter = DiagnosticFilter::new(self.warning_level);
        filter.ignored.extend(self.ignore_errors.iter().copied());
        filter
    }

    // ------------------------------------------------------------------
    // Rename pairs
    // ------------------------------------------------------------------

    /// Adds one manual rename. Both names must be identifiers.
    pub fn add_rename_pair(&mut self, from: &str, to: &str) -> Result<(), ConfigurationError> {
        check_identifier(from)?;
        check_identifier(to)?;
        if self.rename_pairs.contains_key(from) {
            return Err(ConfigurationError::DuplicateRename(from.to_string()));
        }
        self.rename_pairs.insert(from.to_string(), to.to_string());
        Ok(())
    }

    /// Replaces the rename pairs with a `old=new,old2=new2` list.
    ///
    /// Nothing is changed when any pair is invalid.
    pub fn set_rename_pairs(&mut self, pairs: &str) -> Result<(), ConfigurationError> {
        let mut parsed = BTreeMap::new();
        for pair in split_list(pairs) {
            let mut parts = pair.split('=');
            let (from, to) = match (parts.next(), parts.next(), parts.next()) {
                (Some(from), Some(to), None) => (from.trim(), to.trim()),
                _ => return Err(ConfigurationError::MalformedRenamePair(pair.to_string())),
            };
            check_identifier(from)?;
            check_identifier(to)?;
            if parsed.insert(from.to_string(), to.to_string()).is_some() {
                return Err(ConfigurationError::DuplicateRename(from.to_string()));
            }
        }
        self.rename_pairs = parsed;
        Ok(())
    }

    /// Manual rename target for `name`, if any.
    pub fn rename_target(&self, name: &str) -> Option<&str> {
        self.rename_pairs.get(name).map(String::as_str)
    }

    /// All manual rename pairs.
    pub fn rename_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rename_pairs.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    // ------------------------------------------------------------------
    // Name lists
    // ------------------------------------------------------------------

    /// Replaces the names that are never renamed automatically.
    pub fn set_no_auto_rename(&mut self, names: &str) -> Result<(), ConfigurationError> {
        self.no_auto_rename = parse_identifier_list(names)?;
        Ok(())
    }

    /// Whether `name` must keep its source spelling.
    pub fn is_no_auto_rename(&self, name: &str) -> bool {
        self.no_auto_rename.contains(name)
    }

    /// Replaces the allowlist of globals defined outside the compiled code.
    pub fn set_known_global_names(&mut self, names: &str) -> Result<(), ConfigurationError> {
        self.known_global_names = parse_identifier_list(names)?;
        Ok(())
    }

    /// Whether `name` is an allowlisted global.
    pub fn is_known_global(&self, name: &str) -> bool {
        self.known_global_names.contains(name)
    }

    /// Replaces the debug lookups. Entries may be dotted member chains.
    pub fn set_debug_lookups(&mut self, lookups: &str) -> Result<(), ConfigurationError> {
        let mut parsed: Vec<String> = Vec::new();
        for lookup in split_list(lookups) {
            check_member_chain(lookup)?;
            if !parsed.iter().any(|l| l == lookup) {
                parsed.push(lookup.to_string());
            }
        }
        self.debug_lookups = parsed;
        Ok(())
    }

    /// The configured debug lookups.
    pub fn debug_lookups(&self) -> &[String] {
        &self.debug_lookups
    }

    // ------------------------------------------------------------------
    // Preprocessor defines
    // ------------------------------------------------------------------

    /// Replaces the preprocessor defines with a `NAME,NAME=value` list.
    pub fn set_preprocessor_defines(&mut self, defines: &str) -> Result<(), ConfigurationError> {
        let mut parsed = BTreeMap::new();
        for define in split_list(defines) {
            let (name, value) = match define.split_once('=') {
                Some((name, value)) => (name.trim(), value.trim()),
                None => (define, ""),
            };
            if !is_valid_identifier(name) {
                return Err(ConfigurationError::InvalidDefine(define.to_string()));
            }
            parsed.insert(name.to_uppercase(), value.to_string());
        }
        self.preprocessor_defines = parsed;
        Ok(())
    }

    /// Whether `name` is defined (names are case-insensitive).
    pub fn is_defined(&self, name: &str) -> bool {
        self.preprocessor_defines.contains_key(&name.to_uppercase())
    }

    /// Names of all preprocessor defines, upper-cased.
    pub fn preprocessor_defines(&self) -> impl Iterator<Item = &str> {
        self.preprocessor_defines.keys().map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Replacement tokens
    // ------------------------------------------------------------------

    /// Adds a `%name%` replacement value. Names are case-insensitive.
    pub fn add_replacement_token(&mut self, name: &str, value: &str) {
        self.replacement_tokens
            .insert(name.to_lowercase(), value.to_string());
    }

    /// Adds a value for `%missing:fallback%` markers.
    pub fn add_replacement_fallback(&mut self, name: &str, value: &str) {
        self.replacement_fallbacks
            .insert(name.to_lowercase(), value.to_string());
    }

    /// Merges a flat JSON object of replacement values.
    ///
    /// String members are used verbatim; any other member is stored as its
    /// JSON text.
    pub fn set_replacement_tokens_json(&mut self, json: &str) -> Result<(), ConfigurationError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::InvalidReplacementTokens(e.to_string()))?;
        let object = value.as_object().ok_or_else(|| {
            ConfigurationError::InvalidReplacementTokens("expected a JSON object".to_string())
        })?;
        for (name, member) in object {
            let text = match member {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.add_replacement_token(name, &text);
        }
        Ok(())
    }

    /// Replacement value for `name`.
    pub fn replacement_token(&self, name: &str) -> Option<&str> {
        self.replacement_tokens
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    /// Fallback value for `name`.
    pub fn replacement_fallback(&self, name: &str) -> Option<&str> {
        self.replacement_fallbacks
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    /// Whether any replacement values or fallbacks are configured.
    pub fn has_replacements(&self) -> bool {
        !self.replacement_tokens.is_empty() || !self.replacement_fallbacks.is_empty()
    }
}

mod kill_switch_bits {
    use super::TreeModifications;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bits: &TreeModifications, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(bits.bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TreeModifications, D::Error> {
        u64::deserialize(d).map(TreeModifications::from_bits_retain)
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(&[',', ';'][..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn check_identifier(name: &str) -> Result<(), ConfigurationError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidIdentifier(name.to_string()))
    }
}

fn check_member_chain(chain: &str) -> Result<(), ConfigurationError> {
    if chain.split('.').all(is_valid_identifier) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidIdentifier(chain.to_string()))
    }
}

fn parse_identifier_list(list: &str) -> Result<BTreeSet<String>, ConfigurationError> {
    let mut names = BTreeSet::new();
    for name in split_list(list) {
        check_identifier(name)?;
        names.insert(name.to_string());
    }
    Ok(names)
}

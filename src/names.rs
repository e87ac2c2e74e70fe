//! Test-name parsing.
//!
//! Result files are named after the pytest id of the workload that produced
//! them, e.g.
//!
//! ```text
//! test_worst_opcode.py::test_worst_opcode[fork_Prague-benchmark-gas-value_1M-blockchain_test-opcode_ADD_WC_1000]
//! ```
//!
//! [`parse`] turns such an id into a [`ParsedTestName`] with a short file name
//! (`opcode_ADD_WC_1000.json`) and a display name (`Opcode: ADD_WC_1000`).
//! [`extract_op_count`] pulls the opcode and repetition count out of the same id.
//! Both are total: unrecognized input degrades to an opaque name, never an error.

use regex::Regex;
use std::sync::LazyLock;

/// Test file stem -> category label. First match wins.
const CATEGORY_PREFIXES: &[(&str, &str)] = &[
    ("test_worst_blocks.py", "blocks"),
    ("test_worst_bytecode.py", "bytecode"),
    ("test_worst_compute.py", "compute"),
    ("test_worst_memory.py", "memory"),
    ("test_worst_opcode.py", "opcode"),
    ("test_worst_stateful_opcodes.py", "stateful"),
];

const UNKNOWN_CATEGORY: &str = "unknown";

/// Exact parameter rewrites. Checked before any prefix rule.
const PARAM_REWRITES: &[(&str, &str)] = &[
    ("big_memory_expansion_True", "big_mem"),
    ("big_memory_expansion_False", "small_mem"),
    ("offset_initialized_True", "init_offset"),
    ("offset_initialized_False", "uninit_offset"),
    ("non_zero_data_True", "non_zero"),
    ("non_zero_data_False", "zero_data"),
    ("fixed_offset_True", "fixed"),
    ("fixed_offset_False", "dynamic"),
    ("zeros_topic", "zero_topic"),
    ("non_zero_topic", "non_zero_topic"),
    ("value_bearing_True", "with_value"),
    ("value_bearing_False", "no_value"),
    ("absent_target_True", "absent_target"),
    ("absent_target_False", "present_target"),
    ("fixed_src_dst_True", "fixed_src_dst"),
    ("fixed_src_dst_False", "dynamic_src_dst"),
    ("zero_byte_True", "zero_byte"),
    ("zero_byte_False", "non_zero_byte"),
];

/// `(prefix, replacement)`: the prefix is swapped for the replacement.
const PREFIX_RULES: &[(&str, &str)] = &[
    ("opcode_", ""),
    ("case_id_", ""),
    ("offset_", "off_"),
    ("size_", ""),
    ("data_", ""),
    ("value_", ""),
];

/// `(phrase, token)`: a parameter starting with the phrase becomes the token.
const PHRASE_RULES: &[(&str, &str)] = &[
    ("0 bytes", "0bytes"),
    ("100 bytes", "100bytes"),
    ("1 MiB", "1MiB"),
    ("0.25x max code size", "0.25x_max_code"),
    ("max code size", "max_code"),
    ("with value", "with_value"),
    ("without value", "without_value"),
    ("with non-zero data", "non_zero_data"),
    ("with zero data", "zero_data"),
];

/// Never a parameter delimiter, even though it contains hyphens.
const GAS_VALUE_MARKER: &str = "-gas-value";

// A parameter starts at `-` or `[` and may carry lowercase words such as
// `opcode_` or `precompile_` before the uppercase name.
static WORST_CASE_OP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-\[](?:[a-z][a-z0-9]*_)*([A-Z][A-Z0-9_]*)_WC_(\d+)\]")
        .expect("worst-case opcode pattern")
});

static REGULAR_OP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-\[](?:[a-z][a-z0-9]*_)*([A-Z][A-Z0-9_]*)_(\d+)\]").expect("opcode pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTestName {
    pub category: String,
    pub function: String,
    pub parameters: Vec<String>,
    pub simplified_name: String,
    pub display_name: String,
}

/// Opcode (or precompile) under test and how many times it is repeated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpCount {
    pub opcode: String,
    pub op_count: u64,
}

/// Chooses how raw test ids are presented in reports.
pub trait NameParser {
    fn parse(&self, raw: &str) -> ParsedTestName;

    fn display_name(&self, raw: &str) -> String {
        self.parse(raw).display_name
    }
}

/// Full structural parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredNames;

/// Leaves names untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNames;

impl NameParser for StructuredNames {
    fn parse(&self, raw: &str) -> ParsedTestName {
        parse(raw)
    }
}

impl NameParser for IdentityNames {
    fn parse(&self, raw: &str) -> ParsedTestName {
        ParsedTestName {
            category: UNKNOWN_CATEGORY.to_string(),
            function: raw.to_string(),
            parameters: Vec::new(),
            simplified_name: raw.to_string(),
            display_name: raw.to_string(),
        }
    }
}

/// Picks the parser once at startup.
pub fn name_parser(display_names: bool) -> Box<dyn NameParser> {
    if display_names {
        Box::new(StructuredNames)
    } else {
        Box::new(IdentityNames)
    }
}

pub fn parse(raw: &str) -> ParsedTestName {
    let name = raw.strip_suffix(".json").unwrap_or(raw);

    let Some((test_file, rest)) = name.split_once("::") else {
        return ParsedTestName {
            category: UNKNOWN_CATEGORY.to_string(),
            function: name.to_string(),
            parameters: Vec::new(),
            simplified_name: format!("{UNKNOWN_CATEGORY}_{}.json", clean_function(name)),
            display_name: name.to_string(),
        };
    };

    let (function, parameters) = match (rest.find('['), rest.rfind(']')) {
        (Some(open), Some(close)) if open < close => {
            (&rest[..open], split_parameters(&rest[open + 1..close]))
        }
        _ => (rest, Vec::new()),
    };

    let category = category_for(test_file);
    let simplified: Vec<String> = parameters
        .iter()
        .filter_map(|p| simplify_parameter(p))
        .collect();
    let function_clean = clean_function(function);

    let (simplified_name, display_name) = if simplified.is_empty() {
        (
            format!("{category}_{function_clean}.json"),
            format!("{}: {function_clean}", title_case(category)),
        )
    } else {
        (
            format!("{category}_{}.json", simplified.join("_")),
            format!("{}: {}", title_case(category), simplified.join(", ")),
        )
    };

    ParsedTestName {
        category: category.to_string(),
        function: function.to_string(),
        parameters,
        simplified_name,
        display_name,
    }
}

/// Category label for a test file part, `unknown` if the stem is not listed.
pub fn category_for(test_file: &str) -> &'static str {
    CATEGORY_PREFIXES
        .iter()
        .find(|(stem, _)| test_file.contains(stem))
        .map(|(_, category)| *category)
        .unwrap_or(UNKNOWN_CATEGORY)
}

/// Splits a bracketed parameter list on `-`, keeping `-gas-value` inside its token.
pub fn split_parameters(params: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut rest = params;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with(GAS_VALUE_MARKER) {
            current.push_str(GAS_VALUE_MARKER);
            rest = &rest[GAS_VALUE_MARKER.len()..];
            continue;
        }
        if c == '-' {
            push_token(&mut out, &current);
            current.clear();
        } else {
            current.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    push_token(&mut out, &current);
    out
}

fn push_token(out: &mut Vec<String>, token: &str) {
    let token = token.trim();
    if !token.is_empty() {
        out.push(token.to_string());
    }
}

fn is_boilerplate(param: &str) -> bool {
    param.starts_with("fork_")
        || param == "blockchain_test"
        || param.starts_with("blockchain_test_")
        || param == "benchmark"
        || param.starts_with("benchmark-gas-value")
}

/// Short form of one parameter, or `None` when it carries no information.
pub fn simplify_parameter(param: &str) -> Option<String> {
    if is_boilerplate(param) {
        return None;
    }

    if let Some((_, to)) = PARAM_REWRITES.iter().find(|(from, _)| *from == param) {
        return Some(to.to_string());
    }

    for (prefix, replacement) in PREFIX_RULES {
        if let Some(tail) = param.strip_prefix(prefix) {
            if tail.is_empty() {
                return None;
            }
            return Some(format!("{replacement}{tail}"));
        }
    }

    for (phrase, token) in PHRASE_RULES {
        if param.starts_with(phrase) {
            return Some(token.to_string());
        }
    }

    Some(param.to_string())
}

fn clean_function(function: &str) -> &str {
    let f = function.strip_prefix("test_worst_").unwrap_or(function);
    f.strip_prefix("test_").unwrap_or(f)
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Opcode and repetition count encoded at the end of a parameter list.
///
/// `...-ADD_WC_1000]` (worst-case family) yields `ADD_WC`/1000 and is tried
/// first; `...-ADD_1000]` yields `ADD`/1000. Underscores belong to the name,
/// so `-CALL_DATA_COPY_100]` is `CALL_DATA_COPY`, never `COPY`. `None` means
/// "not an opcode benchmark" and callers skip the record.
pub fn extract_op_count(raw: &str) -> Option<OpCount> {
    if let Some(caps) = WORST_CASE_OP.captures(raw) {
        let op_count = caps[2].parse().ok()?;
        return Some(OpCount {
            opcode: format!("{}_WC", &caps[1]),
            op_count,
        });
    }

    let caps = REGULAR_OP.captures(raw)?;
    Some(OpCount {
        opcode: caps[1].to_string(),
        op_count: caps[2].parse().ok()?,
    })
}

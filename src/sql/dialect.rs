//! Statement preparation: rewrites statements written in the named-marker
//! (`@name`) dialect into PostgreSQL with positional `$n` placeholders.
//!
//! Besides placeholders, a few legacy constructs are rewritten so that
//! statements written for the older engine still run:
//!
//! | legacy                  | PostgreSQL            |
//! |-------------------------|-----------------------|
//! | `SELECT TOP(n) ...`     | `SELECT ... LIMIT n`  |
//! | `dbo.table`             | `table`               |
//! | `NVARCHAR(MAX)`         | `TEXT`                |
//! | `NVARCHAR(n)`           | `VARCHAR(n)`          |
//! | `DATETIME2`             | `TIMESTAMPTZ`         |
//! | `DECIMAL(p,s)`          | `NUMERIC(p,s)`        |
//! | `BIT`                   | `BOOLEAN`             |
//!
//! Placeholders are numbered by where each marker sits in the rewritten
//! text, never by the order inputs were declared. A marker used twice is
//! bound twice. Rewrites do not look inside string literals, so literal
//! text containing these words must be passed as a parameter instead.

use crate::sql::params::{NamedParams, QueryBuf};
use regex::{Captures, Regex};
use std::sync::OnceLock;

struct Rules {
    top: Regex,
    schema_prefix: Regex,
    nvarchar_max: Regex,
    nvarchar: Regex,
    datetime2: Regex,
    decimal: Regex,
    bit: Regex,
    marker: Regex,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        top: Regex::new(r"(?i)\bSELECT(\s+DISTINCT)?\s+TOP\s*(?:\(\s*(\d+)\s*\)|(\d+))\s*").expect("valid pattern"),
        schema_prefix: Regex::new(r"(?i)(?:\[dbo\]|\bdbo)\.").expect("valid pattern"),
        nvarchar_max: Regex::new(r"(?i)\bNVARCHAR\s*\(\s*MAX\s*\)").expect("valid pattern"),
        nvarchar: Regex::new(r"(?i)\bNVARCHAR\s*\(").expect("valid pattern"),
        datetime2: Regex::new(r"(?i)\bDATETIME2\b").expect("valid pattern"),
        decimal: Regex::new(r"(?i)\bDECIMAL\s*\(").expect("valid pattern"),
        bit: Regex::new(r"(?i)\bBIT\b").expect("valid pattern"),
        marker: Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)").expect("valid pattern"),
    })
}

/// Rewrite `sql` and pair every `@name` marker with its declared value.
///
/// Markers with no declared input are left untouched (PostgreSQL will then
/// reject the statement); inputs that are never referenced are not bound.
pub fn translate(sql: &str, params: &NamedParams) -> QueryBuf {
    let text = rewrite_clauses(sql);
    bind_markers(&text, params)
}

/// Apply the clause and type-name rewrites without touching markers.
pub fn rewrite_clauses(sql: &str) -> String {
    let r = rules();
    let text = rewrite_top(sql, &r.top);
    let text = r.schema_prefix.replace_all(&text, "");
    let text = r.nvarchar_max.replace_all(&text, "TEXT");
    let text = r.nvarchar.replace_all(&text, "VARCHAR(");
    let text = r.datetime2.replace_all(&text, "TIMESTAMPTZ");
    let text = r.decimal.replace_all(&text, "NUMERIC(");
    let text = r.bit.replace_all(&text, "BOOLEAN");
    text.into_owned()
}

/// `SELECT TOP(n) cols ...` becomes `SELECT cols ... LIMIT n`. Only the first
/// occurrence is rewritten since a trailing LIMIT applies to the outer query.
fn rewrite_top(sql: &str, top: &Regex) -> String {
    let Some(caps) = top.captures(sql) else {
        return sql.to_string();
    };
    let Some(whole) = caps.get(0) else {
        return sql.to_string();
    };
    let limit = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
        .unwrap_or_default();
    let distinct = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

    let mut out = String::with_capacity(sql.len() + 12);
    out.push_str(&sql[..whole.start()]);
    out.push_str(&whole.as_str()[..6]);
    out.push_str(distinct);
    out.push(' ');
    out.push_str(&sql[whole.end()..]);

    let body = out.trim_end();
    let (body, terminator) = match body.strip_suffix(';') {
        Some(stripped) => (stripped.trim_end(), ";"),
        None => (body, ""),
    };
    format!("{} LIMIT {}{}", body, limit, terminator)
}

fn bind_markers(text: &str, params: &NamedParams) -> QueryBuf {
    let r = rules();
    let mut q = QueryBuf::default();
    let mut sql = String::with_capacity(text.len());
    let mut last = 0;
    // captures_iter yields matches left to right, so numbering follows text position.
    for caps in r.marker.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if is_escaped(text, whole.start()) {
            continue;
        }
        let Some(value) = params.get(name.as_str()) else {
            continue;
        };
        q.params.push(value.clone());
        sql.push_str(&text[last..whole.start()]);
        sql.push_str(&format!("${}", q.params.len()));
        last = whole.end();
    }
    sql.push_str(&text[last..]);
    q.sql = sql;
    q
}

/// `@@name` is a server variable, not a marker.
fn is_escaped(text: &str, start: usize) -> bool {
    start > 0 && text.as_bytes()[start - 1] == b'@'
}

/// Names of the markers in `sql`, in text order (duplicates included).
pub fn marker_names(sql: &str) -> Vec<String> {
    rules()
        .marker
        .captures_iter(sql)
        .filter(|caps| caps.get(0).map_or(false, |m| !is_escaped(sql, m.start())))
        .filter_map(|caps: Captures<'_>| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! A small recursive-descent parser for the CLI-style filter grammar,
//! so a caller can build a [`crate::filter::FilterExpr`] from a
//! string instead of constructing the algebra by hand. This is a
//! supplementary module: the original grammar was
//! documented prose with no concrete parser.
//!
//! ```text
//! col=val            equal
//! col="val"          equal, literal string (quotes escape operator sigils)
//! col=val*           prefix
//! col=*val           suffix
//! col=*val*          contains
//! col=lt(x) | lte(x) | gt(x) | gte(x)     comparison
//! col=isNull() | isNotNull()
//! col["key"]=...     map-key-scoped filter
//! foo.bar=...        dotted path (quoted segments allow spaces)
//! ```
//!
//! Multiple clauses joined by commas parse into a single `Join::All` set.

use crate::errors::{ParquetError, Result};
use crate::filter::{ColumnFilter, FilterExpr, FilterValue, Join, Predicate};

/// One parsed, *unbound* clause: a dotted column path (joined back into a
/// single string — this crate addresses logical columns by their top-level
/// name only, see `record::reader::projected_names`), an optional map key,
/// and the predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFilter {
    pub column: String,
    pub map_key: Option<String>,
    pub predicate: Predicate,
}

/// A cursor over the remaining input, re-sliced rather than consumed
/// token-by-token so lookahead (checking for `lt(`/`lte(`/... prefixes) is
/// cheap and unambiguous.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Reads a quoted segment's contents (the opening quote must already
    /// have been consumed), allowing spaces; closing quote is consumed.
    fn read_quoted(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(ParquetError::General("unterminated quoted segment".to_owned())),
            }
        }
    }

    /// Reads an unquoted token up to (not including) any of `stop`.
    fn read_until(&mut self, stop: &[char]) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if stop.contains(&c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

/// Parses a dotted column path: a sequence of quoted or bare segments
/// joined by `.`, stopping at `=` or `[`.
fn parse_path(scanner: &mut Scanner) -> Result<String> {
    let mut segments = Vec::new();
    loop {
        scanner.skip_whitespace();
        let segment = if scanner.peek() == Some('"') {
            scanner.bump();
            scanner.read_quoted()?
        } else {
            scanner.read_until(&['.', '=', '['])
        };
        if segment.is_empty() {
            return Err(ParquetError::General("empty column path segment".to_owned()));
        }
        segments.push(segment);
        if scanner.peek() == Some('.') {
            scanner.bump();
            continue;
        }
        break;
    }
    Ok(segments.join("."))
}

fn parse_map_key(scanner: &mut Scanner) -> Result<Option<String>> {
    if scanner.peek() != Some('[') {
        return Ok(None);
    }
    scanner.bump();
    scanner.skip_whitespace();
    if scanner.bump() != Some('"') {
        return Err(ParquetError::General("map-key scope must be a quoted string".to_owned()));
    }
    let key = scanner.read_quoted()?;
    scanner.skip_whitespace();
    if scanner.bump() != Some(']') {
        return Err(ParquetError::General("unterminated map-key scope".to_owned()));
    }
    Ok(Some(key))
}

/// Reads a `(`-delimited call argument: a quoted string or a bare token,
/// type-inferred by [`parse_bare_value`].
fn parse_call_arg(scanner: &mut Scanner) -> Result<FilterValue> {
    if scanner.bump() != Some('(') {
        return Err(ParquetError::General("expected '('".to_owned()));
    }
    let arg = if scanner.peek() == Some('"') {
        scanner.bump();
        FilterValue::Str(scanner.read_quoted()?)
    } else {
        let token = scanner.read_until(&[')']);
        parse_bare_value(&token)
    };
    if scanner.bump() != Some(')') {
        return Err(ParquetError::General("expected ')'".to_owned()));
    }
    Ok(arg)
}

/// Infers a type for a bare (unquoted) value token: `true`/`false` as
/// `Bool`, an integer literal as `Long`, a `.`/exponent-bearing literal as
/// `Double`, otherwise a literal `Str`.
fn parse_bare_value(token: &str) -> FilterValue {
    match token {
        "true" => return FilterValue::Bool(true),
        "false" => return FilterValue::Bool(false),
        _ => {}
    }
    if let Ok(v) = token.parse::<i64>() {
        return FilterValue::Long(v);
    }
    if let Ok(v) = token.parse::<f64>() {
        return FilterValue::Double(v);
    }
    FilterValue::Str(token.to_owned())
}

fn parse_predicate(scanner: &mut Scanner) -> Result<Predicate> {
    scanner.skip_whitespace();

    // Function-call forms, checked by literal prefix so a bare numeric or
    // string value is never mistaken for a keyword.
    if scanner.starts_with("lte(") {
        scanner.advance(3);
        return Ok(Predicate::LessThanOrEqual(parse_call_arg(scanner)?));
    }
    if scanner.starts_with("lt(") {
        scanner.advance(2);
        return Ok(Predicate::LessThan(parse_call_arg(scanner)?));
    }
    if scanner.starts_with("gte(") {
        scanner.advance(3);
        return Ok(Predicate::GreaterThanOrEqual(parse_call_arg(scanner)?));
    }
    if scanner.starts_with("gt(") {
        scanner.advance(2);
        return Ok(Predicate::GreaterThan(parse_call_arg(scanner)?));
    }
    if scanner.starts_with("isNotNull(") {
        scanner.advance("isNotNull".len());
        if scanner.bump() != Some('(') || scanner.bump() != Some(')') {
            return Err(ParquetError::General("expected isNotNull()".to_owned()));
        }
        return Ok(Predicate::IsNotNull);
    }
    if scanner.starts_with("isNull(") {
        scanner.advance("isNull".len());
        if scanner.bump() != Some('(') || scanner.bump() != Some(')') {
            return Err(ParquetError::General("expected isNull()".to_owned()));
        }
        return Ok(Predicate::IsNull);
    }

    // Literal forms: optional leading/trailing `*`, a quoted string, or a
    // bare token.
    let leading_star = scanner.peek() == Some('*');
    if leading_star {
        scanner.bump();
    }
    let literal = if scanner.peek() == Some('"') {
        scanner.bump();
        FilterValue::Str(scanner.read_quoted()?)
    } else {
        let token = scanner.read_until(&['*']);
        if leading_star {
            FilterValue::Str(token)
        } else {
            parse_bare_value(&token)
        }
    };
    let trailing_star = scanner.peek() == Some('*');
    if trailing_star {
        scanner.bump();
    }

    Ok(match (leading_star, trailing_star) {
        (true, true) => Predicate::Contains(literal),
        (true, false) => Predicate::Suffix(literal),
        (false, true) => Predicate::Prefix(literal),
        (false, false) => Predicate::Equal(literal),
    })
}

fn parse_clause(scanner: &mut Scanner) -> Result<ParsedFilter> {
    let column = parse_path(scanner)?;
    let map_key = parse_map_key(scanner)?;
    scanner.skip_whitespace();
    if scanner.bump() != Some('=') {
        return Err(ParquetError::General(format!("expected '=' after column '{}'", column)));
    }
    let predicate = parse_predicate(scanner)?;
    Ok(ParsedFilter {
        column,
        map_key,
        predicate,
    })
}

/// Parses a single `col=predicate` clause.
pub fn parse(input: &str) -> Result<ParsedFilter> {
    let mut scanner = Scanner::new(input.trim());
    let parsed = parse_clause(&mut scanner)?;
    scanner.skip_whitespace();
    if scanner.peek().is_some() {
        return Err(ParquetError::General(format!(
            "unexpected trailing input after clause: '{}'",
            input
        )));
    }
    Ok(parsed)
}

/// Parses a comma-separated list of clauses into an ANDed [`FilterExpr`]
/// (unbound: `ColumnFilter`s are built directly from the path string, not
/// validated against a schema — use `ColumnFilters::create_filter` first if
/// validation is required).
pub fn parse_all(input: &str) -> Result<FilterExpr> {
    let children: Result<Vec<FilterExpr>> = input
        .split(',')
        .map(|clause| {
            parse(clause).map(|p| {
                FilterExpr::Predicate(ColumnFilter {
                    column: p.column,
                    map_key: p.map_key,
                    predicate: p.predicate,
                })
            })
        })
        .collect();
    Ok(FilterExpr::Set(Join::All, children?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_equal() {
        let p = parse("id=3").unwrap();
        assert_eq!(p.column, "id");
        assert_eq!(p.predicate, Predicate::Equal(FilterValue::Long(3)));
    }

    #[test]
    fn test_parse_quoted_equal() {
        let p = parse(r#"name="3""#).unwrap();
        assert_eq!(p.predicate, Predicate::Equal(FilterValue::Str("3".to_owned())));
    }

    #[test]
    fn test_parse_prefix_suffix_contains() {
        assert_eq!(
            parse("name=apple*").unwrap().predicate,
            Predicate::Prefix(FilterValue::Str("apple".to_owned()))
        );
        assert_eq!(
            parse("name=*mango").unwrap().predicate,
            Predicate::Suffix(FilterValue::Str("mango".to_owned()))
        );
        assert_eq!(
            parse("name=*banana*").unwrap().predicate,
            Predicate::Contains(FilterValue::Str("banana".to_owned()))
        );
    }

    #[test]
    fn test_parse_comparisons() {
        assert_eq!(parse("id=lt(3)").unwrap().predicate, Predicate::LessThan(FilterValue::Long(3)));
        assert_eq!(
            parse("id=lte(3)").unwrap().predicate,
            Predicate::LessThanOrEqual(FilterValue::Long(3))
        );
        assert_eq!(parse("id=gt(3)").unwrap().predicate, Predicate::GreaterThan(FilterValue::Long(3)));
        assert_eq!(
            parse("id=gte(3)").unwrap().predicate,
            Predicate::GreaterThanOrEqual(FilterValue::Long(3))
        );
    }

    #[test]
    fn test_parse_is_null() {
        assert_eq!(parse("id=isNull()").unwrap().predicate, Predicate::IsNull);
        assert_eq!(parse("id=isNotNull()").unwrap().predicate, Predicate::IsNotNull);
    }

    #[test]
    fn test_parse_map_key_scope() {
        let p = parse(r#"tags["en"]=lt(3)"#).unwrap();
        assert_eq!(p.column, "tags");
        assert_eq!(p.map_key, Some("en".to_owned()));
    }

    #[test]
    fn test_parse_dotted_path_with_quoted_segment() {
        let p = parse(r#""foo bar".baz=1"#).unwrap();
        assert_eq!(p.column, "foo bar.baz");
    }

    #[test]
    fn test_parse_all_ands_clauses() {
        let expr = parse_all("id=gte(3),id=lte(6)").unwrap();
        match expr {
            FilterExpr::Set(Join::All, children) => assert_eq!(children.len(), 2),
            _ => panic!("expected FilterExpr::Set(Join::All, _)"),
        }
    }
}

//! Statement splitting and the read-only guard

use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use super::error::{StoreError, StoreResult};

/// Split a block of SQL into individual statements on `;`
///
/// Terminators inside quoted strings, quoted identifiers and comments are not
/// split on. Fragments that are blank or contain only comments are dropped.
pub fn split_statements(block: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;

    let mut in_single = false;
    let mut in_double = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let mut chars = block.chars().peekable();
    while let Some(c) = chars.next() {
        if in_line_comment {
            current.push(c);
            if c == '\n' {
                in_line_comment = false;
            }
            continue;
        }
        if in_block_comment {
            current.push(c);
            if c == '*' && chars.peek() == Some(&'/') {
                current.push('/');
                chars.next();
                in_block_comment = false;
            }
            continue;
        }
        if in_single || in_double {
            current.push(c);
            if (in_single && c == '\'') || (in_double && c == '"') {
                in_single = false;
                in_double = false;
            }
            continue;
        }

        match c {
            ';' => {
                if has_code {
                    statements.push(current.trim().to_string());
                }
                current.clear();
                has_code = false;
            }
            '-' if chars.peek() == Some(&'-') => {
                current.push_str("--");
                chars.next();
                in_line_comment = true;
            }
            '/' if chars.peek() == Some(&'*') => {
                current.push_str("/*");
                chars.next();
                in_block_comment = true;
            }
            '\'' => {
                current.push(c);
                in_single = true;
                has_code = true;
            }
            '"' => {
                current.push(c);
                in_double = true;
                has_code = true;
            }
            _ => {
                if !c.is_whitespace() {
                    has_code = true;
                }
                current.push(c);
            }
        }
    }

    if has_code {
        statements.push(current.trim().to_string());
    }

    statements
}

/// Refuse statements that would modify data or schema
///
/// Statements the parser understands must be queries, or explains of queries.
/// `EXPLAIN ANALYZE` runs the wrapped statement, so the wrapped statement is
/// checked too. Statements the parser cannot understand are left for the
/// engine to judge.
pub fn ensure_read_only(statement: &str) -> StoreResult<()> {
    let parsed = match Parser::parse_sql(&DuckDbDialect {}, statement) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(error = %e, "Statement not understood by parser, deferring to engine");
            return Ok(());
        }
    };

    if parsed.iter().all(is_read_only) {
        Ok(())
    } else {
        Err(StoreError::NotReadOnly(leading_keyword(statement)))
    }
}

fn is_read_only(stmt: &Statement) -> bool {
    match stmt {
        Statement::Query(_) | Statement::ExplainTable { .. } => true,
        Statement::Explain { statement, .. } => is_read_only(statement),
        _ => false,
    }
}

fn leading_keyword(statement: &str) -> String {
    statement
        .split_whitespace()
        .find(|word| !word.starts_with("--"))
        .unwrap_or("statement")
        .to_uppercase()
}

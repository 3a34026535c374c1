//! Split a SQL script into individual statements.
//!
//! A `;` ends a statement unless it sits inside a quoted literal or identifier,
//! a comment, or a `$tag$ ... $tag$` body. Only ASCII bytes are delimiters, so
//! scanning bytes never lands inside a multi-byte character.

/// Statements in script order, trimmed, with leading comments removed.
/// Pieces that hold nothing but comments and whitespace are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let mut has_code = false;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                let escapes = i > 0
                    && matches!(bytes[i - 1], b'E' | b'e')
                    && (i < 2 || !is_ident_byte(bytes[i - 2]));
                has_code = true;
                i = skip_quoted(bytes, i + 1, b'\'', escapes);
            }
            b'"' => {
                has_code = true;
                i = skip_quoted(bytes, i + 1, b'"', false);
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = skip_line_comment(bytes, i + 2);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i + 2);
            }
            b'$' if i > 0 && is_ident_byte(bytes[i - 1]) => {
                // `$` inside an identifier such as `col$1`
                has_code = true;
                i += 1;
            }
            b'$' => {
                has_code = true;
                i = match dollar_tag_end(bytes, i) {
                    Some(tag_end) => {
                        let tag = &sql[i..=tag_end];
                        match sql[tag_end + 1..].find(tag) {
                            Some(pos) => tag_end + 1 + pos + tag.len(),
                            None => bytes.len(),
                        }
                    }
                    None => i + 1,
                };
            }
            b';' => {
                if has_code {
                    push_statement(&mut statements, &sql[start..i]);
                }
                has_code = false;
                i += 1;
                start = i;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                has_code = true;
                i += 1;
            }
        }
    }

    if has_code {
        push_statement(&mut statements, &sql[start..]);
    }
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = strip_leading_comments(raw).trim_end();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}

/// Drop whitespace and comments in front of the first token.
pub fn strip_leading_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.split_once('\n').map_or("", |(_, tail)| tail);
        } else if sql.starts_with("/*") {
            let end = skip_block_comment(sql.as_bytes(), 2);
            sql = &sql[end..];
        } else {
            return sql;
        }
    }
}

/// Index just past the closing quote. Doubled quotes are literal quotes.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8, backslash_escapes: bool) -> usize {
    while i < bytes.len() {
        let b = bytes[i];
        if backslash_escapes && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], i: usize) -> usize {
    bytes[i..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |pos| i + pos + 1)
}

/// Postgres block comments nest.
fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 1;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// For `$tag$` or `$$` starting at `start`, the index of the closing `$` of the
/// opening tag. Positional parameters such as `$1` are not tags.
fn dollar_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if bytes.get(j).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
        j += 1;
    }
    (bytes.get(j) == Some(&b'$')).then_some(j)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslash_escapes_only_in_e_strings() {
        // `DATE'..'` is a typed literal, so the trailing backslash is plain text
        let sql = r"SELECT DATE'2024-01-01\'; SELECT E'a\';b'; SELECT 3";
        assert_eq!(
            split_statements(sql),
            vec![
                r"SELECT DATE'2024-01-01\'",
                r"SELECT E'a\';b'",
                "SELECT 3",
            ]
        );
    }

    #[test]
    fn dollar_inside_identifier_is_not_a_tag() {
        let sql = "SELECT a$b$ FROM t; SELECT 2";
        assert_eq!(split_statements(sql), vec!["SELECT a$b$ FROM t", "SELECT 2"]);
    }

    #[test]
    fn splits_on_semicolons_and_drops_empty_pieces() {
        let sql = "INSERT INTO x VALUES (1);\n;\n  INSERT INTO x VALUES (2) ;;";
        assert_eq!(
            split_statements(sql),
            vec!["INSERT INTO x VALUES (1)", "INSERT INTO x VALUES (2)"]
        );
    }

    #[test]
    fn keeps_trailing_statement_without_semicolon() {
        assert_eq!(
            split_statements("SELECT 1; SELECT 2"),
            vec!["SELECT 1", "SELECT 2"]
        );
    }

    #[test]
    fn semicolons_inside_literals_do_not_split() {
        let sql = r#"INSERT INTO t VALUES ('a;b', 'it''s; fine', E'esc\'; still');
SELECT "odd;name" FROM t;"#;
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].ends_with("E'esc\\'; still')"));
        assert_eq!(stmts[1], r#"SELECT "odd;name" FROM t"#);
    }

    #[test]
    fn comments_do_not_split_and_comment_only_pieces_vanish() {
        let sql = "-- header; with semicolon\nCREATE TABLE a (id INT); /* block; /* nested; */ still */\n-- trailing;\n";
        assert_eq!(split_statements(sql), vec!["CREATE TABLE a (id INT)"]);
    }

    #[test]
    fn dollar_quoted_bodies_stay_whole() {
        let sql = "CREATE FUNCTION f() RETURNS TRIGGER AS $$\nBEGIN\n  NEW.x = 1;\n  RETURN NEW;\nEND;\n$$ LANGUAGE plpgsql;\nDO $body$ BEGIN PERFORM 1; END $body$;";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("RETURN NEW;\nEND;\n$$ LANGUAGE plpgsql"));
        assert_eq!(stmts[1], "DO $body$ BEGIN PERFORM 1; END $body$");
    }

    #[test]
    fn positional_parameters_are_not_dollar_quotes() {
        assert_eq!(
            split_statements("SELECT $1; SELECT $2"),
            vec!["SELECT $1", "SELECT $2"]
        );
    }

    #[test]
    fn bundled_schema_splits_into_each_object() {
        let stmts = split_statements(include_str!("../../sql/schema.sql"));
        let tables = stmts
            .iter()
            .filter(|s| s.starts_with("CREATE TABLE"))
            .count();
        assert_eq!(tables, 11);
        assert_eq!(stmts.len(), 18);
        assert!(stmts.iter().all(|s| !s.starts_with("--")));
        assert!(
            stmts
                .iter()
                .any(|s| s.starts_with("CREATE OR REPLACE FUNCTION") && s.ends_with("LANGUAGE plpgsql"))
        );
    }

    #[test]
    fn leading_comment_stripping() {
        assert_eq!(strip_leading_comments("-- a\n/* b */  SELECT 1"), "SELECT 1");
        assert_eq!(strip_leading_comments("-- only"), "");
    }
}

use std::collections::BTreeSet;
use std::io::BufRead;

use ir::{GateKind, Lit, Problem, Quant, QuantBlk, QuantPrefix, Var};
use log::{debug, warn};

use crate::{Interest, LineCursor, ParseError};

/// Nesting limit for subformulas; deep but legal inputs grow the stack instead.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Added to every variable number read from the input.
    pub offset: isize,
    /// Variables forced to be free in the result.
    pub interest: BTreeSet<Var>,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            offset: 0,
            interest: BTreeSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_offset(mut self, offset: isize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_interest(mut self, interest: Interest) -> Self {
        self.offset = interest.offset;
        self.interest = interest.vars;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Parses a QPRO circuit into a [`Problem`].
///
/// Nothing is returned unless the whole input parsed; interest variables are
/// moved into a free block of the output gate's prefix.
pub fn parse_qpro<R: BufRead>(reader: R, options: &ParseOptions) -> Result<Problem, ParseError> {
    let mut cursor = LineCursor::new(reader)?;
    let last_input = read_header(&mut cursor, options.offset)?;
    debug!("QPRO header: last input variable {}", last_input);

    let mut parser = QproParser {
        cursor,
        options,
        problem: Problem::new(last_input),
        depth: 0,
        dropped: BTreeSet::new(),
    };
    let out = parser.read_subformula()?;
    let out = parser.gate_lit(out)?;
    parser.problem.set_output(out);

    while !parser.cursor.at_end() && parser.cursor.current().is_empty() {
        parser.cursor.advance()?;
    }
    if !parser.cursor.at_end() {
        warn!(
            "ignoring input after the formula, starting at line {}",
            parser.cursor.line()
        );
    }

    let mut problem = parser.problem;
    let removed = problem.extract_free_vars(&options.interest);
    let unbound: Vec<&Var> = options
        .interest
        .iter()
        .filter(|v| !parser.dropped.contains(v) && !removed.contains(v))
        .collect();
    if !unbound.is_empty() {
        warn!("interest variables not bound by any quantifier block: {:?}", unbound);
    }
    debug!(
        "parsed {} gates and {} prefixes, output gate {}",
        problem.num_gates(),
        problem.prefixes().len(),
        problem.output()
    );
    Ok(problem)
}

/// Skips leading comments and reads `QBF <n>`, which may be split over two lines.
fn read_header<R: BufRead>(cursor: &mut LineCursor<R>, offset: isize) -> Result<Var, ParseError> {
    while cursor.current().starts_with('c') {
        cursor.advance()?;
    }
    if !cursor.current().starts_with("QBF") {
        if cursor.at_end() {
            return Err(ParseError::end_of_input(cursor.line(), "'QBF'"));
        }
        return Err(ParseError::format(cursor.line(), "'QBF'", cursor.current()));
    }

    let mut header = cursor.current().to_string();
    if header == "QBF" {
        cursor.advance()?;
        header.push(' ');
        header.push_str(cursor.current());
    }
    let count = header["QBF".len()..].trim();
    if count.is_empty() && cursor.at_end() {
        return Err(ParseError::end_of_input(cursor.line(), "the number of variables"));
    }
    let num_vars: isize = count
        .parse()
        .map_err(|_| ParseError::format(cursor.line(), "an integer", count))?;
    let last = num_vars
        .checked_add(offset)
        .filter(|n| *n >= 0)
        .ok_or_else(|| ParseError::format(cursor.line(), "a non-negative variable count", count))?;
    cursor.advance()?;
    Ok(last as Var)
}

struct QproParser<'a, R: BufRead> {
    cursor: LineCursor<R>,
    options: &'a ParseOptions,
    problem: Problem,
    depth: usize,
    /// Interest variables left out of the quantifier blocks read so far.
    dropped: BTreeSet<Var>,
}

impl<'a, R: BufRead> QproParser<'a, R> {
    fn format_error(&self, expected: impl Into<String>) -> ParseError {
        ParseError::format(self.cursor.line(), expected, self.cursor.current())
    }

    /// A format error, or an end-of-input error if the source is exhausted.
    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        if self.cursor.at_end() {
            ParseError::end_of_input(self.cursor.line(), expected)
        } else {
            self.format_error(expected)
        }
    }

    /// A minted gate id as a positive literal; ids past `Lit::MAX` have no literal.
    fn gate_lit(&self, id: Var) -> Result<Lit, ParseError> {
        Lit::try_from(id).map_err(|_| {
            ParseError::format(self.cursor.line(), "a gate number that fits a literal", id.to_string())
        })
    }

    fn current_is(&self, marker: &str) -> bool {
        self.cursor.current().eq_ignore_ascii_case(marker)
    }

    /// Reads whitespace separated variable numbers and shifts them by the offset.
    fn read_vars(&self, text: &str) -> Result<Vec<Var>, ParseError> {
        text.split_whitespace()
            .map(|tok| {
                let raw: isize = tok
                    .parse()
                    .map_err(|_| ParseError::format(self.cursor.line(), "an integer", tok))?;
                raw.checked_add(self.options.offset)
                    .filter(|v| *v > 0)
                    .map(|v| v as Var)
                    .ok_or_else(|| {
                        ParseError::format(self.cursor.line(), "a positive variable number", tok)
                    })
            })
            .collect()
    }

    /// Returns the gate id the subformula at the cursor evaluates to.
    fn read_subformula(&mut self) -> Result<Var, ParseError> {
        if self.depth >= self.options.max_depth {
            return Err(ParseError::TooDeep {
                line: self.cursor.line(),
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
            if self.current_is("q") {
                self.read_quantified_block()
            } else if GateKind::from_marker(self.cursor.current()).is_some() {
                self.read_gate()
            } else {
                Err(self.unexpected("'c', 'd', or 'q'"))
            }
        });
        self.depth -= 1;
        result
    }

    fn read_quantified_block(&mut self) -> Result<Var, ParseError> {
        debug_assert!(self.current_is("q"));
        self.cursor.advance()?;
        let mut num_q = 1;
        let mut blocks = Vec::new();
        loop {
            if self.current_is("q") {
                self.cursor.advance()?;
                num_q += 1;
                continue;
            }
            let line = self.cursor.current().to_string();
            let quant = match line.chars().next() {
                Some(c) if c.eq_ignore_ascii_case(&'a') => Quant::Forall,
                Some(c) if c.eq_ignore_ascii_case(&'e') => Quant::Exists,
                _ => break,
            };
            let (dropped, vars): (Vec<Var>, Vec<Var>) = self
                .read_vars(&line[1..])?
                .into_iter()
                .partition(|v| self.options.interest.contains(v));
            self.dropped.extend(dropped);
            blocks.push(QuantBlk::new(quant, vars));
            self.cursor.advance()?;
        }

        if GateKind::from_marker(self.cursor.current()).is_none() {
            return Err(self.unexpected("one of ['a', 'e', 'c', 'd']"));
        }
        let gate = self.read_gate()?;

        for _ in 0..num_q {
            if !self.current_is("/q") {
                let found = if self.cursor.at_end() {
                    "end of input".to_string()
                } else {
                    self.cursor.current().to_string()
                };
                return Err(ParseError::format(self.cursor.line(), "'/q'", found));
            }
            self.cursor.advance()?;
        }
        debug!("prefix of {} blocks on gate {}", blocks.len(), gate);
        self.problem.push_prefix(QuantPrefix::new(gate, blocks));
        Ok(gate)
    }

    fn read_gate(&mut self) -> Result<Var, ParseError> {
        let kind = match GateKind::from_marker(self.cursor.current()) {
            Some(kind) => kind,
            None => return Err(self.unexpected("'c' or 'd'")),
        };
        self.cursor.advance()?;

        // positive literals, then negative literals
        let mut args: Vec<Lit> = Vec::new();
        for sign in [1, -1] {
            if self.cursor.at_end() {
                return Err(ParseError::end_of_input(self.cursor.line(), "a line of literals"));
            }
            let vars = self.read_vars(self.cursor.current())?;
            args.extend(vars.into_iter().map(|v| v as Lit * sign));
            self.cursor.advance()?;
        }

        loop {
            if self.cursor.current().starts_with('/') {
                if !self.current_is(kind.closer()) {
                    return Err(self.format_error(format!("'{}'", kind.closer())));
                }
                self.cursor.advance()?;
                break;
            }
            let sub = self.read_subformula()?;
            args.push(self.gate_lit(sub)?);
        }

        Ok(self.problem.add_gate(kind, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::Gate;

    fn parse(text: &str) -> Result<Problem, ParseError> {
        parse_qpro(text.as_bytes(), &ParseOptions::default())
    }

    #[test]
    fn single_quantified_and() {
        let prob = parse("QBF 3\nq\na 1 2\nc\n1 2\n\n/c\n/q\n").unwrap();
        assert_eq!(prob.last_input_var(), 3);
        assert_eq!(prob.last_gate_var(), 4);
        assert_eq!(prob.output(), 4);
        assert_eq!(
            prob.prefixes(),
            &[QuantPrefix::new(4, vec![QuantBlk::new(Quant::Forall, vec![1, 2])])]
        );
        assert_eq!(
            prob.gate(4),
            Some(&Gate { kind: GateKind::And, id: 4, args: vec![1, 2] })
        );
    }

    #[test]
    fn nested_gates_and_prefixes() {
        let text = "c a comment\n\
                    c another\n\
                    QBF\n\
                    4\n\
                    q\n\
                    e 1\n\
                    a 2\n\
                    d\n\
                    1\n\
                    2\n\
                    c\n\
                    3\n\
                    4\n\
                    /c\n\
                    q\n\
                    e 3 4\n\
                    c\n\
                    \n\
                    3\n\
                    /c\n\
                    /q\n\
                    /d\n\
                    /q\n";
        let prob = parse(text).unwrap();
        assert_eq!(prob.last_input_var(), 4);
        // inner and(3, -4) = 5, and(-3) = 6, or(...) = 7
        assert_eq!(prob.gate(5).unwrap().args, vec![3, -4]);
        assert_eq!(prob.gate(6).unwrap().args, vec![-3]);
        let root = prob.gate(7).unwrap();
        assert_eq!(root.kind, GateKind::Or);
        assert_eq!(root.args, vec![1, -2, 5, 6]);
        assert_eq!(prob.output(), 7);
        let anchors: Vec<Var> = prob.prefixes().iter().map(|p| p.gate).collect();
        assert_eq!(anchors, vec![6, 7]);
        assert_eq!(prob.prefixes()[1].blocks.len(), 2);
    }

    #[test]
    fn stacked_q_markers() {
        let text = "QBF 2\nq\ne 1\nQ\nA 2\nC\n1\n2\n/C\n/q\n/Q\n";
        let prob = parse(text).unwrap();
        assert_eq!(prob.prefixes()[0].blocks.len(), 2);
        assert_eq!(prob.gate(3).unwrap().args, vec![1, -2]);
    }

    #[test]
    fn offset_shifts_every_variable() {
        let opts = ParseOptions::default().with_offset(10);
        let prob = parse_qpro("QBF 2\nq\ne 1 2\nd\n1\n2\n/d\n/q\n".as_bytes(), &opts).unwrap();
        assert_eq!(prob.last_input_var(), 12);
        assert_eq!(prob.output(), 13);
        assert_eq!(prob.prefixes()[0].blocks[0].vars, vec![11, 12]);
        assert_eq!(prob.gate(13).unwrap().args, vec![11, -12]);
    }

    #[test]
    fn interest_vars_become_free() {
        let interest = Interest {
            vars: BTreeSet::from([12, 11]),
            offset: 10,
        };
        let opts = ParseOptions::default().with_interest(interest);
        let text = "QBF 3\nq\na 1 2\ne 3\nc\n1 2 3\n\n/c\n/q\n";
        let prob = parse_qpro(text.as_bytes(), &opts).unwrap();
        assert_eq!(
            prob.prefixes()[0].blocks,
            vec![
                QuantBlk::new(Quant::Free, vec![11, 12]),
                QuantBlk::new(Quant::Forall, vec![]),
                QuantBlk::new(Quant::Exists, vec![13]),
            ]
        );
    }

    #[test]
    fn interest_without_output_prefix() {
        let interest = Interest { vars: BTreeSet::from([1]), offset: 0 };
        let opts = ParseOptions::default().with_interest(interest);
        let text = "QBF 2\nc\n1\n\nq\ne 2\nd\n2\n\n/d\n/q\n/c\n";
        let prob = parse_qpro(text.as_bytes(), &opts).unwrap();
        assert_eq!(prob.output(), 4);
        let last = prob.prefixes().last().unwrap();
        assert_eq!(last, &QuantPrefix::new(4, vec![QuantBlk::new(Quant::Free, vec![1])]));
    }

    #[test]
    fn missing_q_closer() {
        let err = parse("QBF 2\nq\nq\na 1\nc\n1\n\n/c\n/q\n").unwrap_err();
        match err {
            ParseError::Format { line, expected, found } => {
                assert_eq!(line, 10);
                assert_eq!(expected, "'/q'");
                assert_eq!(found, "end of input");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_gate_closer() {
        let err = parse("QBF 1\nc\n1\n\n/d\n").unwrap_err();
        assert!(matches!(err, ParseError::Format { line: 5, .. }));
    }

    #[test]
    fn bad_header() {
        assert!(matches!(parse("c hi\nQBX 3\n"), Err(ParseError::Format { line: 2, .. })));
        assert!(matches!(parse("QBF three\n"), Err(ParseError::Format { line: 1, .. })));
        assert!(matches!(parse("c only comments\n"), Err(ParseError::EndOfInput { .. })));
    }

    #[test]
    fn non_positive_variables_are_rejected() {
        let opts = ParseOptions::default().with_offset(-2);
        let err = parse_qpro("QBF 3\nc\n1\n\n/c\n".as_bytes(), &opts).unwrap_err();
        match err {
            ParseError::Format { line, found, .. } => assert_eq!((line, found.as_str()), (3, "1")),
            other => panic!("unexpected error: {other}"),
        }

        let err = parse("QBF 2\nq\ne 0\nc\n\n\n/c\n/q\n").unwrap_err();
        assert!(matches!(err, ParseError::Format { line: 3, .. }));
        let err = parse("QBF 2\nd\n\n0\n/d\n").unwrap_err();
        assert!(matches!(err, ParseError::Format { line: 4, .. }));
    }

    #[test]
    fn negative_variable_count() {
        let opts = ParseOptions::default().with_offset(-5);
        let err = parse_qpro("QBF 1\nc\n1\n\n/c\n".as_bytes(), &opts).unwrap_err();
        assert!(matches!(err, ParseError::Format { line: 1, .. }));
        assert!(matches!(parse("QBF -1\n"), Err(ParseError::Format { line: 1, .. })));
    }

    #[test]
    fn gate_ids_past_the_literal_range() {
        let err = parse("QBF 9223372036854775807\nc\n1\n\n/c\n").unwrap_err();
        match err {
            ParseError::Format { found, .. } => assert_eq!(found, "9223372036854775808"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unexpected_subformula_marker() {
        let err = parse("QBF 1\nx\n").unwrap_err();
        match err {
            ParseError::Format { line, found, .. } => assert_eq!((line, found.as_str()), (2, "x")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn quantifier_followed_by_junk() {
        let err = parse("QBF 1\nq\ne 1\nz\n").unwrap_err();
        assert!(matches!(err, ParseError::Format { line: 4, .. }));
    }

    #[test]
    fn truncated_gate() {
        assert!(matches!(parse("QBF 1\nc\n1\n"), Err(ParseError::EndOfInput { .. })));
        assert!(matches!(parse("QBF 1\nc\n1\n\n"), Err(ParseError::EndOfInput { .. })));
    }

    #[test]
    fn non_integer_literal() {
        let err = parse("QBF 2\nc\n1 x\n\n/c\n").unwrap_err();
        assert!(matches!(err, ParseError::Format { line: 3, .. }));
    }

    #[test]
    fn depth_limit() {
        let mut text = String::from("QBF 1\n");
        for _ in 0..5 {
            text.push_str("c\n1\n\n");
        }
        for _ in 0..5 {
            text.push_str("/c\n");
        }
        let opts = ParseOptions::default().with_max_depth(4);
        let err = parse_qpro(text.as_bytes(), &opts).unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { limit: 4, .. }));

        let opts = ParseOptions::default().with_max_depth(5);
        let prob = parse_qpro(text.as_bytes(), &opts).unwrap();
        assert_eq!(prob.num_gates(), 5);
        assert_eq!(prob.output(), 6);
    }

    #[test]
    fn deep_nesting_grows_the_stack() {
        let depth = 5_000;
        let mut text = String::from("QBF 1\n");
        for _ in 0..depth {
            text.push_str("d\n1\n\n");
        }
        for _ in 0..depth {
            text.push_str("/d\n");
        }
        let prob = parse(&text).unwrap();
        assert_eq!(prob.num_gates(), depth);
        assert_eq!(prob.gate(2).unwrap().args, vec![1]);
        assert_eq!(prob.gate(3).unwrap().args, vec![1, 2]);
    }
}

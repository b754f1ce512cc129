use std::io::BufRead;

use indexmap::IndexMap;
use ir::{Gate, GateKind, Lit, Problem, Quant, QuantBlk, QuantPrefix, Var};
use log::debug;
use regex::Regex;

use crate::CqbfError;

struct Lines<R: BufRead> {
    inner: std::io::Lines<R>,
    line_num: usize,
}

impl<R: BufRead> Lines<R> {
    /// Next non-blank line, trimmed, with its 1-based line number.
    fn next_line(&mut self) -> Result<Option<(usize, String)>, CqbfError> {
        for line in self.inner.by_ref() {
            self.line_num += 1;
            let line = line?;
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Some((self.line_num, line.to_string())));
            }
        }
        Ok(None)
    }
}

fn parse_int<T: std::str::FromStr>(line: usize, tok: &str) -> Result<T, CqbfError> {
    tok.parse()
        .map_err(|_| CqbfError::format(line, format!("expected an integer, but found '{}'", tok)))
}

/// Reads a `Name <int>` header line; `None` if the line is not that parameter.
fn header_param(
    re: &Regex,
    entry: Option<&(usize, String)>,
    name: &str,
) -> Result<Option<Lit>, CqbfError> {
    let Some((line, text)) = entry else {
        return Ok(None);
    };
    match re.captures(text) {
        Some(cap) if &cap[1] == name => Ok(Some(parse_int(*line, &cap[2])?)),
        _ => Ok(None),
    }
}

fn expect_param<R: BufRead>(
    lines: &mut Lines<R>,
    re: &Regex,
    cur: &mut Option<(usize, String)>,
    name: &str,
) -> Result<Lit, CqbfError> {
    match header_param(re, cur.as_ref(), name)? {
        Some(value) => {
            *cur = lines.next_line()?;
            Ok(value)
        }
        None => Err(match cur {
            Some((line, text)) => {
                CqbfError::format(*line, format!("expected '{}', but found '{}'", name, text))
            }
            None => CqbfError::format(
                lines.line_num,
                format!("unexpected end of input, expected '{}'", name),
            ),
        }),
    }
}

/// Reads CQBF text back into a [`Problem`].
///
/// Prefix sections for the same gate are merged in the order they appear.
/// Every gate variable referenced by a gate or the output must be defined.
pub fn read_cqbf<R: BufRead>(reader: R) -> Result<Problem, CqbfError> {
    let param_re = Regex::new(r"^(\w+)\s+(-?\d+)$")?;
    let qopen_re = Regex::new(r"^<q\s+gate=(\d+)>$")?;
    let gate_re = Regex::new(r"^(\d+)\s*=\s*(\w+)\s*\((.*)\)$")?;

    let mut lines = Lines {
        inner: reader.lines(),
        line_num: 0,
    };
    let mut cur = lines.next_line()?;
    if matches!(&cur, Some((_, l)) if l == "CktQBF") {
        cur = lines.next_line()?;
    }

    let last_input = expect_param(&mut lines, &param_re, &mut cur, "LastInputVar")?;
    if header_param(&param_re, cur.as_ref(), "FirstGateVar")?.is_some() {
        cur = lines.next_line()?;
    }
    let last_gate = expect_param(&mut lines, &param_re, &mut cur, "LastGateVar")?;
    let output = expect_param(&mut lines, &param_re, &mut cur, "OutputGateLit")?;

    if last_input < 0 || last_gate < 0 {
        return Err(CqbfError::format(lines.line_num, "variable counts must not be negative"));
    }
    let mut prob = Problem::new(last_input as Var);
    prob.set_output(output);

    let mut quants: IndexMap<Var, Vec<QuantBlk>> = IndexMap::new();
    while let Some((line, text)) = &cur {
        if !text.starts_with('<') {
            break;
        }
        let cap = qopen_re.captures(text).ok_or_else(|| {
            CqbfError::format(*line, "expected a line beginning with \"<q gate=\" followed by a positive integer")
        })?;
        let gate: Var = parse_int(*line, &cap[1])?;
        if gate == 0 {
            return Err(CqbfError::format(*line, "gate number must be a positive integer"));
        }
        let blocks = quants.entry(gate).or_default();
        loop {
            let Some((line, text)) = lines.next_line()? else {
                return Err(CqbfError::format(lines.line_num, "unexpected end of input, expected '</q>'"));
            };
            if text == "</q>" {
                break;
            }
            let mut toks = text.split_whitespace();
            let quant = toks
                .next()
                .filter(|t| t.len() == 1)
                .and_then(|t| t.chars().next())
                .and_then(Quant::from_tag)
                .ok_or_else(|| {
                    CqbfError::format(line, format!("expected 'a' or 'e' or 'f', but found '{}'", text))
                })?;
            // Free variables need not be bound inputs.
            let vars = toks
                .map(|t| {
                    let v: Var = parse_int(line, t)?;
                    if v == 0 || (quant != Quant::Free && v > prob.last_input_var()) {
                        return Err(CqbfError::format(line, format!("variable {} is out of range", t)));
                    }
                    Ok(v)
                })
                .collect::<Result<Vec<Var>, CqbfError>>()?;
            blocks.push(QuantBlk::new(quant, vars));
        }
        cur = lines.next_line()?;
    }
    for (gate, blocks) in quants {
        prob.push_prefix(QuantPrefix::new(gate, blocks));
    }

    while let Some((line, text)) = cur {
        let cap = gate_re
            .captures(&text)
            .ok_or_else(|| CqbfError::format(line, format!("expected a gate definition, but found '{}'", text)))?;
        let id: Var = parse_int(line, &cap[1])?;
        if id == 0 {
            return Err(CqbfError::format(line, "gate number must be a positive integer"));
        }
        let kind = GateKind::from_name(&cap[2])
            .ok_or_else(|| CqbfError::format(line, format!("unrecognized operator name '{}'", &cap[2])))?;
        let args = cap[3]
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| parse_int::<Lit>(line, t))
            .collect::<Result<Vec<Lit>, CqbfError>>()?;
        prob.insert_gate(Gate { kind, id, args });
        cur = lines.next_line()?;
    }
    prob.set_last_gate_var(last_gate as Var);

    let missing = prob.missing_gates();
    if !missing.is_empty() {
        return Err(CqbfError::DanglingReference(missing));
    }
    debug!(
        "read {} gates and {} prefixes from CQBF",
        prob.num_gates(),
        prob.prefixes().len()
    );
    Ok(prob)
}

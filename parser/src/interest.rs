use std::collections::BTreeSet;
use std::io::BufRead;

use ir::Var;
use log::debug;

use crate::{LineCursor, ParseError};

const INTEREST_HEADER: &str = "Variables of interest:";
const INTEREST_END: i64 = -1;

/// Variables to be treated as free, with the offset the QPRO input is shifted by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interest {
    pub vars: BTreeSet<Var>,
    pub offset: isize,
}

/// Reads an interest file: the header line, one variable per line, then `-1`.
///
/// The numbers are stored as written; they already live in the shifted
/// variable space of the QPRO input.
pub fn read_interest<R: BufRead>(reader: R, offset: isize) -> Result<Interest, ParseError> {
    let mut cursor = LineCursor::new(reader)?;
    if cursor.current() != INTEREST_HEADER {
        return Err(ParseError::format(
            cursor.line(),
            format!("'{}'", INTEREST_HEADER),
            cursor.current(),
        ));
    }
    cursor.advance()?;

    let mut vars = BTreeSet::new();
    loop {
        if cursor.at_end() {
            return Err(ParseError::end_of_input(
                cursor.line(),
                "an interest variable or the '-1' terminator",
            ));
        }
        let value: i64 = cursor
            .current()
            .parse()
            .map_err(|_| ParseError::format(cursor.line(), "an integer", cursor.current()))?;
        if value == INTEREST_END {
            break;
        }
        if value <= 0 {
            return Err(ParseError::format(
                cursor.line(),
                "a positive variable number",
                cursor.current(),
            ));
        }
        vars.insert(value as Var);
        cursor.advance()?;
    }
    debug!("read {} interest variables", vars.len());
    Ok(Interest { vars, offset })
}

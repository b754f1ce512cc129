use std::collections::BTreeMap;
use std::fmt;

mod rewrite;

/// A variable number. Input variables and gate variables share one namespace.
pub type Var = usize;

/// A signed variable number; a negative literal is the negation of its variable.
pub type Lit = isize;

#[inline]
pub fn var_of(lit: Lit) -> Var {
    lit.unsigned_abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    And,
    Or,
}

impl GateKind {
    /// Maps a QPRO gate marker (`c` or `d`) to its gate kind.
    pub fn from_marker(marker: &str) -> Option<GateKind> {
        if marker.eq_ignore_ascii_case("c") {
            Some(GateKind::And)
        } else if marker.eq_ignore_ascii_case("d") {
            Some(GateKind::Or)
        } else {
            None
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            GateKind::And => "c",
            GateKind::Or => "d",
        }
    }

    /// The line that closes a gate of this kind in QPRO.
    pub fn closer(&self) -> &'static str {
        match self {
            GateKind::And => "/c",
            GateKind::Or => "/d",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::And => "and",
            GateKind::Or => "or",
        }
    }

    pub fn from_name(name: &str) -> Option<GateKind> {
        match name {
            "and" => Some(GateKind::And),
            "or" => Some(GateKind::Or),
            _ => None,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One node of the gate DAG. Arguments are input literals or (signed) gate ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    pub kind: GateKind,
    pub id: Var,
    pub args: Vec<Lit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quant {
    Forall,
    Exists,
    Free,
}

impl Quant {
    pub fn tag(&self) -> char {
        match self {
            Quant::Forall => 'a',
            Quant::Exists => 'e',
            Quant::Free => 'f',
        }
    }

    pub fn from_tag(tag: char) -> Option<Quant> {
        match tag.to_ascii_lowercase() {
            'a' => Some(Quant::Forall),
            'e' => Some(Quant::Exists),
            'f' => Some(Quant::Free),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantBlk {
    pub quant: Quant,
    pub vars: Vec<Var>,
}

impl QuantBlk {
    pub fn new(quant: Quant, vars: Vec<Var>) -> Self {
        QuantBlk { quant, vars }
    }
}

/// The quantifier blocks (outermost first) scoping over the subformula rooted at `gate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantPrefix {
    pub gate: Var,
    pub blocks: Vec<QuantBlk>,
}

impl QuantPrefix {
    pub fn new(gate: Var, blocks: Vec<QuantBlk>) -> Self {
        QuantPrefix { gate, blocks }
    }
}

/// A quantified circuit: the prefixes and the gate table keyed by gate id.
///
/// Gate ids are minted by [`Problem::add_gate`] one after another, starting right
/// after the last input variable, so the gate table iterates in mint order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    num_vars: Var,
    last_input_var: Var,
    output: Lit,
    prefixes: Vec<QuantPrefix>,
    gates: BTreeMap<Var, Gate>,
}

impl Problem {
    pub fn new(last_input_var: Var) -> Self {
        Problem {
            num_vars: last_input_var,
            last_input_var,
            output: 0,
            prefixes: Vec::new(),
            gates: BTreeMap::new(),
        }
    }

    pub fn last_input_var(&self) -> Var {
        self.last_input_var
    }

    /// The highest variable number in use, i.e. the last minted gate variable.
    pub fn last_gate_var(&self) -> Var {
        self.num_vars
    }

    pub fn output(&self) -> Lit {
        self.output
    }

    pub fn set_output(&mut self, output: Lit) {
        self.output = output;
    }

    pub fn prefixes(&self) -> &[QuantPrefix] {
        &self.prefixes
    }

    pub fn push_prefix(&mut self, prefix: QuantPrefix) {
        self.prefixes.push(prefix);
    }

    pub fn gate(&self, id: Var) -> Option<&Gate> {
        self.gates.get(&id)
    }

    /// Gates in ascending id order.
    pub fn gates(&self) -> impl DoubleEndedIterator<Item = &Gate> {
        self.gates.values()
    }

    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    #[inline]
    fn fresh(&mut self) -> Var {
        self.num_vars += 1;
        self.num_vars
    }

    /// Mints a new gate variable and stores the gate under it.
    pub fn add_gate(&mut self, kind: GateKind, args: Vec<Lit>) -> Var {
        let id = self.fresh();
        self.gates.insert(id, Gate { kind, id, args });
        id
    }

    /// Stores a gate whose id was fixed elsewhere (e.g. read back from CQBF).
    /// The variable counter is raised to cover the id.
    pub fn insert_gate(&mut self, gate: Gate) {
        self.num_vars = self.num_vars.max(gate.id);
        self.gates.insert(gate.id, gate);
    }

    /// Overrides the last gate variable, which may exceed the highest defined gate.
    pub fn set_last_gate_var(&mut self, last: Var) {
        self.num_vars = last.max(self.last_input_var);
    }

    pub fn is_input_var(&self, var: Var) -> bool {
        var <= self.last_input_var
    }

    /// Gate variables referenced by a gate argument or the output that have no definition.
    pub fn missing_gates(&self) -> Vec<Var> {
        let mut missing: Vec<Var> = self
            .gates
            .values()
            .flat_map(|g| g.args.iter())
            .chain(std::iter::once(&self.output))
            .map(|&lit| var_of(lit))
            .filter(|&v| !self.is_input_var(v) && !self.gates.contains_key(&v))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

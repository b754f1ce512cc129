use std::collections::BTreeSet;

use log::debug;

use crate::{Problem, Quant, QuantBlk, QuantPrefix, Var};

impl Problem {
    /// Turns the interest variables into free variables of the whole formula.
    ///
    /// The variables are dropped from every existing block, and a single `f` block
    /// holding them in ascending order is put in front of the prefix anchored at the
    /// output gate. If no prefix is anchored there, one is appended.
    ///
    /// Returns the interest variables that were removed from some block.
    pub fn extract_free_vars(&mut self, interest: &BTreeSet<Var>) -> BTreeSet<Var> {
        let mut bound: BTreeSet<Var> = BTreeSet::new();
        if interest.is_empty() {
            return bound;
        }

        for prefix in self.prefixes.iter_mut() {
            for blk in prefix.blocks.iter_mut() {
                blk.vars.retain(|v| {
                    if interest.contains(v) {
                        bound.insert(*v);
                        false
                    } else {
                        true
                    }
                });
            }
        }

        let free = QuantBlk::new(Quant::Free, interest.iter().copied().collect());
        let out_gate = crate::var_of(self.output);
        match self.prefixes.iter_mut().find(|p| p.gate == out_gate) {
            Some(prefix) => prefix.blocks.insert(0, free),
            None => {
                debug!("no prefix anchored at output gate {}, adding one", out_gate);
                self.prefixes.push(QuantPrefix::new(out_gate, vec![free]));
            }
        }
        bound
    }
}

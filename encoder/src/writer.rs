use std::io::Write;

use ir::{Gate, Problem, QuantBlk};

fn fmt_block(blk: &QuantBlk) -> String {
    let ids = blk
        .vars
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{} {}", blk.quant.tag(), ids)
}

fn fmt_gate(gate: &Gate) -> String {
    let args = gate
        .args
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} = {}({})", gate.id, gate.kind, args)
}

/// Renders a problem as CQBF.
///
/// Header first, then every prefix in the order it was added, then the gates
/// from the highest id down to the lowest.
pub fn to_cqbf_string(prob: &Problem) -> String {
    let mut lines: Vec<String> = vec![
        "CktQBF".into(),
        format!("LastInputVar {}", prob.last_input_var()),
        format!("LastGateVar {}", prob.last_gate_var()),
        format!("OutputGateLit {}", prob.output()),
    ];

    for pfx in prob.prefixes() {
        lines.push(format!("<q gate={}>", pfx.gate));
        lines.extend(pfx.blocks.iter().map(fmt_block));
        lines.push("</q>".into());
    }

    lines.extend(prob.gates().rev().map(fmt_gate));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn write_cqbf<W: Write>(prob: &Problem, out: &mut W) -> std::io::Result<()> {
    out.write_all(to_cqbf_string(prob).as_bytes())?;
    out.flush()
}

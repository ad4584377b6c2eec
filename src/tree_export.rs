use crate::ast::*;
use crate::issue::Issue;

fn escape(label: &str) -> String {
    match label {
        "<" | ">" => format!("${}$", label),
        _ => label.to_string(),
    }
}

fn node(label: &str, children: &[String]) -> String {
    format!("[{{{}}} {}]", escape(label), children.concat())
}

fn expr_node(expr: &Expr) -> String {
    match expr {
        Expr::Operand(operand) => node(&operand.to_string(), &[]),
        Expr::Binary { op, lhs, rhs } => {
            node(&op.to_string(), &[expr_node(lhs), expr_node(rhs)])
        }
    }
}

fn instruction_node(instruction: &Instruction) -> String {
    match instruction {
        Instruction::Assign { target, value } => {
            node(":=", &[node(target, &[]), expr_node(value)])
        }
        Instruction::If { condition, .. } | Instruction::While { condition, .. } => node(
            &condition.comparison.to_string(),
            &[expr_node(&condition.lhs), expr_node(&condition.rhs)],
        ),
        Instruction::Print { variable } | Instruction::Read { variable } => node(variable, &[]),
    }
}

/// A standalone LaTeX document drawing the first instruction of `program`
/// as a `forest` tree.
pub(crate) fn export_first_instruction(program: &Program) -> Result<String, Issue> {
    let instruction = program
        .instructions
        .first()
        .ok_or(Issue::NothingToExport)?;

    Ok(format!(
        "\\documentclass[border=5pt]{{standalone}}\n\n\
         \\usepackage{{tikz}}\n\
         \\usepackage{{forest}}\n\n\
         \\begin{{document}}\n\n\
         \\begin{{forest}}for tree={{rectangle, draw, l sep=20pt}}{};\n\
         \\end{{forest}}\n\n\
         \\end{{document}}\n\
         %% Local Variables:\n\
         %% TeX-engine: pdflatex\n\
         %% End:\n",
        instruction_node(instruction)
    ))
}

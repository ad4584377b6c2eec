use crate::ast::Program;
use crate::intermediate_code_generator::{render, CodegenContext};

pub(crate) const DEFAULT_RUNTIME: &str = include_str!("../assets/runtime.ll");

/// Lays out a whole module: the runtime, then `main` holding every
/// top-level instruction in program order. Variable storage is allocated
/// at the top of the entry block, ahead of any branch.
pub(crate) struct CodeEmitter<'a> {
    pub(crate) runtime: &'a str,
}

impl<'a> CodeEmitter<'a> {
    pub(crate) fn run(&self, program: &Program) -> String {
        let mut ctx = CodegenContext::hoisting();
        let body: Vec<String> = program
            .instructions
            .iter()
            .map(|instruction| instruction.generate_code(&mut ctx))
            .collect();
        let allocations = ctx.take_allocations();

        let mut res = String::new();
        res += self.runtime.trim();
        res += "\n\n";
        res += "define i32 @main() {\n";
        res += "entry_block:\n";
        if !allocations.is_empty() {
            res += &render(&allocations);
            res.push('\n');
        }
        for code in body {
            res += &code;
            res.push('\n');
        }
        res += "  ret i32 0\n";
        res += "}\n";
        res
    }
}

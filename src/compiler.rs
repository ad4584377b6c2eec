use crate::action_table::ActionTable;
use crate::ast::Program;
use crate::code_emitter::CodeEmitter;
use crate::grammar::Grammar;
use crate::issue::Issue;
use crate::parser::Parser;
use crate::simplifier::simplify_program;
use crate::tokenizer::Tokenizer;

pub(crate) struct Compilation {
    pub(crate) program: Program,
    /// Applied rules as 1-based rule numbers.
    pub(crate) derivation: String,
    pub(crate) ir: String,
}

/// Tokenizes, parses, simplifies and emits one source file at a time.
/// Runs are independent of each other.
pub(crate) struct Compiler<'a> {
    action_table: ActionTable<'a>,
    runtime: &'a str,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(grammar: &'a Grammar, runtime: &'a str) -> Result<Self, Issue> {
        Ok(Compiler {
            action_table: ActionTable::build(grammar)?,
            runtime,
        })
    }

    pub(crate) fn run(&self, source_code: &str) -> Result<Compilation, Issue> {
        let mut parser = Parser::new(&self.action_table, Tokenizer::new(source_code));
        let tree = parser.run()?;
        let program = simplify_program(&tree)?;
        let ir = CodeEmitter {
            runtime: self.runtime,
        }
        .run(&program);

        Ok(Compilation {
            program,
            derivation: parser.left_derivation(),
            ir,
        })
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::tokenizer::token::{Terminal, Token, TokenPos};

    const RUNTIME: &str = "declare void @println(i32)";

    fn compile(source_code: &str) -> Result<Compilation, String> {
        let grammar = Grammar::fortress().map_err(|err| err.to_string())?;
        let compiler = Compiler::new(&grammar, RUNTIME).map_err(|err| err.to_string())?;
        compiler.run(source_code).map_err(|err| err.to_string())
    }

    fn main_body(ir: &str) -> Result<&str, String> {
        let start = ir.find("entry_block:\n").ok_or("no entry block")? + "entry_block:\n".len();
        let end = ir.rfind("  ret i32 0\n").ok_or("no return")?;
        Ok(&ir[start..end])
    }

    #[test]
    fn test_arithmetic() -> Result<(), String> {
        let compilation = compile(indoc! {"
            BEGIN Arith
              x := 1 + 2,
              y := -x * (x - 3),
              PRINT(y),
            END
        "})?;

        assert_eq!(compilation.program.name, "Arith");
        assert_eq!(
            compilation.ir,
            indoc! {"
                declare void @println(i32)

                define i32 @main() {
                entry_block:
                  %x = alloca i32
                  %y = alloca i32
                  %0 = call i32 @assign(i32 1)
                  %1 = call i32 @assign(i32 2)
                  %2 = add i32 %0, %1
                  store i32 %2, i32* %x
                  %3 = load i32, i32* %x
                  %4 = sub i32 0, %3
                  %5 = load i32, i32* %x
                  %6 = call i32 @assign(i32 3)
                  %7 = sub i32 %5, %6
                  %8 = mul i32 %4, %7
                  store i32 %8, i32* %y
                  %9 = load i32, i32* %y
                  call void @println(i32 %9)
                  ret i32 0
                }
            "}
        );
        Ok(())
    }

    #[test]
    fn test_left_to_right_chain() -> Result<(), String> {
        let compilation = compile("BEGIN Chain x := 8 - 4 - 2, END")?;
        assert_eq!(
            main_body(&compilation.ir)?,
            concat!(
                "  %x = alloca i32\n",
                "  %0 = call i32 @assign(i32 8)\n",
                "  %1 = call i32 @assign(i32 -4)\n",
                "  %2 = call i32 @assign(i32 2)\n",
                "  %3 = sub i32 %1, %2\n",
                "  %4 = add i32 %0, %3\n",
                "  store i32 %4, i32* %x\n",
            )
        );
        Ok(())
    }

    #[test]
    fn test_if_else() -> Result<(), String> {
        let compilation = compile(indoc! {"
            BEGIN Sign
              READ(n),
              IF (n > 0) THEN PRINT(n), ELSE n := 0, END,
            END
        "})?;
        assert_eq!(
            main_body(&compilation.ir)?,
            indoc! {"
                  %n = alloca i32
                  %0 = call i32 @readInt()
                  store i32 %0, i32* %n
                  %1 = load i32, i32* %n
                  %2 = call i32 @assign(i32 0)
                  %cond_0 = icmp sgt i32 %1, %2
                  br i1 %cond_0, label %then_0, label %else_0
                then_0:
                  %3 = load i32, i32* %n
                  call void @println(i32 %3)
                  br label %end_0
                else_0:
                  %4 = call i32 @assign(i32 0)
                  store i32 %4, i32* %n
                  br label %end_0
                end_0:
            "}
        );
        Ok(())
    }

    #[test]
    fn test_storage_allocated_before_branches() -> Result<(), String> {
        let compilation = compile(indoc! {"
            BEGIN Late
              IF (1 = 1) THEN y := 1, END,
              PRINT(y),
            END
        "})?;
        assert_eq!(
            main_body(&compilation.ir)?,
            indoc! {"
                  %y = alloca i32
                  %0 = call i32 @assign(i32 1)
                  %1 = call i32 @assign(i32 1)
                  %cond_0 = icmp eq i32 %0, %1
                  br i1 %cond_0, label %then_0, label %else_0
                then_0:
                  %2 = call i32 @assign(i32 1)
                  store i32 %2, i32* %y
                  br label %end_0
                else_0:
                  br label %end_0
                end_0:
                  %3 = load i32, i32* %y
                  call void @println(i32 %3)
            "}
        );
        Ok(())
    }

    #[test]
    fn test_nested_loops() -> Result<(), String> {
        let compilation = compile(indoc! {"
            BEGIN Euclid
              $ greatest common divisor
              READ(a),
              READ(b),
              WHILE (0 < b) DO
                c := b,
                WHILE (a > b - 1) DO a := a - b, END,
                b := a,
                a := c,
              END,
              !! a holds the
                 result !!
              PRINT(a),
            END
        "})?;

        let ir = &compilation.ir;
        for line in [
            "  br label %eval_cond_0",
            "eval_cond_0:",
            "  %cond_0 = icmp slt i32 %",
            "  br i1 %cond_0, label %do_0, label %end_0",
            "  br label %eval_cond_1",
            "  br i1 %cond_1, label %do_1, label %end_1",
            "end_1:",
            "end_0:",
        ] {
            assert!(ir.contains(line), "missing {:?} in\n{}", line, ir);
        }
        for variable in ["a", "b", "c"] {
            assert_eq!(
                ir.matches(&format!("%{} = alloca i32", variable)).count(),
                1,
                "{}",
                variable
            );
        }
        Ok(())
    }

    #[test]
    fn test_large_programs() -> Result<(), String> {
        let long = format!("BEGIN Long READ(a), {} END", "PRINT(a), ".repeat(50_000));
        let compilation = compile(&long)?;
        assert_eq!(compilation.program.instructions.len(), 50_001);
        assert_eq!(compilation.ir.matches("call void @println").count(), 50_000);

        let wide = format!("BEGIN Wide x := 1{}, END", " + 1".repeat(199));
        let compilation = compile(&wide)?;
        assert_eq!(compilation.ir.matches(" = add i32 ").count(), 199);
        Ok(())
    }

    #[test]
    fn test_derivation() -> Result<(), String> {
        let compilation = compile("BEGIN P READ(a), END")?;
        assert_eq!(compilation.derivation, "1 2 8 31 3");
        Ok(())
    }

    #[test]
    fn test_runs_are_independent() -> Result<(), String> {
        let grammar = Grammar::fortress().map_err(|err| err.to_string())?;
        let compiler = Compiler::new(&grammar, RUNTIME).map_err(|err| err.to_string())?;
        let source_code = "BEGIN P READ(a), IF (a = 1) THEN END, END";

        let first = compiler.run(source_code).map_err(|err| err.to_string())?;
        let second = compiler.run(source_code).map_err(|err| err.to_string())?;
        assert_eq!(first.ir, second.ir);
        assert!(second.ir.contains("%a = alloca i32"));
        assert!(second.ir.contains("%cond_0 = icmp eq"));
        Ok(())
    }

    #[test]
    fn test_missing_assignment_operator() -> Result<(), String> {
        let grammar = Grammar::fortress().map_err(|err| err.to_string())?;
        let compiler = Compiler::new(&grammar, RUNTIME).map_err(|err| err.to_string())?;
        let result = compiler.run("BEGIN P\n  x 1,\nEND").map(|_| ());
        assert_eq!(
            result,
            Err(Issue::TokenMismatch {
                expected: Terminal::Assign,
                found: Token {
                    terminal: Terminal::Number,
                    lexeme: "1".to_string(),
                    pos: TokenPos::from((2, 5)),
                },
            })
        );
        Ok(())
    }

    #[test]
    fn test_conflicting_grammar_is_rejected() -> Result<(), String> {
        let grammar = Grammar::from_description(indoc! {"
            <Program>;BEGIN;[ProgName];<Code>;END
            <Code>;<Instruction>;,;<Code>
            <Code>;E
            <Instruction>;<Print>
            <Instruction>;<Print>;<Print>
            <Print>;PRINT;(;[VarName];)
        "})
        .map_err(|err| err.to_string())?;
        assert!(matches!(
            Compiler::new(&grammar, RUNTIME).map(|_| ()),
            Err(Issue::GrammarConflict {
                nonterminal: crate::grammar::NonTerminal::Instruction,
                terminal: Terminal::Print,
                first: 3,
                second: 4,
            })
        ));
        Ok(())
    }
}

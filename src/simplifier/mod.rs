use crate::ast::*;
use crate::grammar::NonTerminal;
use crate::issue::Issue;
use crate::parser::parse_tree::*;
use crate::tokenizer::token::Terminal;
use expression::simplify_expression;

pub(crate) mod expression;

fn malformed(expected: &'static str, node: &ParseTree) -> Issue {
    Issue::MalformedTree {
        expected,
        found: node.label.to_string(),
    }
}

fn child<'a>(
    node: &'a ParseTree,
    nonterminal: NonTerminal,
    expected: &'static str,
) -> Result<&'a ParseTree, Issue> {
    node.child_of(nonterminal)
        .ok_or_else(|| malformed(expected, node))
}

fn name(node: &ParseTree, terminal: Terminal, expected: &'static str) -> Result<String, Issue> {
    node.token_of(terminal)
        .map(|token| token.lexeme.clone())
        .ok_or_else(|| malformed(expected, node))
}

/// Reads the program out of its concrete syntax tree, leaving out
/// punctuation and keywords.
pub(crate) fn simplify_program(tree: &ParseTree) -> Result<Program, Issue> {
    if tree.nonterminal() != Some(NonTerminal::Program) {
        return Err(malformed("<Program>", tree));
    }
    Ok(Program {
        name: name(tree, Terminal::ProgName, "a program name")?,
        instructions: simplify_code(child(tree, NonTerminal::Code, "<Code>")?)?,
    })
}

/// Flattens a right-recursive `<Code>` chain into a list.
fn simplify_code(code: &ParseTree) -> Result<Vec<Instruction>, Issue> {
    let mut instructions = vec![];
    let mut block = Some(code);
    while let Some(curr_block) = block {
        for instruction in curr_block.children_of(NonTerminal::Instruction) {
            instructions.push(simplify_instruction(instruction)?);
        }
        block = curr_block.child_of(NonTerminal::Code);
    }
    Ok(instructions)
}

fn simplify_instruction(instruction: &ParseTree) -> Result<Instruction, Issue> {
    let statement = instruction
        .children
        .first()
        .ok_or_else(|| malformed("an instruction", instruction))?;

    Ok(match statement.nonterminal() {
        Some(NonTerminal::Assign) => Instruction::Assign {
            target: name(statement, Terminal::VarName, "an assigned variable")?,
            value: simplify_expression(child(statement, NonTerminal::ExprArith, "<ExprArith>")?)?,
        },
        Some(NonTerminal::If) => {
            let else_branch = match child(statement, NonTerminal::IfSeq, "<IfSeq>")?
                .child_of(NonTerminal::Code)
            {
                Some(code) => simplify_code(code)?,
                None => vec![],
            };
            Instruction::If {
                condition: simplify_condition(child(statement, NonTerminal::Cond, "<Cond>")?)?,
                then_branch: simplify_code(child(statement, NonTerminal::Code, "<Code>")?)?,
                else_branch,
            }
        }
        Some(NonTerminal::While) => Instruction::While {
            condition: simplify_condition(child(statement, NonTerminal::Cond, "<Cond>")?)?,
            body: simplify_code(child(statement, NonTerminal::Code, "<Code>")?)?,
        },
        Some(NonTerminal::Print) => Instruction::Print {
            variable: name(statement, Terminal::VarName, "a printed variable")?,
        },
        Some(NonTerminal::Read) => Instruction::Read {
            variable: name(statement, Terminal::VarName, "a read variable")?,
        },
        _ => return Err(malformed("an assignment, IF, WHILE, PRINT or READ", statement)),
    })
}

fn simplify_condition(cond: &ParseTree) -> Result<Condition, Issue> {
    let mut operands = cond.children_of(NonTerminal::ExprArith);
    let (Some(lhs), Some(rhs)) = (operands.next(), operands.next()) else {
        return Err(malformed("two compared expressions", cond));
    };

    let comp = child(cond, NonTerminal::Comp, "<Comp>")?;
    let comparison = comp
        .children
        .iter()
        .filter_map(ParseTree::token)
        .find_map(|token| Comparison::from_terminal(token.terminal))
        .ok_or_else(|| malformed("a comparison operator", comp))?;

    Ok(Condition {
        lhs: simplify_expression(lhs)?,
        comparison,
        rhs: simplify_expression(rhs)?,
    })
}

use std::*;
use collections::HashSet;
use mem;
use fmt::{Display, Formatter};

use itertools::Itertools;

use crate::ast::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Label {
    Then(u64),
    Else(u64),
    End(u64),
    EvalCond(u64),
    Do(u64),
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Label::Then(id) => write!(f, "then_{}", id),
            Label::Else(id) => write!(f, "else_{}", id),
            Label::End(id) => write!(f, "end_{}", id),
            Label::EvalCond(id) => write!(f, "eval_cond_{}", id),
            Label::Do(id) => write!(f, "do_{}", id),
        }
    }
}

/// One IR instruction. Temporaries are numbered, variables keep their
/// source name.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum IntermRepr {
    LoadVariable { dest: u64, name: String },
    LoadConstant { dest: u64, value: i64 },
    BinOp { dest: u64, op: ArithOp, lhs: u64, rhs: u64 },
    InvertSign { dest: u64, src: u64 },
    Alloca(String),
    Store { src: u64, name: String },
    Print(u64),
    ReadInt(u64),
    Compare { block: u64, comparison: Comparison, lhs: u64, rhs: u64 },
    BranchIf { block: u64, on_true: Label, on_false: Label },
    Jump(Label),
    InternalLabel(Label),
}

impl Display for IntermRepr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use IntermRepr::*;
        match self {
            LoadVariable { dest, name } => write!(f, "%{} = load i32, i32* %{}", dest, name),
            LoadConstant { dest, value } => write!(f, "%{} = call i32 @assign(i32 {})", dest, value),
            BinOp { dest, op, lhs, rhs } => {
                let instruction = match op {
                    ArithOp::Add => "add",
                    ArithOp::Sub => "sub",
                    ArithOp::Mul => "mul",
                    ArithOp::Div => "sdiv",
                };
                write!(f, "%{} = {} i32 %{}, %{}", dest, instruction, lhs, rhs)
            }
            InvertSign { dest, src } => write!(f, "%{} = sub i32 0, %{}", dest, src),
            Alloca(name) => write!(f, "%{} = alloca i32", name),
            Store { src, name } => write!(f, "store i32 %{}, i32* %{}", src, name),
            Print(src) => write!(f, "call void @println(i32 %{})", src),
            ReadInt(dest) => write!(f, "%{} = call i32 @readInt()", dest),
            Compare {
                block,
                comparison,
                lhs,
                rhs,
            } => {
                let predicate = match comparison {
                    Comparison::Equal => "eq",
                    Comparison::Smaller => "slt",
                    Comparison::Greater => "sgt",
                };
                write!(f, "%cond_{} = icmp {} i32 %{}, %{}", block, predicate, lhs, rhs)
            }
            BranchIf {
                block,
                on_true,
                on_false,
            } => write!(
                f,
                "br i1 %cond_{}, label %{}, label %{}",
                block, on_true, on_false
            ),
            Jump(label) => write!(f, "br label %{}", label),
            InternalLabel(label) => write!(f, "{}:", label),
        }
    }
}

/// Numbering and allocation state shared by every instruction of one
/// compilation. Ids are never handed out twice.
///
/// A hoisting context keeps allocations out of the lowered code and hands
/// them over through [`CodegenContext::take_allocations`], so that they can
/// all be placed in the entry block.
#[derive(Debug, Default)]
pub(crate) struct CodegenContext {
    next_temp: u64,
    next_block: u64,
    allocated: HashSet<String>,
    hoisted: Option<Vec<String>>,
}

impl CodegenContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn hoisting() -> Self {
        CodegenContext {
            hoisted: Some(vec![]),
            ..Self::default()
        }
    }

    /// Allocations held back so far, in first-use order.
    pub(crate) fn take_allocations(&mut self) -> Vec<IntermRepr> {
        self.hoisted
            .as_mut()
            .map(mem::take)
            .unwrap_or_default()
            .into_iter()
            .map(IntermRepr::Alloca)
            .collect()
    }

    fn fresh_temp(&mut self) -> u64 {
        let temp = self.next_temp;
        self.next_temp += 1;
        temp
    }

    fn fresh_block(&mut self) -> u64 {
        let block = self.next_block;
        self.next_block += 1;
        block
    }

    /// Storage for `name`, unless it already has some.
    fn allocate(&mut self, name: &str) -> Option<IntermRepr> {
        if !self.allocated.insert(name.to_string()) {
            return None;
        }
        match &mut self.hoisted {
            Some(hoisted) => {
                hoisted.push(name.to_string());
                None
            }
            None => Some(IntermRepr::Alloca(name.to_string())),
        }
    }
}

/// Emits `expr` in post-order and returns the temporary holding its value.
fn process_expression(ctx: &mut CodegenContext, expr: &Expr, res: &mut Vec<IntermRepr>) -> u64 {
    use IntermRepr::*;
    match expr {
        Expr::Operand(Operand {
            value: Value::Constant(value),
            negated,
        }) => {
            let value = if *negated {
                -i64::from(*value)
            } else {
                i64::from(*value)
            };
            let dest = ctx.fresh_temp();
            res.push(LoadConstant { dest, value });
            dest
        }
        Expr::Operand(Operand {
            value: Value::Variable(name),
            negated,
        }) => {
            let loaded = ctx.fresh_temp();
            res.push(LoadVariable {
                dest: loaded,
                name: name.clone(),
            });
            if !negated {
                return loaded;
            }
            let dest = ctx.fresh_temp();
            res.push(InvertSign { dest, src: loaded });
            dest
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = process_expression(ctx, lhs, res);
            let rhs = process_expression(ctx, rhs, res);
            let dest = ctx.fresh_temp();
            res.push(BinOp {
                dest,
                op: *op,
                lhs,
                rhs,
            });
            dest
        }
    }
}

fn process_condition(
    ctx: &mut CodegenContext,
    condition: &Condition,
    block: u64,
    res: &mut Vec<IntermRepr>,
) {
    let lhs = process_expression(ctx, &condition.lhs, res);
    let rhs = process_expression(ctx, &condition.rhs, res);
    res.push(IntermRepr::Compare {
        block,
        comparison: condition.comparison,
        lhs,
        rhs,
    });
}

fn process_store(ctx: &mut CodegenContext, src: u64, name: &str, res: &mut Vec<IntermRepr>) {
    res.extend(ctx.allocate(name));
    res.push(IntermRepr::Store {
        src,
        name: name.to_string(),
    });
}

fn process_block(ctx: &mut CodegenContext, instructions: &[Instruction], res: &mut Vec<IntermRepr>) {
    for instruction in instructions {
        instruction.process(ctx, res);
    }
}

/// Labels start at the beginning of the line, everything else is indented.
pub(crate) fn render(code: &[IntermRepr]) -> String {
    code.iter()
        .map(|ir| match ir {
            IntermRepr::InternalLabel(_) => ir.to_string(),
            _ => format!("  {}", ir),
        })
        .join("\n")
}

impl Instruction {
    fn process(&self, ctx: &mut CodegenContext, res: &mut Vec<IntermRepr>) {
        use IntermRepr::*;
        match self {
            Instruction::Assign { target, value } => {
                let src = process_expression(ctx, value, res);
                process_store(ctx, src, target, res);
            }
            Instruction::Print { variable } => {
                let dest = ctx.fresh_temp();
                res.push(LoadVariable {
                    dest,
                    name: variable.clone(),
                });
                res.push(Print(dest));
            }
            Instruction::Read { variable } => {
                let dest = ctx.fresh_temp();
                res.push(ReadInt(dest));
                process_store(ctx, dest, variable, res);
            }
            Instruction::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let block = ctx.fresh_block();
                process_condition(ctx, condition, block, res);
                res.push(BranchIf {
                    block,
                    on_true: Label::Then(block),
                    on_false: Label::Else(block),
                });
                res.push(InternalLabel(Label::Then(block)));
                process_block(ctx, then_branch, res);
                res.push(Jump(Label::End(block)));
                res.push(InternalLabel(Label::Else(block)));
                process_block(ctx, else_branch, res);
                res.push(Jump(Label::End(block)));
                res.push(InternalLabel(Label::End(block)));
            }
            Instruction::While { condition, body } => {
                let block = ctx.fresh_block();
                res.push(Jump(Label::EvalCond(block)));
                res.push(InternalLabel(Label::EvalCond(block)));
                process_condition(ctx, condition, block, res);
                res.push(BranchIf {
                    block,
                    on_true: Label::Do(block),
                    on_false: Label::End(block),
                });
                res.push(InternalLabel(Label::Do(block)));
                process_block(ctx, body, res);
                res.push(Jump(Label::EvalCond(block)));
                res.push(InternalLabel(Label::End(block)));
            }
        }
    }

    /// The IR of this instruction, nested instructions included.
    pub(crate) fn lower(&self, ctx: &mut CodegenContext) -> Vec<IntermRepr> {
        let mut res = vec![];
        self.process(ctx, &mut res);
        res
    }

    pub(crate) fn generate_code(&self, ctx: &mut CodegenContext) -> String {
        render(&self.lower(ctx))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn var(name: &str) -> Expr {
        Expr::Operand(Operand {
            value: Value::Variable(name.to_string()),
            negated: false,
        })
    }

    fn constant(value: i32) -> Expr {
        Expr::Operand(Operand {
            value: Value::Constant(value),
            negated: false,
        })
    }

    fn assign(target: &str, value: Expr) -> Instruction {
        Instruction::Assign {
            target: target.to_string(),
            value,
        }
    }

    fn condition(lhs: Expr, comparison: Comparison, rhs: Expr) -> Condition {
        Condition {
            lhs,
            comparison,
            rhs,
        }
    }

    fn temps_defined(code: &[IntermRepr]) -> Vec<u64> {
        use IntermRepr::*;
        code.iter()
            .filter_map(|ir| match ir {
                LoadVariable { dest, .. }
                | LoadConstant { dest, .. }
                | BinOp { dest, .. }
                | InvertSign { dest, .. }
                | ReadInt(dest) => Some(*dest),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_assignment() {
        let mut ctx = CodegenContext::new();
        let instruction = assign("x", Expr::binary(ArithOp::Add, constant(1), constant(2)));
        assert_eq!(
            instruction.generate_code(&mut ctx),
            concat!(
                "  %0 = call i32 @assign(i32 1)\n",
                "  %1 = call i32 @assign(i32 2)\n",
                "  %2 = add i32 %0, %1\n",
                "  %x = alloca i32\n",
                "  store i32 %2, i32* %x",
            )
        );
    }

    #[test]
    fn test_negated_operands() {
        let mut ctx = CodegenContext::new();
        let value = Expr::binary(
            ArithOp::Div,
            Expr::Operand(Operand {
                value: Value::Variable("a".to_string()),
                negated: true,
            }),
            Expr::Operand(Operand {
                value: Value::Constant(4),
                negated: true,
            }),
        );
        assert_eq!(
            assign("b", value).generate_code(&mut ctx),
            concat!(
                "  %0 = load i32, i32* %a\n",
                "  %1 = sub i32 0, %0\n",
                "  %2 = call i32 @assign(i32 -4)\n",
                "  %3 = sdiv i32 %1, %2\n",
                "  %b = alloca i32\n",
                "  store i32 %3, i32* %b",
            )
        );
    }

    #[test]
    fn test_if_with_empty_else() {
        let mut ctx = CodegenContext::new();
        let instruction = Instruction::If {
            condition: condition(var("x"), Comparison::Greater, constant(0)),
            then_branch: vec![assign("y", constant(1))],
            else_branch: vec![],
        };
        assert_eq!(
            instruction.generate_code(&mut ctx),
            indoc! {"
                  %0 = load i32, i32* %x
                  %1 = call i32 @assign(i32 0)
                  %cond_0 = icmp sgt i32 %0, %1
                  br i1 %cond_0, label %then_0, label %else_0
                then_0:
                  %2 = call i32 @assign(i32 1)
                  %y = alloca i32
                  store i32 %2, i32* %y
                  br label %end_0
                else_0:
                  br label %end_0
                end_0:"}
        );
    }

    #[test]
    fn test_while() {
        let mut ctx = CodegenContext::new();
        let instruction = Instruction::While {
            condition: condition(var("i"), Comparison::Smaller, constant(10)),
            body: vec![
                Instruction::Print {
                    variable: "i".to_string(),
                },
                Instruction::Read {
                    variable: "i".to_string(),
                },
            ],
        };
        assert_eq!(
            instruction.generate_code(&mut ctx),
            indoc! {"
                  br label %eval_cond_0
                eval_cond_0:
                  %0 = load i32, i32* %i
                  %1 = call i32 @assign(i32 10)
                  %cond_0 = icmp slt i32 %0, %1
                  br i1 %cond_0, label %do_0, label %end_0
                do_0:
                  %2 = load i32, i32* %i
                  call void @println(i32 %2)
                  %3 = call i32 @readInt()
                  %i = alloca i32
                  store i32 %3, i32* %i
                  br label %eval_cond_0
                end_0:"}
        );
    }

    #[test]
    fn test_variable_allocated_once() {
        let mut ctx = CodegenContext::new();
        let instructions = vec![
            Instruction::Read {
                variable: "v".to_string(),
            },
            assign("v", var("v")),
            Instruction::While {
                condition: condition(var("v"), Comparison::Equal, constant(0)),
                body: vec![assign("v", constant(1)), assign("w", var("v"))],
            },
            assign("w", constant(2)),
        ];
        let code: Vec<IntermRepr> = instructions
            .iter()
            .flat_map(|instruction| instruction.lower(&mut ctx))
            .collect();

        let allocations: Vec<&IntermRepr> = code
            .iter()
            .filter(|ir| matches!(ir, IntermRepr::Alloca(_)))
            .collect();
        assert_eq!(
            allocations,
            vec![
                &IntermRepr::Alloca("v".to_string()),
                &IntermRepr::Alloca("w".to_string()),
            ]
        );
    }

    #[test]
    fn test_ids_are_fresh_across_nesting() {
        let mut ctx = CodegenContext::new();
        let inner_if = Instruction::If {
            condition: condition(var("a"), Comparison::Equal, var("b")),
            then_branch: vec![Instruction::Print {
                variable: "a".to_string(),
            }],
            else_branch: vec![Instruction::While {
                condition: condition(var("b"), Comparison::Smaller, constant(3)),
                body: vec![],
            }],
        };
        let instructions = vec![
            Instruction::While {
                condition: condition(var("a"), Comparison::Greater, constant(0)),
                body: vec![inner_if.clone(), inner_if],
            },
            Instruction::If {
                condition: condition(constant(1), Comparison::Equal, constant(1)),
                then_branch: vec![],
                else_branch: vec![],
            },
        ];
        let code: Vec<IntermRepr> = instructions
            .iter()
            .flat_map(|instruction| instruction.lower(&mut ctx))
            .collect();

        let temps = temps_defined(&code);
        assert_eq!(temps, (0..temps.len() as u64).collect::<Vec<_>>());

        let mut blocks: Vec<u64> = code
            .iter()
            .filter_map(|ir| match ir {
                IntermRepr::Compare { block, .. } => Some(*block),
                _ => None,
            })
            .collect();
        assert_eq!(blocks.len(), 6);
        blocks.sort();
        blocks.dedup();
        assert_eq!(blocks, vec![0, 1, 2, 3, 4, 5]);

        let labels: Vec<String> = code
            .iter()
            .filter(|ir| matches!(ir, IntermRepr::InternalLabel(_)))
            .map(|ir| ir.to_string())
            .collect();
        let mut unique_labels = labels.clone();
        unique_labels.sort();
        unique_labels.dedup();
        assert_eq!(labels.len(), unique_labels.len());
    }

    #[test]
    fn test_hoisting_context_holds_allocations_back() {
        let mut ctx = CodegenContext::hoisting();
        let instructions = vec![
            Instruction::While {
                condition: condition(var("k"), Comparison::Smaller, constant(3)),
                body: vec![assign("k", constant(1)), assign("j", var("k"))],
            },
            assign("k", constant(2)),
        ];
        let code: Vec<IntermRepr> = instructions
            .iter()
            .flat_map(|instruction| instruction.lower(&mut ctx))
            .collect();

        assert!(!code.iter().any(|ir| matches!(ir, IntermRepr::Alloca(_))));
        assert_eq!(
            ctx.take_allocations(),
            vec![
                IntermRepr::Alloca("k".to_string()),
                IntermRepr::Alloca("j".to_string()),
            ]
        );
        assert!(ctx.take_allocations().is_empty());
        assert!(CodegenContext::new().take_allocations().is_empty());
    }
}

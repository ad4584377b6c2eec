use std::*;
use process;

use anyhow::{Context, Result};

use crate::code_emitter::DEFAULT_RUNTIME;
use crate::compiler::Compiler;
use crate::config::Config;
use crate::grammar::Grammar;

mod action_table;
mod ast;
mod code_emitter;
mod compiler;
mod config;
mod grammar;
mod intermediate_code_generator;
mod issue;
mod parser;
mod simplifier;
mod tokenizer;
mod tree_export;

fn run(config: &Config) -> Result<()> {
    let source_code = fs::read_to_string(&config.input)
        .with_context(|| format!("cannot read the input file \"{}\"", config.input))?;
    let runtime = match &config.runtime {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("cannot read the runtime file \"{}\"", path))?,
        None => DEFAULT_RUNTIME.to_string(),
    };

    let grammar = match &config.grammar {
        Some(path) => Grammar::from_description(
            &fs::read_to_string(path)
                .with_context(|| format!("cannot read the grammar file \"{}\"", path))?,
        ),
        None => Grammar::fortress(),
    }
    .context("invalid grammar")?;
    let compiler = Compiler::new(&grammar, &runtime).context("cannot build the action table")?;
    let compilation = compiler
        .run(&source_code)
        .with_context(|| format!("cannot compile \"{}\"", config.input))?;

    if config.derivation {
        eprintln!("{}", compilation.derivation);
    }

    if let Some(tree_path) = &config.write_tree {
        let document = tree_export::export_first_instruction(&compilation.program)?;
        fs::write(tree_path, document)
            .with_context(|| format!("cannot write the tree file \"{}\"", tree_path))?;
    }

    print!("{}", compilation.ir);
    Ok(())
}

fn main() {
    let config = Config::try_parse().unwrap_or_else(|err| {
        eprintln!("Something went wrong parsing arguments: {:#}", err);
        process::exit(1);
    });

    if let Err(err) = run(&config) {
        eprintln!("{:#}", err);
        process::exit(1);
    }
}

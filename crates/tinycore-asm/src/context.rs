//! The assembly context: symbol table, section map, and the per-line
//! directive/instruction dispatcher that together implement pass 1. Pass 2
//! (symbol resolution and word emission) happens in [`compile`].

use crate::error::{AsmError, Result};
use crate::expr::Expression;
use crate::lexer::tokenize;
use crate::parser::{
    parse_dual_arg, parse_eq, parse_isub, parse_neg_pred, parse_neq, parse_pos_pred,
    parse_single_arg, parse_sub, parse_swap, parse_swapi,
};
use crate::section::{AsmInstruction, PseudoOpWord, Section};
use crate::symbol::SymbolTable;
use tinycore_isa::Opcode;

type InstParser = fn(Opcode, &[String]) -> Result<AsmInstruction>;

fn mnemonic_table(name: &str) -> Option<(Opcode, InstParser)> {
    Some(match name {
        "swap" => (Opcode::Swap, parse_swap as InstParser),
        "swapi" => (Opcode::Swap, parse_swapi as InstParser),
        "or" => (Opcode::Or, parse_dual_arg as InstParser),
        "and" => (Opcode::And, parse_dual_arg as InstParser),
        "xor" => (Opcode::Xor, parse_dual_arg as InstParser),
        "add" => (Opcode::Add, parse_dual_arg as InstParser),
        "sub" => (Opcode::Sub, parse_sub as InstParser),
        "isub" => (Opcode::Isub, parse_isub as InstParser),
        "mov" => (Opcode::Mov, parse_dual_arg as InstParser),
        "if_eq" => (Opcode::Eq, parse_eq as InstParser),
        "if_neq" => (Opcode::Eq, parse_neq as InstParser),
        "if_ltu" => (Opcode::Ltu, parse_pos_pred as InstParser),
        "if_geu" => (Opcode::Ltu, parse_neg_pred as InstParser),
        "if_lts" => (Opcode::Lts, parse_pos_pred as InstParser),
        "if_ges" => (Opcode::Lts, parse_neg_pred as InstParser),
        "if_les" => (Opcode::Les, parse_pos_pred as InstParser),
        "if_gts" => (Opcode::Les, parse_neg_pred as InstParser),
        "istat" => (Opcode::Istat, parse_single_arg as InstParser),
        "rol" => (Opcode::Rol, parse_single_arg as InstParser),
        "ror" => (Opcode::Ror, parse_single_arg as InstParser),
        _ => return None,
    })
}

/// Owns the symbol table and the ordered collection of sections being built
/// up across a `compile()` call.
#[derive(Default)]
pub struct AsmContext {
    /// The symbol table being built up across pass 1, then resolved in pass 2.
    pub symbol_table: SymbolTable,
    section_order: Vec<String>,
    sections: std::collections::HashMap<String, Section>,
    active: Option<String>,
}

impl AsmContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    fn set_active_section(&mut self, name: &str, org: Option<u32>) {
        if !self.has_section(name) {
            self.section_order.push(name.to_string());
            self.sections
                .insert(name.to_string(), Section::new(org.unwrap_or(0)));
        }
        if let Some(org) = org {
            self.sections.get_mut(name).unwrap().set_org(org);
        }
        self.active = Some(name.to_string());
    }

    fn active_section_mut(&mut self) -> Result<&mut Section> {
        let name = self.active.clone().ok_or(AsmError::SectionNotActive)?;
        Ok(self.sections.get_mut(&name).unwrap())
    }

    fn add_inst(&mut self, inst: AsmInstruction) -> Result<()> {
        self.active_section_mut()?.add(Box::new(inst))
    }

    fn current_org(&self) -> Result<u32> {
        let name = self.active.as_ref().ok_or(AsmError::SectionNotActive)?;
        Ok(self.sections[name].current_org())
    }

    fn parse_section_directive(&mut self, tokens: &[String]) -> Result<()> {
        let name = tokens
            .get(1)
            .ok_or_else(|| AsmError::Syntax(".section requires a name".to_string()))?;
        if tokens.len() > 2 {
            self.symbol_table.resolve_all()?;
            let org = Expression::new(&tokens[2..]).resolve(&self.symbol_table)?;
            let org = u32::try_from(org)
                .map_err(|_| AsmError::ValueOutOfRange(org))?;
            self.set_active_section(name, Some(org));
        } else if self.has_section(name) {
            self.set_active_section(name, None);
        } else {
            self.set_active_section(name, Some(0));
        }
        Ok(())
    }

    fn parse_def_directive(&mut self, tokens: &[String]) -> Result<()> {
        let name = tokens
            .get(1)
            .ok_or_else(|| AsmError::Syntax(".def requires a symbol name".to_string()))?;
        if tokens.get(2).map(String::as_str) != Some("=") {
            return Err(AsmError::Syntax(
                ".def needs an equal sign after the symbol name".to_string(),
            ));
        }
        if tokens.len() <= 3 {
            return Err(AsmError::Syntax(".def needs an expression after '='".to_string()));
        }
        self.symbol_table
            .define(name, Expression::new(&tokens[3..]))
    }

    fn parse_word_directive(&mut self, tokens: &[String]) -> Result<()> {
        let mut values = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for token in &tokens[1..] {
            if token == "," {
                values.push(if current.is_empty() {
                    Expression::constant(0)
                } else {
                    Expression::new(&current)
                });
                current.clear();
            } else {
                current.push(token.clone());
            }
        }
        if !current.is_empty() {
            values.push(Expression::new(&current));
        }
        self.active_section_mut()?.add(Box::new(PseudoOpWord { values }))
    }

    fn parse_label(&mut self, tokens: &[String]) -> Result<()> {
        let name = &tokens[0];
        let org = self.current_org()?;
        self.symbol_table
            .define(name, Expression::constant(i64::from(org)))
    }

    fn parse_line(&mut self, line: &str) -> Result<()> {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return Ok(());
        }
        let head = tokens[0].to_ascii_lowercase();
        if let Some((opcode, parse_fn)) = mnemonic_table(&head) {
            let inst = parse_fn(opcode, &tokens)?;
            return self.add_inst(inst);
        }
        match head.as_str() {
            ".section" => return self.parse_section_directive(&tokens),
            ".def" => return self.parse_def_directive(&tokens),
            ".word" => return self.parse_word_directive(&tokens),
            _ => {}
        }
        if tokens.get(1).map(String::as_str) == Some(":") {
            return self.parse_label(&tokens);
        }
        Err(AsmError::Syntax(format!("instruction '{}' is invalid", tokens[0])))
    }

    /// Run pass 1 over every line, then resolve symbols and lay out the
    /// final contiguous word image (pass 2).
    pub fn compile(mut self, source: &str) -> Result<(u32, Vec<u16>)> {
        for line in source.lines() {
            self.parse_line(line)?;
        }
        self.symbol_table.resolve_all()?;
        log::debug!("assembled {} section(s)", self.section_order.len());

        let mut section_images: Vec<(u32, Vec<Option<u16>>)> = Vec::new();
        for name in &self.section_order {
            let section = &self.sections[name];
            let words = section.machine_code(&self.symbol_table)?;
            section_images.push((section.base_addr(), words));
        }
        if section_images.is_empty() {
            return Ok((0, Vec::new()));
        }

        let start_addr = section_images.iter().map(|(base, _)| *base).min().unwrap();
        let end_addr = section_images
            .iter()
            .map(|(base, words)| base + words.len() as u32)
            .max()
            .unwrap();

        let mut image: Vec<Option<u16>> = vec![None; (end_addr - start_addr) as usize];
        for (base, words) in section_images {
            for (ofs, word) in words.into_iter().enumerate() {
                let index = (base + ofs as u32 - start_addr) as usize;
                if image[index].is_some() {
                    return Err(AsmError::OverlappingDefinition((base + ofs as u32) as u16));
                }
                image[index] = word;
            }
        }
        let words = image.into_iter().map(|w| w.unwrap_or(0)).collect();
        Ok((start_addr, words))
    }
}

//! Program text parsing.
//!
//! The grammar is the usual Push surface syntax: parentheses delimit lists,
//! integer literals and `true`/`false` are literals, and every other token
//! must name a registered instruction. The whole text is read as one
//! implicit top-level list.
//!
//! Parsing is iterative, with an explicit frame stack, so deeply nested
//! input cannot exhaust the call stack.

use crate::error::ParseError;
use crate::interpreter::InstructionSet;
use crate::program::{NodeId, NodeKind, Program, ProgramBuilder};

/// Deepest list nesting the parser accepts.
pub const MAX_NESTING: usize = 1024;

/// Parse `text` into a [`Program`], resolving names against `instructions`.
///
/// When `unwrap_single_list` is set and the top level holds exactly one
/// node, that node becomes the root rather than being wrapped again. A
/// lone list is the usual case; a lone atom is how a program whose root is
/// an atom prints. Either way `parse(&program.to_string())` reproduces
/// `program`.
///
/// # Errors
///
/// Returns a [`ParseError`] for empty input, unbalanced parentheses,
/// unknown instruction names, out-of-range integers, or nesting deeper
/// than [`MAX_NESTING`].
pub fn parse<C>(
    text: &str,
    instructions: &InstructionSet<C>,
    unwrap_single_list: bool,
) -> Result<Program, ParseError> {
    let spaced = text.replace('(', " ( ").replace(')', " ) ");
    let mut builder = ProgramBuilder::new();
    // frames[0] is the implicit top-level list.
    let mut frames: Vec<Vec<NodeId>> = vec![Vec::new()];
    let mut seen_token = false;

    for (index, token) in spaced.split_whitespace().enumerate() {
        seen_token = true;
        match token {
            "(" => {
                if frames.len() > MAX_NESTING {
                    return Err(ParseError::TooDeep { limit: MAX_NESTING });
                }
                frames.push(Vec::new());
            }
            ")" => {
                if frames.len() < 2 {
                    return Err(ParseError::UnexpectedClose { token: index });
                }
                let children = frames.pop().unwrap_or_default();
                let list = builder.list(children);
                if let Some(parent) = frames.last_mut() {
                    parent.push(list);
                }
            }
            atom => {
                let kind = classify(atom, instructions)?;
                let id = builder.atom(kind);
                if let Some(frame) = frames.last_mut() {
                    frame.push(id);
                }
            }
        }
    }

    if !seen_token {
        return Err(ParseError::Empty);
    }
    if frames.len() > 1 {
        return Err(ParseError::UnclosedList {
            open: frames.len().saturating_sub(1),
        });
    }

    let top = frames.pop().unwrap_or_default();
    if unwrap_single_list && let [only] = top.as_slice() {
        let root = *only;
        return Ok(builder.finish(root));
    }
    let root = builder.list(top);
    Ok(builder.finish(root))
}

/// Classify a non-parenthesis token.
fn classify<C>(token: &str, instructions: &InstructionSet<C>) -> Result<NodeKind, ParseError> {
    match token {
        "true" => return Ok(NodeKind::Boolean(true)),
        "false" => return Ok(NodeKind::Boolean(false)),
        _ => {}
    }
    if looks_numeric(token) {
        return token
            .parse::<i64>()
            .ok()
            .map(NodeKind::Integer)
            .ok_or_else(|| ParseError::InvalidInteger {
                token: token.to_owned(),
            });
    }
    instructions
        .lookup(token)
        .map(NodeKind::Instruction)
        .ok_or_else(|| ParseError::UnknownInstruction {
            name: token.to_owned(),
        })
}

/// Whether a token is meant as an integer literal: digits with an
/// optional leading sign.
fn looks_numeric(token: &str) -> bool {
    let digits = token
        .strip_prefix('-')
        .or_else(|| token.strip_prefix('+'))
        .unwrap_or(token);
    digits.chars().next().is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn vocab() -> InstructionSet<()> {
        let mut set = InstructionSet::standard();
        set.register("move", |_, _| {});
        set.register("consume", |_, _| {});
        set
    }

    #[test]
    fn parses_nested_lists() {
        let program = parse("( 1 move ( consume ) )", &vocab(), true).unwrap();
        assert_eq!(program.size(), 5);
        assert_eq!(program.to_string(), "( 1 move ( consume ) )");
    }

    #[test]
    fn top_level_is_implicit_list() {
        let program = parse("1 move", &vocab(), true).unwrap();
        assert_eq!(program.to_string(), "( 1 move )");
    }

    #[test]
    fn single_list_is_unwrapped_only_when_asked() {
        let unwrapped = parse("( move )", &vocab(), true).unwrap();
        assert_eq!(unwrapped.to_string(), "( move )");
        let wrapped = parse("( move )", &vocab(), false).unwrap();
        assert_eq!(wrapped.to_string(), "( ( move ) )");
    }

    #[test]
    fn single_atom_becomes_root_only_when_asked() {
        let program = parse("consume", &vocab(), true).unwrap();
        assert_eq!(program.size(), 1);
        assert_eq!(program.to_string(), "consume");
        let wrapped = parse("consume", &vocab(), false).unwrap();
        assert_eq!(wrapped.to_string(), "( consume )");
    }

    #[test]
    fn atom_root_round_trips() {
        let mut builder = ProgramBuilder::new();
        let root = builder.atom(NodeKind::Instruction("exec.pop"));
        let program = builder.finish(root);
        assert_eq!(program.to_string(), "exec.pop");

        let reloaded = parse(&program.to_string(), &vocab(), true).unwrap();
        assert_eq!(reloaded, program);
        assert_eq!(reloaded.size(), 1);
    }

    #[test]
    fn display_round_trips() {
        let text = "( ( 3 -2 ) true ( ) integer.+ ( ( exec.if ) false ) )";
        let program = parse(text, &vocab(), true).unwrap();
        assert_eq!(program.to_string(), text);
        assert_eq!(parse(&program.to_string(), &vocab(), true).unwrap(), program);
    }

    #[test]
    fn tolerates_missing_spaces() {
        let program = parse("(1(move))", &vocab(), true).unwrap();
        assert_eq!(program.to_string(), "( 1 ( move ) )");
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(parse("   ", &vocab(), true), Err(ParseError::Empty));
        assert_eq!(
            parse("( move", &vocab(), true),
            Err(ParseError::UnclosedList { open: 1 })
        );
        assert_eq!(
            parse("move )", &vocab(), true),
            Err(ParseError::UnexpectedClose { token: 1 })
        );
        assert_eq!(
            parse("( dance )", &vocab(), true),
            Err(ParseError::UnknownInstruction {
                name: "dance".to_owned()
            })
        );
        assert_eq!(
            parse("99999999999999999999", &vocab(), true),
            Err(ParseError::InvalidInteger {
                token: "99999999999999999999".to_owned()
            })
        );
        assert!(matches!(
            parse("12abc", &vocab(), true),
            Err(ParseError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let deep = "(".repeat(MAX_NESTING + 1);
        assert_eq!(
            parse(&deep, &vocab(), true),
            Err(ParseError::TooDeep { limit: MAX_NESTING })
        );
    }

    #[test]
    fn accepts_nesting_up_to_limit() {
        let depth = 200;
        let text = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
        let program = parse(&text, &vocab(), true).unwrap();
        assert_eq!(program.size(), depth);
    }
}

//! The context-free standard instruction vocabulary.
//!
//! Every instruction here only touches the [`Stacks`], so it can be
//! registered in an [`InstructionSet`] for any context type. Instructions
//! that lack arguments leave the stacks untouched. Integer arithmetic
//! wraps; division and remainder by zero are no-ops.

use crate::interpreter::{InstructionSet, Stacks};

/// Register the standard vocabulary into `set`.
pub fn register_standard<C>(set: &mut InstructionSet<C>) {
    set.register("integer.+", integer_add::<C>);
    set.register("integer.-", integer_sub::<C>);
    set.register("integer.*", integer_mul::<C>);
    set.register("integer./", integer_div::<C>);
    set.register("integer.%", integer_rem::<C>);
    set.register("integer.<", integer_lt::<C>);
    set.register("integer.>", integer_gt::<C>);
    set.register("integer.=", integer_eq::<C>);
    set.register("integer.dup", integer_dup::<C>);
    set.register("integer.pop", integer_pop::<C>);
    set.register("integer.swap", integer_swap::<C>);
    set.register("integer.flush", integer_flush::<C>);
    set.register("boolean.and", boolean_and::<C>);
    set.register("boolean.or", boolean_or::<C>);
    set.register("boolean.not", boolean_not::<C>);
    set.register("boolean.dup", boolean_dup::<C>);
    set.register("boolean.pop", boolean_pop::<C>);
    set.register("boolean.flush", boolean_flush::<C>);
    set.register("exec.if", exec_if::<C>);
    set.register("exec.dup", exec_dup::<C>);
    set.register("exec.pop", exec_pop::<C>);
}

// ---------------------------------------------------------------------------
// Integer
// ---------------------------------------------------------------------------

fn integer_add<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_integer(a.wrapping_add(b));
    }
}

fn integer_sub<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_integer(a.wrapping_sub(b));
    }
}

fn integer_mul<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_integer(a.wrapping_mul(b));
    }
}

fn integer_div<C>(stacks: &mut Stacks, _context: &mut C) {
    if stacks.integers().last() == Some(&0) {
        return;
    }
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_integer(a.checked_div(b).unwrap_or(a));
    }
}

fn integer_rem<C>(stacks: &mut Stacks, _context: &mut C) {
    if stacks.integers().last() == Some(&0) {
        return;
    }
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_integer(a.checked_rem(b).unwrap_or(0));
    }
}

fn integer_lt<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_boolean(a < b);
    }
}

fn integer_gt<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_boolean(a > b);
    }
}

fn integer_eq<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_boolean(a == b);
    }
}

fn integer_dup<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some(&top) = stacks.integers().last() {
        stacks.push_integer(top);
    }
}

fn integer_pop<C>(stacks: &mut Stacks, _context: &mut C) {
    let _ = stacks.pop_integer();
}

fn integer_swap<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_integer_pair() {
        stacks.push_integer(b);
        stacks.push_integer(a);
    }
}

fn integer_flush<C>(stacks: &mut Stacks, _context: &mut C) {
    stacks.flush_integers();
}

// ---------------------------------------------------------------------------
// Boolean
// ---------------------------------------------------------------------------

fn boolean_and<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_boolean_pair() {
        stacks.push_boolean(a && b);
    }
}

fn boolean_or<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some((a, b)) = stacks.pop_boolean_pair() {
        stacks.push_boolean(a || b);
    }
}

fn boolean_not<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some(value) = stacks.pop_boolean() {
        stacks.push_boolean(!value);
    }
}

fn boolean_dup<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some(&top) = stacks.booleans().last() {
        stacks.push_boolean(top);
    }
}

fn boolean_pop<C>(stacks: &mut Stacks, _context: &mut C) {
    let _ = stacks.pop_boolean();
}

fn boolean_flush<C>(stacks: &mut Stacks, _context: &mut C) {
    stacks.flush_booleans();
}

// ---------------------------------------------------------------------------
// Exec
// ---------------------------------------------------------------------------

/// Pop a boolean; keep the next exec item if true, the one after if false.
fn exec_if<C>(stacks: &mut Stacks, _context: &mut C) {
    if stacks.exec_len() < 2 || stacks.booleans().is_empty() {
        return;
    }
    let (Some(condition), Some(then_branch), Some(else_branch)) =
        (stacks.pop_boolean(), stacks.pop_exec(), stacks.pop_exec())
    else {
        return;
    };
    stacks.push_exec(if condition { then_branch } else { else_branch });
}

fn exec_dup<C>(stacks: &mut Stacks, _context: &mut C) {
    if let Some(top) = stacks.peek_exec() {
        stacks.push_exec(top);
    }
}

fn exec_pop<C>(stacks: &mut Stacks, _context: &mut C) {
    let _ = stacks.pop_exec();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use crate::interpreter::{InstructionSet, Interpreter, InterpreterOptions};

    fn run(text: &str) -> Interpreter<()> {
        let mut interp = Interpreter::new(
            InterpreterOptions::default(),
            Arc::new(InstructionSet::<()>::standard()),
        );
        let program = interp.parse(text).unwrap();
        interp.run(&program, &mut ());
        interp
    }

    #[test]
    fn arithmetic_uses_second_then_top() {
        assert_eq!(run("( 7 2 integer.- )").stacks().integers(), &[5]);
        assert_eq!(run("( 7 2 integer./ )").stacks().integers(), &[3]);
        assert_eq!(run("( 7 2 integer.% )").stacks().integers(), &[1]);
        assert_eq!(run("( 7 2 integer.* )").stacks().integers(), &[14]);
    }

    #[test]
    fn division_by_zero_is_noop() {
        assert_eq!(run("( 7 0 integer./ )").stacks().integers(), &[7, 0]);
        assert_eq!(run("( 7 0 integer.% )").stacks().integers(), &[7, 0]);
    }

    #[test]
    fn overflow_wraps() {
        let text = format!("( {} 1 integer.+ )", i64::MAX);
        assert_eq!(run(&text).stacks().integers(), &[i64::MIN]);
        let text = format!("( {} -1 integer./ )", i64::MIN);
        assert_eq!(run(&text).stacks().integers(), &[i64::MIN]);
    }

    #[test]
    fn underflow_leaves_stacks_alone() {
        assert_eq!(run("( 1 integer.+ )").stacks().integers(), &[1]);
        assert_eq!(run("( true boolean.and )").stacks().booleans(), &[true]);
        assert!(run("( integer.pop boolean.not )").stacks().integers().is_empty());
    }

    #[test]
    fn comparisons_push_booleans() {
        let interp = run("( 1 2 integer.< 1 2 integer.> 3 3 integer.= )");
        assert_eq!(interp.stacks().booleans(), &[true, false, true]);
        assert!(interp.stacks().integers().is_empty());
    }

    #[test]
    fn exec_if_selects_branch() {
        assert_eq!(run("( true exec.if 1 2 )").stacks().integers(), &[1]);
        assert_eq!(run("( false exec.if 1 2 )").stacks().integers(), &[2]);
    }

    #[test]
    fn exec_if_without_condition_runs_both() {
        assert_eq!(run("( exec.if 1 2 )").stacks().integers(), &[1, 2]);
    }

    #[test]
    fn swap_and_dup() {
        assert_eq!(run("( 1 2 integer.swap )").stacks().integers(), &[2, 1]);
        assert_eq!(run("( 4 integer.dup )").stacks().integers(), &[4, 4]);
    }

    #[test]
    fn flush_clears_one_stack() {
        let interp = run("( 1 2 true integer.flush 3 )");
        assert_eq!(interp.stacks().integers(), &[3]);
        assert_eq!(interp.stacks().booleans(), &[true]);
        let interp = run("( 1 true false boolean.flush )");
        assert_eq!(interp.stacks().integers(), &[1]);
        assert!(interp.stacks().booleans().is_empty());
    }
}

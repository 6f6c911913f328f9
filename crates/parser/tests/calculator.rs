//! File-driven calculator tests: each `tests/calculator/*.calc` input is
//! parsed and evaluated, and the output (or the formatted parse error) is
//! compared against the matching `.expected` file.

use std::path::Path;

use bumpalo::Bump;
use datatest_stable::harness;
use parser::{
    ch, choice, choice_of, format_errors, newline, one_or_more, parse, range, rule_ref, seq_of,
    term, zero_or_more, Grammar, Matched, RuleId,
};

/// Integer calculator with the usual precedence: `%`, `/`, and `*` bind
/// tighter than `+` and `-`; everything is left-associative; parentheses
/// group.
///
/// ```text
/// expr   = add_op | sub_op | mul
/// add_op = expr '+' expr
/// sub_op = expr '-' expr
/// mul    = mul_op | div_op | mod_op | val
/// mul_op = mul '*' mul
/// div_op = mul '/' mul
/// mod_op = mul '%' mul
/// val    = num | '(' expr ')'
/// num    = [0-9]+                    (terminal)
/// ```
fn calculator<'a>(g: &mut Grammar<'a, Vec<i64>>) -> (RuleId, RuleId) {
    let arena = g.arena();
    let ws = g.add(
        "ws",
        zero_or_more(
            arena,
            choice_of(
                arena,
                &[ch(' '), ch('\t'), newline(arena, ch('\n'))],
            ),
        ),
    );

    let num = g.add("num", term(arena, one_or_more(arena, range(arena, '0', '9'))));
    let expr = g.declare("expr");
    let mul = g.declare("mul");

    let val = g.add(
        "val",
        choice(
            arena,
            rule_ref(num),
            seq_of(arena, &[ch('('), rule_ref(expr), ch(')')]),
        ),
    );

    let mul_op = g.add("mul_op", seq_of(arena, &[rule_ref(mul), ch('*'), rule_ref(mul)]));
    let div_op = g.add("div_op", seq_of(arena, &[rule_ref(mul), ch('/'), rule_ref(mul)]));
    let mod_op = g.add("mod_op", seq_of(arena, &[rule_ref(mul), ch('%'), rule_ref(mul)]));
    g.define(
        mul,
        choice_of(
            arena,
            &[
                rule_ref(mul_op),
                rule_ref(div_op),
                rule_ref(mod_op),
                rule_ref(val),
            ],
        ),
    );

    let add_op = g.add("add_op", seq_of(arena, &[rule_ref(expr), ch('+'), rule_ref(expr)]));
    let sub_op = g.add("sub_op", seq_of(arena, &[rule_ref(expr), ch('-'), rule_ref(expr)]));
    g.define(
        expr,
        choice_of(
            arena,
            &[rule_ref(add_op), rule_ref(sub_op), rule_ref(mul)],
        ),
    );

    g.bind(num, |m: Matched<'_>, stack: &mut Vec<i64>| {
        stack.push(m.text.parse().expect("digits"));
    });
    for (rule, op) in [
        (add_op, '+'),
        (sub_op, '-'),
        (mul_op, '*'),
        (div_op, '/'),
        (mod_op, '%'),
    ] {
        g.bind(rule, move |_, stack: &mut Vec<i64>| {
            let b = stack.pop().expect("right operand");
            let a = stack.pop().expect("left operand");
            stack.push(match op {
                '+' => a + b,
                '-' => a - b,
                '*' => a * b,
                '/' => a / b,
                _ => a % b,
            });
        });
    }

    (expr, ws)
}

fn run_test(path: &Path) -> datatest_stable::Result<()> {
    let input = std::fs::read_to_string(path)?;
    let input = input.trim_end_matches('\n');
    let expected_path = format!("{}.expected", path.display());
    let expected = std::fs::read_to_string(&expected_path)?.trim().to_string();
    let test_name = path.file_name().unwrap().to_str().unwrap();

    let arena = Bump::new();
    let mut g: Grammar<'_, Vec<i64>> = Grammar::new(&arena);
    let (expr, ws) = calculator(&mut g);

    let mut stack = Vec::new();
    let mut errors = Vec::new();
    let actual = if parse(input, &g, expr, ws, &mut errors, &mut stack) {
        if stack.len() != 1 {
            return Err(format!(
                "expected exactly one value for {:?}, got {:?}",
                path, stack
            )
            .into());
        }
        stack[0].to_string()
    } else {
        format_errors(&errors, input, test_name)
    };

    if actual != expected {
        return Err(format!(
            "mismatch for {:?}\n\nExpected:\n{}\n\nActual:\n{}",
            path, expected, actual
        )
        .into());
    }

    Ok(())
}

harness!(run_test, "tests/calculator", r"\.calc$");

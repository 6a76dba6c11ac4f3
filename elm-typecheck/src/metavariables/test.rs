use super::{Solution, Solutions};
use elm_core::VarId;
use pretty_assertions::assert_eq;

#[test]
fn fresh_vars_are_dense() {
    let mut solutions: Solutions<u8> = Solutions::new();
    assert!(solutions.is_empty());
    assert_eq!(VarId(0), solutions.fresh());
    assert_eq!(VarId(1), solutions.fresh());
    assert_eq!(2, solutions.len())
}

#[test]
fn set_then_freeze() {
    let mut solutions = Solutions::new();
    let a = solutions.fresh();
    let b = solutions.fresh();
    solutions.set(b, 'x');
    assert_eq!(&Solution::Unsolved, solutions.get(a));

    let frozen = solutions.freeze();
    assert_eq!(&Solution::Unsolved, frozen.get(a));
    assert_eq!(&Solution::Solved('x'), frozen.get(b))
}

#[test]
#[should_panic(expected = "is already bound")]
fn set_twice() {
    let mut solutions = Solutions::new();
    let a = solutions.fresh();
    solutions.set(a, 1);
    solutions.set(a, 2)
}

#[test]
#[should_panic(expected = "belongs to another store")]
fn foreign_var() {
    let solutions: Solutions<u8> = Solutions::new();
    solutions.get(VarId(3));
}

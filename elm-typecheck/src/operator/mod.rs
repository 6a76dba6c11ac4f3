//! Binary operator precedence.
//!
//! Operator chains like `a + b * c |> f` are stored flat. [`parse`] rebuilds the tree from
//! each operator's precedence and associativity.


use elm_syntax::Associativity;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Precedence {
    pub precedence: u8,
    pub associativity: Associativity,
}

/**
An operator chain, with operands and operators identified by their index in the chain.

The chain `e0 op0 e1 op1 e2` has operands `0, 1, 2` and operators `0, 1`.
*/
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum BinaryTree {
    Operand(usize),
    Binary {
        left: Box<BinaryTree>,
        operator: usize,
        right: Box<BinaryTree>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// Two non-associative operators of the same precedence were chained.
    NonAssociative { operator: usize },
    /// Two operators of the same precedence but different associativity were chained.
    MixedAssociativity { left: usize, right: usize },
}

struct Parser<'a> {
    precedences: &'a [Precedence],
    next_operand: usize,
}

impl<'a> Parser<'a> {
    fn peek_operator(&self) -> Option<usize> {
        // operator `i` follows operand `i`
        let operator = self.next_operand - 1;
        if operator < self.precedences.len() {
            Some(operator)
        } else {
            None
        }
    }

    fn operand(&mut self) -> BinaryTree {
        let operand = self.next_operand;
        self.next_operand += 1;
        BinaryTree::Operand(operand)
    }

    fn check(&self, left: usize, right: usize) -> Result<(), Error> {
        let left_associativity = self.precedences[left].associativity;
        let right_associativity = self.precedences[right].associativity;
        match (left_associativity, right_associativity) {
            (Associativity::Non, Associativity::Non) => {
                Err(Error::NonAssociative { operator: right })
            }
            (a, b) if a != b => Err(Error::MixedAssociativity { left, right }),
            _ => Ok(()),
        }
    }

    /*
    Parse operands joined by operators that bind tighter than `min`. `parent` is the
    operator whose right-hand side is being parsed.
    */
    fn expression(&mut self, min: i16, parent: Option<usize>) -> Result<BinaryTree, Error> {
        let mut left = self.operand();
        let mut previous: Option<usize> = None;
        while let Some(operator) = self.peek_operator() {
            let Precedence {
                precedence,
                associativity,
            } = self.precedences[operator];
            if i16::from(precedence) <= min {
                break;
            }

            let same_precedence = |other: &usize| self.precedences[*other].precedence == precedence;
            if let Some(neighbour) = previous
                .filter(|other| same_precedence(other))
                .or_else(|| parent.filter(|other| same_precedence(other)))
            {
                self.check(neighbour, operator)?;
            }

            let right_min = match associativity {
                Associativity::Left | Associativity::Non => i16::from(precedence),
                Associativity::Right => i16::from(precedence) - 1,
            };
            let right = self.expression(right_min, Some(operator))?;
            left = BinaryTree::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
            previous = Some(operator);
        }
        Ok(left)
    }
}

/**
Build the tree for a chain of `precedences.len() + 1` operands separated by operators with
the given precedences.
*/
pub fn parse(precedences: &[Precedence]) -> Result<BinaryTree, Error> {
    Parser {
        precedences,
        next_operand: 0,
    }
    .expression(-1, None)
}

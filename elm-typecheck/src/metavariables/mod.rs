//! Type variable bindings.
//!
//! A [`Solutions`] table is owned by one inference pass and grows as fresh variables are
//! created. [`Solutions::freeze`] ends the pass: the resulting [`FrozenSolutions`] can only be
//! read, which is what lets finished results be shared.

#[cfg(test)]
mod test;

use elm_core::VarId;

#[derive(Debug, Clone, PartialEq)]
pub enum Solution<T> {
    Unsolved,
    Solved(T),
}

impl<T> Solution<T> {
    pub fn is_unsolved(&self) -> bool {
        matches!(self, Solution::Unsolved)
    }
}

fn lookup<T>(solutions: &[Solution<T>], var: VarId) -> &Solution<T> {
    solutions
        .get(var.0)
        .unwrap_or_else(|| panic!("type variable {:?} belongs to another store", var))
}

/**
The bindings of one inference pass.

Variable ids are dense indices into the table, so a [`VarId`] from another pass's store is a
bug and panics.
*/
#[derive(Debug)]
pub struct Solutions<T> {
    solutions: Vec<Solution<T>>,
}

impl<T> Solutions<T> {
    pub fn new() -> Self {
        Solutions {
            solutions: Vec::new(),
        }
    }

    pub fn get(&self, var: VarId) -> &Solution<T> {
        lookup(&self.solutions, var)
    }

    /// Bind an unsolved variable. Binding a variable twice panics.
    pub fn set(&mut self, var: VarId, value: T) {
        let solution = self
            .solutions
            .get_mut(var.0)
            .unwrap_or_else(|| panic!("type variable {:?} belongs to another store", var));
        if !solution.is_unsolved() {
            panic!("type variable {:?} is already bound", var);
        }
        *solution = Solution::Solved(value);
    }

    pub fn fresh(&mut self) -> VarId {
        self.solutions.push(Solution::Unsolved);
        VarId(self.solutions.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn freeze(self) -> FrozenSolutions<T> {
        FrozenSolutions {
            solutions: self.solutions,
        }
    }
}

impl<T> Default for Solutions<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bindings that can no longer change.
#[derive(Debug)]
pub struct FrozenSolutions<T> {
    solutions: Vec<Solution<T>>,
}

impl<T> FrozenSolutions<T> {
    pub fn get(&self, var: VarId) -> &Solution<T> {
        lookup(&self.solutions, var)
    }
}

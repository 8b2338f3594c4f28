use crate::error::{Result, VmError};
use crate::memory::{Word, MAX_VALUE};

/// Unbounded call stack used by `push`, `pop`, `call` and `ret`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Stack {
    data: Vec<Word>,
}

impl Stack {
    pub fn push(&mut self, value: Word) -> Result<()> {
        if value > MAX_VALUE {
            return Err(VmError::ValueRange {
                value: value as usize,
            });
        }

        self.data.push(value);
        Ok(())
    }

    /// Removes the most recently pushed word
    pub fn pop(&mut self) -> Result<Word> {
        self.data.pop().ok_or(VmError::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

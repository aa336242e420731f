//! EVM stack implementation

use primitive_types::U256;

use crate::error::{EvmError, EvmResult};
use crate::gas::cost::MAX_STACK_SIZE;

/// Bounded LIFO stack of 256-bit words
#[derive(Clone, Debug)]
pub struct Stack {
    data: Vec<U256>,
    max_height: usize,
}

impl Stack {
    /// Create a new empty stack holding at most 1024 words
    pub fn new() -> Self {
        Self::with_limit(MAX_STACK_SIZE)
    }

    /// Create a stack with a custom height limit
    pub fn with_limit(max_height: usize) -> Self {
        Self {
            data: Vec::with_capacity(max_height.min(MAX_STACK_SIZE)),
            max_height,
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: U256) -> EvmResult<()> {
        if self.data.len() >= self.max_height {
            return Err(EvmError::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Push a big-endian byte string. More than 32 bytes does not fit a word.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> EvmResult<()> {
        if bytes.len() > 32 {
            return Err(EvmError::OutOfRange);
        }
        self.push(U256::from_big_endian(bytes))
    }

    /// Pop a value from the stack
    pub fn pop(&mut self) -> EvmResult<U256> {
        self.data.pop().ok_or(EvmError::StackUnderflow)
    }

    /// Pop `n` values, top first
    pub fn pop_n(&mut self, n: usize) -> EvmResult<Vec<U256>> {
        if self.data.len() < n {
            return Err(EvmError::StackUnderflow);
        }
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut popped = self.data.split_off(self.data.len() - n);
        popped.reverse();
        Ok(popped)
    }

    /// Copy the top `n` values, top first, without popping
    pub fn peek(&self, n: usize) -> EvmResult<Vec<U256>> {
        if self.data.len() < n {
            return Err(EvmError::StackUnderflow);
        }
        Ok(self.data.iter().rev().take(n).copied().collect())
    }

    /// Swap the top with the item `pos` below it (1 = second item)
    pub fn swap(&mut self, pos: usize) -> EvmResult<()> {
        if self.data.len() <= pos {
            return Err(EvmError::StackUnderflow);
        }
        let head = self.data.len() - 1;
        self.data.swap(head, head - pos);
        Ok(())
    }

    /// Duplicate the item at depth `pos` to the top (1 = top)
    pub fn dup(&mut self, pos: usize) -> EvmResult<()> {
        if pos == 0 || self.data.len() < pos {
            return Err(EvmError::StackUnderflow);
        }
        let value = self.data[self.data.len() - pos];
        self.push(value)
    }

    /// Get current stack size
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Contents, bottom first
    pub fn as_slice(&self) -> &[U256] {
        &self.data
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stack_of(values: &[u64]) -> Stack {
        let mut stack = Stack::new();
        for v in values {
            stack.push(U256::from(*v)).unwrap();
        }
        stack
    }

    fn contents(stack: &Stack) -> Vec<u64> {
        stack.as_slice().iter().map(|v| v.as_u64()).collect()
    }

    // ==================== push / pop ====================

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();
        stack.push(U256::from(42u64)).unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.pop().unwrap(), U256::from(42u64));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_empty_underflows() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(EvmError::StackUnderflow));
    }

    #[test]
    fn test_overflow_at_1025() {
        let mut stack = Stack::new();
        for i in 0..1024u64 {
            stack.push(U256::from(i)).unwrap();
        }
        assert_eq!(stack.push(U256::zero()), Err(EvmError::StackOverflow));
        assert_eq!(stack.len(), 1024);
    }

    #[test]
    fn test_custom_limit() {
        let mut stack = Stack::with_limit(2);
        stack.push(U256::one()).unwrap();
        stack.push(U256::one()).unwrap();
        assert_eq!(stack.push(U256::one()), Err(EvmError::StackOverflow));
    }

    #[test]
    fn test_push_bytes_range() {
        let mut stack = Stack::new();
        stack.push_bytes(&[0x01, 0x00]).unwrap();
        assert_eq!(stack.pop().unwrap(), U256::from(256u64));
        stack.push_bytes(&[0xff; 32]).unwrap();
        assert_eq!(stack.pop().unwrap(), U256::MAX);
        assert_eq!(stack.push_bytes(&[0x01; 33]), Err(EvmError::OutOfRange));
    }

    // ==================== pop_n / peek ====================

    #[test]
    fn test_pop_n_order() {
        let mut stack = stack_of(&[1, 2, 3]);
        let popped = stack.pop_n(2).unwrap();
        assert_eq!(popped, vec![U256::from(3u64), U256::from(2u64)]);
        assert_eq!(contents(&stack), vec![1]);
    }

    #[test]
    fn test_pop_n_zero_and_underflow() {
        let mut stack = stack_of(&[1]);
        assert!(stack.pop_n(0).unwrap().is_empty());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.pop_n(2), Err(EvmError::StackUnderflow));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let stack = stack_of(&[1, 2, 3]);
        assert_eq!(stack.peek(2).unwrap(), vec![U256::from(3u64), U256::from(2u64)]);
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.peek(4), Err(EvmError::StackUnderflow));
    }

    // ==================== swap / dup ====================

    #[test]
    fn test_dup1() {
        let mut stack = stack_of(&[1, 2, 3]);
        stack.dup(1).unwrap();
        assert_eq!(contents(&stack), vec![1, 2, 3, 3]);
    }

    #[test]
    fn test_dup_deep() {
        let mut stack = stack_of(&[1, 2, 3]);
        stack.dup(3).unwrap();
        assert_eq!(contents(&stack), vec![1, 2, 3, 1]);
        assert_eq!(stack.dup(5), Err(EvmError::StackUnderflow));
        assert_eq!(stack.dup(0), Err(EvmError::StackUnderflow));
    }

    #[test]
    fn test_dup_overflow() {
        let mut stack = Stack::with_limit(1);
        stack.push(U256::one()).unwrap();
        assert_eq!(stack.dup(1), Err(EvmError::StackOverflow));
    }

    #[test]
    fn test_swap1() {
        let mut stack = stack_of(&[1, 2, 3]);
        stack.swap(1).unwrap();
        assert_eq!(contents(&stack), vec![1, 3, 2]);
    }

    #[test]
    fn test_swap_underflow() {
        let mut stack = stack_of(&[1, 2]);
        assert_eq!(stack.swap(2), Err(EvmError::StackUnderflow));
        stack.swap(1).unwrap();
        assert_eq!(contents(&stack), vec![2, 1]);
    }

    proptest! {
        #[test]
        fn prop_height_never_exceeds_limit(pushes in 0usize..1100) {
            let mut stack = Stack::new();
            let mut failures = 0;
            for i in 0..pushes {
                if stack.push(U256::from(i)).is_err() {
                    failures += 1;
                }
            }
            prop_assert!(stack.len() <= 1024);
            prop_assert_eq!(failures, pushes.saturating_sub(1024));
        }

        #[test]
        fn prop_pop_n_matches_repeated_pop(values in proptest::collection::vec(any::<u64>(), 0..40), n in 0usize..40) {
            let mut a = Stack::new();
            for v in &values {
                a.push(U256::from(*v)).unwrap();
            }
            let mut b = a.clone();
            match a.pop_n(n) {
                Ok(popped) => {
                    let single: Vec<U256> = (0..n).map(|_| b.pop().unwrap()).collect();
                    prop_assert_eq!(popped, single);
                }
                Err(e) => {
                    prop_assert_eq!(e, EvmError::StackUnderflow);
                    prop_assert!(n > values.len());
                }
            }
        }
    }
}

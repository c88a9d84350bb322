use std::cell::RefCell;

enum State<T> {
    Unfilled,
    Filling,
    Filled(T),
}

/// A value computed at most once, on first access.
///
/// Asking for the value while its fill function is still running (directly
/// recursive, or re-entered through another lazy value that depends on it)
/// is a programming error and panics instead of deadlocking or recursing.
///
/// The cell is `!Sync`; it is owned by a single snapshot on a single task.
pub struct Lazy<T> {
    state: RefCell<State<T>>,
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Lazy<T> {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::Unfilled),
        }
    }

    /// Whether the value has already been computed.
    pub fn is_filled(&self) -> bool {
        matches!(*self.state.borrow(), State::Filled(_))
    }
}

impl<T: Clone> Lazy<T> {
    /// Return the value, running `fill` first if it has not been computed.
    ///
    /// # Panics
    ///
    /// Panics if called while `fill` for this same cell is in progress.
    /// If `fill` itself panics the cell is left unfilled.
    pub fn get_or_fill(&self, fill: impl FnOnce() -> T) -> T {
        {
            let mut state = self.state.borrow_mut();
            match &*state {
                State::Filled(value) => return value.clone(),
                State::Filling => panic!("lazy value accessed while it was being filled"),
                State::Unfilled => *state = State::Filling,
            }
        }

        // The borrow is released so `fill` may read other cells.
        let guard = ResetOnUnwind { state: &self.state };
        let value = fill();
        std::mem::forget(guard);
        *self.state.borrow_mut() = State::Filled(value.clone());
        value
    }
}

/// Puts a cell back to `Unfilled` if its fill function panics, so the next
/// access retries instead of reporting a fill that is no longer running.
struct ResetOnUnwind<'a, T> {
    state: &'a RefCell<State<T>>,
}

impl<T> Drop for ResetOnUnwind<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            *state = State::Unfilled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fills_once() {
        let calls = Cell::new(0);
        let lazy = Lazy::new();

        let first = lazy.get_or_fill(|| {
            calls.set(calls.get() + 1);
            42
        });
        let second = lazy.get_or_fill(|| {
            calls.set(calls.get() + 1);
            7
        });

        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(calls.get(), 1);
        assert!(lazy.is_filled());
    }

    #[test]
    fn starts_unfilled() {
        let lazy: Lazy<bool> = Lazy::default();
        assert!(!lazy.is_filled());
    }

    #[test]
    #[should_panic(expected = "being filled")]
    fn recursive_fill_panics() {
        let lazy: Lazy<u32> = Lazy::new();
        lazy.get_or_fill(|| lazy.get_or_fill(|| 1) + 1);
    }

    #[test]
    fn panicking_fill_leaves_cell_unfilled() {
        let lazy: Lazy<u32> = Lazy::new();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            lazy.get_or_fill(|| panic!("fill failed"))
        }));
        assert!(outcome.is_err());
        assert!(!lazy.is_filled());

        assert_eq!(lazy.get_or_fill(|| 5), 5);
        assert!(lazy.is_filled());
    }

    #[test]
    fn recursive_fill_panic_does_not_poison_the_cell() {
        let lazy: Lazy<u32> = Lazy::new();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            lazy.get_or_fill(|| lazy.get_or_fill(|| 1) + 1)
        }));
        assert!(outcome.is_err());
        assert_eq!(lazy.get_or_fill(|| 3), 3);
    }

    #[test]
    fn nested_independent_cells_are_allowed() {
        let inner: Lazy<u32> = Lazy::new();
        let outer: Lazy<u32> = Lazy::new();

        let v = outer.get_or_fill(|| inner.get_or_fill(|| 2) * 10);
        assert_eq!(v, 20);
        assert!(inner.is_filled());
    }
}

//! Lightweight 32-bit index handles.
//!
//! Every entity in the front-end (tokens, lines, identifiers, parse
//! nodes) is addressed by a `u32` index into a vector owned by the
//! enclosing buffer. Handles are passed by value and are only meaningful
//! together with the buffer that issued them.

/// Defines a newtype index handle over `u32`.
///
/// The generated type is `Copy`, ordered, hashable, and prints as its
/// raw index. `$name::new` takes a `usize` for direct use with vector
/// lengths; `index()` converts back for direct use with vector lookups.
#[macro_export]
macro_rules! define_index_type {
    ($(#[$doc:meta])* $vis:vis struct $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(u32);

        impl $name {
            $vis fn new(index: usize) -> Self {
                debug_assert!(index <= u32::MAX as usize);
                Self(index as u32)
            }

            $vis const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// The raw index, for vector lookups.
            $vis const fn index(self) -> usize {
                self.0 as usize
            }

            $vis const fn raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    define_index_type! {
        struct TestIndex
    }

    #[test]
    fn round_trips_through_usize() {
        let idx = TestIndex::new(42);
        assert_eq!(idx.index(), 42);
        assert_eq!(idx.raw(), 42);
        assert_eq!(TestIndex::from_raw(42), idx);
    }

    #[test]
    fn ordering_follows_index() {
        assert!(TestIndex::new(1) < TestIndex::new(2));
        assert_eq!(TestIndex::new(7), TestIndex::new(7));
    }

    #[test]
    fn displays_as_raw_index() {
        assert_eq!(TestIndex::new(9).to_string(), "9");
    }
}

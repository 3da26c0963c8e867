use std::cmp::Ordering;

/// A total order over keys, used by the index instead of [`Ord`].
///
/// Any closure `Fn(&K, &K) -> Ordering` can be used as comparator.
/// The comparator must be consistent for all keys inserted into the same index,
/// otherwise entries might not be found again.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Compares keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K> Comparator<K> for NaturalOrder
where
    K: Ord + ?Sized,
{
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K, F> Comparator<K> for F
where
    K: ?Sized,
    F: Fn(&K, &K) -> Ordering,
{
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order() {
        assert_eq!(Ordering::Less, NaturalOrder.compare(&1, &2));
        assert_eq!(Ordering::Equal, NaturalOrder.compare("abc", "abc"));
        assert_eq!(Ordering::Greater, NaturalOrder.compare(&vec![1, 2], &vec![1]));
    }

    #[test]
    fn closure_comparator() {
        let reverse = |a: &u32, b: &u32| b.cmp(a);
        assert_eq!(Ordering::Greater, reverse.compare(&1, &2));
        assert_eq!(Ordering::Less, reverse.compare(&2, &1));
    }
}

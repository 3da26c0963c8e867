use std::collections::TryReserveError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the order of the B-tree must be at least 2, but was {0}")]
    OrderTooSmall(usize),
    #[error("the order of the B-tree must be at most {}, but was {0}", usize::MAX / 2)]
    OrderTooLarge(usize),
    #[error("could not allocate storage for B-tree nodes")]
    AllocationFailure(#[from] TryReserveError),
    #[error("key does not exist in the index")]
    NonExistingKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            "the order of the B-tree must be at least 2, but was 1",
            Error::OrderTooSmall(1).to_string()
        );
        assert_eq!(
            format!("the order of the B-tree must be at most {}, but was {}", usize::MAX / 2, usize::MAX),
            Error::OrderTooLarge(usize::MAX).to_string()
        );
        assert_eq!("key does not exist in the index", Error::NonExistingKey.to_string());
    }

    #[test]
    fn allocation_error_conversion() {
        let reserve_error = Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err();
        let err: Error = reserve_error.into();
        assert!(matches!(err, Error::AllocationFailure(_)));
    }
}

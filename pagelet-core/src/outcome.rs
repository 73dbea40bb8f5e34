//! Handler outcome and conversion traits.

use crate::error::BoxError;

/// Result of a handler invocation indicating whether the fire continues.
///
/// A veto is an explicit decision; anything that is not an explicit veto
/// (including "no opinion") continues the fire. This replaces the loose
/// `undefined` / `false` / truthy inspection of dynamic event buses with
/// two named states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// No opinion, or handled without objection; the fire continues.
    Continue,
    /// Explicit rejection. Gating events stop here; collect events record it.
    Veto,
}

impl FireOutcome {
    /// Whether this outcome is an explicit veto.
    pub fn is_veto(self) -> bool {
        matches!(self, FireOutcome::Veto)
    }
}

/// Trait for converting a handler's return value into a [`FireOutcome`].
///
/// # Default Implementations
///
/// - `()` → Continue
/// - `bool` → `true` = Continue, `false` = Veto
/// - `FireOutcome` → As is
/// - `Option<T>` → `None` means "no opinion", delegates otherwise
/// - `Result<T, E>` → Delegates to inner `T` or propagates the error
pub trait IntoOutcome {
    /// Convert the value into propagation behavior and optional error.
    fn into_outcome(self) -> Result<FireOutcome, BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<FireOutcome, BoxError> {
        Ok(FireOutcome::Continue)
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Result<FireOutcome, BoxError> {
        Ok(if self {
            FireOutcome::Continue
        } else {
            FireOutcome::Veto
        })
    }
}

impl IntoOutcome for FireOutcome {
    fn into_outcome(self) -> Result<FireOutcome, BoxError> {
        Ok(self)
    }
}

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Result<FireOutcome, BoxError> {
        match self {
            Some(value) => value.into_outcome(),
            None => Ok(FireOutcome::Continue),
        }
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_outcome(self) -> Result<FireOutcome, BoxError> {
        match self {
            Ok(value) => value.into_outcome(),
            Err(e) => Err(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_false_is_the_only_veto() {
        assert_eq!(().into_outcome().unwrap(), FireOutcome::Continue);
        assert_eq!(true.into_outcome().unwrap(), FireOutcome::Continue);
        assert_eq!(false.into_outcome().unwrap(), FireOutcome::Veto);
        assert_eq!(None::<bool>.into_outcome().unwrap(), FireOutcome::Continue);
        assert_eq!(Some(false).into_outcome().unwrap(), FireOutcome::Veto);
    }

    #[test]
    fn errors_propagate() {
        let result: Result<bool, std::io::Error> = Err(std::io::Error::other("boom"));
        assert!(result.into_outcome().is_err());
    }
}

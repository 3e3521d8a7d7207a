use std::future::Future;

use launch_services::ServiceResult;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a resource existence check.
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

/// Awaits a remote lookup and never fails the caller.
///
/// A 404 is an ordinary miss. Any other error is logged and treated as a
/// miss so that a real conflict surfaces on the create call instead.
pub async fn lookup<T, F>(service: &'static str, name: &str, query: F) -> Lookup<T>
where
    F: Future<Output = ServiceResult<Option<T>>>,
{
    match query.await {
        Ok(Some(found)) => Lookup::Found(found),
        Ok(None) => Lookup::NotFound,
        Err(error) if error.is_not_found() => Lookup::NotFound,
        Err(error) => {
            tracing::warn!(
                service,
                name,
                error = %error,
                "existence check failed; treating resource as absent"
            );
            Lookup::NotFound
        }
    }
}

use std::fmt::{Display, Formatter};

/// When a suspend or resume fails, the error states what it has left behind in the cluster so the
/// operator knows whether the cluster can be used as-is.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Residue {
    /// Nothing was changed. The cluster is in the state it was in before the command ran.
    Untouched,

    /// Some changes were made before the failure. The cluster is in an intermediate state and the
    /// command (or its counterpart) should be run again.
    Partial,

    /// It is unknown whether anything was changed.
    Unknown,
}

impl Residue {
    pub fn message(&self) -> &'static str {
        match self {
            Residue::Untouched => "No changes were made to the cluster",
            Residue::Partial => "The cluster was left partially changed",
            Residue::Unknown => "It is unknown whether the cluster was changed",
        }
    }
}

impl Display for Residue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self.message(), f)
    }
}

/// The error type returned by suspend and resume.
#[derive(Debug)]
pub struct LifecycleError {
    /// What the failure has left behind in the cluster.
    residue: Residue,

    /// Any message to be included with the error. This will be included in the formatted display
    /// before `inner`.
    context: Option<String>,

    /// The error that caused this error.
    inner: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;

impl LifecycleError {
    pub fn new_with_source_and_context<S, E>(residue: Residue, context: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            residue,
            context: Some(context.into()),
            inner: Some(source.into()),
        }
    }

    pub fn new_with_source<E>(residue: Residue, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            residue,
            context: None,
            inner: Some(source.into()),
        }
    }

    pub fn new_with_context<S>(residue: Residue, context: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            residue,
            context: Some(context.into()),
            inner: None,
        }
    }

    /// Replaces the residue. Used by the step executor, which knows whether earlier steps have
    /// already changed the cluster.
    pub fn with_residue(mut self, residue: Residue) -> Self {
        self.residue = residue;
        self
    }

    pub fn residue(&self) -> Residue {
        self.residue
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn inner(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.inner.as_ref().map(|some| some.as_ref())
    }
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.context(), self.inner()) {
            (Some(context), Some(inner)) => write!(f, "{}: {}", context, inner)?,
            (Some(context), None) => write!(f, "{}", context)?,
            (None, Some(inner)) => write!(f, "{}", inner)?,
            (None, None) => write!(f, "{}", self.residue)?,
        }
        Ok(())
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// A trait that makes it possible to convert error types to `LifecycleError` using a familiar
/// `context` function.
pub trait IntoLifecycleError<T> {
    fn context<S>(self, residue: Residue, message: S) -> LifecycleResult<T>
    where
        S: Into<String>;
}

impl<T, E> IntoLifecycleError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<S>(self, residue: Residue, message: S) -> LifecycleResult<T>
    where
        S: Into<String>,
    {
        self.map_err(|e| LifecycleError::new_with_source_and_context(residue, message, e))
    }
}

impl<T> IntoLifecycleError<T> for std::option::Option<T> {
    fn context<S>(self, residue: Residue, message: S) -> LifecycleResult<T>
    where
        S: Into<String>,
    {
        self.ok_or_else(|| LifecycleError::new_with_context(residue, message))
    }
}

impl From<crate::clients::Error> for LifecycleError {
    fn from(e: crate::clients::Error) -> Self {
        LifecycleError::new_with_source(Residue::Unknown, e)
    }
}

use std::sync::Arc;

/// An optional shared callback. Cloning shares the same function.
pub enum SharedFn<F: ?Sized + Send + Sync + 'static> {
    None,
    Some(Arc<F>),
}

impl<F: ?Sized + Send + Sync + 'static> Clone for SharedFn<F> {
    fn clone(&self) -> Self {
        match self {
            SharedFn::None => SharedFn::None,
            SharedFn::Some(f) => SharedFn::Some(Arc::clone(f)),
        }
    }
}

impl<F: ?Sized + Send + Sync + 'static> Default for SharedFn<F> {
    fn default() -> Self {
        SharedFn::None
    }
}

impl<F: ?Sized + Send + Sync + 'static> SharedFn<F> {
    pub fn new(f: Arc<F>) -> Self {
        SharedFn::Some(f)
    }

    pub fn is_some(&self) -> bool {
        matches!(self, SharedFn::Some(_))
    }

    pub fn as_ref(&self) -> Option<&Arc<F>> {
        match self {
            SharedFn::None => None,
            SharedFn::Some(f) => Some(f),
        }
    }
}

impl<F: ?Sized + Send + Sync + 'static> std::fmt::Debug for SharedFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SharedFn::None => write!(f, "SharedFn::None"),
            SharedFn::Some(_) => write!(f, "SharedFn::Some(...)"),
        }
    }
}

impl<F: ?Sized + Send + Sync + 'static> From<Arc<F>> for SharedFn<F> {
    fn from(f: Arc<F>) -> Self {
        SharedFn::Some(f)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    type Counter = SharedFn<dyn Fn(usize) + Send + Sync>;

    #[test]
    fn default_holds_nothing() {
        let callback = Counter::default();
        assert!(!callback.is_some());
        assert!(callback.as_ref().is_none());
        assert_eq!(format!("{:?}", callback), "SharedFn::None");
    }

    #[test]
    fn clones_share_the_function() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&calls);
        let callback: Counter = SharedFn::new(Arc::new(move |n: usize| {
            sink.fetch_add(n, Ordering::SeqCst);
        }));
        let copy = callback.clone();

        for cb in [&callback, &copy] {
            if let Some(f) = cb.as_ref() {
                f(2);
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(format!("{:?}", copy), "SharedFn::Some(...)");
    }
}

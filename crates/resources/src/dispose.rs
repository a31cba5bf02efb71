use std::{any::Any, marker::PhantomData, num::NonZeroU64, sync::Arc};

use crate::{id::make_id, resource::Resource};

make_id! {
    /// Handle of a registered disposer.
    pub DisposerId;
}

/// Releases resource objects of some kind.
pub trait Disposer: Send + Sync + 'static {
    /// Returns name of the disposer.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Checks if this disposer knows how to release the resource.
    fn can_dispose(&self, resource: &Resource) -> bool;

    /// Releases the resource.
    fn dispose(&self, resource: Resource);
}

/// Disposer that handles resources of type `T` with a function.
pub struct DisposeFn<T, F> {
    f: F,
    marker: PhantomData<fn(Arc<T>)>,
}

impl<T, F> DisposeFn<T, F>
where
    T: Any + Send + Sync,
    F: Fn(Arc<T>) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        DisposeFn {
            f,
            marker: PhantomData,
        }
    }
}

impl<T, F> Disposer for DisposeFn<T, F>
where
    T: Any + Send + Sync,
    F: Fn(Arc<T>) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn can_dispose(&self, resource: &Resource) -> bool {
        resource.is::<T>()
    }

    fn dispose(&self, resource: Resource) {
        if let Some(object) = resource.downcast::<T>() {
            (self.f)(object);
        }
    }
}

/// Ordered list of disposers.
/// First disposer that can dispose wins.
pub(crate) struct Disposers {
    next_id: NonZeroU64,
    disposers: Vec<(DisposerId, Box<dyn Disposer>)>,
}

impl Disposers {
    pub fn new() -> Self {
        Disposers {
            next_id: NonZeroU64::MIN,
            disposers: Vec::new(),
        }
    }

    pub fn add_disposer(&mut self, disposer: Box<dyn Disposer>) -> DisposerId {
        let id = DisposerId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        tracing::info!("Registering disposer '{}' as {:?}", disposer.name(), id);
        self.disposers.push((id, disposer));
        id
    }

    pub fn remove_disposer(&mut self, id: DisposerId) -> bool {
        match self.disposers.iter().position(|(i, _)| *i == id) {
            None => false,
            Some(idx) => {
                self.disposers.remove(idx);
                true
            }
        }
    }

    pub fn find(&self, resource: &Resource) -> Option<(DisposerId, &dyn Disposer)> {
        self.disposers
            .iter()
            .find(|(_, disposer)| disposer.can_dispose(resource))
            .map(|(id, disposer)| (*id, &**disposer))
    }
}

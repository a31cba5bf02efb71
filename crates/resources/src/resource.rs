use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Weak},
};

/// Type tag of a resource object.
///
/// Compared by [`TypeId`], name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct ResourceType {
    id: TypeId,
    name: &'static str,
}

impl ResourceType {
    #[inline(always)]
    pub fn of<T: Any>() -> Self {
        ResourceType {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline(always)]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ResourceType {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceType {}

impl Hash for ResourceType {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Shared handle to an imported resource object.
///
/// The handle may be given out before the object is fully patched,
/// so objects that reference other resources keep those references
/// behind interior mutability.
/// Two handles refer to the same object iff [`Resource::ptr_eq`] is true.
#[derive(Clone)]
pub struct Resource {
    object: Arc<dyn Any + Send + Sync>,
    ty: ResourceType,
}

impl Resource {
    pub fn new<T>(object: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Resource::from_arc(Arc::new(object))
    }

    pub fn from_arc<T>(object: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Resource {
            object,
            ty: ResourceType::of::<T>(),
        }
    }

    /// Returns type of the object.
    #[inline(always)]
    pub fn ty(&self) -> ResourceType {
        self.ty
    }

    #[inline(always)]
    pub fn is<T: Any>(&self) -> bool {
        self.ty.is::<T>()
    }

    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.object.clone().downcast::<T>().ok()
    }

    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Any,
    {
        self.object.downcast_ref::<T>()
    }

    /// Checks that both handles refer to the same object.
    #[inline(always)]
    pub fn ptr_eq(a: &Resource, b: &Resource) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&a.object), Arc::as_ptr(&b.object))
    }

    /// Creates a weak handle to the object.
    ///
    /// Importers that wire cyclic references should keep one side weak
    /// to let the cycle be freed.
    pub fn downgrade(&self) -> WeakResource {
        WeakResource {
            object: Arc::downgrade(&self.object),
            ty: self.ty,
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resource<{}>({:p})",
            self.ty.name,
            Arc::as_ptr(&self.object) as *const ()
        )
    }
}

/// Weak counterpart of [`Resource`].
#[derive(Clone)]
pub struct WeakResource {
    object: Weak<dyn Any + Send + Sync>,
    ty: ResourceType,
}

impl WeakResource {
    pub fn upgrade(&self) -> Option<Resource> {
        Some(Resource {
            object: self.object.upgrade()?,
            ty: self.ty,
        })
    }

    #[inline(always)]
    pub fn ty(&self) -> ResourceType {
        self.ty
    }
}

impl fmt::Debug for WeakResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakResource<{}>", self.ty.name)
    }
}

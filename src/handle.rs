//! Opaque handles to backend-owned GPU resources.
//!
//! The core never touches raw GPU objects. Every buffer, texture, mesh, depth
//! target and program lives inside a [`GraphicsBackend`] and is referred to
//! by a [`ResourceHandle`]: a backend-assigned id plus the kind of resource
//! it names.
//!
//! [`GraphicsBackend`]: crate::backend::GraphicsBackend

use std::fmt;

use rustc_hash::FxHashMap;

use crate::backend::RenderError;

/// Kind of GPU resource a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Vertex, index or storage buffer.
    Buffer,
    /// Sampled color texture.
    Texture,
    /// Off-screen depth image (shadow map).
    DepthTarget,
    /// Uploaded mesh (vertex + index buffers).
    Mesh,
    /// Shader program (pipeline family).
    Program,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Buffer => "buffer",
            Self::Texture => "texture",
            Self::DepthTarget => "depth target",
            Self::Mesh => "mesh",
            Self::Program => "program",
        };
        f.write_str(name)
    }
}

/// Backend resource id tagged with its declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    id: u64,
    kind: ResourceKind,
}

impl ResourceHandle {
    /// Wrap a backend id. Only backends should mint handles.
    #[must_use]
    pub const fn new(id: u64, kind: ResourceKind) -> Self {
        Self { id, kind }
    }

    /// Backend resource id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.id
    }

    /// Declared resource kind.
    #[must_use]
    pub const fn kind(self) -> ResourceKind {
        self.kind
    }

    /// Return `self` if it names a resource of `expected` kind.
    ///
    /// # Errors
    ///
    /// [`RenderError::WrongKind`] if the kinds differ.
    pub fn expect_kind(
        self,
        expected: ResourceKind,
    ) -> Result<Self, RenderError> {
        if self.kind == expected {
            Ok(self)
        } else {
            Err(RenderError::WrongKind {
                handle: self,
                expected,
            })
        }
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Mints handles with monotonically increasing ids. Ids are never reused, so
/// a released handle can never alias a newer resource.
#[derive(Debug)]
pub struct HandleAllocator {
    next: u64,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleAllocator {
    /// Allocator starting at id 1 (0 is never handed out).
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Mint a fresh handle of the given kind.
    pub fn allocate(&mut self, kind: ResourceKind) -> ResourceHandle {
        let id = self.next;
        self.next += 1;
        ResourceHandle::new(id, kind)
    }
}

/// Handle-keyed storage for backend resources.
pub struct HandleStore<T> {
    allocator: HandleAllocator,
    entries: FxHashMap<u64, (ResourceKind, T)>,
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleStore<T> {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: HandleAllocator::new(),
            entries: FxHashMap::default(),
        }
    }

    /// Store a resource and return its new handle.
    pub fn insert(&mut self, kind: ResourceKind, value: T) -> ResourceHandle {
        let handle = self.allocator.allocate(kind);
        let _ = self.entries.insert(handle.id(), (kind, value));
        handle
    }

    /// Look up a resource, checking the handle's kind against the stored one.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnknownHandle`] if the id is not live,
    /// [`RenderError::WrongKind`] if it was stored under a different kind.
    pub fn get(&self, handle: ResourceHandle) -> Result<&T, RenderError> {
        match self.entries.get(&handle.id()) {
            Some((kind, value)) if *kind == handle.kind() => Ok(value),
            Some((kind, _)) => Err(RenderError::WrongKind {
                handle,
                expected: *kind,
            }),
            None => Err(RenderError::UnknownHandle(handle)),
        }
    }

    /// Mutable lookup with the same checks as [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut(
        &mut self,
        handle: ResourceHandle,
    ) -> Result<&mut T, RenderError> {
        match self.entries.get_mut(&handle.id()) {
            Some((kind, value)) if *kind == handle.kind() => Ok(value),
            Some((kind, _)) => Err(RenderError::WrongKind {
                handle,
                expected: *kind,
            }),
            None => Err(RenderError::UnknownHandle(handle)),
        }
    }

    /// Remove a resource. Returns `None` if the handle was not live.
    pub fn remove(&mut self, handle: ResourceHandle) -> Option<T> {
        match self.entries.get(&handle.id()) {
            Some((kind, _)) if *kind == handle.kind() => {
                self.entries.remove(&handle.id()).map(|(_, value)| value)
            }
            _ => None,
        }
    }

    /// Number of live resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no live resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = HandleAllocator::new();
        let a = allocator.allocate(ResourceKind::Buffer);
        let b = allocator.allocate(ResourceKind::Buffer);
        assert_ne!(a.id(), b.id());
        assert!(b.id() > a.id());
    }

    #[test]
    fn store_checks_kind() {
        let mut store = HandleStore::new();
        let handle = store.insert(ResourceKind::Texture, 7_u32);
        assert_eq!(store.get(handle).copied().ok(), Some(7));

        let forged = ResourceHandle::new(handle.id(), ResourceKind::Buffer);
        assert!(matches!(
            store.get(forged),
            Err(RenderError::WrongKind { .. })
        ));
        assert!(store.remove(forged).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn removed_handle_is_unknown() {
        let mut store = HandleStore::new();
        let handle = store.insert(ResourceKind::Mesh, "ground");
        assert_eq!(store.remove(handle), Some("ground"));
        assert!(matches!(
            store.get(handle),
            Err(RenderError::UnknownHandle(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn expect_kind_rejects_mismatch() {
        let handle = ResourceHandle::new(3, ResourceKind::DepthTarget);
        assert!(handle.expect_kind(ResourceKind::DepthTarget).is_ok());
        assert!(handle.expect_kind(ResourceKind::Texture).is_err());
        assert_eq!(handle.to_string(), "depth target#3");
    }
}

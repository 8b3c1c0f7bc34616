use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use crate::error::{Result, SackError};

#[derive(Debug, Default)]
struct Registry {
    tokens: BTreeSet<u64>,
    next_token: u64,
}

impl Registry {
    fn register(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        self.tokens.insert(token);
        token
    }
}

/// Vouches for the validity of every handle registered with it.
///
/// Handles register a token here on construction; `clear()` (and dropping
/// the guard) invalidates all of them at once. The guard stays usable after
/// `clear()` — handles registered afterwards are valid until the next clear.
/// Tokens are never reused, so a cleared handle can not come back to life.
#[derive(Debug, Default)]
pub struct HandleGuard {
    registry: Rc<RefCell<Registry>>,
}

impl HandleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently registered handles.
    pub fn size(&self) -> usize {
        self.registry.borrow().tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().tokens.is_empty()
    }

    /// Invalidate every registered handle and empty the registry.
    /// Idempotent.
    pub fn clear(&self) {
        self.registry.borrow_mut().tokens.clear();
    }

    fn register(&self) -> Registration {
        let token = self.registry.borrow_mut().register();
        Registration {
            registry: Rc::downgrade(&self.registry),
            token,
        }
    }
}

/// One handle's membership in a guard's registry: a weak reference to the
/// registry plus the token it was issued. The token travels with the handle
/// on move, so moves need no registry surgery.
#[derive(Debug)]
struct Registration {
    registry: Weak<RefCell<Registry>>,
    token: u64,
}

impl Registration {
    fn is_valid(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.borrow().tokens.contains(&self.token),
            None => false,
        }
    }

    /// A fresh registration with the same guard, or a dead one if this
    /// registration is no longer valid (copies of an invalid handle stay
    /// invalid).
    fn duplicate(&self) -> Registration {
        if let Some(registry) = self.registry.upgrade() {
            let mut inner = registry.borrow_mut();
            if inner.tokens.contains(&self.token) {
                return Registration {
                    registry: self.registry.clone(),
                    token: inner.register(),
                };
            }
        }
        Registration {
            registry: self.registry.clone(),
            token: self.token,
        }
    }

    fn same_guard(&self, other: &Registration) -> bool {
        Weak::ptr_eq(&self.registry, &other.registry)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().tokens.remove(&self.token);
        }
    }
}

/// A handle that owns a private copy of the resource.
///
/// The copy is released when the handle is dropped, but the handle is only
/// dereferenceable while its guard vouches for it: after the guard is
/// cleared or dropped, `get()` fails with [`SackError::InvalidHandle`] even
/// though the copy is still allocated.
#[derive(Debug)]
pub struct OwningHandle<T> {
    resource: Box<T>,
    registration: Registration,
}

impl<T> OwningHandle<T> {
    pub fn new(resource: T, guard: &HandleGuard) -> Self {
        Self {
            resource: Box::new(resource),
            registration: guard.register(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.registration.is_valid()
    }

    /// Fails with [`SackError::InvalidHandle`] when the guard was cleared
    /// or dropped since registration.
    pub fn check(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SackError::InvalidHandle)
        }
    }

    /// Access the owned copy.
    pub fn get(&self) -> Result<&T> {
        self.check()?;
        Ok(&self.resource)
    }

    /// Mutable access to the owned copy.
    pub fn get_mut(&mut self) -> Result<&mut T> {
        self.check()?;
        Ok(&mut self.resource)
    }

    pub fn has_same_guard(&self, other: &OwningHandle<T>) -> bool {
        self.registration.same_guard(&other.registration)
    }
}

/// Cloning deep-copies the resource and takes a fresh registration with the
/// same guard.
impl<T: Clone> Clone for OwningHandle<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            registration: self.registration.duplicate(),
        }
    }
}

/// Equality compares resource identity; two owning handles are only equal
/// to themselves.
impl<T> PartialEq for OwningHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(&*self.resource, &*other.resource)
    }
}

impl<T> Eq for OwningHandle<T> {}

/// A handle that aliases a resource owned elsewhere.
///
/// Cloning aliases the same resource and re-registers with the same guard.
/// The shared allocation outlives invalidation, so a stale handle is a
/// checked error rather than a dangling read.
#[derive(Debug)]
pub struct AliasHandle<T> {
    resource: Rc<T>,
    registration: Registration,
}

impl<T> AliasHandle<T> {
    pub fn new(resource: Rc<T>, guard: &HandleGuard) -> Self {
        Self {
            resource,
            registration: guard.register(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.registration.is_valid()
    }

    /// Fails with [`SackError::InvalidHandle`] when the guard was cleared
    /// or dropped since registration.
    pub fn check(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SackError::InvalidHandle)
        }
    }

    /// Access the aliased resource.
    pub fn get(&self) -> Result<&T> {
        self.check()?;
        Ok(&self.resource)
    }

    pub fn has_same_guard(&self, other: &AliasHandle<T>) -> bool {
        self.registration.same_guard(&other.registration)
    }
}

impl<T> Clone for AliasHandle<T> {
    fn clone(&self) -> Self {
        Self {
            resource: Rc::clone(&self.resource),
            registration: self.registration.duplicate(),
        }
    }
}

/// Equality compares resource identity, independent of guard.
impl<T> PartialEq for AliasHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T> Eq for AliasHandle<T> {}

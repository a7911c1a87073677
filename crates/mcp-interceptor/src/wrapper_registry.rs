//! The only process-wide state the layer keeps:
//! a map from a wrapped server's identity to its controlling
//! [`crate::wrapper::WrapperHandle`], using weak references so a dropped
//! server's entry does not keep the handle alive forever.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, Weak};

fn registry() -> &'static Mutex<HashMap<usize, Weak<dyn Any + Send + Sync>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<usize, Weak<dyn Any + Send + Sync>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Identity key for a wrapped server: the `Arc`'s pointer address. Stable
/// for the `Arc`'s lifetime, which is exactly the scope we need.
pub fn identity_of<T: ?Sized>(server: &Arc<T>) -> usize {
    Arc::as_ptr(server) as *const () as usize
}

/// Record `handle` as the controlling instance for `key`, evicting any
/// stale (already-dropped) entry first.
pub fn register(key: usize, handle: Arc<dyn Any + Send + Sync>) {
    registry().lock().expect("wrapper registry lock poisoned").insert(key, Arc::downgrade(&handle));
}

/// Look up the controlling instance for `key`, if it's still alive.
pub fn lookup(key: usize) -> Option<Arc<dyn Any + Send + Sync>> {
    registry().lock().expect("wrapper registry lock poisoned").get(&key).and_then(Weak::upgrade)
}
